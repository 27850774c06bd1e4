// Keyword extraction from incident descriptions.

pub mod keywords;
