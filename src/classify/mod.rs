// Waste classification: category corpus, keyword rules and the
// semantic/keyword arbitration engine.

pub mod category;
pub mod engine;
pub mod keywords;
