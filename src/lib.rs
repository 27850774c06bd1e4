// Wastewatch: waste incident classification, duplicate detection and analytics
//
// This is the library root. Each module corresponds to a major subsystem:
// the classification engine and its encoder, similarity ranking, storage,
// analytics, and the ingest pipeline that ties them together.

pub mod analytics;
pub mod classify;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod similarity;
pub mod status;
pub mod text;
