// Incident pipeline: process -> find duplicates -> persist, plus explicit
// reprocessing.

pub mod duplicates;
pub mod ingest;

pub use ingest::{
    delete_incident, update_incident, IncidentPipeline, ProcessedIncident, ReprocessSummary,
};
