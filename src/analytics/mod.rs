// Analytics over stored incidents: aggregates, trends, spikes, hotspots and
// the narrative summary.

pub mod anomaly;
pub mod service;
pub mod stats;
pub mod summary;
pub mod trends;

pub use service::AnalyticsService;
