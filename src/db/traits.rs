// Storage trait: async interface over incident persistence.
//
// The engine only needs the reader half (candidates and aggregate counts);
// the pipeline and CLI use the writer half. Both live on one trait so a
// single `Arc<dyn IncidentStore>` can be handed around.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::models::{
    AiFields, Candidate, CountDimension, DailyCategoryCount, Incident, IncidentFilter,
    IncidentUpdate, LocationPoint, NewIncident, TimeWindow,
};

#[async_trait]
pub trait IncidentStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Reader ---

    /// Incidents with a stored embedding, minus `exclude_id`.
    async fn fetch_candidates(&self, exclude_id: Option<Uuid>) -> Result<Vec<Candidate>>;

    /// Counts grouped by `dimension` within `window`.
    async fn fetch_counts_by(
        &self,
        dimension: CountDimension,
        window: TimeWindow,
    ) -> Result<BTreeMap<String, i64>>;

    async fn fetch_daily_category_counts(
        &self,
        window: TimeWindow,
    ) -> Result<Vec<DailyCategoryCount>>;

    /// Keyword lists of every processed incident.
    async fn fetch_keyword_lists(&self) -> Result<Vec<Vec<String>>>;

    async fn fetch_location_points(&self, window: TimeWindow) -> Result<Vec<LocationPoint>>;

    async fn count_incidents(&self, window: TimeWindow) -> Result<i64>;

    // --- Writer ---

    async fn insert_incident(&self, new: &NewIncident) -> Result<Incident>;

    /// Insert an incident and its computed fields in a single transaction.
    async fn insert_processed(&self, new: &NewIncident, fields: &AiFields) -> Result<Incident>;

    async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>>;

    /// Newest first; `page` is 1-based.
    async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Incident>>;

    async fn list_incident_ids(&self) -> Result<Vec<Uuid>>;

    /// Edit user fields only. None if the incident doesn't exist.
    async fn update_incident(&self, id: Uuid, update: &IncidentUpdate)
        -> Result<Option<Incident>>;

    async fn delete_incident(&self, id: Uuid) -> Result<bool>;

    /// Persist computed fields in a single transaction.
    async fn save_ai_fields(&self, id: Uuid, fields: &AiFields) -> Result<bool>;
}
