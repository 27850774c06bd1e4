// SqliteStore: rusqlite backend implementing IncidentStore.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Each method locks, does its synchronous rusqlite work through queries.rs,
// and returns. The guard is never held across an .await.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{
    AiFields, Candidate, CountDimension, DailyCategoryCount, Incident, IncidentFilter,
    IncidentUpdate, LocationPoint, NewIncident, TimeWindow,
};
use super::queries;
use super::traits::IncidentStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Fresh in-memory database with the schema applied.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl IncidentStore for SqliteStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn fetch_candidates(&self, exclude_id: Option<Uuid>) -> Result<Vec<Candidate>> {
        let conn = self.conn.lock().await;
        queries::fetch_candidates(&conn, exclude_id)
    }

    async fn fetch_counts_by(
        &self,
        dimension: CountDimension,
        window: TimeWindow,
    ) -> Result<BTreeMap<String, i64>> {
        let conn = self.conn.lock().await;
        queries::fetch_counts_by(&conn, dimension, &window)
    }

    async fn fetch_daily_category_counts(
        &self,
        window: TimeWindow,
    ) -> Result<Vec<DailyCategoryCount>> {
        let conn = self.conn.lock().await;
        queries::fetch_daily_category_counts(&conn, &window)
    }

    async fn fetch_keyword_lists(&self) -> Result<Vec<Vec<String>>> {
        let conn = self.conn.lock().await;
        queries::fetch_keyword_lists(&conn)
    }

    async fn fetch_location_points(&self, window: TimeWindow) -> Result<Vec<LocationPoint>> {
        let conn = self.conn.lock().await;
        queries::fetch_location_points(&conn, &window)
    }

    async fn count_incidents(&self, window: TimeWindow) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::count_incidents(&conn, &window)
    }

    async fn insert_incident(&self, new: &NewIncident) -> Result<Incident> {
        let conn = self.conn.lock().await;
        queries::insert_incident(&conn, new)
    }

    async fn insert_processed(&self, new: &NewIncident, fields: &AiFields) -> Result<Incident> {
        let mut conn = self.conn.lock().await;
        queries::insert_processed(&mut conn, new, fields)
    }

    async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>> {
        let conn = self.conn.lock().await;
        queries::get_incident(&conn, id)
    }

    async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Incident>> {
        let conn = self.conn.lock().await;
        queries::list_incidents(&conn, filter, page, page_size)
    }

    async fn list_incident_ids(&self) -> Result<Vec<Uuid>> {
        let conn = self.conn.lock().await;
        queries::list_incident_ids(&conn)
    }

    async fn update_incident(
        &self,
        id: Uuid,
        update: &IncidentUpdate,
    ) -> Result<Option<Incident>> {
        let conn = self.conn.lock().await;
        queries::update_incident(&conn, id, update)
    }

    async fn delete_incident(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::delete_incident(&conn, id)
    }

    async fn save_ai_fields(&self, id: Uuid, fields: &AiFields) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        queries::save_ai_fields(&mut conn, id, fields)
    }
}
