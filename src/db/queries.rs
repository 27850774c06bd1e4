// Database queries: incident CRUD and the aggregate reads behind analytics.
//
// All SQL lives here. Vectors, keyword lists and id lists are stored as JSON
// text columns.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::models::{
    format_timestamp, AiFields, Candidate, CountDimension, DailyCategoryCount, Incident,
    IncidentFilter, IncidentUpdate, LocationPoint, NewIncident, TimeWindow,
};
use crate::classify::category::WasteCategory;
use crate::classify::engine::ClassificationBasis;

const INCIDENT_COLUMNS: &str = "id, description, location, latitude, longitude, reported_at,
    waste_type, confidence, classification_basis, keywords, embedding, similar_ids,
    created_at, updated_at";

// --- Incidents ---

/// Insert a new, unprocessed incident and return the stored row.
pub fn insert_incident(conn: &Connection, new: &NewIncident) -> Result<Incident> {
    let id = insert_row(conn, new)?;
    get_incident(conn, id)?
        .ok_or_else(|| anyhow::anyhow!("incident {id} vanished after insert"))
}

/// Insert an incident together with its computed fields in one transaction.
pub fn insert_processed(
    conn: &mut Connection,
    new: &NewIncident,
    fields: &AiFields,
) -> Result<Incident> {
    let tx = conn.transaction()?;
    let id = insert_row(&tx, new)?;
    write_ai_fields(&tx, id, fields)?;
    tx.commit()?;

    get_incident(conn, id)?
        .ok_or_else(|| anyhow::anyhow!("incident {id} vanished after insert"))
}

fn insert_row(conn: &Connection, new: &NewIncident) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let reported_at = new.reported_at.unwrap_or(now);
    let now_str = format_timestamp(&now);

    conn.execute(
        "INSERT INTO incidents (id, description, location, latitude, longitude, reported_at,
                                created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            id.to_string(),
            new.description,
            new.location,
            new.latitude,
            new.longitude,
            format_timestamp(&reported_at),
            now_str,
        ],
    )?;
    Ok(id)
}

pub fn get_incident(conn: &Connection, id: Uuid) -> Result<Option<Incident>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?1"
    ))?;
    let result = stmt
        .query_row(params![id.to_string()], row_to_incident)
        .optional()?;
    Ok(result)
}

/// List incidents newest first. `page` is 1-based.
pub fn list_incidents(
    conn: &Connection,
    filter: &IncidentFilter,
    page: u32,
    page_size: u32,
) -> Result<Vec<Incident>> {
    let (mut predicate, mut args) = filter.window.sql_predicate("reported_at");

    if let Some(waste_type) = &filter.waste_type {
        predicate.push_str(" AND LOWER(COALESCE(waste_type, '')) LIKE ? ESCAPE '\\'");
        args.push(contains_pattern(waste_type));
    }
    if let Some(location) = &filter.location {
        predicate.push_str(" AND LOWER(location) LIKE ? ESCAPE '\\'");
        args.push(contains_pattern(location));
    }

    let page_size = page_size.max(1);
    let offset = page.saturating_sub(1) as u64 * page_size as u64;

    let mut stmt = conn.prepare(&format!(
        "SELECT {INCIDENT_COLUMNS} FROM incidents
         WHERE {predicate}
         ORDER BY reported_at DESC, created_at DESC
         LIMIT {page_size} OFFSET {offset}"
    ))?;
    let rows = stmt.query_map(params_from_iter(args.iter()), row_to_incident)?;

    let mut incidents = Vec::new();
    for row in rows {
        incidents.push(row?);
    }
    Ok(incidents)
}

/// Case-insensitive substring pattern for `LIKE .. ESCAPE '\'`.
/// Wildcards in user input match literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Every incident id, oldest first.
pub fn list_incident_ids(conn: &Connection) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare("SELECT id FROM incidents ORDER BY reported_at, created_at")?;
    let rows = stmt.query_map([], |row| parse_uuid(row, 0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Apply user edits. AI fields are left untouched.
pub fn update_incident(
    conn: &Connection,
    id: Uuid,
    update: &IncidentUpdate,
) -> Result<Option<Incident>> {
    let changed = conn.execute(
        "UPDATE incidents SET
            description = COALESCE(?2, description),
            location = COALESCE(?3, location),
            latitude = COALESCE(?4, latitude),
            longitude = COALESCE(?5, longitude),
            updated_at = ?6
         WHERE id = ?1",
        params![
            id.to_string(),
            update.description,
            update.location,
            update.latitude,
            update.longitude,
            format_timestamp(&Utc::now()),
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_incident(conn, id)
}

/// Returns false when no such incident existed.
pub fn delete_incident(conn: &Connection, id: Uuid) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM incidents WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(changed > 0)
}

/// Persist every computed field for an incident in one transaction.
/// Returns false when no such incident existed.
pub fn save_ai_fields(conn: &mut Connection, id: Uuid, fields: &AiFields) -> Result<bool> {
    let tx = conn.transaction()?;
    let changed = write_ai_fields(&tx, id, fields)?;
    tx.commit()?;
    Ok(changed > 0)
}

fn write_ai_fields(conn: &Connection, id: Uuid, fields: &AiFields) -> Result<usize> {
    let keywords_json = serde_json::to_string(&fields.keywords)?;
    let embedding_json = serde_json::to_string(&fields.embedding)?;
    let similar_json = serde_json::to_string(&fields.similar_ids)?;

    let changed = conn.execute(
        "UPDATE incidents SET
            waste_type = ?2,
            confidence = ?3,
            classification_basis = ?4,
            keywords = ?5,
            embedding = ?6,
            similar_ids = ?7,
            updated_at = ?8
         WHERE id = ?1",
        params![
            id.to_string(),
            fields.waste_type.as_str(),
            fields.confidence,
            fields.basis.as_str(),
            keywords_json,
            embedding_json,
            similar_json,
            format_timestamp(&Utc::now()),
        ],
    )?;
    Ok(changed)
}

// --- Similarity ---

/// Every incident with a stored embedding, except `exclude_id`.
pub fn fetch_candidates(conn: &Connection, exclude_id: Option<Uuid>) -> Result<Vec<Candidate>> {
    let exclude = exclude_id.map(|id| id.to_string()).unwrap_or_default();
    let mut stmt = conn.prepare(
        "SELECT id, embedding FROM incidents
         WHERE embedding IS NOT NULL AND id != ?1",
    )?;
    let rows = stmt.query_map(params![exclude], |row| {
        Ok(Candidate {
            id: parse_uuid(row, 0)?,
            embedding: parse_json(row, 1)?,
        })
    })?;

    let mut candidates = Vec::new();
    for row in rows {
        candidates.push(row?);
    }
    Ok(candidates)
}

// --- Aggregates ---

/// Incident counts grouped by `dimension` within `window`, keyed in sort order.
pub fn fetch_counts_by(
    conn: &Connection,
    dimension: CountDimension,
    window: &TimeWindow,
) -> Result<BTreeMap<String, i64>> {
    let (key, extra) = match dimension {
        CountDimension::Category => ("waste_type", " AND waste_type IS NOT NULL"),
        CountDimension::Location => ("location", ""),
        CountDimension::Day => ("date(reported_at)", ""),
        CountDimension::Week => ("date(reported_at, 'weekday 0', '-6 days')", ""),
        CountDimension::Month => ("strftime('%Y-%m-01', reported_at)", ""),
    };
    let (predicate, args) = window.sql_predicate("reported_at");

    let mut stmt = conn.prepare(&format!(
        "SELECT {key} AS bucket, COUNT(*) FROM incidents
         WHERE {predicate}{extra}
         GROUP BY bucket"
    ))?;
    let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = BTreeMap::new();
    for row in rows {
        let (bucket, count) = row?;
        counts.insert(bucket, count);
    }
    Ok(counts)
}

/// Per-day, per-category counts ordered by date then category.
pub fn fetch_daily_category_counts(
    conn: &Connection,
    window: &TimeWindow,
) -> Result<Vec<DailyCategoryCount>> {
    let (predicate, args) = window.sql_predicate("reported_at");
    let mut stmt = conn.prepare(&format!(
        "SELECT date(reported_at) AS day, waste_type, COUNT(*) FROM incidents
         WHERE {predicate} AND waste_type IS NOT NULL
         GROUP BY day, waste_type
         ORDER BY day, waste_type"
    ))?;
    let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
        Ok(DailyCategoryCount {
            date: row.get(0)?,
            category: row.get(1)?,
            count: row.get(2)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Stored keyword lists for every processed incident.
pub fn fetch_keyword_lists(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut stmt = conn.prepare("SELECT keywords FROM incidents WHERE keywords IS NOT NULL")?;
    let rows = stmt.query_map([], |row| parse_json::<Vec<String>>(row, 0))?;

    let mut lists = Vec::new();
    for row in rows {
        if let Some(list) = row? {
            lists.push(list);
        }
    }
    Ok(lists)
}

/// Incidents with coordinates, grouped per location with averaged position.
pub fn fetch_location_points(conn: &Connection, window: &TimeWindow) -> Result<Vec<LocationPoint>> {
    let (predicate, args) = window.sql_predicate("reported_at");
    let mut stmt = conn.prepare(&format!(
        "SELECT location, AVG(latitude), AVG(longitude), COUNT(*) AS n FROM incidents
         WHERE {predicate} AND latitude IS NOT NULL AND longitude IS NOT NULL
         GROUP BY location
         ORDER BY n DESC, location"
    ))?;
    let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
        Ok(LocationPoint {
            location: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            count: row.get(3)?,
        })
    })?;

    let mut points = Vec::new();
    for row in rows {
        points.push(row?);
    }
    Ok(points)
}

pub fn count_incidents(conn: &Connection, window: &TimeWindow) -> Result<i64> {
    let (predicate, args) = window.sql_predicate("reported_at");
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM incidents WHERE {predicate}"),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;
    Ok(count)
}

// --- Row mapping ---

fn row_to_incident(row: &Row<'_>) -> rusqlite::Result<Incident> {
    let waste_type: Option<String> = row.get(6)?;
    let waste_type = waste_type
        .map(|s| s.parse::<WasteCategory>())
        .transpose()
        .map_err(|e| conversion_error(6, e.into()))?;
    let basis: Option<String> = row.get(8)?;

    Ok(Incident {
        id: parse_uuid(row, 0)?,
        description: row.get(1)?,
        location: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        reported_at: row.get(5)?,
        waste_type,
        confidence: row.get(7)?,
        basis: basis.as_deref().and_then(ClassificationBasis::from_label),
        keywords: parse_json(row, 9)?.unwrap_or_default(),
        embedding: parse_json(row, 10)?,
        similar_ids: parse_json(row, 11)?.unwrap_or_default(),
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn parse_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, Box::new(e)))
}

/// Decode a nullable JSON text column.
fn parse_json<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| conversion_error(idx, Box::new(e)))
}

fn conversion_error(
    idx: usize,
    err: Box<dyn std::error::Error + Send + Sync + 'static>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use chrono::TimeZone;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn fields(category: WasteCategory, embedding: Vec<f64>) -> AiFields {
        AiFields {
            waste_type: category,
            confidence: 0.8,
            basis: ClassificationBasis::Semantic,
            keywords: vec!["bottles".to_string()],
            embedding,
            similar_ids: vec![],
        }
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        let new = NewIncident::new("Plastic bottles on the beach", "North Beach")
            .at(at(6, 9))
            .with_coordinates(51.5, -0.12);
        let inc = insert_incident(&conn, &new).unwrap();

        assert_eq!(inc.description, "Plastic bottles on the beach");
        assert_eq!(inc.reported_at, "2024-05-06 09:00:00");
        assert_eq!(inc.latitude, Some(51.5));
        assert!(inc.waste_type.is_none());
        assert!(inc.embedding.is_none());
        assert!(inc.keywords.is_empty());

        let loaded = get_incident(&conn, inc.id).unwrap().unwrap();
        assert_eq!(loaded.id, inc.id);
        assert!(get_incident(&conn, Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_save_ai_fields_roundtrip() {
        let mut conn = test_db();
        let inc = insert_incident(&conn, &NewIncident::new("d", "l")).unwrap();
        let other = Uuid::new_v4();

        let mut f = fields(WasteCategory::Plastic, vec![0.1, -0.2, 0.3]);
        f.similar_ids = vec![other];
        assert!(save_ai_fields(&mut conn, inc.id, &f).unwrap());

        let loaded = get_incident(&conn, inc.id).unwrap().unwrap();
        assert_eq!(loaded.waste_type, Some(WasteCategory::Plastic));
        assert_eq!(loaded.confidence, Some(0.8));
        assert_eq!(loaded.basis, Some(ClassificationBasis::Semantic));
        assert_eq!(loaded.keywords, vec!["bottles"]);
        assert_eq!(loaded.embedding, Some(vec![0.1, -0.2, 0.3]));
        assert_eq!(loaded.similar_ids, vec![other]);

        assert!(!save_ai_fields(&mut conn, Uuid::new_v4(), &f).unwrap());
    }

    #[test]
    fn test_insert_processed_writes_everything() {
        let mut conn = test_db();
        let new = NewIncident::new("Broken glass by the bins", "Car Park").at(at(4, 7));
        let inc = insert_processed(&mut conn, &new, &fields(WasteCategory::Glass, vec![0.0, 1.0]))
            .unwrap();
        assert_eq!(inc.reported_at, "2024-05-04 07:00:00");
        assert_eq!(inc.waste_type, Some(WasteCategory::Glass));
        assert_eq!(inc.embedding, Some(vec![0.0, 1.0]));
        assert_eq!(count_incidents(&conn, &TimeWindow::all()).unwrap(), 1);
    }

    #[test]
    fn test_update_leaves_ai_fields_alone() {
        let mut conn = test_db();
        let inc = insert_incident(&conn, &NewIncident::new("old text", "Park")).unwrap();
        save_ai_fields(&mut conn, inc.id, &fields(WasteCategory::Glass, vec![1.0])).unwrap();

        let update = IncidentUpdate {
            description: Some("new text".to_string()),
            ..Default::default()
        };
        let updated = update_incident(&conn, inc.id, &update).unwrap().unwrap();
        assert_eq!(updated.description, "new text");
        assert_eq!(updated.location, "Park");
        assert_eq!(updated.waste_type, Some(WasteCategory::Glass));
        assert_eq!(updated.embedding, Some(vec![1.0]));

        assert!(update_incident(&conn, Uuid::new_v4(), &update)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete() {
        let conn = test_db();
        let inc = insert_incident(&conn, &NewIncident::new("d", "l")).unwrap();
        assert!(delete_incident(&conn, inc.id).unwrap());
        assert!(!delete_incident(&conn, inc.id).unwrap());
        assert!(get_incident(&conn, inc.id).unwrap().is_none());
    }

    #[test]
    fn test_list_filters_and_pages() {
        let mut conn = test_db();
        for (i, loc) in ["River Road", "Market Square", "riverside park"].iter().enumerate() {
            let inc =
                insert_incident(&conn, &NewIncident::new("d", *loc).at(at(1 + i as u32, 8)))
                    .unwrap();
            let cat = if i == 1 {
                WasteCategory::Metal
            } else {
                WasteCategory::Plastic
            };
            save_ai_fields(&mut conn, inc.id, &fields(cat, vec![1.0])).unwrap();
        }

        let filter = IncidentFilter {
            location: Some("RIVER".to_string()),
            ..Default::default()
        };
        let found = list_incidents(&conn, &filter, 1, 10).unwrap();
        assert_eq!(found.len(), 2);
        // Newest first
        assert_eq!(found[0].location, "riverside park");

        let filter = IncidentFilter {
            waste_type: Some("met".to_string()),
            ..Default::default()
        };
        assert_eq!(list_incidents(&conn, &filter, 1, 10).unwrap().len(), 1);

        let all = IncidentFilter::default();
        assert_eq!(list_incidents(&conn, &all, 1, 2).unwrap().len(), 2);
        assert_eq!(list_incidents(&conn, &all, 2, 2).unwrap().len(), 1);
        assert!(list_incidents(&conn, &all, 3, 2).unwrap().is_empty());
    }

    #[test]
    fn test_list_filter_wildcards_match_literally() {
        let conn = test_db();
        for loc in ["Dock 5", "Lot_7", "50% Road"] {
            insert_incident(&conn, &NewIncident::new("d", loc)).unwrap();
        }

        let by = |needle: &str| IncidentFilter {
            location: Some(needle.to_string()),
            ..Default::default()
        };
        let percent = list_incidents(&conn, &by("%"), 1, 10).unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].location, "50% Road");
        let underscore = list_incidents(&conn, &by("_"), 1, 10).unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].location, "Lot_7");
        assert!(list_incidents(&conn, &by("\\"), 1, 10).unwrap().is_empty());

        let waste = IncidentFilter {
            waste_type: Some("%".to_string()),
            ..Default::default()
        };
        assert!(list_incidents(&conn, &waste, 1, 10).unwrap().is_empty());
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Lot_7"), "%lot\\_7%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_fetch_candidates_skips_unprocessed_and_excluded() {
        let mut conn = test_db();
        let a = insert_incident(&conn, &NewIncident::new("a", "x")).unwrap();
        let b = insert_incident(&conn, &NewIncident::new("b", "x")).unwrap();
        let _c = insert_incident(&conn, &NewIncident::new("c", "x")).unwrap();
        save_ai_fields(&mut conn, a.id, &fields(WasteCategory::Paper, vec![1.0, 0.0])).unwrap();
        save_ai_fields(&mut conn, b.id, &fields(WasteCategory::Paper, vec![0.0, 1.0])).unwrap();

        assert_eq!(fetch_candidates(&conn, None).unwrap().len(), 2);
        let without_a = fetch_candidates(&conn, Some(a.id)).unwrap();
        assert_eq!(without_a.len(), 1);
        assert_eq!(without_a[0].id, b.id);
    }

    #[test]
    fn test_counts_by_dimension() {
        let mut conn = test_db();
        // 2024-05-01 is a Wednesday; 2024-05-06 a Monday
        let rows = [
            (at(1, 10), "A", Some(WasteCategory::Plastic)),
            (at(1, 11), "A", Some(WasteCategory::Plastic)),
            (at(5, 10), "B", Some(WasteCategory::Glass)),
            (at(6, 10), "B", None),
        ];
        for (ts, loc, cat) in rows {
            let inc = insert_incident(&conn, &NewIncident::new("d", loc).at(ts)).unwrap();
            if let Some(cat) = cat {
                save_ai_fields(&mut conn, inc.id, &fields(cat, vec![1.0])).unwrap();
            }
        }
        let all = TimeWindow::all();

        let by_cat = fetch_counts_by(&conn, CountDimension::Category, &all).unwrap();
        assert_eq!(by_cat.get("plastic"), Some(&2));
        assert_eq!(by_cat.get("glass"), Some(&1));
        assert_eq!(by_cat.len(), 2);

        let by_loc = fetch_counts_by(&conn, CountDimension::Location, &all).unwrap();
        assert_eq!(by_loc.get("A"), Some(&2));
        assert_eq!(by_loc.get("B"), Some(&2));

        let by_day = fetch_counts_by(&conn, CountDimension::Day, &all).unwrap();
        let days: Vec<_> = by_day.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(days, vec![("2024-05-01", 2), ("2024-05-05", 1), ("2024-05-06", 1)]);

        let by_week = fetch_counts_by(&conn, CountDimension::Week, &all).unwrap();
        let weeks: Vec<_> = by_week.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(weeks, vec![("2024-04-29", 3), ("2024-05-06", 1)]);

        let by_month = fetch_counts_by(&conn, CountDimension::Month, &all).unwrap();
        assert_eq!(by_month.get("2024-05-01"), Some(&4));

        let window = TimeWindow::half_open(at(1, 0), at(5, 0));
        assert_eq!(count_incidents(&conn, &window).unwrap(), 2);
        assert_eq!(count_incidents(&conn, &all).unwrap(), 4);
    }

    #[test]
    fn test_daily_category_counts_and_keywords() {
        let mut conn = test_db();
        for (ts, cat) in [
            (at(2, 9), WasteCategory::Plastic),
            (at(2, 10), WasteCategory::Plastic),
            (at(3, 9), WasteCategory::Organic),
        ] {
            let inc = insert_incident(&conn, &NewIncident::new("d", "x").at(ts)).unwrap();
            save_ai_fields(&mut conn, inc.id, &fields(cat, vec![1.0])).unwrap();
        }

        let daily = fetch_daily_category_counts(&conn, &TimeWindow::all()).unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, "2024-05-02");
        assert_eq!(daily[0].category, "plastic");
        assert_eq!(daily[0].count, 2);

        let lists = fetch_keyword_lists(&conn).unwrap();
        assert_eq!(lists.len(), 3);
        assert!(lists.iter().all(|l| l == &vec!["bottles".to_string()]));
    }

    #[test]
    fn test_location_points_need_coordinates() {
        let conn = test_db();
        insert_incident(
            &conn,
            &NewIncident::new("d", "Dock").with_coordinates(10.0, 20.0),
        )
        .unwrap();
        insert_incident(
            &conn,
            &NewIncident::new("d", "Dock").with_coordinates(12.0, 22.0),
        )
        .unwrap();
        insert_incident(&conn, &NewIncident::new("d", "Nowhere")).unwrap();

        let points = fetch_location_points(&conn, &TimeWindow::all()).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].location, "Dock");
        assert_eq!(points[0].count, 2);
        assert!((points[0].latitude - 11.0).abs() < 1e-9);
        assert!((points[0].longitude - 21.0).abs() < 1e-9);
    }
}
