// Data models: Rust structs that map to incident rows and storage queries.
//
// These types flow through the engine and the CLI. They live apart from the
// SQL so other modules can use them without depending on rusqlite directly.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::category::WasteCategory;
use crate::classify::engine::ClassificationBasis;

/// Storage timestamp format (UTC, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `now` minus `days`, or `None` when that instant is outside chrono's range.
pub fn days_before(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|span| now.checked_sub_signed(span))
}

/// Format a UTC instant the way it is stored.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp back into a UTC instant.
pub fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)?;
    Ok(naive.and_utc())
}

/// A reported waste incident with whatever AI fields have been computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// When the incident happened (UTC, `YYYY-MM-DD HH:MM:SS`)
    pub reported_at: String,
    pub waste_type: Option<WasteCategory>,
    pub confidence: Option<f64>,
    pub basis: Option<ClassificationBasis>,
    pub keywords: Vec<String>,
    pub embedding: Option<Vec<f64>>,
    pub similar_ids: Vec<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields supplied when an incident is first reported.
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Defaults to now when None.
    pub reported_at: Option<DateTime<Utc>>,
}

impl NewIncident {
    pub fn new(description: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            location: location.into(),
            latitude: None,
            longitude: None,
            reported_at: None,
        }
    }

    pub fn at(mut self, reported_at: DateTime<Utc>) -> Self {
        self.reported_at = Some(reported_at);
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

/// User-editable fields. Editing never recomputes the AI fields.
#[derive(Debug, Clone, Default)]
pub struct IncidentUpdate {
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Everything the engine computes for one incident, persisted together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiFields {
    pub waste_type: WasteCategory,
    pub confidence: f64,
    pub basis: ClassificationBasis,
    pub keywords: Vec<String>,
    pub embedding: Vec<f64>,
    pub similar_ids: Vec<Uuid>,
}

/// Minimal projection used by similarity search.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub embedding: Option<Vec<f64>>,
}

/// Grouping key for aggregate counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountDimension {
    /// Only incidents with a waste type
    Category,
    Location,
    /// `YYYY-MM-DD`
    Day,
    /// Monday of the week, `YYYY-MM-DD`
    Week,
    /// First of the month, `YYYY-MM-01`
    Month,
}

/// Bounds on `reported_at`. `start` is always inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub end_inclusive: bool,
}

impl TimeWindow {
    /// No bounds: every incident.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
            end_inclusive: false,
        }
    }

    /// `[start, end]`
    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            end_inclusive: true,
        }
    }

    /// `[start, end)`
    pub fn half_open(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            end_inclusive: false,
        }
    }

    /// `[now - days, now]`. A span reaching past the earliest representable
    /// instant leaves the start unbounded.
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: days_before(now, days),
            end: Some(now),
            end_inclusive: true,
        }
    }

    /// `[now - days, ..)`, unbounded when the span is out of range.
    pub fn since_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: days_before(now, days),
            end: None,
            end_inclusive: false,
        }
    }

    /// `(.., end)`
    pub fn before(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
            end_inclusive: false,
        }
    }

    /// SQL predicate over `column` plus its positional arguments.
    pub fn sql_predicate(&self, column: &str) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut args = Vec::new();
        if let Some(start) = &self.start {
            clauses.push(format!("{column} >= ?"));
            args.push(format_timestamp(start));
        }
        if let Some(end) = &self.end {
            let op = if self.end_inclusive { "<=" } else { "<" };
            clauses.push(format!("{column} {op} ?"));
            args.push(format_timestamp(end));
        }
        if clauses.is_empty() {
            ("1 = 1".to_string(), args)
        } else {
            (clauses.join(" AND "), args)
        }
    }
}

/// Filters for listing incidents. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub waste_type: Option<String>,
    pub location: Option<String>,
    pub window: TimeWindow,
}

/// Aggregated point for the location heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationPoint {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: i64,
}

/// One (day, category, count) row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCategoryCount {
    pub date: String,
    pub category: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let s = format_timestamp(&ts);
        assert_eq!(s, "2024-03-09 14:05:00");
        assert_eq!(parse_timestamp(&s).unwrap(), ts);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_window_predicates() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();

        let (sql, args) = TimeWindow::all().sql_predicate("reported_at");
        assert_eq!(sql, "1 = 1");
        assert!(args.is_empty());

        let (sql, args) = TimeWindow::closed(a, b).sql_predicate("reported_at");
        assert_eq!(sql, "reported_at >= ? AND reported_at <= ?");
        assert_eq!(args, vec!["2024-01-01 00:00:00", "2024-01-08 00:00:00"]);

        let (sql, _) = TimeWindow::half_open(a, b).sql_predicate("reported_at");
        assert_eq!(sql, "reported_at >= ? AND reported_at < ?");

        let (sql, args) = TimeWindow::since(a).sql_predicate("t");
        assert_eq!(sql, "t >= ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_last_days_window() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        let w = TimeWindow::last_days(now, 30);
        assert_eq!(w.start, Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()));
        assert_eq!(w.end, Some(now));
        assert!(w.end_inclusive);
    }

    #[test]
    fn test_out_of_range_span_is_unbounded() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(days_before(now, 200_000_000), None);
        assert_eq!(days_before(now, i64::MAX), None);

        let w = TimeWindow::last_days(now, 200_000_000);
        assert_eq!(w.start, None);
        assert_eq!(w.end, Some(now));
        assert_eq!(TimeWindow::since_days(now, 200_000_000), TimeWindow::all());
    }
}
