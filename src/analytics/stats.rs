// Aggregate read models: summary statistics, time series, per-category daily
// series, and keyword frequency. Pure functions over counts fetched from
// storage; the service wires them to the store.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::db::models::{CountDimension, DailyCategoryCount};

/// Number of locations reported in summary statistics.
pub const TOP_LOCATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_incidents: i64,
    pub recent_incidents_7d: i64,
    /// Category label -> count, classified incidents only
    pub category_distribution: BTreeMap<String, i64>,
    pub top_locations: Vec<LocationCount>,
    pub period: Period,
}

impl SummaryStatistics {
    /// Largest category with its count. Ties go to the alphabetically first label.
    pub fn dominant_category(&self) -> Option<(&str, i64)> {
        let mut best: Option<(&str, i64)> = None;
        for (label, &count) in &self.category_distribution {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((label.as_str(), count));
            }
        }
        best
    }
}

/// Time-series bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn dimension(&self) -> CountDimension {
        match self {
            Granularity::Day => CountDimension::Day,
            Granularity::Week => CountDimension::Week,
            Granularity::Month => CountDimension::Month,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            other => anyhow::bail!("unknown granularity '{other}' (expected day, week or month)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    pub period: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

/// Rank locations by count descending, then name, keeping `limit`.
pub fn top_locations(counts: &BTreeMap<String, i64>, limit: usize) -> Vec<LocationCount> {
    let mut ranked: Vec<LocationCount> = counts
        .iter()
        .map(|(location, &count)| LocationCount {
            location: location.clone(),
            count,
        })
        .collect();
    // BTreeMap order is alphabetical, and the sort is stable
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Period buckets in chronological order.
pub fn time_series_points(buckets: BTreeMap<String, i64>) -> Vec<TimeSeriesPoint> {
    buckets
        .into_iter()
        .map(|(period, count)| TimeSeriesPoint { period, count })
        .collect()
}

/// Regroup (day, category, count) rows into one dated series per category.
pub fn category_series(rows: Vec<DailyCategoryCount>) -> BTreeMap<String, Vec<DatedCount>> {
    let mut series: BTreeMap<String, Vec<DatedCount>> = BTreeMap::new();
    for row in rows {
        series.entry(row.category).or_default().push(DatedCount {
            date: row.date,
            count: row.count,
        });
    }
    for points in series.values_mut() {
        points.sort_by(|a, b| a.date.cmp(&b.date));
    }
    series
}

/// Most frequent keywords across all lists. Ties are broken alphabetically.
pub fn keyword_frequency(lists: &[Vec<String>], limit: usize) -> Vec<KeywordCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for keyword in lists.iter().flatten() {
        *counts.entry(keyword.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<KeywordCount> = counts
        .into_iter()
        .map(|(keyword, count)| KeywordCount {
            keyword: keyword.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
    ranked.truncate(limit);
    ranked
}
