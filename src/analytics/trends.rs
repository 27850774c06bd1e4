// Period-over-period trend classification and daily spike detection.
//
// Trends compare per-category counts in two adjacent windows of equal length.
// Spikes compare each day's count against the mean and population standard
// deviation of the recent daily counts.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::config::EngineSettings;

/// Fewer distinct days than this and spike detection returns nothing.
pub const MIN_SPIKE_DAYS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendClass {
    Rising,
    Falling,
    Stable,
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRecord {
    pub category: String,
    pub current_count: i64,
    pub previous_count: i64,
    /// Rounded to 1 decimal. None for new categories.
    pub change_percentage: Option<f64>,
    pub change_absolute: i64,
    pub classification: TrendClass,
    pub severity: Severity,
}

/// Trend records split by classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendBreakdown {
    /// Sorted by |change| descending
    pub rising: Vec<TrendRecord>,
    /// Sorted by |change| descending
    pub falling: Vec<TrendRecord>,
    pub stable: Vec<TrendRecord>,
    pub new: Vec<TrendRecord>,
}

impl TrendBreakdown {
    pub fn total_categories(&self) -> usize {
        self.rising.len() + self.falling.len() + self.stable.len() + self.new.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeRecord {
    pub date: String,
    pub count: i64,
    /// Rounded to 1 decimal
    pub mean: f64,
    /// Rounded to 1 decimal
    pub threshold: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendSummary {
    pub total_categories: usize,
    pub trending_up: usize,
    pub trending_down: usize,
    pub stable: usize,
    pub new: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub period_days: u32,
    pub analysis_date: String,
    pub rising_trends: Vec<TrendRecord>,
    pub falling_trends: Vec<TrendRecord>,
    pub stable_trends: Vec<TrendRecord>,
    pub new_categories: Vec<TrendRecord>,
    pub spikes: Vec<SpikeRecord>,
    pub summary: TrendSummary,
}

impl TrendReport {
    pub fn new(
        period_days: u32,
        analysis_date: String,
        breakdown: TrendBreakdown,
        spikes: Vec<SpikeRecord>,
    ) -> Self {
        let summary = TrendSummary {
            total_categories: breakdown.total_categories(),
            trending_up: breakdown.rising.len(),
            trending_down: breakdown.falling.len(),
            stable: breakdown.stable.len(),
            new: breakdown.new.len(),
        };
        Self {
            period_days,
            analysis_date,
            rising_trends: breakdown.rising,
            falling_trends: breakdown.falling,
            stable_trends: breakdown.stable,
            new_categories: breakdown.new,
            spikes,
            summary,
        }
    }
}

/// Classify each category's change between the previous and current window.
///
/// Categories absent from both windows never appear. A category with no
/// previous incidents is `New` and carries no percentage.
pub fn classify_trends(
    current: &BTreeMap<String, i64>,
    previous: &BTreeMap<String, i64>,
    settings: &EngineSettings,
) -> TrendBreakdown {
    let categories: BTreeSet<&String> = current.keys().chain(previous.keys()).collect();
    let mut out = TrendBreakdown::default();

    for category in categories {
        let cur = current.get(category).copied().unwrap_or(0);
        let prev = previous.get(category).copied().unwrap_or(0);

        if prev == 0 {
            if cur > 0 {
                out.new.push(TrendRecord {
                    category: category.clone(),
                    current_count: cur,
                    previous_count: 0,
                    change_percentage: None,
                    change_absolute: cur,
                    classification: TrendClass::New,
                    severity: Severity::Low,
                });
            }
            continue;
        }

        let change = (cur - prev) as f64 / prev as f64 * 100.0;
        let (classification, severity) = classify_change(change, settings);
        let record = TrendRecord {
            category: category.clone(),
            current_count: cur,
            previous_count: prev,
            change_percentage: Some(round_to(change, 1)),
            change_absolute: cur - prev,
            classification,
            severity,
        };

        match classification {
            TrendClass::Rising => out.rising.push(record),
            TrendClass::Falling => out.falling.push(record),
            _ => out.stable.push(record),
        }
    }

    let by_magnitude = |a: &TrendRecord, b: &TrendRecord| {
        let a = a.change_percentage.unwrap_or(0.0).abs();
        let b = b.change_percentage.unwrap_or(0.0).abs();
        b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
    };
    out.rising.sort_by(by_magnitude);
    out.falling.sort_by(by_magnitude);

    debug!(
        rising = out.rising.len(),
        falling = out.falling.len(),
        stable = out.stable.len(),
        new = out.new.len(),
        "Trends classified"
    );

    out
}

/// Rising/falling beyond the cutoff, high severity beyond the high cutoff.
pub fn classify_change(change_pct: f64, settings: &EngineSettings) -> (TrendClass, Severity) {
    let severity = if change_pct.abs() > settings.trend_high_cutoff_pct {
        Severity::High
    } else {
        Severity::Medium
    };

    if change_pct > settings.trend_cutoff_pct {
        (TrendClass::Rising, severity)
    } else if change_pct < -settings.trend_cutoff_pct {
        (TrendClass::Falling, severity)
    } else {
        (TrendClass::Stable, Severity::Low)
    }
}

/// Flag days whose count exceeds `mean + k * stddev` (population stddev).
///
/// `daily` must be in chronological order. Output keeps that order.
pub fn detect_spikes(daily: &[(String, i64)], k: f64, high_k: f64) -> Vec<SpikeRecord> {
    if daily.len() < MIN_SPIKE_DAYS {
        return Vec::new();
    }

    let n = daily.len() as f64;
    let mean = daily.iter().map(|(_, c)| *c as f64).sum::<f64>() / n;
    let variance = daily
        .iter()
        .map(|(_, c)| (*c as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();

    let threshold = mean + k * std_dev;
    let high_threshold = mean + high_k * std_dev;

    daily
        .iter()
        .filter(|(_, count)| *count as f64 > threshold)
        .map(|(date, count)| SpikeRecord {
            date: date.clone(),
            count: *count,
            mean: round_to(mean, 1),
            threshold: round_to(threshold, 1),
            severity: if *count as f64 > high_threshold {
                Severity::High
            } else {
                Severity::Medium
            },
        })
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
