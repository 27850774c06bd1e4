// Location hotspot detection.
//
// A location is anomalous when its incident count exceeds the mean
// per-location count times a multiplier. It is high severity when it also
// exceeds that threshold by the severity multiplier.

use std::collections::BTreeMap;

use serde::Serialize;

use super::trends::{round_to, Severity};

/// Default threshold multiplier over the mean per-location count.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub location: String,
    pub count: i64,
    /// Rounded to 2 decimals
    pub mean: f64,
    /// Rounded to 2 decimals
    pub threshold: f64,
    pub severity: Severity,
}

/// Find anomalous locations, sorted by count descending then name.
pub fn detect_anomalies(
    location_counts: &BTreeMap<String, i64>,
    multiplier: f64,
    severity_multiplier: f64,
) -> Vec<Anomaly> {
    if location_counts.is_empty() {
        return Vec::new();
    }

    let mean = location_counts.values().sum::<i64>() as f64 / location_counts.len() as f64;
    let threshold = mean * multiplier;
    let high = threshold * severity_multiplier;

    let mut anomalies: Vec<Anomaly> = location_counts
        .iter()
        .filter(|(_, &count)| count as f64 > threshold)
        .map(|(location, &count)| Anomaly {
            location: location.clone(),
            count,
            mean: round_to(mean, 2),
            threshold: round_to(threshold, 2),
            severity: if count as f64 > high {
                Severity::High
            } else {
                Severity::Medium
            },
        })
        .collect();

    anomalies.sort_by(|a, b| b.count.cmp(&a.count));
    anomalies
}
