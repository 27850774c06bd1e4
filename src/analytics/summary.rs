// Narrative summary: deterministic insight templates plus a one-paragraph
// executive summary, built from statistics, trends, anomalies and keywords.

use serde::Serialize;
use serde_json::{json, Value};

use super::anomaly::Anomaly;
use super::stats::{KeywordCount, SummaryStatistics};
use super::trends::{round_to, Severity, TrendReport};
use crate::classify::category::title_case;

/// Keywords mentioned in the themes insight.
const THEME_KEYWORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Overview,
    TrendRising,
    TrendFalling,
    NewCategory,
    Spike,
    Hotspot,
    DominantType,
    Keywords,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub severity: InsightSeverity,
    pub text: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminSummary {
    pub generated_at: String,
    pub period_days: u32,
    pub executive_summary: String,
    pub insights: Vec<Insight>,
    pub statistics: SummaryStatistics,
    pub trends: TrendReport,
    pub anomalies: Vec<Anomaly>,
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Insights in fixed order; each only when its data is non-empty.
pub fn build_insights(
    days: u32,
    stats: &SummaryStatistics,
    trends: &TrendReport,
    anomalies: &[Anomaly],
    keywords: &[KeywordCount],
) -> Vec<Insight> {
    let mut insights = Vec::new();
    let total = stats.total_incidents;

    if total > 0 {
        insights.push(Insight {
            kind: InsightKind::Overview,
            severity: InsightSeverity::Info,
            text: format!(
                "📊 {total} incident{} reported in the last {days} days",
                plural(total)
            ),
            data: json!({ "count": total, "period_days": days }),
        });
    }

    if let Some(top) = trends.rising_trends.first() {
        let pct = top.change_percentage.unwrap_or(0.0);
        insights.push(Insight {
            kind: InsightKind::TrendRising,
            severity: if top.severity == Severity::High {
                InsightSeverity::Warning
            } else {
                InsightSeverity::Info
            },
            text: format!(
                "📈 {} waste is rising: {pct:+.0}% increase ({} incidents, up from {})",
                title_case(&top.category),
                top.current_count,
                top.previous_count
            ),
            data: json!(top),
        });
    }

    if let Some(top) = trends.falling_trends.first() {
        let pct = top.change_percentage.unwrap_or(0.0);
        insights.push(Insight {
            kind: InsightKind::TrendFalling,
            severity: InsightSeverity::Success,
            text: format!(
                "📉 {} waste is declining: {pct:.0}% decrease (good progress!)",
                title_case(&top.category)
            ),
            data: json!(top),
        });
    }

    if !trends.new_categories.is_empty() {
        let names: Vec<&str> = trends
            .new_categories
            .iter()
            .map(|t| t.category.as_str())
            .collect();
        insights.push(Insight {
            kind: InsightKind::NewCategory,
            severity: InsightSeverity::Info,
            text: format!(
                "🆕 New waste type{} detected: {}",
                if names.len() > 1 { "s" } else { "" },
                names.join(", ")
            ),
            data: json!(trends.new_categories),
        });
    }

    if let Some(spike) = trends.spikes.last() {
        insights.push(Insight {
            kind: InsightKind::Spike,
            severity: InsightSeverity::Warning,
            text: format!(
                "⚠️ Unusual activity spike detected on {}: {} incidents (normally {:.0})",
                spike.date, spike.count, spike.mean
            ),
            data: json!(spike),
        });
    }

    if let Some(top) = anomalies.first() {
        insights.push(Insight {
            kind: InsightKind::Hotspot,
            severity: if top.severity == Severity::High {
                InsightSeverity::Error
            } else {
                InsightSeverity::Warning
            },
            text: format!(
                "🔥 Hotspot alert: {} has {} incidents (well above average of {})",
                top.location, top.count, top.mean
            ),
            data: json!(top),
        });
    }

    if let Some((label, count)) = stats.dominant_category() {
        let percentage = if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        insights.push(Insight {
            kind: InsightKind::DominantType,
            severity: InsightSeverity::Info,
            text: format!(
                "🏆 Most common waste type: {} ({count} incidents, {percentage:.0}% of total)",
                title_case(label)
            ),
            data: json!({
                "waste_type": label,
                "count": count,
                "percentage": round_to(percentage, 1),
            }),
        });
    }

    if !keywords.is_empty() {
        let top: Vec<&str> = keywords
            .iter()
            .take(THEME_KEYWORDS)
            .map(|k| k.keyword.as_str())
            .collect();
        insights.push(Insight {
            kind: InsightKind::Keywords,
            severity: InsightSeverity::Info,
            text: format!("🔑 Common themes: {}", top.join(", ")),
            data: json!({ "keywords": top }),
        });
    }

    if let Some(top) = stats.top_locations.first() {
        insights.push(Insight {
            kind: InsightKind::Location,
            severity: InsightSeverity::Info,
            text: format!(
                "📍 Most affected location: {} ({} incidents)",
                top.location, top.count
            ),
            data: json!(top),
        });
    }

    insights
}

/// One paragraph: window and total, then top rising, hotspot, dominant and
/// top falling where present.
pub fn executive_summary(
    days: u32,
    stats: &SummaryStatistics,
    trends: &TrendReport,
    anomalies: &[Anomaly],
) -> String {
    let total = stats.total_incidents;
    let mut parts = vec![format!(
        "In the past {days} days, {total} waste incident{} reported",
        if total == 1 { " was" } else { "s were" }
    )];

    if let Some(top) = trends.rising_trends.first() {
        parts.push(format!(
            "with {} waste showing a significant increase of {:+.0}%",
            top.category,
            top.change_percentage.unwrap_or(0.0)
        ));
    }

    if let Some(hotspot) = anomalies.first() {
        parts.push(format!(
            "A hotspot was identified at {} with {} incidents",
            hotspot.location, hotspot.count
        ));
    }

    if let Some((label, count)) = stats.dominant_category() {
        parts.push(format!(
            "{} waste remains the most common type with {count} incidents",
            title_case(label)
        ));
    }

    if let Some(top) = trends.falling_trends.first() {
        parts.push(format!(
            "while {} waste has decreased by {:.0}%",
            top.category,
            top.change_percentage.unwrap_or(0.0).abs()
        ));
    }

    format!("{}.", parts.join(". "))
}
