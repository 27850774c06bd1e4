// Colored terminal output for incidents, matches and analytics reports.
//
// main.rs delegates all human-readable rendering here; `--json` bypasses it.

use colored::Colorize;

use crate::analytics::anomaly::Anomaly;
use crate::analytics::stats::{KeywordCount, SummaryStatistics, TimeSeriesPoint};
use crate::analytics::summary::{AdminSummary, InsightSeverity};
use crate::analytics::trends::{Severity, TrendRecord, TrendReport};
use crate::classify::category::title_case;
use crate::classify::engine::Classification;
use crate::db::models::Incident;
use crate::similarity::SimilarMatch;

/// Warn that a result was produced after a caught failure.
pub fn display_degraded(reason: Option<&str>) {
    if let Some(reason) = reason {
        println!("  {} degraded result: {}", "!".yellow().bold(), reason.yellow());
    }
}

pub fn display_classification(classification: &Classification, keywords: &[String]) {
    println!(
        "\n  Waste type: {}  ({:.1}% via {})",
        classification.category.title().bold(),
        classification.confidence * 100.0,
        classification.basis.as_str().dimmed()
    );
    if !keywords.is_empty() {
        println!("  Keywords:   {}", keywords.join(", "));
    }
}

/// Display a page of incidents, newest first.
pub fn display_incident_list(incidents: &[Incident], page: u32) {
    if incidents.is_empty() {
        println!("No incidents found. Report one with `wastewatch report`.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Incidents (page {}, {} shown) ===", page, incidents.len()).bold()
    );
    println!();
    println!(
        "  {:<36}  {:<19}  {:<13}  {:>5}  {}",
        "Id".dimmed(),
        "Reported".dimmed(),
        "Type".dimmed(),
        "Conf".dimmed(),
        "Location".dimmed(),
    );
    println!("  {}", "-".repeat(100).dimmed());

    for incident in incidents {
        let waste_type = incident
            .waste_type
            .map(|c| c.title())
            .unwrap_or_else(|| "-".to_string());
        let confidence = incident
            .confidence
            .map(|c| format!("{:.2}", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<36}  {:<19}  {:<13}  {:>5}  {}",
            incident.id,
            incident.reported_at,
            waste_type,
            confidence,
            super::truncate_chars(&incident.location, 30),
        );
    }
    println!();
}

pub fn display_incident_detail(incident: &Incident) {
    println!("\n{}", format!("=== Incident {} ===", incident.id).bold());
    println!("  Location:    {}", incident.location);
    if let (Some(lat), Some(lon)) = (incident.latitude, incident.longitude) {
        println!("  Coordinates: {:.5}, {:.5}", lat, lon);
    }
    println!("  Reported:    {}", incident.reported_at);
    println!("  Description: {}", incident.description);

    match (incident.waste_type, incident.confidence) {
        (Some(category), Some(confidence)) => {
            let basis = incident.basis.map(|b| b.as_str()).unwrap_or("unknown");
            println!(
                "  Waste type:  {} ({:.1}% via {})",
                category.title().bold(),
                confidence * 100.0,
                basis.dimmed()
            );
        }
        _ => println!("  Waste type:  {}", "not processed".dimmed()),
    }
    if !incident.keywords.is_empty() {
        println!("  Keywords:    {}", incident.keywords.join(", "));
    }
    if !incident.similar_ids.is_empty() {
        println!("  Similar:     {} incident(s)", incident.similar_ids.len());
        for id in &incident.similar_ids {
            println!("    {}", id.to_string().dimmed());
        }
    }
    println!(
        "  {}",
        format!("created {}  updated {}", incident.created_at, incident.updated_at).dimmed()
    );
}

/// Display ranked similar incidents. Each match carries its incident if it
/// could still be loaded.
pub fn display_similar(matches: &[(SimilarMatch, Option<Incident>)]) {
    if matches.is_empty() {
        println!("No similar incidents above the threshold.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Similar incidents ({}) ===", matches.len()).bold()
    );
    println!();
    for (i, (m, incident)) in matches.iter().enumerate() {
        let score = format!("{:.3}", m.score);
        let score = if m.score >= 0.9 {
            score.red().bold()
        } else {
            score.yellow()
        };
        match incident {
            Some(incident) => println!(
                "  {:>2}. [{}] {}  @ {}\n      {}",
                i + 1,
                score,
                m.id,
                incident.location,
                super::truncate_chars(&incident.description, 120).dimmed()
            ),
            None => println!("  {:>2}. [{}] {}", i + 1, score, m.id),
        }
    }
    println!();
}

pub fn display_statistics(stats: &SummaryStatistics) {
    println!("\n{}", "=== Incident statistics ===".bold());
    let start = stats.period.start_date.as_deref().unwrap_or("beginning");
    let end = stats.period.end_date.as_deref().unwrap_or("now");
    println!("  Period:          {} to {}", start, end);
    println!("  Total incidents: {}", stats.total_incidents);
    println!("  Last 7 days:     {}", stats.recent_incidents_7d);

    if !stats.category_distribution.is_empty() {
        println!("\n  By waste type:");
        let mut rows: Vec<(&String, &i64)> = stats.category_distribution.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (label, count) in rows {
            println!("    {:<14} {:>6}", title_case(label), count);
        }
    }

    if !stats.top_locations.is_empty() {
        println!("\n  Top locations:");
        for loc in &stats.top_locations {
            println!(
                "    {:<40} {:>6}",
                super::truncate_chars(&loc.location, 40),
                loc.count
            );
        }
    }
    println!();
}

pub fn display_time_series(points: &[TimeSeriesPoint], granularity: &str) {
    if points.is_empty() {
        println!("No incidents in range.");
        return;
    }
    println!("\n{}", format!("=== Incidents per {} ===", granularity).bold());
    let max = points.iter().map(|p| p.count).max().unwrap_or(1).max(1);
    for point in points {
        let width = ((point.count as f64 / max as f64) * 40.0).round() as usize;
        println!(
            "  {:<10} {:>5}  {}",
            point.period,
            point.count,
            "#".repeat(width).green()
        );
    }
    println!();
}

pub fn display_keywords(keywords: &[KeywordCount]) {
    if keywords.is_empty() {
        println!("No keywords extracted yet. Run `wastewatch reprocess` first.");
        return;
    }
    println!("\n{}", "=== Top keywords ===".bold());
    for (i, kw) in keywords.iter().enumerate() {
        println!("  {:>2}. {:<24} {:>5}", i + 1, kw.keyword, kw.count);
    }
    println!();
}

pub fn display_trend_report(report: &TrendReport) {
    println!(
        "\n{}",
        format!(
            "=== Trends: last {} days vs previous {} ({}) ===",
            report.period_days, report.period_days, report.analysis_date
        )
        .bold()
    );

    let s = &report.summary;
    println!(
        "  {} categories: {} up, {} down, {} stable, {} new",
        s.total_categories,
        s.trending_up.to_string().red(),
        s.trending_down.to_string().green(),
        s.stable,
        s.new.to_string().cyan(),
    );

    display_trend_group("Rising", &report.rising_trends, "↑".red());
    display_trend_group("Falling", &report.falling_trends, "↓".green());
    display_trend_group("New", &report.new_categories, "+".cyan());
    display_trend_group("Stable", &report.stable_trends, "=".dimmed());

    if !report.spikes.is_empty() {
        println!("\n  Daily spikes:");
        for spike in &report.spikes {
            println!(
                "    {}  {} incidents (mean {:.1}, threshold {:.1})  {}",
                spike.date,
                spike.count,
                spike.mean,
                spike.threshold,
                colorize_severity(spike.severity)
            );
        }
    }
    println!();
}

fn display_trend_group(title: &str, records: &[TrendRecord], marker: colored::ColoredString) {
    if records.is_empty() {
        return;
    }
    println!("\n  {}:", title);
    for r in records {
        let change = r
            .change_percentage
            .map(|p| format!("{:+.1}%", p))
            .unwrap_or_else(|| "new".to_string());
        println!(
            "    {} {:<14} {:>4} -> {:<4} {:>8}  {}",
            marker,
            title_case(&r.category),
            r.previous_count,
            r.current_count,
            change,
            colorize_severity(r.severity)
        );
    }
}

pub fn display_anomalies(anomalies: &[Anomaly]) {
    if anomalies.is_empty() {
        println!("No location hotspots detected.");
        return;
    }
    println!(
        "\n{}",
        format!("=== Location hotspots ({}) ===", anomalies.len()).bold()
    );
    for a in anomalies {
        println!(
            "  {:<40} {:>5} incidents (mean {:.2}, threshold {:.2})  {}",
            super::truncate_chars(&a.location, 40),
            a.count,
            a.mean,
            a.threshold,
            colorize_severity(a.severity)
        );
    }
    println!();
}

pub fn display_summary(summary: &AdminSummary) {
    println!(
        "\n{}",
        format!("=== Summary: last {} days ===", summary.period_days).bold()
    );
    println!("  {}", summary.generated_at.dimmed());
    println!("\n  {}\n", summary.executive_summary);

    for insight in &summary.insights {
        let bullet = match insight.severity {
            InsightSeverity::Error => "!!".red().bold(),
            InsightSeverity::Warning => "!".yellow(),
            InsightSeverity::Success => "+".green(),
            InsightSeverity::Info => "-".normal(),
        };
        println!("  {} {}", bullet, insight.text);
    }
    println!();
}

fn colorize_severity(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::High => severity.as_str().red().bold(),
        Severity::Medium => severity.as_str().yellow(),
        Severity::Low => severity.as_str().dimmed(),
    }
}
