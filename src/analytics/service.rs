// AnalyticsService: wires the pure analytics functions to the incident store.
//
// Every method has an `_at` variant taking the reference instant, so windows
// are reproducible in tests; the plain variants use the current time.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::anomaly::{self, Anomaly};
use super::stats::{
    self, DatedCount, Granularity, KeywordCount, Period, SummaryStatistics, TimeSeriesPoint,
};
use super::summary::{self, AdminSummary};
use super::trends::{self, SpikeRecord, TrendReport};
use crate::config::EngineSettings;
use crate::db::models::{
    days_before, format_timestamp, CountDimension, LocationPoint, TimeWindow,
};
use crate::db::IncidentStore;
use crate::error::{EngineError, EngineResult};

/// Keyword frequency limit used by the narrative summary.
const SUMMARY_KEYWORD_LIMIT: usize = 10;

pub struct AnalyticsService {
    store: Arc<dyn IncidentStore>,
    settings: EngineSettings,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn IncidentStore>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Totals, category distribution and top locations within `window`.
    pub async fn summary_statistics(&self, window: TimeWindow) -> EngineResult<SummaryStatistics> {
        self.summary_statistics_at(window, Utc::now()).await
    }

    pub async fn summary_statistics_at(
        &self,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> EngineResult<SummaryStatistics> {
        let total = self
            .store
            .count_incidents(window)
            .await
            .map_err(EngineError::Storage)?;
        let recent = self
            .store
            .count_incidents(TimeWindow::since_days(now, 7))
            .await
            .map_err(EngineError::Storage)?;
        let distribution = self
            .store
            .fetch_counts_by(CountDimension::Category, window)
            .await
            .map_err(EngineError::Storage)?;
        let locations = self
            .store
            .fetch_counts_by(CountDimension::Location, window)
            .await
            .map_err(EngineError::Storage)?;

        Ok(SummaryStatistics {
            total_incidents: total,
            recent_incidents_7d: recent,
            category_distribution: distribution,
            top_locations: stats::top_locations(&locations, stats::TOP_LOCATIONS),
            period: Period {
                start_date: window.start.as_ref().map(format_timestamp),
                end_date: window.end.as_ref().map(format_timestamp),
            },
        })
    }

    /// Incident counts over the last `days`, bucketed by `granularity`.
    pub async fn time_series(
        &self,
        days: u32,
        granularity: Granularity,
    ) -> EngineResult<Vec<TimeSeriesPoint>> {
        self.time_series_at(days, granularity, Utc::now()).await
    }

    pub async fn time_series_at(
        &self,
        days: u32,
        granularity: Granularity,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<TimeSeriesPoint>> {
        let window = TimeWindow::since_days(now, days as i64);
        let buckets = self
            .store
            .fetch_counts_by(granularity.dimension(), window)
            .await
            .map_err(EngineError::Storage)?;
        Ok(stats::time_series_points(buckets))
    }

    /// Per-category daily series over the last `days`.
    pub async fn category_trends(
        &self,
        days: u32,
    ) -> EngineResult<BTreeMap<String, Vec<DatedCount>>> {
        self.category_trends_at(days, Utc::now()).await
    }

    pub async fn category_trends_at(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> EngineResult<BTreeMap<String, Vec<DatedCount>>> {
        let window = TimeWindow::since_days(now, days as i64);
        let rows = self
            .store
            .fetch_daily_category_counts(window)
            .await
            .map_err(EngineError::Storage)?;
        Ok(stats::category_series(rows))
    }

    pub async fn location_heatmap(&self, window: TimeWindow) -> EngineResult<Vec<LocationPoint>> {
        self.store
            .fetch_location_points(window)
            .await
            .map_err(EngineError::Storage)
    }

    pub async fn keyword_frequency(&self, limit: usize) -> EngineResult<Vec<KeywordCount>> {
        let lists = self
            .store
            .fetch_keyword_lists()
            .await
            .map_err(EngineError::Storage)?;
        Ok(stats::keyword_frequency(&lists, limit))
    }

    /// Compare the last `days` against the `days` before them, plus daily spikes.
    pub async fn analyze_trends(&self, days: u32) -> EngineResult<TrendReport> {
        self.analyze_trends_at(days, Utc::now()).await
    }

    pub async fn analyze_trends_at(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> EngineResult<TrendReport> {
        let current_window = TimeWindow::last_days(now, days as i64);
        let current = self
            .store
            .fetch_counts_by(CountDimension::Category, current_window)
            .await
            .map_err(EngineError::Storage)?;

        // A current window that already reaches back to the beginning leaves
        // nothing before it to compare against.
        let previous = match current_window.start {
            Some(current_start) => {
                let previous_window = match days_before(current_start, days as i64) {
                    Some(previous_start) => TimeWindow::half_open(previous_start, current_start),
                    None => TimeWindow::before(current_start),
                };
                self.store
                    .fetch_counts_by(CountDimension::Category, previous_window)
                    .await
                    .map_err(EngineError::Storage)?
            }
            None => BTreeMap::new(),
        };

        let breakdown = trends::classify_trends(&current, &previous, &self.settings);
        let spikes = self.detect_spikes_at(now).await?;

        let report = TrendReport::new(days, format_timestamp(&now), breakdown, spikes);
        info!(
            rising = report.summary.trending_up,
            falling = report.summary.trending_down,
            stable = report.summary.stable,
            new = report.summary.new,
            spikes = report.spikes.len(),
            "Trend analysis completed"
        );
        Ok(report)
    }

    /// Daily spikes over the last `spike_days` days.
    pub async fn detect_spikes_at(&self, now: DateTime<Utc>) -> EngineResult<Vec<SpikeRecord>> {
        let window = TimeWindow::since_days(now, self.settings.spike_days);
        let daily: Vec<(String, i64)> = self
            .store
            .fetch_counts_by(CountDimension::Day, window)
            .await
            .map_err(EngineError::Storage)?
            .into_iter()
            .collect();
        Ok(trends::detect_spikes(
            &daily,
            self.settings.spike_k,
            self.settings.spike_high_k,
        ))
    }

    /// Location hotspots over all incidents.
    pub async fn detect_anomalies(&self, multiplier: f64) -> EngineResult<Vec<Anomaly>> {
        let counts = self
            .store
            .fetch_counts_by(CountDimension::Location, TimeWindow::all())
            .await
            .map_err(EngineError::Storage)?;
        let anomalies = anomaly::detect_anomalies(
            &counts,
            multiplier,
            self.settings.anomaly_severity_multiplier,
        );
        info!(count = anomalies.len(), "Detected anomalous locations");
        Ok(anomalies)
    }

    /// Templated insights and executive summary for the last `days`.
    pub async fn generate_summary(&self, days: u32) -> EngineResult<AdminSummary> {
        self.generate_summary_at(days, Utc::now()).await
    }

    pub async fn generate_summary_at(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> EngineResult<AdminSummary> {
        let window = TimeWindow::last_days(now, days as i64);
        let statistics = self.summary_statistics_at(window, now).await?;
        let trends = self.analyze_trends_at(days, now).await?;
        let anomalies = self.detect_anomalies(anomaly::DEFAULT_MULTIPLIER).await?;
        let keywords = self.keyword_frequency(SUMMARY_KEYWORD_LIMIT).await?;

        let insights = summary::build_insights(days, &statistics, &trends, &anomalies, &keywords);
        let executive_summary = summary::executive_summary(days, &statistics, &trends, &anomalies);

        info!(insights = insights.len(), "Generated admin summary");

        Ok(AdminSummary {
            generated_at: format_timestamp(&now),
            period_days: days,
            executive_summary,
            insights,
            statistics,
            trends,
            anomalies,
        })
    }
}
