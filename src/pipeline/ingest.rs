// Incident processing: classify, extract keywords, embed, find duplicates,
// persist. Also the explicit reprocessing paths and audited edits.
//
// Editing an incident never recomputes its AI fields; only `reprocess` does.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::duplicates::rank_stored;
use crate::classify::engine::{Classification, ClassificationEngine};
use crate::db::models::{AiFields, Incident, IncidentUpdate, NewIncident};
use crate::db::IncidentStore;
use crate::error::{EngineError, EngineResult, Outcome};
use crate::similarity::{SimilarMatch, DEFAULT_LIMIT};
use crate::text::keywords::{KeywordExtractor, DEFAULT_TOP_N};

/// Everything computed for one incident's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedIncident {
    pub classification: Classification,
    pub keywords: Vec<String>,
    pub embedding: Vec<f64>,
}

/// Counts from a bulk reprocessing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReprocessSummary {
    pub processed: usize,
    pub degraded: usize,
    pub failed: usize,
}

pub struct IncidentPipeline {
    engine: Arc<ClassificationEngine>,
    store: Arc<dyn IncidentStore>,
    extractor: KeywordExtractor,
}

impl IncidentPipeline {
    pub fn new(engine: Arc<ClassificationEngine>, store: Arc<dyn IncidentStore>) -> Self {
        Self {
            engine,
            store,
            extractor: KeywordExtractor::new(),
        }
    }

    pub fn engine(&self) -> &ClassificationEngine {
        &self.engine
    }

    /// Classify the description, extract its keywords, and embed
    /// "{description} {location}".
    ///
    /// Classification may degrade to keyword-only; embedding failure is an
    /// error since there is no fallback vector.
    pub async fn process_incident(
        &self,
        description: &str,
        location: &str,
    ) -> EngineResult<Outcome<ProcessedIncident>> {
        let classification = self.engine.classify(description).await?;
        let keywords = self.extractor.extract(description, DEFAULT_TOP_N);
        let embedding = self
            .engine
            .embed(&format!("{description} {location}"))
            .await?;

        Ok(classification.map(|classification| ProcessedIncident {
            classification,
            keywords,
            embedding,
        }))
    }

    /// Process a new report, find its duplicates among stored incidents, and
    /// store it with all computed fields in one transaction.
    pub async fn ingest(&self, new: NewIncident) -> EngineResult<Outcome<Incident>> {
        let processed = self
            .process_incident(&new.description, &new.location)
            .await?;

        let similar = rank_stored(
            self.store.as_ref(),
            &processed.value().embedding,
            None,
            None,
            self.engine.settings().similarity_threshold,
            DEFAULT_LIMIT,
        )
        .await;

        let reason = join_reasons(&processed, &similar);
        let fields = to_fields(processed.into_value(), similar.into_value());

        let incident = match self.store.insert_processed(&new, &fields).await {
            Ok(incident) => incident,
            Err(e) => {
                audit("create", None, "failure");
                return Err(EngineError::Storage(e));
            }
        };

        audit("create", Some(incident.id), "success");
        info!(
            incident_id = %incident.id,
            location = %incident.location,
            waste_type = %fields.waste_type,
            confidence = fields.confidence,
            similar = fields.similar_ids.len(),
            "Incident created"
        );

        Ok(with_reason(incident, reason))
    }

    /// Recompute every AI field for one stored incident.
    pub async fn reprocess(&self, id: Uuid) -> EngineResult<Outcome<Incident>> {
        let incident = self
            .store
            .get_incident(id)
            .await
            .map_err(EngineError::Storage)?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;

        let processed = self
            .process_incident(&incident.description, &incident.location)
            .await?;
        let similar = rank_stored(
            self.store.as_ref(),
            &processed.value().embedding,
            Some(id),
            None,
            self.engine.settings().similarity_threshold,
            DEFAULT_LIMIT,
        )
        .await;

        let reason = join_reasons(&processed, &similar);
        let fields = to_fields(processed.into_value(), similar.into_value());

        let saved = self
            .store
            .save_ai_fields(id, &fields)
            .await
            .map_err(EngineError::Storage)?;
        if !saved {
            return Err(EngineError::NotFound(id.to_string()));
        }
        audit("reprocess", Some(id), "success");

        let updated = self
            .store
            .get_incident(id)
            .await
            .map_err(EngineError::Storage)?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        Ok(with_reason(updated, reason))
    }

    /// Reprocess every stored incident, at most `concurrency` at a time.
    ///
    /// Per-incident failures are logged and counted; an uninitialized engine
    /// aborts the run.
    pub async fn reprocess_all(&self, concurrency: usize) -> EngineResult<ReprocessSummary> {
        let ids = self
            .store
            .list_incident_ids()
            .await
            .map_err(EngineError::Storage)?;

        info!(count = ids.len(), concurrency, "Reprocessing incidents");

        let pb = ProgressBar::new(ids.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Reprocessing [{bar:30}] {pos}/{len} ({eta})")
                .expect("valid template"),
        );

        let results: Vec<(Uuid, EngineResult<Outcome<Incident>>)> = stream::iter(ids)
            .map(|id| async move { (id, self.reprocess(id).await) })
            .buffer_unordered(concurrency.max(1))
            .inspect(|_| pb.inc(1))
            .collect()
            .await;
        pb.finish_and_clear();

        let mut summary = ReprocessSummary::default();
        for (id, result) in results {
            match result {
                Ok(outcome) => {
                    summary.processed += 1;
                    if outcome.is_degraded() {
                        summary.degraded += 1;
                    }
                }
                Err(EngineError::NotInitialized) => return Err(EngineError::NotInitialized),
                Err(e) => {
                    warn!(incident_id = %id, error = %e, "Failed to reprocess incident, skipping");
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            degraded = summary.degraded,
            failed = summary.failed,
            "Reprocessing complete"
        );
        Ok(summary)
    }
}

/// Edit description/location/coordinates without recomputing AI fields.
pub async fn update_incident(
    store: &dyn IncidentStore,
    id: Uuid,
    update: &IncidentUpdate,
) -> EngineResult<Incident> {
    let updated = store
        .update_incident(id, update)
        .await
        .map_err(EngineError::Storage)?
        .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
    audit("update", Some(id), "success");
    Ok(updated)
}

pub async fn delete_incident(store: &dyn IncidentStore, id: Uuid) -> EngineResult<()> {
    let deleted = store
        .delete_incident(id)
        .await
        .map_err(EngineError::Storage)?;
    if !deleted {
        return Err(EngineError::NotFound(id.to_string()));
    }
    audit("delete", Some(id), "success");
    Ok(())
}

fn to_fields(processed: ProcessedIncident, similar: Vec<SimilarMatch>) -> AiFields {
    AiFields {
        waste_type: processed.classification.category,
        confidence: processed.classification.confidence,
        basis: processed.classification.basis,
        keywords: processed.keywords,
        embedding: processed.embedding,
        similar_ids: similar.into_iter().map(|m| m.id).collect(),
    }
}

fn join_reasons<A, B>(a: &Outcome<A>, b: &Outcome<B>) -> Option<String> {
    let reasons: Vec<&str> = [a.reason(), b.reason()].into_iter().flatten().collect();
    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("; "))
    }
}

fn with_reason<T>(value: T, reason: Option<String>) -> Outcome<T> {
    match reason {
        Some(reason) => Outcome::degraded(value, reason),
        None => Outcome::Complete(value),
    }
}

/// Structured audit event for a write.
fn audit(action: &str, id: Option<Uuid>, status: &str) {
    let resource_id = id.map(|id| id.to_string()).unwrap_or_default();
    info!(
        target: "audit",
        action,
        resource = "incident",
        resource_id = %resource_id,
        status,
        "audit_event"
    );
}
