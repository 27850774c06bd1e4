// Similar-incident lookups on top of the pure ranker.
//
// `similar_to_incident` reuses the stored embedding and needs no encoder.
// `similar_to_text` encodes the query first, so it needs the engine.

use tracing::warn;
use uuid::Uuid;

use crate::classify::engine::ClassificationEngine;
use crate::db::IncidentStore;
use crate::error::{EngineError, EngineResult, Outcome};
use crate::similarity::{find_similar, SimilarMatch};

/// Incidents similar to a stored one, excluding itself.
///
/// Fails with `NotFound` for an unknown id. An incident that was never
/// processed has no embedding and yields a clean empty result.
pub async fn similar_to_incident(
    store: &dyn IncidentStore,
    id: Uuid,
    threshold: Option<f64>,
    default_threshold: f64,
    limit: usize,
) -> EngineResult<Outcome<Vec<SimilarMatch>>> {
    let incident = store
        .get_incident(id)
        .await
        .map_err(EngineError::Storage)?
        .ok_or_else(|| EngineError::NotFound(id.to_string()))?;

    let Some(embedding) = incident.embedding.filter(|e| !e.is_empty()) else {
        return Ok(Outcome::Complete(Vec::new()));
    };

    Ok(rank_stored(store, &embedding, Some(id), threshold, default_threshold, limit).await)
}

/// Incidents similar to free text. Encoder failures surface as errors.
pub async fn similar_to_text(
    engine: &ClassificationEngine,
    store: &dyn IncidentStore,
    text: &str,
    threshold: Option<f64>,
    limit: usize,
) -> EngineResult<Outcome<Vec<SimilarMatch>>> {
    let embedding = engine.embed(text).await?;
    let default_threshold = engine.settings().similarity_threshold;
    Ok(rank_stored(store, &embedding, None, threshold, default_threshold, limit).await)
}

/// Fetch candidates and rank them. A storage failure degrades to empty.
pub(crate) async fn rank_stored(
    store: &dyn IncidentStore,
    query: &[f64],
    exclude_id: Option<Uuid>,
    threshold: Option<f64>,
    default_threshold: f64,
    limit: usize,
) -> Outcome<Vec<SimilarMatch>> {
    match store.fetch_candidates(exclude_id).await {
        Ok(candidates) => find_similar(
            query,
            &candidates,
            exclude_id,
            threshold,
            default_threshold,
            limit,
        ),
        Err(e) => {
            warn!(error = %e, "Failed to fetch similarity candidates");
            Outcome::degraded(Vec::new(), format!("storage: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::category::WasteCategory;
    use crate::classify::engine::ClassificationBasis;
    use crate::db::models::{AiFields, NewIncident};
    use crate::db::SqliteStore;

    async fn seeded(store: &SqliteStore, embedding: Vec<f64>) -> Uuid {
        let inc = store
            .insert_incident(&NewIncident::new("d", "x"))
            .await
            .unwrap();
        let fields = AiFields {
            waste_type: WasteCategory::Mixed,
            confidence: 0.5,
            basis: ClassificationBasis::LowConfidence,
            keywords: vec![],
            embedding,
            similar_ids: vec![],
        };
        store.save_ai_fields(inc.id, &fields).await.unwrap();
        inc.id
    }

    #[tokio::test]
    async fn test_unknown_incident_is_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let err = similar_to_incident(&store, Uuid::new_v4(), None, 0.75, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unprocessed_incident_has_no_matches() {
        let store = SqliteStore::in_memory().unwrap();
        let raw = store
            .insert_incident(&NewIncident::new("d", "x"))
            .await
            .unwrap();
        seeded(&store, vec![1.0, 0.0]).await;

        let out = similar_to_incident(&store, raw.id, Some(0.0), 0.75, 5)
            .await
            .unwrap();
        assert!(!out.is_degraded());
        assert!(out.value().is_empty());
    }

    #[tokio::test]
    async fn test_similar_to_incident_excludes_self() {
        let store = SqliteStore::in_memory().unwrap();
        let a = seeded(&store, vec![1.0, 0.0]).await;
        let b = seeded(&store, vec![0.9, 0.1]).await;
        let _c = seeded(&store, vec![0.0, 1.0]).await;

        let out = similar_to_incident(&store, a, None, 0.75, 5)
            .await
            .unwrap()
            .into_value();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, b);
    }
}
