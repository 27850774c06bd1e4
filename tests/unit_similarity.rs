// Unit tests for similar-incident ranking.
//
// Pure checks on find_similar plus the store-backed lookups in
// pipeline::duplicates against in-memory SQLite.

mod common;

use uuid::Uuid;

use common::test_engine;
use wastewatch::classify::category::WasteCategory;
use wastewatch::classify::engine::ClassificationBasis;
use wastewatch::db::models::{AiFields, Candidate, NewIncident};
use wastewatch::db::{IncidentStore, SqliteStore};
use wastewatch::pipeline::duplicates::{similar_to_incident, similar_to_text};
use wastewatch::similarity::find_similar;

fn candidate(embedding: Option<Vec<f64>>) -> Candidate {
    Candidate {
        id: Uuid::new_v4(),
        embedding,
    }
}

fn corpus() -> Vec<Candidate> {
    vec![
        candidate(Some(vec![1.0, 0.0, 0.0])),
        candidate(Some(vec![0.9, 0.1, 0.0])),
        candidate(Some(vec![0.7, 0.7, 0.0])),
        candidate(Some(vec![0.0, 1.0, 0.0])),
        candidate(Some(vec![-1.0, 0.0, 0.0])),
        candidate(None),
        candidate(Some(vec![])),
    ]
}

// ============================================================
// find_similar: pure ranking
// ============================================================

#[test]
fn raising_threshold_never_adds_matches() {
    let query = [1.0, 0.0, 0.0];
    let candidates = corpus();
    let mut previous = usize::MAX;
    for t in [-1.0, -0.5, 0.0, 0.5, 0.7, 0.9, 0.99, 1.0] {
        let n = find_similar(&query, &candidates, None, Some(t), 0.75, 100)
            .into_value()
            .len();
        assert!(n <= previous, "threshold {t} returned {n} > {previous}");
        previous = n;
    }
}

#[test]
fn results_are_sorted_and_above_threshold() {
    let query = [1.0, 0.0, 0.0];
    let out = find_similar(&query, &corpus(), None, Some(0.5), 0.75, 100).into_value();
    assert_eq!(out.len(), 3);
    assert!(out.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(out.iter().all(|m| m.score >= 0.5));
}

#[test]
fn default_threshold_applies_when_none_given() {
    let query = [1.0, 0.0, 0.0];
    let out = find_similar(&query, &corpus(), None, None, 0.75, 100).into_value();
    // 1.0 and ~0.994 clear 0.75; the 45-degree vector (~0.707) doesn't
    assert_eq!(out.len(), 2);
}

#[test]
fn limit_truncates_best_first() {
    let query = [1.0, 0.0, 0.0];
    let candidates = corpus();
    let out = find_similar(&query, &candidates, None, Some(-1.0), 0.75, 2).into_value();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].id, candidates[0].id);
    assert_eq!(out[1].id, candidates[1].id);
}

#[test]
fn empty_corpus_is_clean_empty() {
    let out = find_similar(&[1.0, 0.0], &[], None, None, 0.75, 5);
    assert!(!out.is_degraded());
    assert!(out.value().is_empty());
}

#[test]
fn dimension_mismatch_degrades_to_empty() {
    let candidates = vec![candidate(Some(vec![1.0, 0.0]))];
    let out = find_similar(&[1.0, 0.0, 0.0], &candidates, None, Some(0.0), 0.75, 5);
    assert!(out.is_degraded());
    assert!(out.value().is_empty());
}

// ============================================================
// Store-backed lookups
// ============================================================

async fn processed(store: &SqliteStore, embedding: Vec<f64>) -> Uuid {
    let inc = store
        .insert_incident(&NewIncident::new("desc", "loc"))
        .await
        .unwrap();
    let fields = AiFields {
        waste_type: WasteCategory::Plastic,
        confidence: 0.8,
        basis: ClassificationBasis::Semantic,
        keywords: vec!["plastic".into()],
        embedding,
        similar_ids: vec![],
    };
    assert!(store.save_ai_fields(inc.id, &fields).await.unwrap());
    inc.id
}

#[tokio::test]
async fn stored_lookup_ranks_neighbours() {
    let store = SqliteStore::in_memory().unwrap();
    let a = processed(&store, vec![1.0, 0.0, 0.0]).await;
    let b = processed(&store, vec![0.9, 0.1, 0.0]).await;
    let c = processed(&store, vec![0.8, 0.3, 0.0]).await;
    let _far = processed(&store, vec![0.0, 0.0, 1.0]).await;

    let out = similar_to_incident(&store, a, Some(0.5), 0.75, 5)
        .await
        .unwrap()
        .into_value();
    let ids: Vec<Uuid> = out.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![b, c]);
}

#[tokio::test]
async fn text_lookup_uses_engine_encoder() {
    let (engine, _) = test_engine().await;
    let store = SqliteStore::in_memory().unwrap();

    let near = engine
        .embed("plastic bottles dumped by the canal")
        .await
        .unwrap();
    let far = engine
        .embed("asbestos sheets left in the car park")
        .await
        .unwrap();
    let near_id = processed(&store, near).await;
    processed(&store, far).await;

    let out = similar_to_text(
        &engine,
        &store,
        "plastic bottles dumped by the canal",
        Some(0.9),
        5,
    )
    .await
    .unwrap()
    .into_value();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, near_id);
    assert!(out[0].score > 0.999);
}
