// Unit tests for the classification engine against a deterministic encoder.
//
// Covers the reference-text property, determinism, confidence range, the
// keyword fallback when the encoder fails, and one-time initialization.

mod common;

use std::sync::Arc;

use common::{test_engine, HashingEncoder};
use wastewatch::classify::category::WasteCategory;
use wastewatch::classify::engine::{ClassificationBasis, ClassificationEngine, EngineCell};
use wastewatch::config::EngineSettings;
use wastewatch::embedding::traits::TextEncoder;
use wastewatch::error::EngineError;

// ============================================================
// Semantic path
// ============================================================

#[tokio::test]
async fn reference_text_classifies_as_its_own_category() {
    let (engine, _) = test_engine().await;
    for category in WasteCategory::CLASSIFIABLE {
        let out = engine.classify(category.reference_text()).await.unwrap();
        assert!(!out.is_degraded());
        let c = out.value();
        assert_eq!(c.category, category, "reference text for {category}");
        assert_eq!(c.basis, ClassificationBasis::Semantic);
        assert!(c.confidence >= 0.99, "{category}: {}", c.confidence);
    }
}

#[tokio::test]
async fn classification_is_deterministic() {
    let (engine, _) = test_engine().await;
    let text = "Pile of plastic bottles and bags dumped behind the school";
    let a = engine.classify(text).await.unwrap().into_value();
    let b = engine.classify(text).await.unwrap().into_value();
    assert_eq!(a, b);
}

#[tokio::test]
async fn confidence_stays_in_unit_range() {
    let (engine, _) = test_engine().await;
    let texts = [
        "",
        "asdf qwerty",
        "plastic plastic plastic bottle bag cup lid straw film wrapper",
        "Broken glass and beer bottles on the pavement",
        "Old laptop, phone chargers and a television",
    ];
    for text in texts {
        let c = engine.classify(text).await.unwrap().into_value();
        assert!(
            (0.0..=1.0).contains(&c.confidence),
            "{text:?} -> {}",
            c.confidence
        );
    }
}

#[tokio::test]
async fn weak_semantic_signal_defers_to_keywords() {
    let (engine, _) = test_engine().await;
    let c = engine
        .classify("plastic bottles and bags dumped near the river")
        .await
        .unwrap()
        .into_value();
    assert_eq!(c.category, WasteCategory::Plastic);
    assert_eq!(c.basis, ClassificationBasis::Keyword);
}

#[tokio::test]
async fn embed_has_engine_dimension() {
    let (engine, _) = test_engine().await;
    let v = engine.embed("rubble on the corner").await.unwrap();
    assert_eq!(v.len(), engine.dimension());
    assert_eq!(engine.model_id(), "test-hashing-encoder");
}

// ============================================================
// Encoder failure
// ============================================================

#[tokio::test]
async fn encoder_failure_degrades_to_keywords() {
    let (engine, encoder) = test_engine().await;
    encoder.set_failing(true);

    let out = engine
        .classify("broken glass bottles on the pavement")
        .await
        .unwrap();
    assert!(out.is_degraded());
    assert!(out.reason().unwrap().contains("encoding"));

    let c = out.value();
    assert_eq!(c.category, WasteCategory::Glass);
    assert_eq!(c.basis, ClassificationBasis::KeywordFallback);
    // glass + bottle + "broken glass" (2 words) over 9 keywords, doubled
    assert!((c.confidence - 0.89).abs() < 1e-9);
}

#[tokio::test]
async fn encoder_failure_without_keywords_is_unclassified() {
    let (engine, encoder) = test_engine().await;
    encoder.set_failing(true);

    let c = engine.classify("zzz qqq").await.unwrap().into_value();
    assert_eq!(c.category, WasteCategory::Unclassified);
    assert_eq!(c.confidence, 0.0);
}

#[tokio::test]
async fn encoder_failure_surfaces_from_embed() {
    let (engine, encoder) = test_engine().await;
    encoder.set_failing(true);
    let err = engine.embed("anything").await.unwrap_err();
    assert!(matches!(err, EngineError::Encoding(_)));
}

#[tokio::test]
async fn initialize_fails_when_encoder_is_down() {
    let encoder = Arc::new(HashingEncoder::new());
    encoder.set_failing(true);
    let result = ClassificationEngine::initialize(encoder, EngineSettings::default()).await;
    assert!(matches!(result, Err(EngineError::Encoding(_))));
}

// ============================================================
// EngineCell lifecycle
// ============================================================

#[tokio::test]
async fn cell_before_initialize_is_not_initialized() {
    let cell = EngineCell::new();
    assert!(!cell.is_initialized());
    assert!(matches!(
        cell.classify("plastic").await,
        Err(EngineError::NotInitialized)
    ));
    assert!(matches!(
        cell.embed("plastic").await,
        Err(EngineError::NotInitialized)
    ));
}

#[tokio::test]
async fn cell_initializes_once() {
    let cell = EngineCell::new();
    let encoder: Arc<dyn TextEncoder> = Arc::new(HashingEncoder::new());

    let (a, b) = tokio::join!(
        cell.initialize(Arc::clone(&encoder), EngineSettings::default()),
        cell.initialize(Arc::clone(&encoder), EngineSettings::default()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(cell.is_initialized());

    let c = cell.classify("old clothes and shoes").await.unwrap();
    assert!(!c.is_degraded());
}
