// Classification engine: semantic/keyword arbitration.
//
// Stage 1 embeds the text and compares it against each category's reference
// embedding (computed once, at initialization). Stage 2 scores the text
// against each category's keyword list. The arbitration rules decide which
// signal wins and how much the other one adds:
//
//   semantic >= trust threshold  -> semantic winner, + keyword score * boost
//   else any keyword match       -> keyword winner (score * multiplier),
//                                   + semantic * agreement boost if both agree
//   else                         -> semantic winner at its raw score
//
// If the encoder fails, classification degrades to keyword-only scoring.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::category::WasteCategory;
use super::keywords::{self, KeywordScore};
use crate::config::EngineSettings;
use crate::embedding::similarity::cosine_similarity;
use crate::embedding::traits::TextEncoder;
use crate::error::{EngineError, EngineResult, Outcome};

/// Which arbitration rule produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationBasis {
    /// Semantic score cleared the trust threshold
    Semantic,
    /// Semantic score was weak; the keyword winner was used
    Keyword,
    /// Neither signal was strong; the semantic winner passed through as-is
    LowConfidence,
    /// The encoder was unavailable; keyword scoring only
    KeywordFallback,
}

impl ClassificationBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationBasis::Semantic => "semantic",
            ClassificationBasis::Keyword => "keyword",
            ClassificationBasis::LowConfidence => "low_confidence",
            ClassificationBasis::KeywordFallback => "keyword_fallback",
        }
    }

    /// Inverse of `as_str`. Unknown labels yield None.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "semantic" => Some(ClassificationBasis::Semantic),
            "keyword" => Some(ClassificationBasis::Keyword),
            "low_confidence" => Some(ClassificationBasis::LowConfidence),
            "keyword_fallback" => Some(ClassificationBasis::KeywordFallback),
            _ => None,
        }
    }
}

/// A category label with a confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: WasteCategory,
    pub confidence: f64,
    pub basis: ClassificationBasis,
}

/// Best semantic match for a text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticMatch {
    pub category: WasteCategory,
    pub score: f64,
}

/// Immutable engine handle: the encoder plus the cached reference embeddings.
///
/// Construct once with `initialize` and share behind an Arc. Every method
/// takes &self and touches no shared mutable state.
pub struct ClassificationEngine {
    encoder: Arc<dyn TextEncoder>,
    references: Vec<(WasteCategory, Vec<f64>)>,
    settings: EngineSettings,
}

impl ClassificationEngine {
    /// Encode every category's reference description and build the handle.
    pub async fn initialize(
        encoder: Arc<dyn TextEncoder>,
        settings: EngineSettings,
    ) -> EngineResult<Self> {
        info!(
            model = encoder.model_id(),
            "Pre-computing waste category reference embeddings"
        );

        let texts: Vec<String> = WasteCategory::CLASSIFIABLE
            .iter()
            .map(|c| c.reference_text().to_string())
            .collect();

        let vectors = encoder
            .encode_batch(&texts)
            .await
            .map_err(EngineError::Encoding)?;

        if vectors.len() != texts.len() {
            return Err(EngineError::Encoding(anyhow::anyhow!(
                "encoder returned {} vectors for {} reference texts",
                vectors.len(),
                texts.len()
            )));
        }

        let dim = encoder.dimension();
        for v in &vectors {
            if v.len() != dim {
                return Err(EngineError::DimensionMismatch {
                    expected: dim,
                    actual: v.len(),
                });
            }
        }

        let references: Vec<(WasteCategory, Vec<f64>)> = WasteCategory::CLASSIFIABLE
            .iter()
            .copied()
            .zip(vectors)
            .collect();

        info!(
            categories = references.len(),
            dim = dim,
            "Reference embeddings ready"
        );

        Ok(Self {
            encoder,
            references,
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn model_id(&self) -> &str {
        self.encoder.model_id()
    }

    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    /// Classify a free-text description.
    ///
    /// Returns `Degraded` when the encoder failed and keyword-only scoring was
    /// used instead.
    pub async fn classify(&self, text: &str) -> EngineResult<Outcome<Classification>> {
        let semantic = match self.embed(text).await {
            Ok(embedding) => self.semantic_match(&embedding),
            Err(e) => Err(e),
        };

        match semantic {
            Ok(semantic) => {
                let scores = keywords::keyword_scores(text);
                Ok(Outcome::Complete(arbitrate(semantic, &scores, &self.settings)))
            }
            Err(EngineError::NotInitialized) => Err(EngineError::NotInitialized),
            Err(e) => {
                warn!(error = %e, "Semantic classification failed, using keyword fallback");
                Ok(Outcome::degraded(
                    classify_by_keywords(text, &self.settings),
                    e.to_string(),
                ))
            }
        }
    }

    /// Encode text into a vector of the engine's fixed dimension.
    ///
    /// There is no fallback embedding; callers must surface the error.
    pub async fn embed(&self, text: &str) -> EngineResult<Vec<f64>> {
        let vector = self
            .encoder
            .encode(text)
            .await
            .map_err(EngineError::Encoding)?;

        let dim = self.encoder.dimension();
        if vector.len() != dim {
            return Err(EngineError::DimensionMismatch {
                expected: dim,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Arg-max cosine similarity against the reference embeddings.
    /// Ties keep the earlier category.
    pub fn semantic_match(&self, embedding: &[f64]) -> EngineResult<SemanticMatch> {
        let mut best: Option<SemanticMatch> = None;
        for (category, reference) in &self.references {
            let score = cosine_similarity(embedding, reference)?;
            if best.is_none_or(|b| score > b.score) {
                best = Some(SemanticMatch {
                    category: *category,
                    score,
                });
            }
        }
        best.ok_or(EngineError::NotInitialized)
    }
}

/// Apply the arbitration rules to a semantic match and keyword scores.
pub fn arbitrate(
    semantic: SemanticMatch,
    scores: &[KeywordScore],
    settings: &EngineSettings,
) -> Classification {
    if semantic.score >= settings.semantic_trust_threshold {
        let boost = keywords::score_for(scores, semantic.category) * settings.keyword_boost_weight;
        let confidence = (semantic.score + boost).min(1.0);

        debug!(
            category = %semantic.category,
            semantic_conf = semantic.score,
            keyword_boost = boost,
            final_conf = confidence,
            "Classification (semantic primary)"
        );

        return Classification {
            category: semantic.category,
            confidence: finalize_confidence(confidence),
            basis: ClassificationBasis::Semantic,
        };
    }

    if let Some(best) = keywords::best_match(scores) {
        let keyword_conf = (best.score * settings.keyword_multiplier).min(1.0);
        let confidence = if best.category == semantic.category {
            (keyword_conf + semantic.score * settings.agreement_boost_weight).min(1.0)
        } else {
            keyword_conf
        };

        debug!(
            category = %best.category,
            keyword_conf = keyword_conf,
            semantic_conf = semantic.score,
            final_conf = confidence,
            "Classification (keyword primary)"
        );

        return Classification {
            category: best.category,
            confidence: finalize_confidence(confidence),
            basis: ClassificationBasis::Keyword,
        };
    }

    debug!(
        category = %semantic.category,
        semantic_conf = semantic.score,
        "Classification (low confidence)"
    );

    Classification {
        category: semantic.category,
        confidence: finalize_confidence(semantic.score),
        basis: ClassificationBasis::LowConfidence,
    }
}

/// Keyword-only classification, used when the encoder is unavailable.
///
/// Never fails: no matches yields `Unclassified` at 0.0.
pub fn classify_by_keywords(text: &str, settings: &EngineSettings) -> Classification {
    let scores = keywords::keyword_scores(text);

    let Some(best) = keywords::best_match(&scores) else {
        return Classification {
            category: WasteCategory::Unclassified,
            confidence: 0.0,
            basis: ClassificationBasis::KeywordFallback,
        };
    };

    let confidence = finalize_confidence((best.score * settings.keyword_multiplier).min(1.0));
    warn!(
        category = %best.category,
        confidence = confidence,
        "Using fallback keyword classification"
    );

    Classification {
        category: best.category,
        confidence,
        basis: ClassificationBasis::KeywordFallback,
    }
}

/// Round to 2 decimals and clamp to [0, 1].
fn finalize_confidence(raw: f64) -> f64 {
    ((raw * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

/// One-time initialization guard around the engine handle.
///
/// Concurrent `initialize` calls run the reference encoding exactly once;
/// later calls are no-ops that return the existing handle. Using the cell
/// before initialization fails with `NotInitialized`.
#[derive(Default)]
pub struct EngineCell {
    cell: OnceCell<Arc<ClassificationEngine>>,
}

impl EngineCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    pub async fn initialize(
        &self,
        encoder: Arc<dyn TextEncoder>,
        settings: EngineSettings,
    ) -> EngineResult<Arc<ClassificationEngine>> {
        let engine = self
            .cell
            .get_or_try_init(|| async move {
                ClassificationEngine::initialize(encoder, settings)
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(engine))
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// The initialized handle, or `NotInitialized`.
    pub fn get(&self) -> EngineResult<Arc<ClassificationEngine>> {
        self.cell
            .get()
            .map(Arc::clone)
            .ok_or(EngineError::NotInitialized)
    }

    pub async fn classify(&self, text: &str) -> EngineResult<Outcome<Classification>> {
        self.get()?.classify(text).await
    }

    pub async fn embed(&self, text: &str) -> EngineResult<Vec<f64>> {
        self.get()?.embed(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sem(category: WasteCategory, score: f64) -> SemanticMatch {
        SemanticMatch { category, score }
    }

    fn kw(category: WasteCategory, score: f64) -> KeywordScore {
        KeywordScore { category, score }
    }

    #[test]
    fn test_trusted_semantic_without_keywords() {
        let c = arbitrate(sem(WasteCategory::Glass, 0.62), &[], &EngineSettings::default());
        assert_eq!(c.category, WasteCategory::Glass);
        assert!((c.confidence - 0.62).abs() < 1e-10);
        assert_eq!(c.basis, ClassificationBasis::Semantic);
    }

    #[test]
    fn test_trusted_semantic_gets_keyword_boost() {
        // 0.60 + 0.5 * 0.2 = 0.70
        let scores = vec![kw(WasteCategory::Metal, 0.5)];
        let c = arbitrate(sem(WasteCategory::Metal, 0.60), &scores, &EngineSettings::default());
        assert!((c.confidence - 0.70).abs() < 1e-10, "got {}", c.confidence);
    }

    #[test]
    fn test_trusted_semantic_ignores_other_category_keywords() {
        let scores = vec![kw(WasteCategory::Paper, 0.9)];
        let c = arbitrate(sem(WasteCategory::Metal, 0.55), &scores, &EngineSettings::default());
        assert_eq!(c.category, WasteCategory::Metal);
        assert!((c.confidence - 0.55).abs() < 1e-10);
    }

    #[test]
    fn test_trust_threshold_is_inclusive() {
        let scores = vec![kw(WasteCategory::Glass, 0.4)];
        let c = arbitrate(sem(WasteCategory::Paper, 0.50), &scores, &EngineSettings::default());
        assert_eq!(c.basis, ClassificationBasis::Semantic);
        assert_eq!(c.category, WasteCategory::Paper);
    }

    #[test]
    fn test_semantic_boost_caps_at_one() {
        let scores = vec![kw(WasteCategory::Glass, 1.0)];
        let c = arbitrate(sem(WasteCategory::Glass, 0.95), &scores, &EngineSettings::default());
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn test_keyword_rescue_disagreeing() {
        // 0.3 * 2 = 0.6, semantic winner differs so no agreement boost
        let scores = vec![kw(WasteCategory::Textile, 0.3)];
        let c = arbitrate(sem(WasteCategory::Mixed, 0.40), &scores, &EngineSettings::default());
        assert_eq!(c.category, WasteCategory::Textile);
        assert!((c.confidence - 0.6).abs() < 1e-10);
        assert_eq!(c.basis, ClassificationBasis::Keyword);
    }

    #[test]
    fn test_keyword_rescue_agreeing_adds_semantic() {
        // 0.1 * 2 = 0.2, + 0.4 * 0.3 = 0.12 -> 0.32
        let scores = vec![kw(WasteCategory::Textile, 0.1)];
        let c = arbitrate(sem(WasteCategory::Textile, 0.40), &scores, &EngineSettings::default());
        assert!((c.confidence - 0.32).abs() < 1e-10, "got {}", c.confidence);
    }

    #[test]
    fn test_keyword_confidence_caps_at_one() {
        let scores = vec![kw(WasteCategory::Organic, 0.8)];
        let c = arbitrate(sem(WasteCategory::Organic, 0.45), &scores, &EngineSettings::default());
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn test_low_confidence_pass_through() {
        let c = arbitrate(sem(WasteCategory::Hazardous, 0.234), &[], &EngineSettings::default());
        assert_eq!(c.category, WasteCategory::Hazardous);
        assert!((c.confidence - 0.23).abs() < 1e-10);
        assert_eq!(c.basis, ClassificationBasis::LowConfidence);
    }

    #[test]
    fn test_negative_semantic_score_clamps_to_zero() {
        let c = arbitrate(sem(WasteCategory::Paper, -0.2), &[], &EngineSettings::default());
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn test_keyword_only_no_matches_is_unclassified() {
        let c = classify_by_keywords("zzz qqq", &EngineSettings::default());
        assert_eq!(c.category, WasteCategory::Unclassified);
        assert_eq!(c.confidence, 0.0);
        assert_eq!(c.basis, ClassificationBasis::KeywordFallback);
    }

    #[test]
    fn test_keyword_only_uses_multiplier() {
        // textile: "leather" -> 1/11 * 2 = 0.1818 -> 0.18
        let c = classify_by_keywords("leather", &EngineSettings::default());
        assert_eq!(c.category, WasteCategory::Textile);
        assert!((c.confidence - 0.18).abs() < 1e-10);
    }

    #[test]
    fn test_custom_settings_change_trust_threshold() {
        let settings = EngineSettings {
            semantic_trust_threshold: 0.3,
            ..EngineSettings::default()
        };
        let scores = vec![kw(WasteCategory::Paper, 0.5)];
        let c = arbitrate(sem(WasteCategory::Glass, 0.35), &scores, &settings);
        assert_eq!(c.category, WasteCategory::Glass);
        assert_eq!(c.basis, ClassificationBasis::Semantic);
    }

    #[test]
    fn test_uninitialized_cell_reports_not_initialized() {
        let cell = EngineCell::new();
        assert!(!cell.is_initialized());
        assert!(matches!(cell.get(), Err(EngineError::NotInitialized)));
    }
}
