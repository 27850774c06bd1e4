// Similar / duplicate incident ranking.
//
// A full scan over the fetched candidates: every candidate with an embedding
// (other than the excluded id) is scored by cosine similarity against the
// query, filtered by the threshold, sorted and truncated. There is no vector
// index, so cost grows linearly with the number of stored incidents.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::Candidate;
use crate::embedding::similarity::cosine_similarity;
use crate::error::Outcome;

/// Default number of matches returned.
pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMatch {
    pub id: Uuid,
    pub score: f64,
}

/// Rank candidates by similarity to `query`.
///
/// `threshold` falls back to `default_threshold` when `None`. Empty corpus or
/// no qualifying candidates is a clean empty result. A malformed vector
/// (dimension mismatch) degrades the whole search to an empty result.
pub fn find_similar(
    query: &[f64],
    candidates: &[Candidate],
    exclude_id: Option<Uuid>,
    threshold: Option<f64>,
    default_threshold: f64,
    limit: usize,
) -> Outcome<Vec<SimilarMatch>> {
    let threshold = threshold.unwrap_or(default_threshold);
    let mut matches = Vec::new();

    for candidate in candidates {
        if Some(candidate.id) == exclude_id {
            continue;
        }
        let Some(embedding) = candidate.embedding.as_deref() else {
            continue;
        };
        if embedding.is_empty() {
            continue;
        }

        match cosine_similarity(query, embedding) {
            Ok(score) if score >= threshold => matches.push(SimilarMatch {
                id: candidate.id,
                score,
            }),
            Ok(_) => {}
            Err(e) => {
                warn!(candidate = %candidate.id, error = %e, "Similarity search failed");
                return Outcome::degraded(Vec::new(), e.to_string());
            }
        }
    }

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    matches.truncate(limit);

    info!(
        count = matches.len(),
        threshold = threshold,
        scanned = candidates.len(),
        "Similar incidents found"
    );

    Outcome::Complete(matches)
}
