// Rule-based keyword scoring per waste category.
//
// For each category, every keyword found as a substring of the lower-cased
// text adds its word count to the score ("broken glass" adds 2). The sum is
// divided by the length of the keyword list so long lists don't dominate.
// Categories with no matches are left out entirely.

use super::category::WasteCategory;

/// A category's normalized keyword score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordScore {
    pub category: WasteCategory,
    pub score: f64,
}

/// Score `text` against every classifiable category.
///
/// Returns only categories with at least one match, in declaration order.
pub fn keyword_scores(text: &str) -> Vec<KeywordScore> {
    let lower = text.to_lowercase();

    WasteCategory::CLASSIFIABLE
        .iter()
        .filter_map(|&category| {
            let keywords = category.keywords();
            let mut matches = 0usize;
            let mut weight = 0usize;

            for kw in keywords {
                if lower.contains(kw) {
                    matches += 1;
                    weight += kw.split_whitespace().count();
                }
            }

            (matches > 0).then(|| KeywordScore {
                category,
                score: weight as f64 / keywords.len() as f64,
            })
        })
        .collect()
}

/// Score for one category, 0.0 if it had no matches.
pub fn score_for(scores: &[KeywordScore], category: WasteCategory) -> f64 {
    scores
        .iter()
        .find(|s| s.category == category)
        .map(|s| s.score)
        .unwrap_or(0.0)
}

/// Highest-scoring category. Ties keep the earlier category.
pub fn best_match(scores: &[KeywordScore]) -> Option<KeywordScore> {
    scores.iter().copied().fold(None, |best, s| match best {
        Some(b) if b.score >= s.score => Some(b),
        _ => Some(s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matches_is_empty() {
        assert!(keyword_scores("nothing relevant here").is_empty());
        assert!(keyword_scores("").is_empty());
    }

    #[test]
    fn test_single_keyword_normalized_by_list_length() {
        // "leather" matches only textile (11 keywords)
        let scores = keyword_scores("a leather jacket");
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].category, WasteCategory::Textile);
        assert!((scores[0].score - 1.0 / 11.0).abs() < 1e-10);
    }

    #[test]
    fn test_multi_word_keyword_counts_each_word() {
        // glass list has 9 entries: "glass" (1) + "broken glass" (2) = 3
        let scores = keyword_scores("Broken Glass");
        let glass = score_for(&scores, WasteCategory::Glass);
        assert!((glass - 3.0 / 9.0).abs() < 1e-10, "got {glass}");
    }

    #[test]
    fn test_substring_matching_is_case_insensitive() {
        let scores = keyword_scores("PLASTIC BOTTLES");
        assert!(score_for(&scores, WasteCategory::Plastic) > 0.0);
        // "bottle" is also a glass keyword
        assert!(score_for(&scores, WasteCategory::Glass) > 0.0);
    }

    #[test]
    fn test_score_for_missing_category_is_zero() {
        let scores = keyword_scores("plastic");
        assert_eq!(score_for(&scores, WasteCategory::Construction), 0.0);
    }

    #[test]
    fn test_best_match_ties_keep_declaration_order() {
        let scores = vec![
            KeywordScore {
                category: WasteCategory::Paper,
                score: 0.2,
            },
            KeywordScore {
                category: WasteCategory::Metal,
                score: 0.2,
            },
        ];
        assert_eq!(best_match(&scores).unwrap().category, WasteCategory::Paper);
    }

    #[test]
    fn test_best_match_empty() {
        assert!(best_match(&[]).is_none());
    }
}
