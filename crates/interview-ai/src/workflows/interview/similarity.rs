use std::collections::HashMap;

/// Bounded semantic-similarity contract: symmetric, returns a score in
/// `[0, 100]`. Implementations must be side-effect free so the instant
/// scoring phase stays deterministic.
pub trait SemanticSimilarity: Send + Sync {
    fn score(&self, left: &str, right: &str) -> f64;
}

/// Cosine similarity over lowercase token-frequency vectors.
///
/// Stands in for an embedding model while honoring the same contract; a
/// vector-backed implementation can replace it behind the trait.
#[derive(Debug, Default, Clone)]
pub struct LexicalSimilarity;

impl LexicalSimilarity {
    fn term_frequencies(text: &str) -> HashMap<String, f64> {
        let mut frequencies = HashMap::new();
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            *frequencies.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
        }
        frequencies
    }
}

impl SemanticSimilarity for LexicalSimilarity {
    fn score(&self, left: &str, right: &str) -> f64 {
        let left_tf = Self::term_frequencies(left);
        let right_tf = Self::term_frequencies(right);
        if left_tf.is_empty() || right_tf.is_empty() {
            return 0.0;
        }

        let dot: f64 = left_tf
            .iter()
            .filter_map(|(token, weight)| right_tf.get(token).map(|other| weight * other))
            .sum();
        let left_norm: f64 = left_tf.values().map(|w| w * w).sum::<f64>().sqrt();
        let right_norm: f64 = right_tf.values().map(|w| w * w).sum::<f64>().sqrt();

        if left_norm == 0.0 || right_norm == 0.0 {
            return 0.0;
        }

        ((dot / (left_norm * right_norm)) * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_score_full_similarity() {
        let similarity = LexicalSimilarity;
        let text = "Indexes speed up reads at the cost of slower writes.";
        assert!((similarity.score(text, text) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_texts_score_zero() {
        let similarity = LexicalSimilarity;
        assert_eq!(similarity.score("alpha beta gamma", "delta epsilon"), 0.0);
    }

    #[test]
    fn score_is_symmetric() {
        let similarity = LexicalSimilarity;
        let left = "Caching reduces database load for repeated queries";
        let right = "A cache keeps repeated queries away from the database";
        assert!((similarity.score(left, right) - similarity.score(right, left)).abs() < 1e-9);
    }

    #[test]
    fn empty_input_scores_zero() {
        let similarity = LexicalSimilarity;
        assert_eq!(similarity.score("", "anything"), 0.0);
        assert_eq!(similarity.score("anything", "   "), 0.0);
    }

    #[test]
    fn overlap_scores_between_bounds() {
        let similarity = LexicalSimilarity;
        let score = similarity.score(
            "Transactions guarantee atomicity and isolation",
            "Isolation levels trade consistency for throughput",
        );
        assert!(score > 0.0 && score < 100.0);
    }
}
