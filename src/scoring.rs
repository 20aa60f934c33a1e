//! Score combination for candidate devices

use crate::config::{RankingWeights, SimilarityWeights};
use crate::types::FeatureScore;

/// Cosine similarity for term vectors (assumes unit-normalized vectors)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn clamp_score(x: f32) -> f32 {
    x.clamp(0.0, 100.0)
}

/// Blend text (0-100) and normalized feature score (0-100).
///
/// When the subject declared no discrete features the feature channel has no
/// evidence to offer and the text score carries the whole similarity.
pub fn compute_similarity_score(
    text_score: f32,
    feature: &FeatureScore,
    weights: &SimilarityWeights,
) -> f32 {
    let combined = match feature.normalized {
        Some(feature_score) => weights.text * text_score + weights.feature * feature_score,
        None => text_score,
    };
    clamp_score(combined)
}

pub fn compute_final_score(
    similarity_score: f32,
    risk_score: f32,
    weights: &RankingWeights,
) -> f32 {
    clamp_score(weights.similarity * similarity_score + weights.risk * risk_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(normalized: Option<f32>) -> FeatureScore {
        FeatureScore {
            normalized,
            ..Default::default()
        }
    }

    #[test]
    fn similarity_uses_configured_split() {
        let score =
            compute_similarity_score(50.0, &feature(Some(100.0)), &SimilarityWeights::default());
        assert!((score - 70.0).abs() < 1e-4);
    }

    #[test]
    fn similarity_falls_back_to_text_without_declared_features() {
        let score = compute_similarity_score(80.0, &feature(None), &SimilarityWeights::default());
        assert_eq!(score, 80.0);
    }

    #[test]
    fn final_score_is_bounded() {
        let score = compute_final_score(100.0, 100.0, &RankingWeights::default());
        assert!(score <= 100.0);
        let score = compute_final_score(0.0, 0.0, &RankingWeights::default());
        assert_eq!(score, 0.0);
    }
}
