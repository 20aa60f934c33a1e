//! Minimal export contract for external renderers

use crate::types::RecommendationResult;
use serde::Serialize;

/// Pretty JSON with every score breakdown intact
pub fn to_json(result: &RecommendationResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// One flat row per recommendation for tabular output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub rank: usize,
    pub k_number: String,
    pub device_name: String,
    pub applicant: String,
    pub decision_date: String,
    pub text_score: f32,
    pub feature_points: f32,
    pub risk_score: f32,
    pub similarity_score: f32,
    pub final_score: f32,
}

pub fn summary_rows(result: &RecommendationResult) -> Vec<SummaryRow> {
    result
        .recommendations
        .iter()
        .map(|rec| SummaryRow {
            rank: rec.rank,
            k_number: rec.candidate.k_number.clone(),
            device_name: rec.candidate.device_name.clone(),
            applicant: rec.candidate.applicant.clone(),
            decision_date: rec.candidate.decision_date.clone(),
            text_score: rec.scores.text_score,
            feature_points: rec.scores.feature.raw_total,
            risk_score: rec.scores.risk.score,
            similarity_score: rec.scores.similarity_score,
            final_score: rec.scores.final_score,
        })
        .collect()
}
