//! Core PredicateEngine: filter, score and rank candidate predicates

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::features::{score_features, SubjectFeatures};
use crate::filter::{apply_filters, HardFilters};
use crate::risk::score_risk;
use crate::scoring::{clamp_score, compute_final_score, compute_similarity_score};
use crate::selection::{select_top, ScoredCandidate};
use crate::text::batch_similarity;
use crate::types::*;
use chrono::{Local, NaiveDate, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stateless apart from its validated configuration
#[derive(Debug, Clone)]
pub struct PredicateEngine {
    config: EngineConfig,
}

impl PredicateEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rank against today's date using the configured shortlist size
    pub fn recommend(
        &self,
        subject: &SubjectDeviceProfile,
        candidates: &[CandidateDevice],
    ) -> RecommendationResult {
        let as_of = Local::now().date_naive();
        self.rank(subject, candidates, self.config.top_n, as_of)
    }

    /// Main entry point: filter, score and rank `candidates` for `subject`
    pub fn recommend_as_of(
        &self,
        subject: &SubjectDeviceProfile,
        candidates: &[CandidateDevice],
        top_n: usize,
        as_of: NaiveDate,
    ) -> Result<RecommendationResult, ConfigError> {
        if top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }
        Ok(self.rank(subject, candidates, top_n, as_of))
    }

    fn rank(
        &self,
        subject: &SubjectDeviceProfile,
        candidates: &[CandidateDevice],
        top_n: usize,
        as_of: NaiveDate,
    ) -> RecommendationResult {
        let start = Instant::now();

        info!(
            "Ranking predicates: code='{}', pool={}, top_n={}, as_of={}",
            subject.classification_code,
            candidates.len(),
            top_n,
            as_of
        );

        // Step 1: Mandatory eligibility filter
        let filters = HardFilters {
            max_age_years: self.config.max_age_years,
            as_of,
        };
        let filtered = apply_filters(subject, candidates, &filters);
        let mut warnings = filtered.warnings;
        let mut stats = PoolStats {
            total_searched: candidates.len(),
            after_filter: filtered.survivors.len(),
            scored: 0,
            excluded: filtered.excluded,
        };

        if filtered.survivors.is_empty() {
            let reason = format!(
                "no candidates survived filtering ({} searched for classification code '{}')",
                candidates.len(),
                subject.classification_code
            );
            info!("{}", reason);
            return self.finish(Vec::new(), stats, warnings, Some(reason), as_of);
        }

        // Step 2: One shared vectorization pass over the whole batch
        let text_scores = self.text_scores(subject, &filtered.survivors, &mut warnings);

        // Step 3: Per-candidate feature and risk scores
        let subject_features = SubjectFeatures::from_profile(subject);
        let scored: Vec<ScoredCandidate> = filtered
            .survivors
            .iter()
            .zip(text_scores)
            .map(|(cand, text_score)| {
                self.score_candidate(*cand, text_score, &subject_features, as_of)
            })
            .collect();
        stats.scored = scored.len();

        // Step 4: Rank and cut
        let recommendations = select_top(scored, top_n);

        info!(
            "Ranking complete: {} of {} survivors recommended in {}ms ({} warnings)",
            recommendations.len(),
            stats.after_filter,
            start.elapsed().as_millis(),
            warnings.len()
        );

        self.finish(recommendations, stats, warnings, None, as_of)
    }

    /// Text similarity per survivor on a 0-100 scale; zeros if vectorization fails
    fn text_scores(
        &self,
        subject: &SubjectDeviceProfile,
        survivors: &[&CandidateDevice],
        warnings: &mut Vec<EngineWarning>,
    ) -> Vec<f32> {
        let subject_text = subject.text();
        if subject_text.is_empty() {
            warn!("Subject has no intended use, description or indications text");
            warnings.push(EngineWarning::EmptySubjectText);
        }

        let candidate_texts: Vec<String> = survivors
            .iter()
            .map(|cand| {
                let text = cand.text();
                if text.is_empty() {
                    warnings.push(EngineWarning::MissingCandidateText {
                        k_number: cand.k_number.clone(),
                    });
                }
                text
            })
            .collect();

        match batch_similarity(&subject_text, &candidate_texts) {
            Ok(scores) => scores.into_iter().map(|s| clamp_score(s * 100.0)).collect(),
            Err(e) => {
                warn!("Text vectorization failed: {}. Using zero text similarity.", e);
                warnings.push(EngineWarning::VectorizationFailed {
                    reason: e.to_string(),
                });
                vec![0.0; survivors.len()]
            }
        }
    }

    fn score_candidate<'a>(
        &self,
        cand: &'a CandidateDevice,
        text_score: f32,
        subject_features: &SubjectFeatures,
        as_of: NaiveDate,
    ) -> ScoredCandidate<'a> {
        let feature = score_features(subject_features, &cand.text());
        let risk = score_risk(cand, as_of);
        let similarity_score =
            compute_similarity_score(text_score, &feature, &self.config.similarity_weights);
        let final_score =
            compute_final_score(similarity_score, risk.score, &self.config.ranking_weights);

        debug!(
            "  SCORE {}: text={:.1} feature={:.1}/{:.0} risk={:.1} final={:.1}",
            cand.k_number,
            text_score,
            feature.raw_total,
            feature.applicable_max,
            risk.score,
            final_score
        );

        ScoredCandidate {
            candidate: cand,
            scores: ScoreBreakdown {
                text_score,
                feature,
                risk,
                similarity_score,
                final_score,
            },
        }
    }

    fn finish(
        &self,
        recommendations: Vec<Recommendation>,
        stats: PoolStats,
        warnings: Vec<EngineWarning>,
        reason: Option<String>,
        as_of: NaiveDate,
    ) -> RecommendationResult {
        RecommendationResult {
            recommendations,
            stats,
            warnings,
            reason,
            generated_at: Utc::now(),
            evaluated_as_of: as_of,
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}
