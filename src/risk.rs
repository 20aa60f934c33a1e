//! Safety and regulatory risk score (0-100, higher is safer)

use crate::filter::age_in_years;
use crate::scoring::clamp_score;
use crate::types::*;
use chrono::NaiveDate;

const BASELINE: f32 = 100.0;
const AGE_PENALTY_START_YEARS: u32 = 10;
const AGE_PENALTY_PER_YEAR: f32 = 2.0;
const AGE_PENALTY_CAP: f32 = 15.0;

/// Adjustments are summed before a single clamp, so bonuses may push the
/// unclamped total past 100.
pub fn score_risk(cand: &CandidateDevice, as_of: NaiveDate) -> RiskScore {
    let mut adjustments = Vec::new();
    let mut push = |factor: RiskFactor, points: f32, notes: String| {
        adjustments.push(RiskAdjustment {
            factor,
            points,
            notes,
        });
    };

    match cand.recall_count {
        0 => push(RiskFactor::NoRecalls, 5.0, "no recalls on record".to_string()),
        1 => push(RiskFactor::SingleRecall, -15.0, "1 recall".to_string()),
        n => push(RiskFactor::MultipleRecalls, -30.0, format!("{n} recalls")),
    }

    match cand.adverse_event_trend {
        AdverseEventTrend::Excellent => push(
            RiskFactor::ExcellentAdverseEvents,
            10.0,
            "adverse event trend excellent".to_string(),
        ),
        AdverseEventTrend::Good => push(
            RiskFactor::GoodAdverseEvents,
            5.0,
            "adverse event trend good".to_string(),
        ),
        AdverseEventTrend::Concerning => push(
            RiskFactor::ConcerningAdverseEvents,
            -15.0,
            "adverse event trend concerning".to_string(),
        ),
        AdverseEventTrend::ExtremeOutlier => push(
            RiskFactor::ExtremeOutlierAdverseEvents,
            -25.0,
            "adverse event extreme outlier".to_string(),
        ),
        AdverseEventTrend::Average | AdverseEventTrend::Unknown => {}
    }

    match cand.clinical_data_history {
        ClinicalDataHistory::Yes => push(
            RiskFactor::ClinicalDataRequired,
            -20.0,
            "clinical data was required".to_string(),
        ),
        ClinicalDataHistory::Probable => push(
            RiskFactor::ClinicalDataProbable,
            -10.0,
            "clinical data probably required".to_string(),
        ),
        ClinicalDataHistory::No => push(
            RiskFactor::NoClinicalData,
            5.0,
            "cleared without clinical data".to_string(),
        ),
        ClinicalDataHistory::Unknown => {}
    }

    if let Some(cleared) = cand.clearance_date() {
        let age = age_in_years(cleared, as_of);
        if age > AGE_PENALTY_START_YEARS {
            let penalty = ((age - AGE_PENALTY_START_YEARS) as f32 * AGE_PENALTY_PER_YEAR)
                .min(AGE_PENALTY_CAP);
            push(
                RiskFactor::ClearanceAge,
                -penalty,
                format!("cleared {age} years ago"),
            );
        } else if age <= 2 {
            push(
                RiskFactor::RecentClearance,
                10.0,
                format!("recent clearance ({age} years)"),
            );
        } else if age <= 5 {
            push(
                RiskFactor::ModernClearance,
                5.0,
                format!("modern clearance ({age} years)"),
            );
        }
    }

    if cand.special_controls {
        push(
            RiskFactor::SpecialControls,
            -10.0,
            "subject to special controls".to_string(),
        );
    }

    let unclamped = BASELINE + adjustments.iter().map(|a| a.points).sum::<f32>();

    RiskScore {
        score: clamp_score(unclamped),
        unclamped,
        adjustments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    /// AVERAGE trend, UNKNOWN clinical and 8 years old: only the no-recall bonus fires
    fn neutral() -> CandidateDevice {
        CandidateDevice {
            k_number: "K160001".to_string(),
            decision_date: "2016-02-01".to_string(),
            adverse_event_trend: AdverseEventTrend::Average,
            ..Default::default()
        }
    }

    fn has(score: &RiskScore, factor: RiskFactor) -> bool {
        score.adjustments.iter().any(|a| a.factor == factor)
    }

    #[test]
    fn recall_tiers_are_exclusive() {
        let mut cand = neutral();
        cand.recall_count = 1;
        let one = score_risk(&cand, as_of());
        cand.recall_count = 4;
        let many = score_risk(&cand, as_of());

        assert_eq!(one.score, 85.0);
        assert_eq!(many.score, 70.0);
        assert!(has(&many, RiskFactor::MultipleRecalls));
        assert!(!has(&many, RiskFactor::SingleRecall));
    }

    #[test]
    fn score_is_non_increasing_in_recalls() {
        let mut cand = neutral();
        let scores: Vec<f32> = [0, 1, 2, 3]
            .iter()
            .map(|&n| {
                cand.recall_count = n;
                score_risk(&cand, as_of()).score
            })
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
    }

    #[test]
    fn penalties_accumulate() {
        let cand = CandidateDevice {
            recall_count: 2,
            adverse_event_trend: AdverseEventTrend::Concerning,
            clinical_data_history: ClinicalDataHistory::Yes,
            special_controls: true,
            decision_date: "2012-05-05".to_string(),
            ..neutral()
        };
        let score = score_risk(&cand, as_of());
        // 100 - 30 - 15 - 20 - 4 (12 years) - 10
        assert_eq!(score.unclamped, 21.0);
        assert_eq!(score.score, 21.0);
    }

    #[test]
    fn age_penalty_is_capped() {
        let cand = CandidateDevice {
            decision_date: "1990-01-01".to_string(),
            ..neutral()
        };
        let score = score_risk(&cand, as_of());
        let age = score
            .adjustments
            .iter()
            .find(|a| a.factor == RiskFactor::ClearanceAge)
            .expect("age penalty fires");
        assert_eq!(age.points, -15.0);
    }

    #[test]
    fn extreme_outlier_is_penalized_if_it_reaches_the_scorer() {
        let cand = CandidateDevice {
            adverse_event_trend: AdverseEventTrend::ExtremeOutlier,
            ..neutral()
        };
        let score = score_risk(&cand, as_of());
        assert!(has(&score, RiskFactor::ExtremeOutlierAdverseEvents));
        assert_eq!(score.score, 80.0);
    }

    #[test]
    fn bonuses_exceed_baseline_before_clamp() {
        let cand = CandidateDevice {
            recall_count: 0,
            adverse_event_trend: AdverseEventTrend::Excellent,
            clinical_data_history: ClinicalDataHistory::No,
            decision_date: "2023-09-01".to_string(),
            ..neutral()
        };
        let score = score_risk(&cand, as_of());
        assert_eq!(score.unclamped, 130.0);
        assert_eq!(score.score, 100.0);
    }

    #[test]
    fn unparsable_date_skips_age_adjustments() {
        let cand = CandidateDevice {
            decision_date: "unknown".to_string(),
            recall_count: 1,
            ..neutral()
        };
        let score = score_risk(&cand, as_of());
        assert_eq!(score.score, 85.0);
        assert_eq!(score.adjustments.len(), 1);
    }
}
