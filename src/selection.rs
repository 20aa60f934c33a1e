//! Final ordering, shortlist cut and per-candidate rationale

use crate::types::*;
use std::cmp::Ordering;

/// A candidate with its full score breakdown, before ranking
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a CandidateDevice,
    pub scores: ScoreBreakdown,
}

/// Final score descending; equal scores fall back to k_number ascending
pub fn rank_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.scores
        .final_score
        .total_cmp(&a.scores.final_score)
        .then_with(|| a.candidate.k_number.cmp(&b.candidate.k_number))
}

/// Sort, assign 1-based ranks and keep the first `top_n`
pub fn select_top(mut scored: Vec<ScoredCandidate>, top_n: usize) -> Vec<Recommendation> {
    scored.sort_by(rank_order);
    scored
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, sc)| Recommendation {
            rank: idx + 1,
            rationale: explain_candidate(&sc.scores),
            candidate: sc.candidate.clone(),
            scores: sc.scores,
        })
        .collect()
}

pub fn explain_candidate(scores: &ScoreBreakdown) -> Vec<String> {
    let mut reasons = Vec::new();

    let strength = match scores.text_score {
        s if s >= 70.0 => "strong",
        s if s >= 40.0 => "moderate",
        s if s > 0.0 => "weak",
        _ => "no",
    };
    reasons.push(format!(
        "{} text match: {:.1}",
        strength, scores.text_score
    ));

    let feature = &scores.feature;
    if feature.sterilization >= 15.0 {
        reasons.push("same sterilization method".to_string());
    } else if feature.sterilization > 0.0 {
        reasons.push("compatible terminal sterilization".to_string());
    }
    if !feature.matched_materials.is_empty() {
        reasons.push(format!(
            "shared materials: {}",
            feature.matched_materials.join(", ")
        ));
    }
    if !feature.matched_standards.is_empty() {
        reasons.push(format!(
            "shared standards: {}",
            feature.matched_standards.join(", ")
        ));
    }

    for adj in &scores.risk.adjustments {
        reasons.push(format!("risk {:+.0}: {}", adj.points, adj.notes));
    }

    reasons.push(format!(
        "final score: {:.1} (similarity {:.1}, risk {:.1})",
        scores.final_score, scores.similarity_score, scores.risk.score
    ));

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(k: &str) -> CandidateDevice {
        CandidateDevice {
            k_number: k.to_string(),
            ..Default::default()
        }
    }

    fn scored(cand: &CandidateDevice, final_score: f32) -> ScoredCandidate<'_> {
        ScoredCandidate {
            candidate: cand,
            scores: ScoreBreakdown {
                final_score,
                ..Default::default()
            },
        }
    }

    #[test]
    fn ranks_descending_and_truncates() {
        let pool: Vec<_> = ["K1", "K2", "K3"].iter().map(|k| candidate(k)).collect();
        let input = vec![
            scored(&pool[0], 40.0),
            scored(&pool[1], 90.0),
            scored(&pool[2], 65.0),
        ];

        let top = select_top(input, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].candidate.k_number, "K2");
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[1].candidate.k_number, "K3");
        assert_eq!(top[1].rank, 2);
    }

    #[test]
    fn ties_break_on_k_number() {
        let pool: Vec<_> = ["K9", "K2", "K5"].iter().map(|k| candidate(k)).collect();
        let make = || pool.iter().map(|c| scored(c, 50.0)).collect::<Vec<_>>();

        let first: Vec<_> = select_top(make(), 3)
            .into_iter()
            .map(|r| r.candidate.k_number)
            .collect();
        let mut reversed = make();
        reversed.reverse();
        let second: Vec<_> = select_top(reversed, 3)
            .into_iter()
            .map(|r| r.candidate.k_number)
            .collect();

        assert_eq!(first, vec!["K2", "K5", "K9"]);
        assert_eq!(first, second);
    }

    #[test]
    fn rationale_lists_fired_risk_adjustments() {
        let scores = ScoreBreakdown {
            text_score: 82.0,
            risk: RiskScore {
                score: 85.0,
                unclamped: 85.0,
                adjustments: vec![RiskAdjustment {
                    factor: RiskFactor::SingleRecall,
                    points: -15.0,
                    notes: "1 recall".to_string(),
                }],
            },
            ..Default::default()
        };

        let reasons = explain_candidate(&scores);

        assert!(reasons[0].starts_with("strong text match"));
        assert!(reasons.iter().any(|r| r == "risk -15: 1 recall"));
        assert!(reasons.last().unwrap().starts_with("final score"));
    }
}
