//! Mandatory eligibility rules applied before any scoring

use crate::types::*;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Hard eligibility criteria
#[derive(Debug, Clone)]
pub struct HardFilters {
    pub max_age_years: u32,
    pub as_of: NaiveDate,
}

/// Survivors borrow from the input pool, in input order
#[derive(Debug, Default)]
pub struct FilterOutcome<'a> {
    pub survivors: Vec<&'a CandidateDevice>,
    pub excluded: BTreeMap<ExclusionReason, usize>,
    pub warnings: Vec<EngineWarning>,
}

/// Whole years between clearance and `as_of`, from calendar years
pub fn age_in_years(cleared: NaiveDate, as_of: NaiveDate) -> u32 {
    (as_of.year() - cleared.year()).max(0) as u32
}

pub fn apply_filters<'a>(
    subject: &SubjectDeviceProfile,
    candidates: &'a [CandidateDevice],
    filters: &HardFilters,
) -> FilterOutcome<'a> {
    let mut outcome = FilterOutcome::default();
    for cand in candidates {
        match check_candidate(&subject.classification_code, cand, filters) {
            Ok(()) => outcome.survivors.push(cand),
            Err(reason) => {
                debug!("  EXCLUDE {}: {:?}", cand.k_number, reason);
                if reason == ExclusionReason::UnparsableDate {
                    outcome.warnings.push(EngineWarning::UnparsableDecisionDate {
                        k_number: cand.k_number.clone(),
                        value: cand.decision_date.clone(),
                    });
                }
                *outcome.excluded.entry(reason).or_insert(0) += 1;
            }
        }
    }

    outcome
}

/// Rules run in a fixed order; the first failing rule is the recorded reason
fn check_candidate(
    subject_code: &str,
    cand: &CandidateDevice,
    filters: &HardFilters,
) -> Result<(), ExclusionReason> {
    if cand.classification_code != subject_code {
        return Err(ExclusionReason::ClassificationMismatch);
    }
    if cand.adverse_event_trend == AdverseEventTrend::ExtremeOutlier {
        return Err(ExclusionReason::ExtremeOutlier);
    }
    if cand.acceptability == Acceptability::NotRecommended {
        return Err(ExclusionReason::NotRecommended);
    }
    let cleared = cand
        .clearance_date()
        .ok_or(ExclusionReason::UnparsableDate)?;
    if age_in_years(cleared, filters.as_of) > filters.max_age_years {
        return Err(ExclusionReason::TooOld);
    }
    if !cand.passed_validation {
        return Err(ExclusionReason::FailedValidation);
    }
    Ok(())
}
