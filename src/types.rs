//! Core type definitions for predicate recommendation

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DISCLAIMER: &str = "Heuristic ranking of candidate predicates only. \
This output is not a substantial equivalence determination and must be reviewed \
by qualified regulatory staff.";

/// Structured description of the new device being submitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectDeviceProfile {
    pub classification_code: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub intended_use: String,
    #[serde(default)]
    pub device_description: String,
    #[serde(default)]
    pub indications_for_use: String,
    #[serde(default)]
    pub sterilization_method: Option<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub standards_referenced: Vec<String>,
}

impl SubjectDeviceProfile {
    /// Free text compared against every candidate
    pub fn text(&self) -> String {
        join_text(&[
            &self.intended_use,
            &self.device_description,
            &self.indications_for_use,
        ])
    }
}

/// Post-market adverse event signal, assessed upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdverseEventTrend {
    Excellent,
    Good,
    Average,
    Concerning,
    ExtremeOutlier,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClinicalDataHistory {
    Yes,
    Probable,
    No,
    #[default]
    Unknown,
}

/// Upstream overall verdict on whether a record is usable as a predicate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Acceptability {
    Acceptable,
    #[default]
    ReviewRequired,
    NotRecommended,
}

/// Previously cleared device with its upstream enrichment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateDevice {
    pub k_number: String,
    pub classification_code: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub applicant: String,
    #[serde(default)]
    pub decision_description: String,
    #[serde(default)]
    pub summary_text: String,
    /// Raw clearance date as published (YYYY-MM-DD, YYYYMMDD or MM/DD/YYYY)
    #[serde(default)]
    pub decision_date: String,

    // Enrichment computed by the data layer
    #[serde(default)]
    pub recall_count: u32,
    #[serde(default)]
    pub adverse_event_trend: AdverseEventTrend,
    #[serde(default)]
    pub clinical_data_history: ClinicalDataHistory,
    #[serde(default)]
    pub acceptability: Acceptability,
    #[serde(default)]
    pub passed_validation: bool,
    #[serde(default)]
    pub special_controls: bool,
}

impl CandidateDevice {
    pub fn text(&self) -> String {
        join_text(&[&self.decision_description, &self.summary_text])
    }

    pub fn clearance_date(&self) -> Option<NaiveDate> {
        parse_decision_date(&self.decision_date)
    }
}

fn join_text(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_decision_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Normalized sterilization method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sterilization {
    EthyleneOxide,
    Radiation,
    Steam,
    NonSterile,
    Other(String),
}

impl Sterilization {
    /// Ethylene oxide, radiation and steam are terminal methods
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EthyleneOxide | Self::Radiation | Self::Steam)
    }
}

/// Discrete-feature sub-scores (raw points, 0-30 total)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub sterilization: f32, // 0-15
    pub materials: f32,     // 0-10
    pub standards: f32,     // 0-5
    pub raw_total: f32,
    /// Points available given what the subject declared
    pub applicable_max: f32,
    /// raw_total rescaled to 0-100 against applicable_max; None when nothing applies
    pub normalized: Option<f32>,
    pub candidate_sterilization: Option<Sterilization>,
    pub matched_materials: Vec<String>,
    pub matched_standards: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    SingleRecall,
    MultipleRecalls,
    ConcerningAdverseEvents,
    ExtremeOutlierAdverseEvents,
    ClinicalDataRequired,
    ClinicalDataProbable,
    ClearanceAge,
    SpecialControls,
    RecentClearance,
    ModernClearance,
    ExcellentAdverseEvents,
    GoodAdverseEvents,
    NoClinicalData,
    NoRecalls,
}

/// One fired penalty or bonus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAdjustment {
    pub factor: RiskFactor,
    pub points: f32,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub score: f32, // clamped 0-100
    pub unclamped: f32,
    pub adjustments: Vec<RiskAdjustment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub text_score: f32,
    pub feature: FeatureScore,
    pub risk: RiskScore,
    pub similarity_score: f32,
    pub final_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rank: usize,
    pub candidate: CandidateDevice,
    pub scores: ScoreBreakdown,
    pub rationale: Vec<String>,
}

/// Why a candidate was dropped before scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    ClassificationMismatch,
    ExtremeOutlier,
    NotRecommended,
    TooOld,
    UnparsableDate,
    FailedValidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    VectorizationFailed { reason: String },
    UnparsableDecisionDate { k_number: String, value: String },
    MissingCandidateText { k_number: String },
    EmptySubjectText,
}

impl EngineWarning {
    /// Warnings that mean scores are less trustworthy than they look
    pub fn degrades_scoring(&self) -> bool {
        matches!(
            self,
            Self::VectorizationFailed { .. } | Self::EmptySubjectText
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_searched: usize,
    pub after_filter: usize,
    pub scored: usize,
    pub excluded: BTreeMap<ExclusionReason, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendations: Vec<Recommendation>,
    pub stats: PoolStats,
    pub warnings: Vec<EngineWarning>,
    /// Set when no recommendation could be produced
    pub reason: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub evaluated_as_of: NaiveDate,
    pub disclaimer: String,
}

impl RecommendationResult {
    pub fn is_degraded(&self) -> bool {
        self.warnings.iter().any(EngineWarning::degrades_scoring)
    }
}
