//! Fatal configuration errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{pair} weights must sum to 1.0 (got {sum:.4})")]
    WeightsDoNotSumToOne { pair: &'static str, sum: f32 },

    #[error("{pair} weights must be non-negative")]
    NegativeWeight { pair: &'static str },

    #[error("top_n must be at least 1")]
    InvalidTopN,

    #[error("max_age_years must be at least 1")]
    InvalidAgeCeiling,

    #[error("{var} has an invalid value: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}
