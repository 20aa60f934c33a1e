//! Engine configuration: weights, age ceiling and shortlist size

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

const WEIGHT_TOLERANCE: f32 = 1e-4;

pub const DEFAULT_PORT: u16 = 8081;

/// Split between text similarity and discrete feature similarity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub text: f32,
    pub feature: f32,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            text: 0.6,
            feature: 0.4,
        }
    }
}

/// Split between combined similarity and risk in the final score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub similarity: f32,
    pub risk: f32,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            similarity: 0.7,
            risk: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub similarity_weights: SimilarityWeights,
    pub ranking_weights: RankingWeights,
    pub max_age_years: u32,
    pub top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_weights: SimilarityWeights::default(),
            ranking_weights: RankingWeights::default(),
            max_age_years: 15,
            top_n: 5,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_pair(
            "similarity",
            self.similarity_weights.text,
            self.similarity_weights.feature,
        )?;
        check_pair(
            "ranking",
            self.ranking_weights.similarity,
            self.ranking_weights.risk,
        )?;
        if self.top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }
        if self.max_age_years == 0 {
            return Err(ConfigError::InvalidAgeCeiling);
        }
        Ok(())
    }

    /// Load overrides from `PREDICATE_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            similarity_weights: SimilarityWeights {
                text: env_or("PREDICATE_TEXT_WEIGHT", defaults.similarity_weights.text)?,
                feature: env_or(
                    "PREDICATE_FEATURE_WEIGHT",
                    defaults.similarity_weights.feature,
                )?,
            },
            ranking_weights: RankingWeights {
                similarity: env_or(
                    "PREDICATE_SIMILARITY_WEIGHT",
                    defaults.ranking_weights.similarity,
                )?,
                risk: env_or("PREDICATE_RISK_WEIGHT", defaults.ranking_weights.risk)?,
            },
            max_age_years: env_or("PREDICATE_MAX_AGE_YEARS", defaults.max_age_years)?,
            top_n: env_or("PREDICATE_TOP_N", defaults.top_n)?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// HTTP port from `PREDICATE_PORT`; a value that is set but unparsable is an error
pub fn port_from_env() -> Result<u16, ConfigError> {
    env_or("PREDICATE_PORT", DEFAULT_PORT)
}

fn check_pair(pair: &'static str, a: f32, b: f32) -> Result<(), ConfigError> {
    if a < 0.0 || b < 0.0 {
        return Err(ConfigError::NegativeWeight { pair });
    }
    let sum = a + b;
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ConfigError::WeightsDoNotSumToOne { pair, sum });
    }
    Ok(())
}

fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "PREDICATE_TEXT_WEIGHT",
            "PREDICATE_FEATURE_WEIGHT",
            "PREDICATE_SIMILARITY_WEIGHT",
            "PREDICATE_RISK_WEIGHT",
            "PREDICATE_MAX_AGE_YEARS",
            "PREDICATE_TOP_N",
            "PREDICATE_PORT",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_n, 5);
        assert_eq!(config.max_age_years, 15);
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let config = EngineConfig {
            similarity_weights: SimilarityWeights {
                text: 0.7,
                feature: 0.4,
            },
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::WeightsDoNotSumToOne { pair, .. }) => assert_eq!(pair, "similarity"),
            other => panic!("expected weight sum error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_weight_even_when_sum_is_one() {
        let config = EngineConfig {
            ranking_weights: RankingWeights {
                similarity: 1.2,
                risk: -0.2,
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeWeight { pair: "ranking" })
        );
    }

    #[test]
    fn rejects_zero_top_n() {
        let config = EngineConfig {
            top_n: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTopN));
    }

    #[test]
    fn from_env_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = EngineConfig::from_env().expect("config loads with defaults");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn from_env_applies_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PREDICATE_TEXT_WEIGHT", "0.5");
        env::set_var("PREDICATE_FEATURE_WEIGHT", "0.5");
        env::set_var("PREDICATE_TOP_N", "3");
        let config = EngineConfig::from_env().expect("config loads");
        reset_env();
        assert_eq!(config.similarity_weights.text, 0.5);
        assert_eq!(config.top_n, 3);
    }

    #[test]
    fn from_env_reports_unparsable_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PREDICATE_MAX_AGE_YEARS", "fifteen");
        let err = EngineConfig::from_env().unwrap_err();
        reset_env();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "PREDICATE_MAX_AGE_YEARS",
                value: "fifteen".to_string()
            }
        );
    }

    #[test]
    fn port_defaults_and_rejects_garbage() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        assert_eq!(port_from_env(), Ok(DEFAULT_PORT));
        env::set_var("PREDICATE_PORT", "9090");
        assert_eq!(port_from_env(), Ok(9090));
        env::set_var("PREDICATE_PORT", "80808");
        let err = port_from_env().unwrap_err();
        reset_env();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "PREDICATE_PORT",
                value: "80808".to_string()
            }
        );
    }
}
