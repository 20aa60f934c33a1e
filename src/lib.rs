//! Predicate Ranker - explainable predicate device recommendation
//!
//! Ranks previously cleared devices as comparison baselines for a new device:
//! - Mandatory eligibility filtering (classification, age, safety, validation)
//! - Batch TF-IDF text similarity plus discrete feature matching
//! - Itemized risk scoring
//! - Weighted final ranking with per-candidate rationale
//!
//! Scores are a heuristic and never a substantial equivalence determination.

pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod filter;
pub mod predicate_engine;
pub mod risk;
pub mod scoring;
pub mod selection;
pub mod server;
pub mod sources;
pub mod text;
pub mod types;

pub use config::{EngineConfig, RankingWeights, SimilarityWeights};
pub use error::ConfigError;
pub use predicate_engine::PredicateEngine;
pub use sources::{CandidateSource, JsonFileSource, StaticSource};
pub use types::*;
