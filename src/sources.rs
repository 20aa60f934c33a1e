//! Candidate pool sources
//!
//! Acquisition and enrichment happen elsewhere; a source only hands over
//! already-enriched records.

use crate::types::CandidateDevice;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Trait for pluggable candidate pool sources
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn load(&self) -> Result<Vec<CandidateDevice>>;
}

/// In-memory pool
pub struct StaticSource {
    candidates: Vec<CandidateDevice>,
}

impl StaticSource {
    pub fn new(candidates: Vec<CandidateDevice>) -> Self {
        Self { candidates }
    }
}

impl CandidateSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn load(&self) -> Result<Vec<CandidateDevice>> {
        Ok(self.candidates.clone())
    }
}

/// JSON array of enriched candidate records on disk
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CandidateSource for JsonFileSource {
    fn name(&self) -> &'static str {
        "json_file"
    }

    fn load(&self) -> Result<Vec<CandidateDevice>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read candidate pool {}", self.path.display()))?;
        let candidates: Vec<CandidateDevice> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse candidate pool {}", self.path.display()))?;

        tracing::info!(
            "Loaded {} candidates from {}",
            candidates.len(),
            self.path.display()
        );

        Ok(candidates)
    }
}
