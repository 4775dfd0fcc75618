use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{default_output_dir, Selection};

/// `[eval]` section of the project config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalSettings {
    pub dataset: Option<PathBuf>,
    pub sample_count: Option<usize>,
    pub offset: usize,
    pub seed: Option<u64>,
    /// Questions in flight at once
    pub concurrency: usize,
    pub output_dir: Option<PathBuf>,
    /// Score gap under which two competing answers count as a stalemate
    pub stalemate_gap: f64,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            dataset: None,
            sample_count: None,
            offset: 0,
            seed: None,
            concurrency: 1,
            output_dir: None,
            stalemate_gap: 1.0,
        }
    }
}

impl EvalSettings {
    pub fn selection(&self) -> Selection {
        Selection {
            offset: self.offset,
            sample_count: self.sample_count,
            seed: self.seed,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(default_output_dir)
    }
}
