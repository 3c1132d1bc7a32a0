//! Run configuration from the environment.
//!
//! `CASE_GEN_CONFIG` names an optional JSON file with `front`, `back` and
//! `verify_volumes`; anything missing keeps its default. `CASE_GEN_OUT_DIR` overrides
//! the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use feature_engine::{BackParams, BuildOptions, FrontParams};
use serde::Deserialize;

pub const CONFIG_VAR: &str = "CASE_GEN_CONFIG";
pub const OUT_DIR_VAR: &str = "CASE_GEN_OUT_DIR";
pub const DEFAULT_OUT_DIR: &str = "case_outputs";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    pub front: FrontParams,
    pub back: BackParams,
    pub verify_volumes: bool,
    pub out_dir: Option<PathBuf>,
}

impl GenConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid case-gen configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Read `CASE_GEN_CONFIG` and `CASE_GEN_OUT_DIR`.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(dir) = std::env::var_os(OUT_DIR_VAR) {
            config.out_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    pub fn out_dir(&self) -> PathBuf {
        self.out_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            verify_volumes: self.verify_volumes,
            ..BuildOptions::default()
        }
    }
}
