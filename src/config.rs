//! Optional configuration file.
//!
//! The file is YAML (JSON is accepted too, being a YAML subset) with camelCase
//! keys:
//!
//! ```yaml
//! entryFile: src/server.ts
//! ignore:
//!   - "**/generated/**"
//! outputFile: build/metadata.json
//! emit: metadata
//! format: json
//! title: Pet Store
//! version: 1.2.0
//! ```
//!
//! Relative paths in the file are taken relative to the file's directory.

use crate::cli::{EmitKind, OutputFormat};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub entry_file: Option<PathBuf>,

    /// Extra glob patterns excluding source units
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub output_file: Option<PathBuf>,

    #[serde(default)]
    pub emit: Option<EmitKind>,

    #[serde(default)]
    pub format: Option<OutputFormat>,

    /// OpenAPI `info.title`
    #[serde(default)]
    pub title: Option<String>,

    /// OpenAPI `info.version`
    #[serde(default)]
    pub version: Option<String>,
}

impl GeneratorConfig {
    /// Reads and parses the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.entry_file = config.entry_file.map(|p| rebase(base, p));
            config.output_file = config.output_file.map(|p| rebase(base, p));
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

fn rebase(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
