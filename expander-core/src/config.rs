//! Embedder and expander configuration
//!
//! Both sides read a small YAML (or JSON) document. Every field has a
//! default, and unknown keys are ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::MatchMode;

/// How the producer stores its catalogue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingType {
    /// Serialized, gzipped and packed into the 15-bit alphabet
    #[default]
    #[serde(rename = "gZipBase32768", alias = "GZipBase32768")]
    GZipBase32768,
    /// Serialized JSON only
    #[serde(rename = "raw", alias = "Raw")]
    Raw,
}

/// Producer-side configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedderConfig {
    /// Embed anything at all
    pub enabled: bool,

    /// Blob format
    pub embedding_type: EmbeddingType,

    /// Sort units by key before serializing for reproducible blobs
    pub sort_units: bool,

    /// Keys of units left out of the catalogue
    pub exclude_keys: Vec<String>,

    /// Publish the namespace list alongside the blob
    pub embed_namespaces: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            embedding_type: EmbeddingType::default(),
            sort_units: true,
            exclude_keys: Vec::new(),
            embed_namespaces: true,
        }
    }
}

impl EmbedderConfig {
    /// Parse from YAML (JSON is accepted too)
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Invalid embedder config")
    }

    /// Load from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read embedder config: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse embedder config: {}", path.display()))
    }
}

/// Consumer-side configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpanderConfig {
    /// Resolve and inline anything at all
    pub enabled: bool,

    /// How referenced names are matched against declared names
    pub match_mode: MatchMode,

    /// Producers whose catalogues are skipped
    pub ignore_producers: Vec<String>,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            match_mode: MatchMode::default(),
            ignore_producers: Vec::new(),
        }
    }
}

impl ExpanderConfig {
    /// Parse from YAML (JSON is accepted too)
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Invalid expander config")
    }

    /// Load from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read expander config: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse expander config: {}", path.display()))
    }

    /// Whether catalogues from `producer` should be loaded
    pub fn accepts_producer(&self, producer: &str) -> bool {
        !self.ignore_producers.iter().any(|p| p == producer)
    }
}
