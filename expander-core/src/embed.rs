//! Embedding catalogues into artifact metadata and reading them back
//!
//! A producer build stores its catalogue as string attributes on its build
//! artifact. A consumer build discovers those attributes on every upstream
//! artifact and decodes each into a [`Catalogue`].
//!
//! Failures are isolated per artifact: a corrupt blob becomes a warning
//! naming the producer and the remaining artifacts still load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::catalog::{Catalogue, CatalogueIndex, ProducerVersion, Registry, SourceUnit};
use crate::codec;
use crate::config::{EmbedderConfig, EmbeddingType, ExpanderConfig};
use crate::error::{ExpanderError, Result};

/// Attribute holding the gzip + base32768 blob
pub const EMBEDDED_SOURCE_COMPRESSED_KEY: &str = "Expander.EmbeddedSourceCode.GZipBase32768";

/// Attribute holding the plain JSON blob
pub const EMBEDDED_SOURCE_RAW_KEY: &str = "Expander.EmbeddedSourceCode";

/// Attribute holding the version of the embedder that wrote the blob
pub const EMBEDDER_VERSION_KEY: &str = "Expander.EmbedderVersion";

/// Attribute holding a comma-separated namespace list
pub const EMBEDDED_NAMESPACES_KEY: &str = "Expander.EmbeddedNamespaces";

/// String attributes attached to one build artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Artifact (producer) name
    pub name: String,

    /// Attribute name to value
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ArtifactMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Whether any catalogue blob is attached
    pub fn has_embedded_source(&self) -> bool {
        self.attributes.contains_key(EMBEDDED_SOURCE_COMPRESSED_KEY)
            || self.attributes.contains_key(EMBEDDED_SOURCE_RAW_KEY)
    }

    /// Version of the embedder that wrote this artifact, if recorded
    pub fn embedder_version(&self) -> Result<Option<ProducerVersion>> {
        self.get(EMBEDDER_VERSION_KEY)
            .map(str::parse::<ProducerVersion>)
            .transpose()
    }

    /// Namespaces published alongside the blob
    pub fn namespaces(&self) -> Vec<String> {
        self.get(EMBEDDED_NAMESPACES_KEY)
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|ns| !ns.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Producer side: turns extracted units into artifact attributes
#[derive(Debug, Clone, Default)]
pub struct Embedder {
    config: EmbedderConfig,
}

impl Embedder {
    pub fn new(config: EmbedderConfig) -> Self {
        Self { config }
    }

    /// Build the attributes for `producer_name` from its extracted units.
    ///
    /// Fails with `DuplicateKey` if two units share a key.
    pub fn embed(&self, producer_name: &str, units: Vec<SourceUnit>) -> Result<ArtifactMetadata> {
        let mut metadata = ArtifactMetadata::new(producer_name);
        if !self.config.enabled {
            info!(producer = producer_name, "Embedding disabled by configuration");
            return Ok(metadata);
        }

        let mut units: Vec<SourceUnit> = units
            .into_iter()
            .filter(|unit| !self.config.exclude_keys.contains(&unit.key))
            .collect();
        if self.config.sort_units {
            units.sort_by(|a, b| a.key.cmp(&b.key));
        }

        let catalogue = Catalogue::new(producer_name, ProducerVersion::current(), units)?;

        let (key, blob) = match self.config.embedding_type {
            EmbeddingType::GZipBase32768 => (
                EMBEDDED_SOURCE_COMPRESSED_KEY,
                codec::encode(catalogue.units())?,
            ),
            EmbeddingType::Raw => (EMBEDDED_SOURCE_RAW_KEY, codec::serialize(catalogue.units())?),
        };
        debug!(
            producer = producer_name,
            units = catalogue.len(),
            attribute = key,
            chars = blob.chars().count(),
            "Embedded catalogue"
        );

        metadata = metadata
            .with_attribute(key, blob)
            .with_attribute(EMBEDDER_VERSION_KEY, ProducerVersion::current().to_string());

        if self.config.embed_namespaces {
            let namespaces: BTreeSet<&str> = catalogue
                .units()
                .iter()
                .flat_map(|unit| unit.namespaces())
                .collect();
            if !namespaces.is_empty() {
                let list = namespaces.into_iter().collect::<Vec<_>>().join(",");
                metadata = metadata.with_attribute(EMBEDDED_NAMESPACES_KEY, list);
            }
        }

        Ok(metadata)
    }
}

impl Catalogue {
    /// Decode the catalogue embedded in one artifact.
    ///
    /// The compressed blob wins when both forms are present. Returns
    /// `Ok(None)` for artifacts that embed nothing. A missing or unreadable
    /// embedder version falls back to `0.0.0`.
    pub fn from_metadata(metadata: &ArtifactMetadata) -> Result<Option<Self>> {
        let units = if let Some(blob) = metadata.get(EMBEDDED_SOURCE_COMPRESSED_KEY) {
            codec::decode(blob)?
        } else if let Some(blob) = metadata.get(EMBEDDED_SOURCE_RAW_KEY) {
            codec::deserialize(blob)?
        } else {
            return Ok(None);
        };

        let version = metadata
            .embedder_version()
            .ok()
            .flatten()
            .unwrap_or_default();

        Catalogue::new(metadata.name.clone(), version, units)
            .map(|catalogue| Some(catalogue.with_namespaces(metadata.namespaces())))
    }
}

impl Registry {
    /// Queue an artifact; its blob is decoded when the registry freezes
    pub fn register_artifact(&self, artifact: ArtifactMetadata) {
        let origin = artifact.name.clone();
        self.register_catalogues(origin, move || {
            Catalogue::from_metadata(&artifact).map(|found| found.into_iter().collect())
        });
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A problem attributed to one producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub producer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, producer: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            producer: producer.to_string(),
            key: None,
            message: message.into(),
        }
    }

    fn warning(producer: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, producer, message)
    }

    /// Attribute an error to a producer.
    ///
    /// Blob-level errors are warnings; duplicate keys are errors.
    pub fn from_error(producer: &str, error: &ExpanderError) -> Self {
        let severity = if error.is_recoverable() {
            Severity::Warning
        } else {
            Severity::Error
        };
        let key = match error {
            ExpanderError::DuplicateKey { key, .. } => Some(key.clone()),
            _ => None,
        };
        Self {
            key,
            ..Self::new(severity, producer, error.to_string())
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.producer)?;
        if let Some(key) = &self.key {
            write!(f, " {key}:")?;
        }
        write!(f, " {}", self.message)
    }
}

/// Result of loading many artifacts
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub catalogues: Vec<Catalogue>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Merge the loaded catalogues; duplicate keys abort the build
    pub fn build_index(&self) -> Result<CatalogueIndex> {
        CatalogueIndex::build(&self.catalogues)
    }
}

/// Decode every artifact, isolating failures per producer.
///
/// Artifacts without a blob are skipped quietly. Blobs written by a newer
/// embedder produce a warning but are still decoded.
pub fn load_catalogues<'a, I>(artifacts: I, config: &ExpanderConfig) -> LoadReport
where
    I: IntoIterator<Item = &'a ArtifactMetadata>,
{
    let current = ProducerVersion::current();
    let mut report = LoadReport::default();

    for artifact in artifacts {
        let producer = artifact.name.as_str();
        if !artifact.has_embedded_source() {
            continue;
        }
        if !config.accepts_producer(producer) {
            debug!(producer, "Producer ignored by configuration");
            report.diagnostics.push(Diagnostic::new(
                Severity::Info,
                producer,
                "ignored by configuration",
            ));
            continue;
        }

        match artifact.embedder_version() {
            Ok(Some(version)) if version > current => {
                warn!(producer, %version, %current, "Catalogue embedded by a newer version");
                report.diagnostics.push(Diagnostic::warning(
                    producer,
                    format!(
                        "embedded by version {version}, newer than this resolver ({current}); decoding anyway"
                    ),
                ));
            }
            Ok(_) => {}
            Err(e) => {
                e.log(producer);
                report.diagnostics.push(Diagnostic::from_error(producer, &e));
            }
        }

        match Catalogue::from_metadata(artifact) {
            Ok(Some(catalogue)) => {
                debug!(producer, units = catalogue.len(), "Loaded catalogue");
                report.catalogues.push(catalogue);
            }
            Ok(None) => {}
            Err(e) => {
                e.log(producer);
                report.diagnostics.push(Diagnostic::from_error(producer, &e));
            }
        }
    }

    report
}
