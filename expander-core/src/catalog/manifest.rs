//! Catalogue manifest: one producer's embedded units plus version metadata
//!
//! A catalogue is built once per decoded blob and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::SourceUnit;
use crate::error::{ExpanderError, Result};

/// Producer version: `major.minor.patch[.revision]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProducerVersion {
    version: semver::Version,
    revision: Option<u64>,
}

impl ProducerVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            version: semver::Version::new(major, minor, patch),
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Version of this crate, used as the embedder/resolver version
    pub fn current() -> Self {
        Self::new(
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        )
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    fn sort_key(&self) -> (u64, u64, u64, u64) {
        (
            self.version.major,
            self.version.minor,
            self.version.patch,
            self.revision.unwrap_or(0),
        )
    }
}

impl Default for ProducerVersion {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl PartialEq for ProducerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for ProducerVersion {}

impl PartialOrd for ProducerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProducerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for ProducerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.version.major, self.version.minor, self.version.patch
        )?;
        if let Some(revision) = self.revision {
            write!(f, ".{revision}")?;
        }
        Ok(())
    }
}

impl FromStr for ProducerVersion {
    type Err = ExpanderError;

    /// Accepts two to four numeric components (`1.2`, `1.2.3`, `1.2.3.4`).
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: &str| ExpanderError::InvalidVersion {
            value: s.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(invalid("expected 2 to 4 dot-separated components"));
        }

        let mut numbers = [0u64; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u64>()
                .map_err(|e| invalid(&format!("component '{part}': {e}")))?;
        }

        let version = Self::new(numbers[0], numbers[1], numbers[2]);
        Ok(if parts.len() == 4 {
            version.with_revision(numbers[3])
        } else {
            version
        })
    }
}

impl TryFrom<String> for ProducerVersion {
    type Error = ExpanderError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ProducerVersion> for String {
    fn from(value: ProducerVersion) -> Self {
        value.to_string()
    }
}

/// One producer's collection of source units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogue {
    producer_name: String,
    producer_version: ProducerVersion,
    namespaces: Vec<String>,
    units: Vec<SourceUnit>,
}

impl Catalogue {
    /// Build a catalogue, rejecting units that share a key
    pub fn new(
        producer_name: impl Into<String>,
        producer_version: ProducerVersion,
        units: Vec<SourceUnit>,
    ) -> Result<Self> {
        let producer_name = producer_name.into();

        let mut seen = HashSet::with_capacity(units.len());
        for unit in &units {
            if !seen.insert(unit.key.as_str()) {
                return Err(ExpanderError::DuplicateKey {
                    key: unit.key.clone(),
                    first: producer_name.clone(),
                    second: producer_name.clone(),
                });
            }
        }

        Ok(Self {
            producer_name,
            producer_version,
            namespaces: Vec::new(),
            units,
        })
    }

    /// Attach the producer's declared namespace list
    pub fn with_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn producer_name(&self) -> &str {
        &self.producer_name
    }

    pub fn producer_version(&self) -> &ProducerVersion {
        &self.producer_version
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Identity used in diagnostics: `name@version`
    pub fn identity(&self) -> String {
        format!("{}@{}", self.producer_name, self.producer_version)
    }
}
