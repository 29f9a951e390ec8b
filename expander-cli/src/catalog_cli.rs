//! Catalogue commands: pack, unpack, inspect, resolve
//!
//! Every command reads and writes artifact files, the JSON form of
//! [`ArtifactMetadata`].

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::{debug, info};

use expander_core::config::{EmbedderConfig, EmbeddingType, ExpanderConfig};
use expander_core::embed::{load_catalogues, ArtifactMetadata, Embedder};
use expander_core::{Catalogue, MatchMode, Seed, SourceUnit};

/// Seed selection for `resolve`
#[derive(Debug, Default)]
pub struct SeedArgs {
    pub keys: Vec<String>,
    pub names: Vec<String>,
    pub exact: bool,
}

impl SeedArgs {
    fn into_seed(self, config: &ExpanderConfig) -> Seed {
        if !self.names.is_empty() {
            let mode = if self.exact {
                MatchMode::Exact
            } else {
                config.match_mode
            };
            Seed::names(self.names, mode)
        } else {
            Seed::keys(self.keys)
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read units from stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_artifact(path: &Path) -> Result<ArtifactMetadata> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Not an artifact file: {}", path.display()))
}

fn read_artifacts(paths: &[PathBuf]) -> Result<Vec<ArtifactMetadata>> {
    paths.iter().map(|path| read_artifact(path)).collect()
}

pub fn pack_command(
    name: &str,
    input: &Path,
    config_path: Option<&Path>,
    raw: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => EmbedderConfig::from_file(path)?,
        None => EmbedderConfig::default(),
    };
    if raw {
        config.embedding_type = EmbeddingType::Raw;
    }

    let content = read_input(input)?;
    let units: Vec<SourceUnit> = expander_core::codec::deserialize(&content)
        .with_context(|| format!("Invalid unit list: {}", input.display()))?;
    debug!(producer = name, units = units.len(), "Packing units");

    let artifact = Embedder::new(config)
        .embed(name, units)
        .with_context(|| format!("Failed to embed catalogue for {name}"))?;
    let json = serde_json::to_string_pretty(&artifact)?;

    match output {
        Some(path) => {
            fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(producer = name, path = %path.display(), "Wrote artifact");
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn unpack_command(artifact_path: &Path, json_output: bool) -> Result<()> {
    let artifact = read_artifact(artifact_path)?;
    let Some(catalogue) = Catalogue::from_metadata(&artifact)
        .with_context(|| format!("Failed to decode catalogue of {}", artifact.name))?
    else {
        bail!("{} has no embedded source", artifact_path.display());
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(catalogue.units())?);
        return Ok(());
    }

    for unit in catalogue.units() {
        println!("// {}", unit.key);
        println!("{}", unit.restore());
    }
    Ok(())
}

/// Table row for one loaded catalogue
#[derive(Tabled, Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogueRow {
    #[tabled(rename = "Producer")]
    producer: String,
    #[tabled(rename = "Embedder")]
    version: String,
    #[tabled(rename = "Units")]
    units: usize,
    #[tabled(rename = "Namespaces")]
    namespaces: String,
}

impl From<&Catalogue> for CatalogueRow {
    fn from(catalogue: &Catalogue) -> Self {
        Self {
            producer: catalogue.producer_name().to_string(),
            version: catalogue.producer_version().to_string(),
            units: catalogue.len(),
            namespaces: catalogue.namespaces().join(", "),
        }
    }
}

pub fn inspect_command(paths: &[PathBuf], json_output: bool) -> Result<()> {
    let artifacts = read_artifacts(paths)?;
    let report = load_catalogues(&artifacts, &ExpanderConfig::default());
    let rows: Vec<CatalogueRow> = report.catalogues.iter().map(CatalogueRow::from).collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("No embedded catalogues found.");
    } else {
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();
        println!("{table}");
    }

    if report.has_errors() {
        bail!("Some catalogues could not be loaded");
    }
    Ok(())
}

pub fn resolve_command(
    paths: &[PathBuf],
    seed: SeedArgs,
    config_path: Option<&Path>,
    render: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => ExpanderConfig::from_file(path)?,
        None => ExpanderConfig::default(),
    };
    if !config.enabled {
        info!("Expansion disabled by configuration");
        return Ok(());
    }

    let artifacts = read_artifacts(paths)?;
    let report = load_catalogues(&artifacts, &config);
    let index = report
        .build_index()
        .context("Catalogues cannot be merged")?;

    let seed = seed.into_seed(&config);
    let resolution = index.resolve(&seed);
    for missing in resolution.unresolved() {
        info!(key = %missing, "Unresolved reference, assumed to be available externally");
    }

    if render {
        print!("{}", resolution.render());
    } else {
        for key in resolution.keys() {
            println!("{key}");
        }
    }
    Ok(())
}
