//! Expander - embed a library's source in its build artifact and inline
//! the parts a consumer actually uses
//!
//! Artifacts are exchanged as JSON files holding the artifact name and its
//! string attributes.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod catalog_cli;

/// Trace modules for pipeline tracing
#[derive(Debug, Clone, ValueEnum)]
enum TraceModule {
    Codec,
    Resolve,
    Registry,
    All,
}

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "expander",
    about = "Pack, inspect and resolve embedded source catalogues",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Enable structured tracing (comma-separated: codec,resolve,registry,all)
    #[clap(long, value_delimiter = ',', global = true)]
    trace: Vec<TraceModule>,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,
}

#[derive(Parser, Debug)]
enum Command {
    /// Embed a JSON array of source units into an artifact file
    Pack {
        /// Producer (artifact) name
        #[clap(long)]
        name: String,

        /// JSON file with the extracted units ("-" reads stdin)
        #[clap(long, default_value = "-")]
        input: PathBuf,

        /// Embedder configuration (YAML or JSON)
        #[clap(long)]
        config: Option<PathBuf>,

        /// Store plain JSON instead of the compressed blob
        #[clap(long)]
        raw: bool,

        /// Where to write the artifact (stdout if omitted)
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Decode the catalogue embedded in an artifact
    Unpack {
        /// Artifact file
        artifact: PathBuf,

        /// Print the units as JSON instead of restored source
        #[clap(long)]
        json: bool,
    },

    /// Summarize the catalogues embedded in artifacts
    Inspect {
        /// Artifact files
        #[clap(required = true)]
        artifacts: Vec<PathBuf>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Compute the closure of units needed by the given keys or names
    Resolve {
        /// Artifact files
        #[clap(required = true)]
        artifacts: Vec<PathBuf>,

        /// Seed unit keys
        #[clap(long = "key", required_unless_present = "names")]
        keys: Vec<String>,

        /// Referenced type names
        #[clap(long = "name", conflicts_with = "keys")]
        names: Vec<String>,

        /// Match names exactly instead of by simple name
        #[clap(long)]
        exact: bool,

        /// Expander configuration (YAML or JSON)
        #[clap(long)]
        config: Option<PathBuf>,

        /// Print the inlinable source instead of the key list
        #[clap(long)]
        render: bool,
    },
}

fn initialize_tracing(log_level: &LogLevel, trace_modules: &[TraceModule]) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    for module in trace_modules {
        let directive = match module {
            TraceModule::Codec => "expander_core::codec=trace",
            TraceModule::Resolve => "expander_core::catalog::index=trace",
            TraceModule::Registry => "expander_core::catalog::registry=trace",
            TraceModule::All => "expander_core=trace",
        };

        if let Ok(parsed) = directive.parse() {
            filter = filter.add_directive(parsed);
        }
    }

    // Logs go to stderr; stdout carries artifacts and resolved source
    if !trace_modules.is_empty() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();

        tracing::info!(trace_modules = ?trace_modules, "Expander tracing enabled");
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, &cli.trace);

    match cli.command {
        Command::Pack {
            name,
            input,
            config,
            raw,
            output,
        } => catalog_cli::pack_command(&name, &input, config.as_deref(), raw, output.as_deref()),
        Command::Unpack { artifact, json } => catalog_cli::unpack_command(&artifact, json),
        Command::Inspect { artifacts, json } => catalog_cli::inspect_command(&artifacts, json),
        Command::Resolve {
            artifacts,
            keys,
            names,
            exact,
            config,
            render,
        } => catalog_cli::resolve_command(
            &artifacts,
            catalog_cli::SeedArgs { keys, names, exact },
            config.as_deref(),
            render,
        ),
    }
}
