//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

use expander_core::embed::{ArtifactMetadata, Embedder};
use expander_core::SourceUnit;
use std::sync::Once;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Build a unit keyed `<producer>ᐳ<path>` declaring `<producer>.<type>`
#[allow(dead_code)]
pub fn library_unit(producer: &str, path: &str, type_name: &str, deps: &[&str]) -> SourceUnit {
    SourceUnit::new(
        SourceUnit::conventional_key(producer, path),
        format!("public class {type_name} {{}}"),
    )
    .with_declared_names([format!("{producer}.{type_name}")])
    .with_imports(["using System;"])
    .with_dependencies(
        deps.iter()
            .map(|dep| SourceUnit::conventional_key(producer, dep)),
    )
}

/// Embed units as a producer build would, with default configuration
#[allow(dead_code)]
pub fn embed_artifact(producer: &str, units: Vec<SourceUnit>) -> ArtifactMetadata {
    Embedder::default()
        .embed(producer, units)
        .unwrap_or_else(|e| panic!("failed to embed {producer}: {e}"))
}
