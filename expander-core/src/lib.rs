//! Expander core library
//!
//! Publish a library's source units inside its build artifact, then pull back
//! the minimal closure of units a consumer references and inline them.

pub mod catalog;
pub mod codec;
pub mod config;
pub mod embed;
pub mod error;

pub use catalog::{
    Catalogue, CatalogueIndex, MatchMode, ProducerVersion, Registry, Resolution, Seed, SourceUnit,
};
pub use error::{ExpanderError, Result};
