//! Source catalogues - data model, dependency resolution and aggregation
//!
//! A producer library embeds a catalogue of its source units in its build
//! artifact. A consumer merges the catalogues of every upstream artifact and
//! pulls back the minimal closure of units its code references.
//!
//! # Architecture
//!
//! ```text
//! Registry (one per build session)
//!     │  queued producers, evaluated on first read
//!     ▼
//! Catalogue × N  ← one per decoded artifact blob
//!     │
//!     ▼
//! CatalogueIndex ← merged by key, duplicate keys rejected
//!     │  resolve(Seed)
//!     ▼
//! Resolution     ← seeds first, then breadth-first dependencies
//! ```

mod index;
mod manifest;
mod registry;
mod resolve;
mod unit;

pub use index::CatalogueIndex;
pub use manifest::{Catalogue, ProducerVersion};
pub use registry::{Registry, ANONYMOUS_PRODUCER_PREFIX};
pub use resolve::{simple_name, MatchMode, Resolution, Seed};
pub use unit::{SourceUnit, KEY_SEPARATOR};
