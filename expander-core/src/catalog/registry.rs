//! Build-session registry of catalogue producers
//!
//! Discovery code queues producer callbacks; nothing is evaluated until the
//! registry is first enumerated. The first enumeration runs every queued
//! callback exactly once, in registration order, and freezes the result.
//!
//! Registrations that arrive once the first enumeration has started,
//! including ones made from inside a producer, are dropped with a warning.
//! Callers must finish registering before anything reads the registry.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, warn};

use super::{Catalogue, CatalogueIndex, ProducerVersion, SourceUnit};
use crate::error::Result;

/// Deferred producer of zero or more catalogues
type Producer = Box<dyn FnOnce() -> Result<Vec<Catalogue>> + Send>;

/// Prefix for catalogues wrapping units registered without a producer name
pub const ANONYMOUS_PRODUCER_PREFIX: &str = "registered#";

#[derive(Default)]
struct Queue {
    producers: Vec<(String, Producer)>,
    registered: usize,
    /// Set once the first enumeration has taken the producers
    frozen: bool,
}

/// Queue-then-freeze aggregator owned by one build session
#[derive(Default)]
pub struct Registry {
    queue: Mutex<Queue>,
    snapshot: OnceLock<Vec<Catalogue>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a single unit
    pub fn register<F>(&self, producer: F)
    where
        F: FnOnce() -> SourceUnit + Send + 'static,
    {
        self.register_batch(move || vec![producer()]);
    }

    /// Queue a batch of units, wrapped in an anonymous catalogue
    pub fn register_batch<F>(&self, producer: F)
    where
        F: FnOnce() -> Vec<SourceUnit> + Send + 'static,
    {
        let mut queue = self.lock();
        let name = format!("{ANONYMOUS_PRODUCER_PREFIX}{}", queue.registered);
        let producer_name = name.clone();
        self.push(
            &mut queue,
            name,
            Box::new(move || {
                Catalogue::new(producer_name, ProducerVersion::current(), producer())
                    .map(|catalogue| vec![catalogue])
            }),
        );
    }

    /// Queue a producer of whole catalogues, e.g. one discovered artifact
    pub fn register_catalogues<F>(&self, origin: impl Into<String>, producer: F)
    where
        F: FnOnce() -> Result<Vec<Catalogue>> + Send + 'static,
    {
        let mut queue = self.lock();
        self.push(&mut queue, origin.into(), Box::new(producer));
    }

    fn push(&self, queue: &mut Queue, origin: String, producer: Producer) {
        if queue.frozen {
            warn!(
                origin = %origin,
                "Producer registered after the registry was enumerated; it will never be observed"
            );
            return;
        }
        queue.registered += 1;
        queue.producers.push((origin, producer));
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the first enumeration has already happened
    pub fn is_frozen(&self) -> bool {
        self.lock().frozen
    }

    /// Frozen catalogues, evaluating queued producers on first access
    pub fn catalogues(&self) -> &[Catalogue] {
        self.snapshot.get_or_init(|| {
            // Release the lock before running producers; they may register more.
            let producers = {
                let mut queue = self.lock();
                queue.frozen = true;
                std::mem::take(&mut queue.producers)
            };
            let mut catalogues = Vec::new();

            for (origin, producer) in producers {
                match producer() {
                    Ok(produced) => {
                        debug!(origin = %origin, catalogues = produced.len(), "Evaluated producer");
                        catalogues.extend(produced);
                    }
                    Err(e) => e.log(&origin),
                }
            }

            debug!(catalogues = catalogues.len(), "Registry frozen");
            catalogues
        })
    }

    /// Every registered unit, in registration order
    pub fn enumerate(&self) -> impl Iterator<Item = &SourceUnit> {
        self.catalogues().iter().flat_map(|catalogue| catalogue.units())
    }

    /// Build a resolver over the frozen snapshot
    pub fn build_index(&self) -> Result<CatalogueIndex> {
        CatalogueIndex::build(self.catalogues())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.lock();
        f.debug_struct("Registry")
            .field("pending", &queue.producers.len())
            .field("frozen", &queue.frozen)
            .finish()
    }
}
