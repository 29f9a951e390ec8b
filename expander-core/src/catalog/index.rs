//! Catalogue index and dependency-closure resolution
//!
//! The index merges the units of every supplied catalogue into one lookup by
//! key. Resolution walks `dependencies` breadth-first from a seed and returns
//! the units that must be inlined for the seed to compile standalone.

use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, trace};

use super::resolve::{simple_name, MatchMode, Resolution, Seed};
use super::{Catalogue, SourceUnit};
use crate::error::{ExpanderError, Result};

/// Merged, read-only view over one or more catalogues
#[derive(Debug, Clone, Default)]
pub struct CatalogueIndex {
    /// Units in merge order
    units: Vec<SourceUnit>,

    /// Identity of the catalogue each unit came from
    origins: Vec<String>,

    by_key: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
    by_simple_name: HashMap<String, Vec<usize>>,
}

impl CatalogueIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge catalogues into an index.
    ///
    /// Fails with `DuplicateKey` on the first key supplied twice; no partial
    /// index is returned.
    pub fn build<'a, I>(catalogues: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Catalogue>,
    {
        let mut index = Self::new();
        for catalogue in catalogues {
            let origin = catalogue.identity();
            for unit in catalogue.units() {
                index.insert(&origin, unit.clone())?;
            }
            debug!(
                producer = catalogue.producer_name(),
                units = catalogue.len(),
                "Merged catalogue into index"
            );
        }
        Ok(index)
    }

    fn insert(&mut self, origin: &str, unit: SourceUnit) -> Result<()> {
        if let Some(&existing) = self.by_key.get(&unit.key) {
            return Err(ExpanderError::DuplicateKey {
                key: unit.key,
                first: self.origins[existing].clone(),
                second: origin.to_string(),
            });
        }

        let slot = self.units.len();
        for name in &unit.declared_names {
            push_unique(self.by_name.entry(name.clone()).or_default(), slot);
            push_unique(
                self.by_simple_name
                    .entry(simple_name(name).to_string())
                    .or_default(),
                slot,
            );
        }
        self.by_key.insert(unit.key.clone(), slot);
        self.origins.push(origin.to_string());
        self.units.push(unit);
        Ok(())
    }

    /// Look up a unit by key
    pub fn get(&self, key: &str) -> Option<&SourceUnit> {
        self.by_key.get(key).map(|&slot| &self.units[slot])
    }

    /// Identity (`name@version`) of the catalogue that supplied `key`
    pub fn origin(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(|&slot| self.origins[slot].as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units declaring `name` under the given match mode, in merge order
    pub fn find_by_name(&self, name: &str, mode: MatchMode) -> Vec<&SourceUnit> {
        self.slots_for_name(name, mode)
            .iter()
            .map(|&slot| &self.units[slot])
            .collect()
    }

    fn slots_for_name(&self, name: &str, mode: MatchMode) -> &[usize] {
        let slots = match mode {
            MatchMode::Exact => self.by_name.get(name),
            MatchMode::SimpleName => self.by_simple_name.get(simple_name(name)),
        };
        slots.map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve the closure of a seed
    pub fn resolve(&self, seed: &Seed) -> Resolution<'_> {
        match seed {
            Seed::Keys(keys) => self.resolve_keys(keys.as_slice()),
            Seed::Names { names, mode } => self.resolve_names(names.as_slice(), *mode),
        }
    }

    /// Closure starting from explicit unit keys.
    ///
    /// Seed keys missing from the index are reported as unresolved.
    pub fn resolve_keys<S: AsRef<str>>(&self, keys: &[S]) -> Resolution<'_> {
        let mut walk = Walk::default();
        for key in keys {
            walk.visit(self, key.as_ref());
        }
        walk.finish(self)
    }

    /// Closure starting from referenced type names.
    ///
    /// A name matching nothing is assumed to be supplied externally; a name
    /// matching several units seeds all of them.
    pub fn resolve_names<S: AsRef<str>>(&self, names: &[S], mode: MatchMode) -> Resolution<'_> {
        let mut walk = Walk::default();
        for name in names {
            let name = name.as_ref();
            let slots = self.slots_for_name(name, mode);
            if slots.is_empty() {
                trace!(name, ?mode, "Referenced name has no catalogued unit");
            }
            for &slot in slots {
                walk.visit(self, &self.units[slot].key);
            }
        }
        walk.finish(self)
    }
}

/// Breadth-first traversal state for one resolution
#[derive(Default)]
struct Walk<'a> {
    visited: HashSet<&'a str>,
    missing: HashSet<String>,
    order: Vec<usize>,
    queue: VecDeque<usize>,
    unresolved: Vec<String>,
}

impl<'a> Walk<'a> {
    fn visit(&mut self, index: &'a CatalogueIndex, key: &str) {
        match index.by_key.get_key_value(key) {
            Some((stored, &slot)) => {
                if self.visited.insert(stored.as_str()) {
                    self.order.push(slot);
                    self.queue.push_back(slot);
                }
            }
            None => {
                if self.missing.insert(key.to_string()) {
                    debug!(key, "Dependency not in index, assuming it is available externally");
                    self.unresolved.push(key.to_string());
                }
            }
        }
    }

    fn finish(mut self, index: &'a CatalogueIndex) -> Resolution<'a> {
        while let Some(slot) = self.queue.pop_front() {
            for dependency in &index.units[slot].dependencies {
                self.visit(index, dependency);
            }
        }

        let units = self.order.iter().map(|&slot| &index.units[slot]).collect();
        Resolution::new(units, self.unresolved)
    }
}

fn push_unique(slots: &mut Vec<usize>, slot: usize) {
    if slots.last() != Some(&slot) {
        slots.push(slot);
    }
}

#[cfg(test)]
mod index_tests {
    use super::*;
    use crate::catalog::ProducerVersion;

    fn unit(key: &str, deps: &[&str]) -> SourceUnit {
        SourceUnit::new(key, format!("// {key}")).with_dependencies(deps.iter().copied())
    }

    fn catalogue(name: &str, units: Vec<SourceUnit>) -> Catalogue {
        Catalogue::new(name, ProducerVersion::new(1, 0, 0), units).unwrap()
    }

    fn index_of(units: Vec<SourceUnit>) -> CatalogueIndex {
        CatalogueIndex::build([&catalogue("Lib", units)]).unwrap()
    }

    #[test]
    fn test_chain_closure() {
        let index = index_of(vec![unit("A", &["B"]), unit("B", &["C"]), unit("C", &[])]);

        let resolution = index.resolve_keys(&["A"]);
        assert_eq!(resolution.keys(), vec!["A", "B", "C"]);
        assert!(resolution.unresolved().is_empty());
    }

    #[test]
    fn test_diamond_visits_shared_dependency_once() {
        let index = index_of(vec![
            unit("A", &["B", "D"]),
            unit("B", &["C"]),
            unit("D", &["C"]),
            unit("C", &[]),
        ]);

        let resolution = index.resolve_keys(&["A"]);
        assert_eq!(resolution.keys(), vec!["A", "B", "D", "C"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let index = index_of(vec![unit("A", &["B"]), unit("B", &["A"])]);

        let resolution = index.resolve_keys(&["A"]);
        assert_eq!(resolution.keys(), vec!["A", "B"]);
    }

    #[test]
    fn test_self_dependency() {
        let index = index_of(vec![unit("A", &["A"])]);
        assert_eq!(index.resolve_keys(&["A"]).keys(), vec!["A"]);
    }

    #[test]
    fn test_dangling_dependency_is_dropped() {
        let index = index_of(vec![unit("A", &["ghost"])]);

        let resolution = index.resolve_keys(&["A"]);
        assert_eq!(resolution.keys(), vec!["A"]);
        assert_eq!(resolution.unresolved(), ["ghost".to_string()]);
    }

    #[test]
    fn test_seeds_come_first_in_caller_order() {
        let index = index_of(vec![
            unit("A", &["C"]),
            unit("B", &["A"]),
            unit("C", &[]),
        ]);

        let resolution = index.resolve_keys(&["B", "A", "B"]);
        assert_eq!(resolution.keys(), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let index = index_of(vec![unit("A", &["B", "C"]), unit("B", &[]), unit("C", &["B"])]);

        let first = index.resolve_keys(&["A"]);
        let second = index.resolve_keys(&["A"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_key_across_catalogues() {
        let left = catalogue("LibA", vec![unit("X.cs", &[])]);
        let right = catalogue("LibB", vec![unit("X.cs", &[])]);

        let err = CatalogueIndex::build([&left, &right]).unwrap_err();
        assert_eq!(
            err,
            ExpanderError::DuplicateKey {
                key: "X.cs".to_string(),
                first: "LibA@1.0.0".to_string(),
                second: "LibB@1.0.0".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_by_simple_name() {
        let foo = unit("Foo.cs", &["Bar.cs"]).with_declared_names(["Namespace.Foo<T>"]);
        let bar = unit("Bar.cs", &[]).with_declared_names(["Namespace.Bar"]);
        let index = index_of(vec![foo, bar]);

        let simple = index.resolve_names(&["Foo"], MatchMode::SimpleName);
        assert_eq!(simple.keys(), vec!["Foo.cs", "Bar.cs"]);

        let exact = index.resolve_names(&["Foo"], MatchMode::Exact);
        assert!(exact.is_empty());

        let exact = index.resolve_names(&["Namespace.Foo<T>"], MatchMode::Exact);
        assert_eq!(exact.keys(), vec!["Foo.cs", "Bar.cs"]);
    }

    #[test]
    fn test_ambiguous_simple_name_seeds_all_matches() {
        let first = unit("One.cs", &[]).with_declared_names(["One.Node"]);
        let second = unit("Two.cs", &[]).with_declared_names(["Two.Node<T>", "Two.Node"]);
        let index = index_of(vec![first, second]);

        assert_eq!(index.find_by_name("Node", MatchMode::SimpleName).len(), 2);
        let resolution = index.resolve(&Seed::names(["Node"], MatchMode::SimpleName));
        assert_eq!(resolution.keys(), vec!["One.cs", "Two.cs"]);
    }

    #[test]
    fn test_unknown_name_is_not_an_error() {
        let index = index_of(vec![unit("A", &[])]);
        let resolution = index.resolve_names(&["System.String"], MatchMode::SimpleName);
        assert!(resolution.is_empty());
        assert!(resolution.unresolved().is_empty());
    }

    #[test]
    fn test_origin_and_lookup() {
        let index = index_of(vec![unit("A", &[])]);
        assert_eq!(index.origin("A"), Some("Lib@1.0.0"));
        assert!(index.contains("A"));
        assert!(index.get("B").is_none());
        assert_eq!(index.len(), 1);
    }
}
