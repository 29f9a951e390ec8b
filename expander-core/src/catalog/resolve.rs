//! Seeds and resolution results for dependency-closure queries

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::SourceUnit;

/// How referenced names are matched against declared names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    /// Name must equal a declared name verbatim
    Exact,
    /// Namespace qualification and generic arguments are ignored on both sides
    #[default]
    SimpleName,
}

impl MatchMode {
    /// Whether `query` refers to `declared` under this mode
    pub fn matches(self, query: &str, declared: &str) -> bool {
        match self {
            MatchMode::Exact => query == declared,
            MatchMode::SimpleName => simple_name(query) == simple_name(declared),
        }
    }
}

/// Reduce `Namespace.Outer.Generic<T>` to `Generic`.
///
/// Everything from the first `<` is dropped, then everything up to and
/// including the last remaining `.`.
pub fn simple_name(name: &str) -> &str {
    let head = match name.find('<') {
        Some(open) => &name[..open],
        None => name,
    };
    match head.rfind('.') {
        Some(dot) => &head[dot + 1..],
        None => head,
    }
}

/// Starting point of a closure computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    /// Explicit unit keys
    Keys(Vec<String>),
    /// Referenced type names, matched against declared names
    Names { names: Vec<String>, mode: MatchMode },
}

impl Seed {
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Seed::Keys(keys.into_iter().map(Into::into).collect())
    }

    pub fn names<I, S>(names: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Seed::Names {
            names: names.into_iter().map(Into::into).collect(),
            mode,
        }
    }
}

/// Ordered, de-duplicated set of units that must be inlined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    units: Vec<&'a SourceUnit>,
    unresolved: Vec<String>,
}

impl<'a> Resolution<'a> {
    pub(crate) fn new(units: Vec<&'a SourceUnit>, unresolved: Vec<String>) -> Self {
        Self { units, unresolved }
    }

    /// Units in resolution order: seeds first, then breadth-first dependencies
    pub fn units(&self) -> &[&'a SourceUnit] {
        &self.units
    }

    /// Keys of the included units, in resolution order
    pub fn keys(&self) -> Vec<&'a str> {
        self.units.iter().map(|unit| unit.key.as_str()).collect()
    }

    /// Dependency keys that were not present in the index
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// `restore()` of every included unit, in resolution order
    pub fn restored(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.restore()).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Render all units as one source text.
    ///
    /// Imports of every unit are hoisted to the top (first occurrence wins),
    /// followed by the bodies in resolution order.
    pub fn render(&self) -> String {
        let mut seen = HashSet::new();
        let imports: Vec<&str> = self
            .units
            .iter()
            .flat_map(|unit| unit.imports.iter())
            .filter(|import| seen.insert(import.as_str()))
            .map(String::as_str)
            .collect();

        let mut text = String::new();
        for import in &imports {
            text.push_str(import);
            text.push('\n');
        }
        for unit in &self.units {
            text.push_str(&unit.body);
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod resolve_tests {
    use super::*;

    #[test]
    fn test_simple_name_strips_namespace_and_generics() {
        assert_eq!(simple_name("Namespace.Outer.Generic<T>"), "Generic");
        assert_eq!(simple_name("Foo"), "Foo");
        assert_eq!(simple_name("Foo<int>"), "Foo");
        assert_eq!(simple_name("A.B.Map<A.Key, A.Value>"), "Map");
        assert_eq!(simple_name("System.Collections"), "Collections");
    }

    #[test]
    fn test_match_modes() {
        assert!(MatchMode::SimpleName.matches("Foo", "Namespace.Foo<T>"));
        assert!(!MatchMode::Exact.matches("Foo", "Namespace.Foo<T>"));
        assert!(MatchMode::Exact.matches("Namespace.Foo<T>", "Namespace.Foo<T>"));
        assert!(!MatchMode::SimpleName.matches("Bar", "Namespace.Foo<T>"));
    }

    #[test]
    fn test_render_hoists_unique_imports() {
        let a = SourceUnit::new("a", "class A {}").with_imports(["using System;"]);
        let b = SourceUnit::new("b", "class B {}")
            .with_imports(["using System;", "using System.Linq;"]);
        let resolution = Resolution::new(vec![&a, &b], Vec::new());

        assert_eq!(
            resolution.render(),
            "using System;\nusing System.Linq;\nclass A {}\nclass B {}\n"
        );
    }
}
