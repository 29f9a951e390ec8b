//! A single catalogued source file

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator between producer name and relative path in conventional keys
pub const KEY_SEPARATOR: char = 'ᐳ';

/// One source file's metadata plus its import-stripped body.
///
/// Field order is the canonical serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUnit {
    /// Unique key, conventionally `<producer>ᐳ<relative path>`
    pub key: String,

    /// Fully qualified names this unit provides
    #[serde(default)]
    pub declared_names: Vec<String>,

    /// Import statements the body needs to compile standalone
    #[serde(default)]
    pub imports: Vec<String>,

    /// Keys of units this one directly requires
    #[serde(default)]
    pub dependencies: BTreeSet<String>,

    /// Code with its own imports stripped
    pub body: String,
}

impl SourceUnit {
    /// Create a unit with no names, imports or dependencies
    pub fn new(key: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            declared_names: Vec::new(),
            imports: Vec::new(),
            dependencies: BTreeSet::new(),
            body: body.into(),
        }
    }

    /// Build the conventional `<producer>ᐳ<path>` key
    pub fn conventional_key(producer: &str, relative_path: &str) -> String {
        format!("{producer}{KEY_SEPARATOR}{relative_path}")
    }

    pub fn with_declared_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Reassemble the standalone source text: imports, a newline, then the body.
    ///
    /// A unit without imports restores to its body alone.
    pub fn restore(&self) -> String {
        if self.imports.is_empty() {
            return self.body.clone();
        }
        let mut text = self.imports.join("\n");
        text.push('\n');
        text.push_str(&self.body);
        text
    }

    /// Namespace-like containers implied by the declared names.
    ///
    /// `A.B.Type` contributes `A.B`; unqualified names contribute nothing.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.declared_names.iter().filter_map(|name| {
            let head = name.split('<').next().unwrap_or(name);
            head.rfind('.').map(|dot| &head[..dot])
        })
    }
}
