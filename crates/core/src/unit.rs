//! Import set and body text of a plugin source file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contract::{Qualifiers, SHARED_PACKAGE};

/// One import spec, e.g. `"fmt"` or `ft "mod/components/fuzzTypes"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Local package name (`alias`, `.` or `_`), if one was given.
    pub alias: Option<String>,

    /// Import path exactly as written, including its quotes.
    pub path: String,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            alias: None,
            path: path.into(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Import path without its surrounding quotes.
    pub fn unquoted(&self) -> &str {
        self.path
            .strip_prefix(['"', '`'])
            .and_then(|p| p.strip_suffix(['"', '`']))
            .unwrap_or(&self.path)
    }

    /// Whether this import refers to the shared type package.
    pub fn is_shared_package(&self) -> bool {
        let path = self.unquoted();
        path == SHARED_PACKAGE || path.ends_with(&format!("/{}", SHARED_PACKAGE))
    }
}

impl fmt::Display for ImportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} {}", alias, self.path),
            None => f.write_str(&self.path),
        }
    }
}

/// What the merge step needs from a plugin file: its imports and its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginUnit {
    /// Imports in file order.
    pub imports: Vec<ImportSpec>,

    /// Source text after the last import declaration (the whole file without imports).
    pub body: String,

    /// Byte offset in the source where `body` starts.
    pub body_offset: usize,

    /// Byte offset in the source just past the package clause.
    pub package_end: usize,
}

impl PluginUnit {
    /// Literal import paths, in file order.
    pub fn import_paths(&self) -> Vec<&str> {
        self.imports.iter().map(|i| i.path.as_str()).collect()
    }

    /// Body text without a leading package clause.
    ///
    /// Only differs from `body` when the file has no imports, in which case
    /// the body starts at the top of the file.
    pub fn declarations(&self) -> &str {
        if self.body_offset < self.package_end {
            let skip = (self.package_end - self.body_offset).min(self.body.len());
            &self.body[skip..]
        } else {
            &self.body
        }
    }

    /// Shared-package qualifiers bound by this file's imports.
    pub fn qualifiers(&self) -> Qualifiers {
        self.imports
            .iter()
            .filter(|i| i.is_shared_package())
            .filter_map(|i| i.alias.as_deref())
            .filter(|alias| *alias != "_" && *alias != ".")
            .fold(Qualifiers::default(), |q, alias| q.with_alias(alias))
    }
}
