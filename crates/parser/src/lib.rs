//! fuzzplug Parser - Go source introspection using nom combinators.
//!
//! Only the parts of Go that plugin packaging depends on are modelled:
//! package clause, imports and function signatures. Everything else is
//! skipped with bracket, literal and comment awareness.

mod ast;
mod canon;
mod combinators;
mod error;
mod extract;
mod lexer;

pub use canon::canonicalize;
pub use extract::{SourceFile, extract_imports_and_body, extract_signature};

pub use ast::{AstField, ChanDir, TypeExpr};

use std::path::Path;

use fuzzplug_core::{PluginUnit, Result, Signature};

/// Extracts the signature of `function` from the Go file at `path`.
pub fn signature_from_file(path: &Path, function: &str) -> Result<Signature> {
    SourceFile::read(path)?.signature(function)
}

/// Extracts imports and body from the Go file at `path`.
pub fn unit_from_file(path: &Path) -> Result<PluginUnit> {
    SourceFile::read(path)?.unit()
}
