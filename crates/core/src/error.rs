//! Error types for fuzzplug.

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::contract::Mismatch;
use crate::role::Role;

/// Result type alias for fuzzplug operations.
pub type Result<T> = std::result::Result<T, PlugError>;

/// Main error type for fuzzplug.
#[derive(Debug, Error, Diagnostic)]
pub enum PlugError {
    #[error("Failed to read {path}")]
    #[diagnostic(code(fuzzplug::io::read))]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    #[diagnostic(code(fuzzplug::io::write))]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(ParseFailure),

    #[error("Function '{0}' not found")]
    #[diagnostic(
        code(fuzzplug::function_not_found),
        help("the plugin file must declare a top-level function with this exact name")
    )]
    FunctionNotFound(String),

    #[error("Bad function definition for {role} plugin: {mismatch}")]
    #[diagnostic(code(fuzzplug::contract_mismatch))]
    ContractMismatch {
        role: Role,
        mismatch: Mismatch,
        /// Example of the calling form the role requires.
        #[help]
        expected: String,
    },

    #[error("Unsupported plugin role '{0}'")]
    #[diagnostic(
        code(fuzzplug::unknown_role),
        help("use one of: payloadProc, reactor, preprocess, payloadGen, reqSender")
    )]
    UnknownRole(String),

    #[error("Malformed template '{template}': {message}")]
    #[diagnostic(code(fuzzplug::template))]
    Template { template: String, message: String },

    #[error("Go toolchain not found: {0}")]
    #[diagnostic(code(fuzzplug::toolchain), help("install Go or pass --go <PATH>"))]
    ToolchainNotFound(String),

    #[error("Compilation failed: {command}")]
    #[diagnostic(code(fuzzplug::compile))]
    CompileFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A syntax error in a Go source file or template, with the offending location.
#[derive(Debug, Error, Diagnostic)]
#[error("Parse error: {message} (line {line}, column {column})")]
#[diagnostic(code(fuzzplug::parse))]
pub struct ParseFailure {
    pub message: String,
    pub line: usize,
    pub column: usize,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl PlugError {
    /// Builds a parse failure pointing at a byte offset of `src`.
    pub fn parse(name: impl AsRef<str>, src: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(src.len());
        let before = &src[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        let len = src[offset..].chars().next().map_or(0, char::len_utf8);

        PlugError::Parse(ParseFailure {
            message: message.into(),
            line,
            column,
            src: NamedSource::new(name, src.to_string()),
            span: Some(SourceSpan::from(offset..offset + len)),
        })
    }

    /// Wraps an IO error for a failed read of `path`.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlugError::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Wraps an IO error for a failed write of `path`.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlugError::FileWrite {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_position() {
        let src = "package main\n\nfunc (\n";
        let err = PlugError::parse("plugin.go", src, 19, "unexpected `(`");
        match err {
            PlugError::Parse(failure) => {
                assert_eq!(failure.line, 3);
                assert_eq!(failure.column, 6);
                assert!(failure.to_string().contains("unexpected `(`"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_at_eof() {
        let src = "package";
        let err = PlugError::parse("plugin.go", src, 100, "unexpected end of file");
        let PlugError::Parse(failure) = err else {
            panic!("expected parse failure");
        };
        assert_eq!(failure.line, 1);
        assert_eq!(failure.column, 8);
    }

    #[test]
    fn test_function_not_found_names_function() {
        let err = PlugError::FunctionNotFound("React".to_string());
        assert_eq!(err.to_string(), "Function 'React' not found");
    }
}
