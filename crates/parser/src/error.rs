//! Conversion of nom errors into located parse failures.

use fuzzplug_core::PlugError;
use nom::error::{Error, ErrorKind};

use crate::lexer::Span;

/// Converts a nom error raised while parsing `src` into a [`PlugError::Parse`].
pub fn to_parse_error(name: &str, src: &str, err: nom::Err<Error<Span>>) -> PlugError {
    match err {
        nom::Err::Incomplete(_) => PlugError::parse(name, src, src.len(), "unexpected end of file"),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = e.input.location_offset();
            PlugError::parse(name, src, offset, describe(e.code, e.input.fragment()))
        }
    }
}

/// First token of `rest`, for messages.
fn token(rest: &str) -> &str {
    let rest = rest.trim_start();
    let end = rest
        .char_indices()
        .find(|(i, c)| c.is_whitespace() || (*i > 0 && !crate::lexer::is_ident_char(*c)))
        .map_or(rest.len(), |(i, _)| i);
    &rest[..end]
}

fn describe(kind: ErrorKind, rest: &str) -> String {
    if rest.trim().is_empty() {
        return "unexpected end of file".to_string();
    }

    match kind {
        ErrorKind::Escaped => "unterminated string literal".to_string(),
        ErrorKind::Char if rest.starts_with("/*") => "unterminated comment".to_string(),
        ErrorKind::Verify if rest.starts_with('(') => {
            "mixed named and unnamed parameters".to_string()
        }
        ErrorKind::Tag if !rest.trim_start().starts_with("package") => {
            format!("expected package clause, found `{}`", token(rest))
        }
        ErrorKind::Eof => format!("expected declaration, found `{}`", token(rest)),
        _ => format!("unexpected `{}`", token(rest)),
    }
}
