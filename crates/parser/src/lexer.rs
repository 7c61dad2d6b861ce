//! Lexical building blocks for Go source: whitespace, comments, identifiers,
//! literals, and token-aware skipping of regions the parser does not model.

use nom::error::{Error, ErrorKind};
use nom::{IResult, Input};
use nom_locate::LocatedSpan;

/// Input type with position tracking.
pub type Span<'a> = LocatedSpan<&'a str>;

/// Creates a new span from a string slice.
pub fn span(input: &str) -> Span<'_> {
    Span::new(input)
}

/// Unicode byte order mark some editors write at the start of a file.
const BOM: char = '\u{feff}';

/// Span over a whole source file, starting after a leading byte order mark.
///
/// Offsets stay relative to the start of `text`.
pub fn file_span(text: &str) -> Span<'_> {
    let input = span(text);
    if text.starts_with(BOM) {
        split(input, BOM.len_utf8()).0
    } else {
        input
    }
}

/// Go keywords; never valid identifiers.
const KEYWORDS: [&str; 25] = [
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Builds a recoverable nom error at `input`.
pub fn fail<O>(input: Span, kind: ErrorKind) -> IResult<Span, O> {
    Err(nom::Err::Error(Error::new(input, kind)))
}

/// Builds an unrecoverable nom error at `input`.
pub fn abort<O>(input: Span, kind: ErrorKind) -> IResult<Span, O> {
    Err(nom::Err::Failure(Error::new(input, kind)))
}

/// Splits `input` after `len` bytes.
fn split(input: Span, len: usize) -> (Span, Span) {
    input.take_split(len)
}

/// Length in bytes of a comment at the start of `s`, if any.
///
/// An unterminated block comment yields `Err`.
fn comment_len(s: &str) -> Option<Result<usize, ()>> {
    if s.starts_with("//") {
        return Some(Ok(s.find('\n').unwrap_or(s.len())));
    }
    if let Some(rest) = s.strip_prefix("/*") {
        return Some(rest.find("*/").map(|end| end + 4).ok_or(()));
    }
    None
}

/// Skips whitespace (including newlines) and comments.
pub fn ws(input: Span) -> IResult<Span, ()> {
    let s = *input.fragment();
    let mut pos = 0;

    loop {
        let rest = &s[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();

        match comment_len(trimmed) {
            Some(Ok(len)) => pos += len,
            Some(Err(())) => return abort(split(input, pos).0, ErrorKind::Char),
            None => break,
        }
    }

    Ok((split(input, pos).0, ()))
}

/// Parses an identifier (keywords excluded).
pub fn identifier(input: Span) -> IResult<Span, String> {
    let s = *input.fragment();
    let mut chars = s.char_indices();

    match chars.next() {
        Some((_, c)) if is_ident_start(c) => {}
        _ => return fail(input, ErrorKind::Alpha),
    }

    let end = chars
        .find(|(_, c)| !is_ident_char(*c))
        .map_or(s.len(), |(i, _)| i);
    let word = &s[..end];

    if is_keyword(word) {
        return fail(input, ErrorKind::Verify);
    }

    let (rest, _) = split(input, end);
    Ok((rest, word.to_string()))
}

/// Matches a keyword that is not immediately followed by an identifier character.
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(Span<'a>) -> IResult<Span<'a>, Span<'a>> {
    move |input: Span<'a>| {
        let s = *input.fragment();
        if !s.starts_with(kw) || s[kw.len()..].chars().next().is_some_and(is_ident_char) {
            return fail(input, ErrorKind::Tag);
        }
        let (rest, word) = split(input, kw.len());
        Ok((rest, word))
    }
}

/// Length of a quoted literal (`"..."`, `` `...` `` or `'...'`) at the start of `s`.
///
/// `None` if `s` does not start with a quote, `Some(Err(()))` if the literal
/// is unterminated.
fn literal_len(s: &str) -> Option<Result<usize, ()>> {
    let quote = s.chars().next().filter(|c| matches!(c, '"' | '`' | '\''))?;

    if quote == '`' {
        return Some(s[1..].find('`').map(|end| end + 2).ok_or(()));
    }

    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            '\n' => return Some(Err(())),
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return Some(Ok(i + 1)),
            _ => escaped = false,
        }
    }
    Some(Err(()))
}

/// Parses an interpreted or raw string literal, returning it with its quotes.
pub fn string_literal(input: Span) -> IResult<Span, String> {
    let s = *input.fragment();
    if !s.starts_with(['"', '`']) {
        return fail(input, ErrorKind::Char);
    }

    match literal_len(s) {
        Some(Ok(len)) => {
            let (rest, lit) = split(input, len);
            Ok((rest, lit.fragment().to_string()))
        }
        _ => abort(input, ErrorKind::Escaped),
    }
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Skips a bracketed region starting at `input` (`(`, `[` or `{`), honouring
/// nested brackets, string/rune literals and comments. Returns the region.
pub fn balanced(input: Span) -> IResult<Span, Span> {
    let s = *input.fragment();
    let Some(open) = s.chars().next().filter(|c| matches!(c, '(' | '[' | '{')) else {
        return fail(input, ErrorKind::Char);
    };

    let mut stack = vec![closing(open)];
    let mut pos = 1;

    while pos < s.len() {
        let rest = &s[pos..];

        if let Some(len) = comment_len(rest) {
            match len {
                Ok(len) => pos += len,
                Err(()) => return abort(split(input, pos).0, ErrorKind::Char),
            }
            continue;
        }

        if let Some(len) = literal_len(rest) {
            match len {
                Ok(len) => pos += len,
                Err(()) => return abort(split(input, pos).0, ErrorKind::Escaped),
            }
            continue;
        }

        let Some(c) = rest.chars().next() else { break };
        match c {
            '(' | '[' | '{' => stack.push(closing(c)),
            ')' | ']' | '}' => {
                if stack.pop() != Some(c) {
                    return abort(split(input, pos).0, ErrorKind::Char);
                }
                if stack.is_empty() {
                    let (rest, region) = split(input, pos + 1);
                    return Ok((rest, region));
                }
            }
            _ => {}
        }
        pos += c.len_utf8();
    }

    abort(split(input, s.len()).0, ErrorKind::Eof)
}

/// Whether a token ending in `last` lets Go insert a semicolon at a line break.
fn ends_statement(last: &str) -> bool {
    let Some(c) = last.chars().next_back() else {
        return false;
    };
    if is_ident_char(c) {
        let word_start = last
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_ident_char(*c))
            .last()
            .map_or(0, |(i, _)| i);
        let word = &last[word_start..];
        return !is_keyword(word) || matches!(word, "break" | "continue" | "fallthrough" | "return");
    }
    matches!(c, ')' | ']' | '}' | '"' | '`' | '\'') || last.ends_with("++") || last.ends_with("--")
}

/// Skips one ungrouped `type`/`var`/`const` spec up to its terminating
/// semicolon or line break, honouring brackets, literals and comments.
pub fn skip_spec(input: Span) -> IResult<Span, Span> {
    let s = *input.fragment();
    let mut pos = 0;
    let mut last_token_end = 0;

    while pos < s.len() {
        let rest = &s[pos..];

        if let Some(len) = comment_len(rest) {
            let Ok(len) = len else {
                return abort(split(input, pos).0, ErrorKind::Char);
            };
            if rest[..len].contains('\n') && ends_statement(&s[..last_token_end]) {
                break;
            }
            pos += len;
            continue;
        }

        if let Some(len) = literal_len(rest) {
            let Ok(len) = len else {
                return abort(split(input, pos).0, ErrorKind::Escaped);
            };
            pos += len;
            last_token_end = pos;
            continue;
        }

        let Some(c) = rest.chars().next() else { break };
        match c {
            '\n' if ends_statement(&s[..last_token_end]) => break,
            ';' => break,
            '(' | '[' | '{' => {
                let (after, _) = balanced(split(input, pos).0)?;
                pos = after.location_offset() - input.location_offset();
                last_token_end = pos;
                continue;
            }
            ')' | ']' | '}' => break,
            c if c.is_whitespace() => {}
            _ => last_token_end = pos + c.len_utf8(),
        }
        pos += c.len_utf8();
    }

    if last_token_end == 0 {
        return fail(input, ErrorKind::Eof);
    }

    let (rest, spec) = split(input, last_token_end);
    Ok((rest, spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_skips_comments() {
        let (rest, ()) = ws(span("  // line\n /* block */\tfunc")).unwrap();
        assert_eq!(*rest.fragment(), "func");
    }

    #[test]
    fn test_ws_unterminated_block_comment() {
        assert!(matches!(ws(span(" /* open")), Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_file_span_skips_byte_order_mark() {
        let input = file_span("\u{feff}package main");
        assert_eq!(*input.fragment(), "package main");
        assert_eq!(input.location_offset(), 3);

        let input = file_span("package main");
        assert_eq!(input.location_offset(), 0);
    }

    #[test]
    fn test_identifier() {
        let (rest, id) = identifier(span("fuzzTypes.Req")).unwrap();
        assert_eq!(id, "fuzzTypes");
        assert_eq!(*rest.fragment(), ".Req");

        let (_, id) = identifier(span("данные int")).unwrap();
        assert_eq!(id, "данные");
    }

    #[test]
    fn test_identifier_rejects_keywords() {
        assert!(identifier(span("func")).is_err());
        assert!(identifier(span("chan int")).is_err());
        assert!(identifier(span("9lives")).is_err());
        assert!(identifier(span("funcName")).is_ok());
    }

    #[test]
    fn test_keyword_boundary() {
        assert!(keyword("func")(span("func F()")).is_ok());
        assert!(keyword("func")(span("funcF()")).is_err());
    }

    #[test]
    fn test_string_literals() {
        let (rest, lit) = string_literal(span(r#""a\"b" x"#)).unwrap();
        assert_eq!(lit, r#""a\"b""#);
        assert_eq!(*rest.fragment(), " x");

        let (_, lit) = string_literal(span("`raw\n\"x\"`")).unwrap();
        assert_eq!(lit, "`raw\n\"x\"`");

        assert!(matches!(string_literal(span("\"open")), Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_balanced_ignores_brackets_in_literals() {
        let src = "{ s := \"}\"; r := '}'; /* } */ if x { y() } } tail";
        let (rest, region) = balanced(span(src)).unwrap();
        assert_eq!(*rest.fragment(), " tail");
        assert!(region.fragment().ends_with("y() } }"));
    }

    #[test]
    fn test_balanced_unterminated() {
        assert!(matches!(balanced(span("{ x := 1")), Err(nom::Err::Failure(_))));
        assert!(matches!(balanced(span("{ x := (1 }")), Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_skip_spec_stops_at_line_end() {
        let (rest, spec) = skip_spec(span("x = 1\nfunc F() {}")).unwrap();
        assert_eq!(*spec.fragment(), "x = 1");
        assert_eq!(*rest.fragment(), "\nfunc F() {}");
    }

    #[test]
    fn test_skip_spec_continues_after_operator() {
        let (_, spec) = skip_spec(span("x = 1 +\n\t2\nvar y")).unwrap();
        assert_eq!(*spec.fragment(), "x = 1 +\n\t2");
    }

    #[test]
    fn test_skip_spec_spans_brackets() {
        let (_, spec) = skip_spec(span("T struct {\n\tA int\n}\n")).unwrap();
        assert_eq!(*spec.fragment(), "T struct {\n\tA int\n}");
    }
}
