//! Nom parser combinators for the Go subset fuzzplug inspects.
//!
//! The grammar covers package clauses, import declarations and function
//! signatures in full. Function bodies and `type`/`var`/`const`
//! declarations are only checked for balanced brackets, literals and
//! comments, then skipped.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{cut, eof, map, opt, peek},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{pair, preceded, terminated},
};

use crate::ast::*;
use crate::lexer::{Span, balanced, identifier, keyword, skip_spec, string_literal, ws};

// ============================================================================
// Utility combinators
// ============================================================================

/// Parses an optional `;` with surrounding whitespace.
fn separator(input: Span) -> IResult<Span, ()> {
    let (input, _) = ws(input)?;
    let (input, _) = opt(char(';')).parse(input)?;
    let (input, _) = ws(input)?;
    Ok((input, ()))
}

/// Parses a comma with surrounding whitespace.
fn comma(input: Span) -> IResult<Span, ()> {
    let (input, _) = ws(input)?;
    let (input, _) = char(',')(input)?;
    let (input, _) = ws(input)?;
    Ok((input, ()))
}

/// Skips a region that must start with `open`.
fn bracketed<'a>(open: char) -> impl FnMut(Span<'a>) -> IResult<Span<'a>, Span<'a>> {
    move |input: Span<'a>| {
        let (_, _) = peek(char(open)).parse(input)?;
        balanced(input)
    }
}

// ============================================================================
// Package and imports
// ============================================================================

/// Parses: package name
pub fn package_clause(input: Span) -> IResult<Span, AstPackage> {
    let (input, _) = keyword("package")(input)?;
    let (input, _) = ws(input)?;
    let (input, name) = cut(identifier).parse(input)?;

    Ok((
        input,
        AstPackage {
            name,
            end: input.location_offset(),
        },
    ))
}

/// Parses: [name | . ] "path"
fn import_spec(input: Span) -> IResult<Span, AstImportSpec> {
    let (input, name) = opt(terminated(
        alt((identifier, map(char('.'), |_| ".".to_string()))),
        ws,
    ))
    .parse(input)?;
    let (input, path) = string_literal(input)?;

    Ok((input, AstImportSpec { name, path }))
}

/// Parses: ( spec ; spec ... )
fn import_group(input: Span) -> IResult<Span, Vec<AstImportSpec>> {
    let (input, _) = char('(')(input)?;
    let (input, _) = ws(input)?;
    let (input, specs) = many0(terminated(import_spec, separator)).parse(input)?;
    let (input, _) = cut(char(')')).parse(input)?;
    Ok((input, specs))
}

/// Parses: import spec | import ( ... )
pub fn import_decl(input: Span) -> IResult<Span, AstImportDecl> {
    let (input, _) = keyword("import")(input)?;
    let (input, _) = ws(input)?;
    let (input, specs) = cut(alt((import_group, map(import_spec, |spec| vec![spec])))).parse(input)?;

    Ok((
        input,
        AstImportDecl {
            specs,
            end: input.location_offset(),
        },
    ))
}

/// Parses the package clause and every import declaration, and nothing else.
pub fn header(input: Span) -> IResult<Span, AstHeader> {
    let (input, _) = ws(input)?;
    let (input, package) = cut(package_clause).parse(input)?;
    let (input, _) = separator(input)?;
    let (input, imports) = many0(terminated(import_decl, separator)).parse(input)?;

    Ok((input, AstHeader { package, imports }))
}

// ============================================================================
// Types
// ============================================================================

/// Parses any type expression.
pub fn type_expr(input: Span) -> IResult<Span, TypeExpr> {
    alt((
        pointer_type,
        array_or_slice_type,
        map_type,
        chan_type,
        func_type,
        map(
            preceded(keyword("struct"), preceded(ws, bracketed('{'))),
            |_| TypeExpr::Struct,
        ),
        map(
            preceded(keyword("interface"), preceded(ws, bracketed('{'))),
            |_| TypeExpr::Interface,
        ),
        paren_type,
        named_type,
    ))
    .parse(input)
}

/// Parses: *T
fn pointer_type(input: Span) -> IResult<Span, TypeExpr> {
    let (input, _) = char('*')(input)?;
    let (input, _) = ws(input)?;
    let (input, pointee) = type_expr(input)?;
    Ok((input, TypeExpr::Pointer(Box::new(pointee))))
}

/// Parses: []T | [N]T | [...]T
fn array_or_slice_type(input: Span) -> IResult<Span, TypeExpr> {
    let (input, region) = bracketed('[')(input)?;
    let (input, _) = ws(input)?;
    let (input, elem) = type_expr(input)?;

    let fragment = region.fragment();
    let len = fragment[1..fragment.len() - 1].trim();
    let elem = Box::new(elem);

    if len.is_empty() {
        Ok((input, TypeExpr::Slice(elem)))
    } else {
        Ok((
            input,
            TypeExpr::Array {
                len: len.to_string(),
                elem,
            },
        ))
    }
}

/// Parses: map[K]V
fn map_type(input: Span) -> IResult<Span, TypeExpr> {
    let (input, _) = keyword("map")(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('[')(input)?;
    let (input, _) = ws(input)?;
    let (input, key) = type_expr(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(']')(input)?;
    let (input, _) = ws(input)?;
    let (input, value) = type_expr(input)?;

    Ok((
        input,
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        },
    ))
}

/// Parses: chan T | chan<- T | <-chan T
fn chan_type(input: Span) -> IResult<Span, TypeExpr> {
    let (input, recv) = opt(terminated(tag("<-"), ws)).parse(input)?;
    let (input, _) = keyword("chan")(input)?;
    let (input, _) = ws(input)?;
    let (input, send) = if recv.is_none() {
        opt(terminated(tag("<-"), ws)).parse(input)?
    } else {
        (input, None)
    };
    let (input, elem) = type_expr(input)?;

    let dir = match (recv, send) {
        (Some(_), _) => ChanDir::Recv,
        (None, Some(_)) => ChanDir::Send,
        (None, None) => ChanDir::Both,
    };

    Ok((
        input,
        TypeExpr::Chan {
            dir,
            elem: Box::new(elem),
        },
    ))
}

/// Parses: func(params) results
fn func_type(input: Span) -> IResult<Span, TypeExpr> {
    let (input, _) = keyword("func")(input)?;
    let (input, _) = ws(input)?;
    let (input, params) = parameters(input)?;
    let (input, results) = results(input)?;
    Ok((input, TypeExpr::Func { params, results }))
}

/// Parses: (T)
fn paren_type(input: Span) -> IResult<Span, TypeExpr> {
    let (input, _) = char('(')(input)?;
    let (input, _) = ws(input)?;
    let (input, inner) = type_expr(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, TypeExpr::Paren(Box::new(inner))))
}

/// Parses: Name | pkg.Name, optionally instantiated as Name[Args]
fn named_type(input: Span) -> IResult<Span, TypeExpr> {
    let (input, first) = identifier(input)?;
    let (input, selected) = opt(preceded(char('.'), identifier)).parse(input)?;

    let named = match selected {
        Some(name) => TypeExpr::Selector {
            qualifier: Box::new(TypeExpr::Ident(first)),
            name,
        },
        None => TypeExpr::Ident(first),
    };

    let (input, args) = opt(bracketed('[')).parse(input)?;
    let ty = match args {
        Some(args) => {
            let fragment = args.fragment();
            TypeExpr::Generic {
                base: Box::new(named),
                args: fragment[1..fragment.len() - 1].trim().to_string(),
            }
        }
        None => named,
    };

    Ok((input, ty))
}

// ============================================================================
// Parameter lists
// ============================================================================

/// Parses: ...T
fn ellipsis_type(input: Span) -> IResult<Span, TypeExpr> {
    let (input, _) = tag("...")(input)?;
    let (input, _) = ws(input)?;
    let (input, elem) = type_expr(input)?;
    Ok((input, TypeExpr::Ellipsis(Box::new(elem))))
}

fn param_type(input: Span) -> IResult<Span, TypeExpr> {
    alt((ellipsis_type, type_expr)).parse(input)
}

/// Parses one entry of a parameter list: `name T` or a bare `T`.
fn param_entry(input: Span) -> IResult<Span, (Option<String>, TypeExpr)> {
    alt((
        map(pair(terminated(identifier, ws), param_type), |(name, ty)| {
            (Some(name), ty)
        }),
        map(param_type, |ty| (None, ty)),
    ))
    .parse(input)
}

/// Groups parameter entries the way Go does.
///
/// Either every entry is a bare type, or entries are names where a bare
/// identifier takes the type of the next named entry (`a, b int`). Returns
/// `None` when named and unnamed parameters are mixed.
fn group_params(entries: Vec<(Option<String>, TypeExpr)>) -> Option<Vec<AstField>> {
    if entries.iter().all(|(name, _)| name.is_none()) {
        return Some(
            entries
                .into_iter()
                .map(|(_, ty)| AstField {
                    names: Vec::new(),
                    ty,
                })
                .collect(),
        );
    }

    let mut fields = Vec::new();
    let mut pending = Vec::new();

    for (name, ty) in entries {
        match (name, ty) {
            (Some(name), ty) => {
                pending.push(name);
                fields.push(AstField {
                    names: std::mem::take(&mut pending),
                    ty,
                });
            }
            (None, TypeExpr::Ident(name)) => pending.push(name),
            (None, _) => return None,
        }
    }

    pending.is_empty().then_some(fields)
}

/// Parses: ( [entry {, entry} [,]] )
pub fn parameters(input: Span) -> IResult<Span, Vec<AstField>> {
    let start = input;
    let (input, _) = char('(')(input)?;
    let (input, _) = ws(input)?;
    let (input, entries) = separated_list0(comma, param_entry).parse(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = opt(char(',')).parse(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(')')(input)?;

    let fields = group_params(entries)
        .ok_or_else(|| nom::Err::Failure(Error::new(start, ErrorKind::Verify)))?;

    Ok((input, fields))
}

/// Parses an optional result clause: `(T1, T2)`, `(a, b T)` or a single type.
fn results(input: Span) -> IResult<Span, Vec<AstField>> {
    let (input, fields) = opt(preceded(
        ws,
        alt((
            parameters,
            map(type_expr, |ty| {
                vec![AstField {
                    names: Vec::new(),
                    ty,
                }]
            }),
        )),
    ))
    .parse(input)?;

    Ok((input, fields.unwrap_or_default()))
}

// ============================================================================
// Declarations
// ============================================================================

/// Parses: func [(recv)] Name [TypeParams] (params) [results] [{ body }]
pub fn func_decl(input: Span) -> IResult<Span, AstFuncDecl> {
    let (input, _) = keyword("func")(input)?;
    let (input, _) = ws(input)?;
    let (input, receiver) = opt(terminated(parameters, ws)).parse(input)?;
    let (input, name) = cut(identifier).parse(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = opt(terminated(bracketed('['), ws)).parse(input)?;
    let (input, params) = cut(parameters).parse(input)?;
    let (input, results) = results(input)?;
    let (input, _) = opt(preceded(ws, bracketed('{'))).parse(input)?;

    Ok((
        input,
        AstFuncDecl {
            name,
            receiver,
            params,
            results,
        },
    ))
}

/// Parses: type|var|const ( ... ) or a single spec.
fn gen_decl(input: Span) -> IResult<Span, AstDecl> {
    let (input, _) = alt((keyword("type"), keyword("var"), keyword("const"))).parse(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = cut(alt((bracketed('('), skip_spec))).parse(input)?;

    Ok((input, AstDecl::Gen))
}

/// Parses a top-level declaration.
fn top_level_decl(input: Span) -> IResult<Span, AstDecl> {
    alt((map(func_decl, AstDecl::Func), gen_decl)).parse(input)
}

// ============================================================================
// Root parser
// ============================================================================

/// Parses a complete Go source file.
pub fn source_file(input: Span) -> IResult<Span, AstFile> {
    let (input, header) = header(input)?;
    let (input, decls) = many0(terminated(top_level_decl, separator)).parse(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = cut(eof).parse(input)?;

    Ok((
        input,
        AstFile { header, decls },
    ))
}

// ============================================================================
// Tests
// ============================================================================
