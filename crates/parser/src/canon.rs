//! Canonical string rendering of type expressions.

use fuzzplug_core::{FUNC_MARKER, ParsedType};

use crate::ast::{ChanDir, TypeExpr};

/// Renders a type expression into its canonical form.
///
/// Struct, interface and generic instantiation types are not modelled and
/// become `<unsupported: KIND>` placeholders, which never equal a contract
/// type.
pub fn canonicalize(ty: &TypeExpr) -> ParsedType {
    ParsedType::new(render(ty))
}

fn render(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Ident(name) => name.clone(),
        TypeExpr::Selector { qualifier, name } => format!("{}.{}", render(qualifier), name),
        TypeExpr::Pointer(pointee) => format!("*{}", render(pointee)),
        TypeExpr::Slice(elem) | TypeExpr::Array { elem, .. } => format!("[]{}", render(elem)),
        TypeExpr::Ellipsis(elem) => format!("...{}", render(elem)),
        TypeExpr::Map { key, value } => format!("map[{}]{}", render(key), render(value)),
        TypeExpr::Chan { dir, elem } => match dir {
            ChanDir::Both => format!("chan {}", render(elem)),
            ChanDir::Send => format!("chan<- {}", render(elem)),
            ChanDir::Recv => format!("<-chan {}", render(elem)),
        },
        TypeExpr::Func { .. } => FUNC_MARKER.to_string(),
        TypeExpr::Paren(inner) => render(inner),
        TypeExpr::Struct | TypeExpr::Interface | TypeExpr::Generic { .. } => {
            ParsedType::opaque(ty.kind()).to_string()
        }
    }
}
