//! Abstract Syntax Tree types for the parts of a Go file fuzzplug inspects.
//!
//! Function bodies and non-function declarations are kept as opaque byte
//! ranges; only package, imports and function signatures are modelled.

/// Root AST node representing a Go source file.
#[derive(Debug, Clone)]
pub struct AstFile {
    pub header: AstHeader,
    pub decls: Vec<AstDecl>,
}

/// Package clause.
#[derive(Debug, Clone)]
pub struct AstPackage {
    pub name: String,
    /// Byte offset just past the package name.
    pub end: usize,
}

/// Header of a file: package clause and import declarations only.
#[derive(Debug, Clone)]
pub struct AstHeader {
    pub package: AstPackage,
    pub imports: Vec<AstImportDecl>,
}

/// One `import` declaration, single or grouped.
#[derive(Debug, Clone)]
pub struct AstImportDecl {
    pub specs: Vec<AstImportSpec>,
    /// Byte offset just past the declaration (past `)` when grouped).
    pub end: usize,
}

/// One import spec inside an import declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct AstImportSpec {
    pub name: Option<String>,
    /// Path literal including its quotes.
    pub path: String,
}

/// Top-level declaration.
#[derive(Debug, Clone)]
pub enum AstDecl {
    Func(AstFuncDecl),
    /// `type`, `var` or `const` declaration; its contents are skipped.
    Gen,
}

/// Function or method declaration.
#[derive(Debug, Clone)]
pub struct AstFuncDecl {
    pub name: String,
    pub receiver: Option<Vec<AstField>>,
    pub params: Vec<AstField>,
    pub results: Vec<AstField>,
}

impl AstFuncDecl {
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

/// A group of names sharing one type, as in `a, b string`.
///
/// Unnamed parameters and results have no names.
#[derive(Debug, Clone, PartialEq)]
pub struct AstField {
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `int`, `Req`
    Ident(String),
    /// `pkg.Name`
    Selector { qualifier: Box<TypeExpr>, name: String },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T` or `[...]T`; the length is kept as written.
    Array { len: String, elem: Box<TypeExpr> },
    /// `...T` in the last parameter position.
    Ellipsis(Box<TypeExpr>),
    /// `map[K]V`
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    /// `func(...) ...`
    Func {
        params: Vec<AstField>,
        results: Vec<AstField>,
    },
    /// `(T)`
    Paren(Box<TypeExpr>),
    /// `struct { ... }`
    Struct,
    /// `interface { ... }`
    Interface,
    /// `T[A, B]`
    Generic { base: Box<TypeExpr>, args: String },
}

impl TypeExpr {
    /// Short name of the node kind, used for opaque placeholders.
    pub fn kind(&self) -> &'static str {
        match self {
            TypeExpr::Ident(_) => "identifier",
            TypeExpr::Selector { .. } => "selector",
            TypeExpr::Pointer(_) => "pointer",
            TypeExpr::Slice(_) => "slice",
            TypeExpr::Array { .. } => "array",
            TypeExpr::Ellipsis(_) => "ellipsis",
            TypeExpr::Map { .. } => "map",
            TypeExpr::Chan { .. } => "chan",
            TypeExpr::Func { .. } => "func",
            TypeExpr::Paren(_) => "paren",
            TypeExpr::Struct => "struct",
            TypeExpr::Interface => "interface",
            TypeExpr::Generic { .. } => "generic",
        }
    }
}
