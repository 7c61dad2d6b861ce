//! Function signatures recovered from plugin sources.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical return type of a function without results.
pub const VOID: &str = "void";

/// Marker emitted for function-typed parameters and results.
pub const FUNC_MARKER: &str = "func(...)";

/// Canonical string form of a declared Go type.
///
/// Two types are the same exactly when their canonical strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedType(String);

impl ParsedType {
    pub fn new(repr: impl Into<String>) -> Self {
        Self(repr.into())
    }

    /// The `void` pseudo type of functions without results.
    pub fn void() -> Self {
        Self(VOID.to_string())
    }

    /// Placeholder for type forms the canonicalizer does not model.
    pub fn opaque(kind: &str) -> Self {
        Self(format!("<unsupported: {}>", kind))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a variadic `...T` parameter type.
    pub fn is_variadic(&self) -> bool {
        self.0.starts_with("...")
    }

    /// Whether this type came from an unsupported form.
    pub fn is_opaque(&self) -> bool {
        self.0.starts_with("<unsupported")
    }
}

impl fmt::Display for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParsedType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for ParsedType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ParsedType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParsedType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: impl Into<ParsedType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Renders the parameter as it appears in a Go parameter list.
    pub fn formal(&self) -> String {
        format!("{} {}", self.name, self.ty)
    }

    /// Renders the parameter as a call argument (variadics are spread).
    pub fn actual(&self) -> String {
        if self.ty.is_variadic() {
            format!("{}...", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)
    }
}

/// Parameters and return type of one function declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub return_type: ParsedType,
}

impl Signature {
    pub fn new(parameters: Vec<Parameter>, return_type: impl Into<ParsedType>) -> Self {
        Self {
            parameters,
            return_type: return_type.into(),
        }
    }

    /// Appends a parameter unless the same (name, type) pair is already present.
    pub fn push_parameter(&mut self, param: Parameter) -> bool {
        if self.parameters.contains(&param) {
            return false;
        }
        self.parameters.push(param);
        true
    }

    /// Canonical return type for a list of result types.
    pub fn return_type_of(results: &[ParsedType]) -> ParsedType {
        match results {
            [] => ParsedType::void(),
            [single] => single.clone(),
            many => ParsedType::new(format!(
                "({})",
                many.iter()
                    .map(ParsedType::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new(Vec::new(), ParsedType::void())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", formal_list(&self.parameters), self.return_type)
    }
}

/// Comma-joined `name type` list used in wrapper declarations.
pub fn formal_list(params: &[Parameter]) -> String {
    params
        .iter()
        .map(Parameter::formal)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comma-joined `name` list used at the wrapper's call site.
pub fn actual_list(params: &[Parameter]) -> String {
    params
        .iter()
        .map(Parameter::actual)
        .collect::<Vec<_>>()
        .join(", ")
}
