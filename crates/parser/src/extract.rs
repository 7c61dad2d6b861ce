//! Signature, import and body extraction from Go sources.

use std::path::Path;

use fuzzplug_core::{ImportSpec, Parameter, ParsedType, PlugError, PluginUnit, Result, Signature};
use tracing::debug;

use crate::ast::{AstDecl, AstFuncDecl, AstImportSpec};
use crate::canon::canonicalize;
use crate::combinators;
use crate::error::to_parse_error;
use crate::lexer::file_span;

/// Name used in diagnostics for sources that did not come from a file.
const UNNAMED: &str = "<string>";

/// Go source text together with the name diagnostics refer to it by.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Reads a source file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fuzzplug_core::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), text))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Signature of the top-level function `function`.
    ///
    /// The whole file must parse. Methods are never candidates; if several
    /// functions share the name, the last declaration wins.
    pub fn signature(&self, function: &str) -> Result<Signature> {
        let (_, file) = combinators::source_file(file_span(&self.text))
            .map_err(|e| to_parse_error(&self.name, &self.text, e))?;

        let decl = file
            .decls
            .iter()
            .filter_map(|decl| match decl {
                AstDecl::Func(func) if !func.is_method() && func.name == function => Some(func),
                _ => None,
            })
            .last()
            .ok_or_else(|| PlugError::FunctionNotFound(function.to_string()))?;

        let signature = signature_of(decl);
        debug!(
            file = %self.name,
            package = %file.header.package.name,
            function,
            %signature,
            "extracted signature"
        );
        Ok(signature)
    }

    /// Imports and the code following them.
    ///
    /// Only the package clause and import declarations are parsed; the rest
    /// of the file is taken verbatim.
    pub fn unit(&self) -> Result<PluginUnit> {
        let (_, header) = combinators::header(file_span(&self.text))
            .map_err(|e| to_parse_error(&self.name, &self.text, e))?;

        let imports: Vec<ImportSpec> = header
            .imports
            .iter()
            .flat_map(|decl| &decl.specs)
            .map(import_spec)
            .collect();

        let body_offset = header.imports.last().map_or(0, |decl| decl.end);
        debug!(
            file = %self.name,
            package = %header.package.name,
            imports = imports.len(),
            body_offset,
            "extracted imports"
        );

        Ok(PluginUnit {
            imports,
            body: self.text[body_offset..].to_string(),
            body_offset,
            package_end: header.package.end,
        })
    }
}

fn import_spec(spec: &AstImportSpec) -> ImportSpec {
    ImportSpec {
        alias: spec.name.clone(),
        path: spec.path.clone(),
    }
}

/// Flattens parameter and result clauses into a [`Signature`].
fn signature_of(decl: &AstFuncDecl) -> Signature {
    let mut signature = Signature::default();

    for field in &decl.params {
        let ty = canonicalize(&field.ty);
        for name in &field.names {
            signature.push_parameter(Parameter::new(name.clone(), ty.clone()));
        }
    }

    let results: Vec<ParsedType> = decl
        .results
        .iter()
        .flat_map(|field| std::iter::repeat_n(canonicalize(&field.ty), field.names.len().max(1)))
        .collect();
    signature.return_type = Signature::return_type_of(&results);

    signature
}

/// Extracts the signature of the top-level function `name` from `source`.
pub fn extract_signature(source: &str, name: &str) -> Result<Signature> {
    SourceFile::new(UNNAMED, source).signature(name)
}

/// Extracts the imports of `source` and the text after the last import declaration.
pub fn extract_imports_and_body(source: &str) -> Result<PluginUnit> {
    SourceFile::new(UNNAMED, source).unit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PROCESSOR: &str = r#"package main

import (
	"fmt"
	s "strings"
)

func helper(x int) int { return x }

func PayloadProcessor(payload string, seed int) string {
	return s.Repeat(payload, seed) + fmt.Sprint(helper(seed))
}
"#;

    #[test]
    fn test_payload_processor_signature() {
        let sig = extract_signature(PROCESSOR, "PayloadProcessor").unwrap();
        assert_eq!(
            sig.parameters,
            vec![
                Parameter::new("payload", "string"),
                Parameter::new("seed", "int")
            ]
        );
        assert_eq!(sig.return_type, "string");
    }

    #[test]
    fn test_unexported_functions_are_found() {
        let sig = extract_signature(PROCESSOR, "helper").unwrap();
        assert_eq!(sig.parameters, vec![Parameter::new("x", "int")]);
    }

    #[test]
    fn test_function_not_found() {
        let err = extract_signature(PROCESSOR, "React").unwrap_err();
        assert!(matches!(err, PlugError::FunctionNotFound(ref name) if name == "React"));
        assert!(err.to_string().contains("React"));
    }

    #[test]
    fn test_grouped_names_share_type() {
        let src = "package main\nfunc F(a, b string, c *fuzzTypes.Req) {}\n";
        let sig = extract_signature(src, "F").unwrap();
        assert_eq!(
            sig.parameters,
            vec![
                Parameter::new("a", "string"),
                Parameter::new("b", "string"),
                Parameter::new("c", "*fuzzTypes.Req"),
            ]
        );
        assert_eq!(sig.return_type, "void");
    }

    #[test]
    fn test_duplicates_dropped_by_name_and_type() {
        let src = "package main\nfunc F(a int, a int, a string) {}\n";
        let sig = extract_signature(src, "F").unwrap();
        assert_eq!(
            sig.parameters,
            vec![Parameter::new("a", "int"), Parameter::new("a", "string")]
        );
    }

    #[test]
    fn test_unnamed_parameters_are_skipped() {
        let src = "package main\nfunc F(int, string) (int, error) { return 0, nil }\n";
        let sig = extract_signature(src, "F").unwrap();
        assert!(sig.parameters.is_empty());
        assert_eq!(sig.return_type, "(int, error)");
    }

    #[test]
    fn test_named_results_counted_per_name() {
        let src = "package main\nfunc F() (x, y int) { return }\n";
        let sig = extract_signature(src, "F").unwrap();
        assert_eq!(sig.return_type, "(int, int)");
    }

    #[test]
    fn test_methods_are_not_candidates() {
        let src = "package main\ntype T struct{}\nfunc (t T) React() {}\n";
        assert!(matches!(
            extract_signature(src, "React"),
            Err(PlugError::FunctionNotFound(_))
        ));
    }

    #[test]
    fn test_last_declaration_wins() {
        let src = "package main\nfunc F(a int) {}\nfunc F(b string) string { return b }\n";
        let sig = extract_signature(src, "F").unwrap();
        assert_eq!(sig.parameters, vec![Parameter::new("b", "string")]);
        assert_eq!(sig.return_type, "string");
    }

    #[test]
    fn test_variadic_and_func_params() {
        let src = "package main\nfunc F(cb func(int) bool, rest ...string) {}\n";
        let sig = extract_signature(src, "F").unwrap();
        assert_eq!(
            sig.parameters,
            vec![
                Parameter::new("cb", "func(...)"),
                Parameter::new("rest", "...string")
            ]
        );
    }

    #[test]
    fn test_signature_requires_valid_file() {
        let src = "package main\nfunc F() {\n";
        assert!(matches!(extract_signature(src, "F"), Err(PlugError::Parse(_))));
    }

    #[test]
    fn test_imports_and_body() {
        let unit = extract_imports_and_body(PROCESSOR).unwrap();
        assert_eq!(unit.import_paths(), vec!["\"fmt\"", "\"strings\""]);
        assert_eq!(unit.imports[1].alias.as_deref(), Some("s"));
        assert!(unit.body.starts_with("\n\nfunc helper"));
        assert_eq!(&PROCESSOR[unit.body_offset..], unit.body);
    }

    #[test]
    fn test_body_after_last_of_several_declarations() {
        let src = "package main\nimport \"fmt\"\nimport \"os\"\nvar x = 1\n";
        let unit = extract_imports_and_body(src).unwrap();
        assert_eq!(unit.import_paths(), vec!["\"fmt\"", "\"os\""]);
        assert_eq!(unit.body, "\nvar x = 1\n");
    }

    #[test]
    fn test_zero_imports_body_is_whole_file() {
        let src = "// header\npackage main\n\nfunc PayloadGenerator() []string { return nil }\n";
        let unit = extract_imports_and_body(src).unwrap();
        assert!(unit.imports.is_empty());
        assert_eq!(unit.body, src);
        assert_eq!(unit.body_offset, 0);
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let src = "\u{feff}package main\nfunc F(a int) string { return \"\" }\n";
        let sig = extract_signature(src, "F").unwrap();
        assert_eq!(sig.parameters, vec![Parameter::new("a", "int")]);

        let unit = extract_imports_and_body(src).unwrap();
        assert_eq!(unit.body, src);
        assert_eq!(unit.declarations(), "\nfunc F(a int) string { return \"\" }\n");

        let with_import = "\u{feff}package main\nimport \"fmt\"\nvar x = fmt.Sprint()\n";
        let unit = extract_imports_and_body(with_import).unwrap();
        assert_eq!(unit.body, "\nvar x = fmt.Sprint()\n");
        assert_eq!(&with_import[unit.body_offset..], unit.body);
    }

    #[test]
    fn test_import_extraction_ignores_rest_of_file() {
        let src = "package main\nimport \"fmt\"\nthis is { not go";
        let unit = extract_imports_and_body(src).unwrap();
        assert_eq!(unit.import_paths(), vec!["\"fmt\""]);
    }

    #[test]
    fn test_import_extraction_requires_package() {
        assert!(matches!(
            extract_imports_and_body("import \"fmt\"\n"),
            Err(PlugError::Parse(_))
        ));
    }

    #[test]
    fn test_read_source_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plugin.go");
        std::fs::write(&path, PROCESSOR).unwrap();

        let file = SourceFile::read(&path).unwrap();
        assert!(file.name().ends_with("plugin.go"));
        assert_eq!(file.signature("PayloadProcessor").unwrap().parameters.len(), 2);
    }
}
