//! Splices a plugin into its role's wrapper template.

use std::path::{Path, PathBuf};

use fuzzplug_core::{ImportSpec, Parameter, Result, Role, actual_list, formal_list};
use fuzzplug_parser::SourceFile;
use serde::Serialize;
use tracing::debug;

use crate::template::{Marker, Template};

/// Name of the generated wrapper file, written next to the plugin.
pub const WRAPPER_FILE: &str = "wrappedPlugin.go";

/// A complete wrapper unit ready for the Go compiler.
#[derive(Debug, Clone, Serialize)]
pub struct MergedSource {
    pub role: Role,

    /// Plugin imports left after removing those the template already has.
    pub custom_imports: Vec<ImportSpec>,

    /// Custom parameters as a declaration list, e.g. `seed int`.
    pub formal: String,

    /// Custom parameters as call arguments, e.g. `seed`.
    pub actual: String,

    /// The generated Go source.
    #[serde(skip)]
    pub text: String,
}

impl MergedSource {
    /// Writes the source as [`WRAPPER_FILE`] inside `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(WRAPPER_FILE);
        fuzzplug_core::fs::write(&path, &self.text)?;
        debug!(path = %path.display(), bytes = self.text.len(), "wrote wrapper source");
        Ok(path)
    }
}

/// Plugin imports that do not appear verbatim among `template` imports.
pub fn dedup_imports(plugin: &[ImportSpec], template: &[ImportSpec]) -> Vec<ImportSpec> {
    plugin
        .iter()
        .filter(|import| !template.contains(import))
        .cloned()
        .collect()
}

/// Renders an import declaration; empty when there is nothing to import.
pub fn import_block(imports: &[ImportSpec]) -> String {
    if imports.is_empty() {
        return String::new();
    }

    let mut block = String::from("import (\n");
    for import in imports {
        block.push('\t');
        block.push_str(&import.to_string());
        block.push('\n');
    }
    block.push(')');
    block
}

/// Builds the wrapper unit for `role`.
///
/// `custom` are the parameters left after the role's fixed prefix, `imports`
/// and `body` come from the plugin file, and `module_name` is the Go module
/// the plugin lives in.
pub fn merge(
    role: Role,
    custom: &[Parameter],
    imports: &[ImportSpec],
    body: &str,
    module_name: &str,
) -> Result<MergedSource> {
    let mut template = Template::for_role(role)?;

    // The shared-types import path embeds the module name, so it has to be
    // bound before the template's imports can be compared with the plugin's.
    if template.has(Marker::ModuleName) {
        template.bind(Marker::ModuleName, module_name)?;
    }
    let template_imports = SourceFile::new(template.name(), template.source())
        .unit()?
        .imports;

    let custom_imports = dedup_imports(imports, &template_imports);
    let formal = formal_list(custom);
    let actual = actual_list(custom);

    template.bind(Marker::CustomImports, import_block(&custom_imports))?;
    template.bind(Marker::FormalParameters, formal.as_str())?;
    template.bind(Marker::ActualParameters, actual.as_str())?;
    template.bind(Marker::Code, body)?;
    let text = template.finish()?;

    debug!(
        %role,
        custom_imports = custom_imports.len(),
        dropped_imports = imports.len() - custom_imports.len(),
        custom_params = custom.len(),
        "merged plugin into wrapper"
    );

    Ok(MergedSource {
        role,
        custom_imports,
        formal,
        actual,
        text,
    })
}
