//! Generation of new plugin projects.

use std::io;
use std::path::{Path, PathBuf};

use fuzzplug_core::{PlugError, Result, Role, SHARED_PACKAGE};
use tracing::{debug, info};

use crate::builder::PLUGIN_FILE;
use crate::template::{FUZZ_TYPES_SOURCE, Marker, Template};

/// Directory of the shared types package, relative to the project root.
pub const FUZZ_TYPES_DIR: &str = "components/fuzzTypes";

/// Settings for [`scaffold`].
#[derive(Debug, Clone, Default)]
pub struct ScaffoldOptions {
    /// Overwrite an existing `plugin.go`.
    pub force: bool,

    /// Copy this file as `fuzzTypes.go` instead of the built-in declarations.
    pub fuzz_types: Option<PathBuf>,

    /// Module name for `go.mod`; defaults to `<EntryFunction>FuzzGIU`.
    pub module_name: Option<String>,
}

/// Files written by [`scaffold`].
#[derive(Debug, Clone)]
pub struct ScaffoldReport {
    pub dir: PathBuf,
    pub module_name: String,
    pub files: Vec<PathBuf>,
}

/// Starter entry function for `role`: the fixed parameters and a body that
/// returns a neutral value.
pub fn stub_function(role: Role) -> String {
    let contract = role.contract();
    let params: Vec<String> = contract
        .fixed
        .iter()
        .map(|p| format!("{} {}", p.name, p.ty))
        .collect();

    let neutral = match role {
        Role::PayloadProcessor => "payload",
        Role::Reactor => "&fuzzTypes.Reaction{}",
        Role::Preprocessor => "fuzz",
        Role::PayloadGenerator => "[]string{}",
        Role::RequestSender => "&fuzzTypes.Resp{}",
    };

    format!(
        "func {}({}) {} {{\n\treturn {}\n}}\n",
        role.entry_function(),
        params.join(", "),
        contract.returns,
        neutral
    )
}

/// Whether the stub for `role` refers to the shared types package.
fn uses_shared_types(role: Role) -> bool {
    let contract = role.contract();
    contract.returns.contains(SHARED_PACKAGE)
        || contract.fixed.iter().any(|p| p.ty.contains(SHARED_PACKAGE))
}

/// Renders the starter `plugin.go` for `role`.
pub fn plugin_source(role: Role, module_name: &str) -> Result<String> {
    let mut template = Template::scaffold()?;

    let imports = if uses_shared_types(role) {
        format!("import \"{}/{}\"\n", module_name, FUZZ_TYPES_DIR)
    } else {
        String::new()
    };

    template.bind(Marker::PluginImports, imports)?;
    template.bind(Marker::PluginFunction, stub_function(role))?;
    template.finish()
}

/// Renders a `go.mod` file.
pub fn go_mod(module_name: &str, go_version: &str) -> String {
    format!("module {}\n\ngo {}\n", module_name, go_version)
}

/// Creates a plugin project for `role` in `dir`.
///
/// Writes `go.mod`, `plugin.go` and `components/fuzzTypes/fuzzTypes.go`.
/// An existing `plugin.go` is only replaced with `force`.
pub fn scaffold(
    role: Role,
    dir: &Path,
    go_version: &str,
    options: &ScaffoldOptions,
) -> Result<ScaffoldReport> {
    let plugin_file = dir.join(PLUGIN_FILE);
    if !options.force && plugin_file.exists() {
        return Err(PlugError::write(
            &plugin_file,
            io::Error::new(io::ErrorKind::AlreadyExists, "file exists, use --force to replace it"),
        ));
    }

    let module_name = options
        .module_name
        .clone()
        .unwrap_or_else(|| role.default_module_name());

    let types_dir = dir.join(FUZZ_TYPES_DIR);
    std::fs::create_dir_all(&types_dir).map_err(|e| PlugError::write(&types_dir, e))?;

    let types_file = match &options.fuzz_types {
        Some(source) => {
            let copied = fuzzplug_core::fs::copy_into_dir(source, &types_dir)?;
            let target = types_dir.join("fuzzTypes.go");
            if copied != target {
                std::fs::rename(&copied, &target).map_err(|e| PlugError::write(&target, e))?;
            }
            target
        }
        None => {
            let target = types_dir.join("fuzzTypes.go");
            fuzzplug_core::fs::write(&target, FUZZ_TYPES_SOURCE)?;
            target
        }
    };
    debug!(path = %types_file.display(), "wrote shared types");

    let go_mod_file = dir.join("go.mod");
    fuzzplug_core::fs::write(&go_mod_file, go_mod(&module_name, go_version))?;

    fuzzplug_core::fs::write(&plugin_file, plugin_source(role, &module_name)?)?;
    info!(%role, dir = %dir.display(), module = %module_name, "created plugin project");

    Ok(ScaffoldReport {
        dir: dir.to_path_buf(),
        module_name,
        files: vec![go_mod_file, plugin_file, types_file],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzzplug_parser::{extract_imports_and_body, extract_signature};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_stubs_satisfy_their_contracts() {
        for role in Role::ALL {
            let source = plugin_source(role, &role.default_module_name()).unwrap();
            let sig = extract_signature(&source, role.entry_function()).unwrap();
            let unit = extract_imports_and_body(&source).unwrap();
            let custom = role
                .contract()
                .validate_with(&sig, &unit.qualifiers())
                .unwrap();
            assert!(custom.is_empty(), "{}", role);
        }
    }

    #[test]
    fn test_shared_types_import_only_when_used() {
        let source = plugin_source(Role::Reactor, "ReactFuzzGIU").unwrap();
        assert!(source.contains("import \"ReactFuzzGIU/components/fuzzTypes\""));

        let source = plugin_source(Role::PayloadProcessor, "PayloadProcessorFuzzGIU").unwrap();
        assert!(!source.contains("import"));
        assert!(source.contains("return payload"));
    }

    #[test]
    fn test_go_mod() {
        assert_eq!(go_mod("ReactFuzzGIU", "1.22.1"), "module ReactFuzzGIU\n\ngo 1.22.1\n");
    }

    #[test]
    fn test_scaffold_creates_project() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("react");
        let report = scaffold(Role::Reactor, &root, "1.22.1", &ScaffoldOptions::default()).unwrap();

        assert_eq!(report.module_name, "ReactFuzzGIU");
        assert_eq!(report.files.len(), 3);
        assert!(fs::read_to_string(root.join("go.mod")).unwrap().starts_with("module ReactFuzzGIU"));
        assert!(root.join("components/fuzzTypes/fuzzTypes.go").is_file());
        assert!(fs::read_to_string(root.join("plugin.go")).unwrap().contains("func React("));
    }

    #[test]
    fn test_scaffold_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("plugin.go"), "package main\n").unwrap();

        let err = scaffold(Role::Reactor, dir.path(), "1.22.1", &ScaffoldOptions::default()).unwrap_err();
        assert!(matches!(err, PlugError::FileWrite { .. }));
        assert_eq!(fs::read_to_string(dir.path().join("plugin.go")).unwrap(), "package main\n");

        let options = ScaffoldOptions {
            force: true,
            ..Default::default()
        };
        scaffold(Role::Reactor, dir.path(), "1.22.1", &options).unwrap();
        assert!(fs::read_to_string(dir.path().join("plugin.go")).unwrap().contains("React"));
    }

    #[test]
    fn test_scaffold_copies_custom_types() {
        let dir = tempdir().unwrap();
        let custom = dir.path().join("types.go");
        fs::write(&custom, "package fuzzTypes\n// custom\n").unwrap();

        let options = ScaffoldOptions {
            fuzz_types: Some(custom),
            module_name: Some("mymod".to_string()),
            ..Default::default()
        };
        let root = dir.path().join("proj");
        let report = scaffold(Role::Preprocessor, &root, "1.21", &options).unwrap();

        assert_eq!(report.module_name, "mymod");
        let types = fs::read_to_string(root.join("components/fuzzTypes/fuzzTypes.go")).unwrap();
        assert!(types.contains("// custom"));
    }
}
