//! Check command implementation.

use std::path::Path;

use console::style;
use fuzzplug_core::Role;
use fuzzplug_engine::{Inspection, inspect};
use miette::{Result, miette};

use crate::output;

/// Validates a plugin against its role without compiling it.
pub fn execute(role: Role, path: &Path, json: bool) -> Result<()> {
    let inspection = inspect(role, path)?;

    if json {
        println!("{}", render_json(&inspection)?);
        return Ok(());
    }

    output::success(&format!(
        "{} satisfies the {} contract",
        inspection.plugin_file.display(),
        style(role.id()).cyan()
    ));

    output::section_header(&format!("{}{}", role.entry_function(), inspection.signature));
    output::parameters(&inspection.signature, &inspection.custom);

    output::section_header("Wrapper");
    output::key_value("formal", &quoted(&inspection.formal));
    output::key_value("actual", &quoted(&inspection.actual));

    if !inspection.imports.is_empty() {
        output::section_header("Imports");
        for import in &inspection.imports {
            output::list_item(&import.to_string());
        }
    }

    Ok(())
}

/// Pretty-printed JSON form of an inspection.
pub fn render_json(inspection: &Inspection) -> Result<String> {
    serde_json::to_string_pretty(inspection).map_err(|e| miette!("Failed to serialize report: {}", e))
}

fn quoted(list: &str) -> String {
    format!("\"{}\"", list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_report() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("plugin.go"),
            "package main\n\nfunc PayloadProcessor(payload string, seed int) string {\n\treturn payload\n}\n",
        )
        .unwrap();

        let inspection = inspect(Role::PayloadProcessor, dir.path()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&inspection).unwrap()).unwrap();

        assert_eq!(json["role"], "payloadProc");
        assert_eq!(json["formal"], "seed int");
        assert_eq!(json["actual"], "seed");
        assert_eq!(json["custom"][0]["name"], "seed");
        assert_eq!(json["custom"][0]["type"], "int");
    }

    #[test]
    fn test_check_reports_mismatch() {
        let dir = tempdir().unwrap();
        let plugin = dir.path().join("plugin.go");
        fs::write(&plugin, "package main\n\nfunc PayloadProcessor(p int) string { return \"\" }\n")
            .unwrap();

        let err = execute(Role::PayloadProcessor, &plugin, true).unwrap_err();
        assert!(err.to_string().contains("Bad function definition"));
    }
}
