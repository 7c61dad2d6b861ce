//! New command implementation.

use std::path::{Path, PathBuf};

use fuzzplug_core::Role;
use fuzzplug_engine::{GoToolchain, PLUGIN_FILE, ScaffoldOptions, ScaffoldReport, scaffold};
use miette::Result;

use crate::output;

/// Creates a plugin project for `role` in `dir`.
pub async fn execute(
    role: Role,
    dir: &Path,
    go: Option<&Path>,
    force: bool,
    fuzz_types: Option<PathBuf>,
    module_name: Option<String>,
) -> Result<()> {
    let toolchain = GoToolchain::locate(go)?;
    let go_version = toolchain.version().await?;

    if force && dir.join(PLUGIN_FILE).exists() {
        output::warning(&format!("Overwriting {}", dir.join(PLUGIN_FILE).display()));
    }

    let options = ScaffoldOptions {
        force,
        fuzz_types,
        module_name,
    };
    let report = scaffold(role, dir, &go_version, &options)?;

    print_report(role, &report);
    Ok(())
}

fn print_report(role: Role, report: &ScaffoldReport) {
    output::success(&format!(
        "Created {} plugin in {}",
        role.id(),
        report.dir.display()
    ));
    output::key_value("module", &report.module_name);

    for file in &report.files {
        let shown = file.strip_prefix(&report.dir).unwrap_or(file.as_path());
        output::list_item(&shown.display().to_string());
    }

    output::info(&format!(
        "Implement {} in plugin.go, then run 'fuzzplug build {} {}'",
        role.entry_function(),
        role.id(),
        report.dir.display()
    ));
}
