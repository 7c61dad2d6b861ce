//! Build command implementation.

use std::path::{Path, PathBuf};

use console::style;
use fuzzplug_core::{PlugError, Role};
use fuzzplug_engine::{BuildOptions, BuildReport, GoToolchain, PluginBuilder};
use miette::Result;
use tracing::debug;

use crate::discovery;
use crate::output;

/// Build flags shared by `build` and `watch`.
#[derive(Debug, Clone, Default)]
pub struct BuildSettings {
    pub output: Option<PathBuf>,
    pub module: Option<String>,
    pub keep_intermediate: bool,
    pub use_cache: bool,
}

/// Translates command-line settings into engine options for the plugin at `path`.
pub fn build_options(path: &Path, settings: &BuildSettings) -> Result<BuildOptions> {
    let mut options = BuildOptions::default()
        .with_keep_intermediate(settings.keep_intermediate)
        .with_cache(settings.use_cache);

    if let Some(output) = &settings.output {
        options = options.with_output(discovery::absolute_output(output)?);
    }

    let module = settings
        .module
        .clone()
        .or_else(|| discovery::module_name(&discovery::plugin_dir(path)));
    if let Some(module) = module {
        debug!(module = %module, "resolved Go module");
        options = options.with_module_name(module);
    }

    Ok(options)
}

/// Creates a builder for `role` using the Go binary at `go` (or on `PATH`).
pub fn builder(
    role: Role,
    path: &Path,
    go: Option<&Path>,
    settings: &BuildSettings,
) -> Result<PluginBuilder> {
    let toolchain = GoToolchain::locate(go)?;
    let options = build_options(path, settings)?;
    Ok(PluginBuilder::new(role, toolchain, options))
}

/// Builds a plugin once.
pub async fn execute(
    role: Role,
    path: &Path,
    go: Option<&Path>,
    settings: BuildSettings,
) -> Result<()> {
    let builder = builder(role, path, go, &settings)?;
    run_build(&builder, path).await?;
    Ok(())
}

/// Runs one build with progress output, relaying compiler output on failure.
pub async fn run_build(builder: &PluginBuilder, path: &Path) -> Result<BuildReport> {
    output::build_header(builder.role(), &path.display().to_string());

    let spinner = output::create_spinner(&format!(
        "Compiling {} plugin...",
        style(builder.role().id()).cyan()
    ));

    let report = match builder.build(path).await {
        Ok(report) => report,
        Err(e) => {
            spinner_failed(&spinner, &e);
            return Err(e.into());
        }
    };

    let artifact = report.artifact.display().to_string();
    if report.cached {
        output::spinner_skipped(&spinner, &artifact);
    } else {
        output::spinner_success(
            &spinner,
            &format!(
                "{} {}",
                artifact,
                style(format!("({}ms)", report.duration_ms)).dim()
            ),
        );
        output::compiler_output(&report.compiler_output);
    }

    print_report(&report);
    Ok(report)
}

fn spinner_failed(spinner: &indicatif::ProgressBar, error: &PlugError) {
    match error {
        PlugError::CompileFailed {
            exit_code,
            output: text,
            ..
        } => {
            let status = exit_code.map_or_else(|| "no exit code".to_string(), |c| c.to_string());
            output::spinner_failure(spinner, &format!("go build failed ({})", status));
            output::compiler_output(text);
        }
        _ => output::spinner_failure(spinner, "build failed"),
    }
}

fn print_report(report: &BuildReport) {
    output::section_header(&format!("{}{}", report.role.entry_function(), report.signature));
    output::parameters(&report.signature, &report.custom);
    output::key_value("go", &report.go_version);

    if let Some(intermediate) = &report.intermediate {
        output::key_value("wrapper", &intermediate.display().to_string());
    }
}
