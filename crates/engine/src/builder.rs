//! End-to-end plugin build: extract, validate, merge, compile.

use std::path::{Path, PathBuf};
use std::time::Instant;

use fuzzplug_core::{ImportSpec, Parameter, Result, Role, Signature, actual_list, formal_list};
use fuzzplug_parser::SourceFile;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{BuildCache, BuildKey};
use crate::merge::{MergedSource, WRAPPER_FILE, merge};
use crate::toolchain::{GoToolchain, header_path};

/// File used when a plugin path names a directory.
pub const PLUGIN_FILE: &str = "plugin.go";

/// Settings for [`PluginBuilder`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Artifact path; relative paths are resolved against the plugin directory.
    pub output: Option<PathBuf>,

    /// Go module of the plugin; defaults to `<EntryFunction>FuzzGIU`.
    pub module_name: Option<String>,

    /// Keep `wrappedPlugin.go` and the generated C header.
    pub keep_intermediate: bool,

    /// Skip builds whose inputs and artifact are unchanged.
    pub use_cache: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            output: None,
            module_name: None,
            keep_intermediate: false,
            use_cache: true,
        }
    }
}

impl BuildOptions {
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = Some(module_name.into());
        self
    }

    pub fn with_keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }
}

/// Everything known about a plugin before compilation.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedBuild {
    pub role: Role,
    pub plugin_file: PathBuf,
    pub plugin_dir: PathBuf,

    /// Full signature of the entry function.
    pub signature: Signature,

    /// Parameters after the role's fixed prefix.
    pub custom: Vec<Parameter>,

    pub merged: MergedSource,
}

/// Outcome of a build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub role: Role,
    pub plugin_file: PathBuf,
    pub artifact: PathBuf,
    pub signature: Signature,
    pub custom: Vec<Parameter>,
    pub go_version: String,

    /// Output relayed from the Go compiler.
    pub compiler_output: String,

    /// Whether the build was skipped because the artifact was up to date.
    pub cached: bool,

    /// `wrappedPlugin.go` when intermediates were kept.
    pub intermediate: Option<PathBuf>,

    pub duration_ms: u64,
}

impl BuildReport {
    fn new(prepared: PreparedBuild, artifact: PathBuf, go_version: String) -> Self {
        Self {
            role: prepared.role,
            plugin_file: prepared.plugin_file,
            artifact,
            signature: prepared.signature,
            custom: prepared.custom,
            go_version,
            compiler_output: String::new(),
            cached: false,
            intermediate: None,
            duration_ms: 0,
        }
    }
}

/// Resolves a plugin path: a directory means its `plugin.go`.
pub fn resolve_plugin_file(path: &Path) -> Result<PathBuf> {
    if fuzzplug_core::fs::is_file(path)? {
        Ok(path.to_path_buf())
    } else {
        Ok(path.join(PLUGIN_FILE))
    }
}

/// Result of checking a plugin without building it.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub role: Role,
    pub plugin_file: PathBuf,
    pub signature: Signature,
    pub custom: Vec<Parameter>,
    pub formal: String,
    pub actual: String,
    pub imports: Vec<ImportSpec>,
}

/// Extracts and validates the entry function of the plugin at `path`.
pub fn inspect(role: Role, path: &Path) -> Result<Inspection> {
    let plugin_file = resolve_plugin_file(path)?;
    let source = SourceFile::read(&plugin_file)?;

    let signature = source.signature(role.entry_function())?;
    let unit = source.unit()?;
    let custom = role.contract().validate_with(&signature, &unit.qualifiers())?;

    Ok(Inspection {
        role,
        plugin_file,
        formal: formal_list(&custom),
        actual: actual_list(&custom),
        signature,
        custom,
        imports: unit.imports,
    })
}

/// Builds plugins of one role with one toolchain.
pub struct PluginBuilder {
    role: Role,
    toolchain: GoToolchain,
    options: BuildOptions,
}

impl PluginBuilder {
    pub fn new(role: Role, toolchain: GoToolchain, options: BuildOptions) -> Self {
        Self {
            role,
            toolchain,
            options,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Runs every step up to, but not including, compilation.
    pub fn prepare(&self, path: &Path) -> Result<PreparedBuild> {
        let plugin_file = resolve_plugin_file(path)?;
        let plugin_dir = fuzzplug_core::fs::containing_dir(&plugin_file)?;
        let source = SourceFile::read(&plugin_file)?;

        let signature = source.signature(self.role.entry_function())?;
        let unit = source.unit()?;
        let custom = self
            .role
            .contract()
            .validate_with(&signature, &unit.qualifiers())?;

        let module_name = self
            .options
            .module_name
            .clone()
            .unwrap_or_else(|| self.role.default_module_name());
        let merged = merge(
            self.role,
            &custom,
            &unit.imports,
            unit.declarations(),
            &module_name,
        )?;

        Ok(PreparedBuild {
            role: self.role,
            plugin_file,
            plugin_dir,
            signature,
            custom,
            merged,
        })
    }

    /// Artifact path for a plugin in `plugin_dir`.
    pub fn artifact_path(&self, plugin_dir: &Path) -> PathBuf {
        let output = self
            .options
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.role.default_artifact_name()));
        plugin_dir.join(output)
    }

    /// Builds the plugin at `path` into a shared library.
    pub async fn build(&self, path: &Path) -> Result<BuildReport> {
        let start = Instant::now();
        let prepared = self.prepare(path)?;
        let artifact = self.artifact_path(&prepared.plugin_dir);
        let go_version = self.toolchain.version().await?;
        info!(role = %self.role, go = %go_version, plugin = %prepared.plugin_file.display(), "building plugin");

        let key = BuildKey {
            role: self.role,
            source: &prepared.merged.text,
            go_version: &go_version,
            artifact: &artifact,
        };

        let mut cache = if self.options.use_cache {
            Some(BuildCache::for_plugin_dir(&prepared.plugin_dir)?)
        } else {
            None
        };

        if cache.as_ref().is_some_and(|c| c.is_up_to_date(&key)) {
            debug!(artifact = %artifact.display(), "artifact is up to date");
            let mut report = BuildReport::new(prepared, artifact, go_version);
            report.cached = true;
            report.duration_ms = start.elapsed().as_millis() as u64;
            return Ok(report);
        }

        let wrapper = prepared.merged.write_to(&prepared.plugin_dir)?;
        let compiled = self
            .toolchain
            .build_shared(&prepared.plugin_dir, WRAPPER_FILE, &artifact)
            .await;

        let intermediate = if self.options.keep_intermediate {
            Some(wrapper)
        } else {
            remove_intermediates(&wrapper, &artifact);
            None
        };

        let compiler_output = compiled?;

        if let Some(cache) = cache.as_mut() {
            cache.record(&key)?;
        }

        let mut report = BuildReport::new(prepared, artifact, go_version);
        report.compiler_output = compiler_output;
        report.intermediate = intermediate;
        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }
}

/// Deletes the wrapper source and the C header next to `artifact`.
fn remove_intermediates(wrapper: &Path, artifact: &Path) {
    for path in [wrapper.to_path_buf(), header_path(artifact)] {
        if let Err(e) = std::fs::remove_file(&path) {
            debug!(path = %path.display(), error = %e, "could not remove intermediate file");
        }
    }
}
