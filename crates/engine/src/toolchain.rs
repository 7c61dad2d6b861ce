//! Go toolchain invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use fuzzplug_core::{PlugError, Result};
use tokio::process::Command as TokioCommand;
use tracing::debug;

/// Default name of the Go binary.
const GO: &str = "go";

/// A Go binary used to query versions and compile wrappers.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: PathBuf,
}

/// Result of a `go` invocation.
#[derive(Debug)]
pub struct CommandResult {
    pub exit_code: i32,
    /// Standard output followed by standard error.
    pub output: String,
}

impl GoToolchain {
    /// Uses `program` as is, without checking that it exists.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolves the Go binary: `explicit` if given, otherwise `go` on `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        let requested = explicit.map_or_else(|| PathBuf::from(GO), Path::to_path_buf);
        let program = which::which(&requested).map_err(|e| {
            PlugError::ToolchainNotFound(format!("{}: {}", requested.display(), e))
        })?;

        debug!(go = %program.display(), "located Go toolchain");
        Ok(Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The toolchain version, e.g. `1.22.1`.
    pub async fn version(&self) -> Result<String> {
        let result = self.run(&["version"], None).await?;
        if result.exit_code != 0 {
            return Err(PlugError::ToolchainNotFound(format!(
                "`{} version` exited with {}",
                self.program.display(),
                result.exit_code
            )));
        }

        parse_version(&result.output).ok_or_else(|| {
            PlugError::ToolchainNotFound(format!(
                "unexpected `go version` output: {}",
                result.output.trim()
            ))
        })
    }

    /// Compiles `source` (relative to `dir`) into the C shared library `output`.
    ///
    /// Returns the compiler output; a non-zero exit becomes
    /// [`PlugError::CompileFailed`] carrying that output.
    pub async fn build_shared(&self, dir: &Path, source: &str, output: &Path) -> Result<String> {
        let args = build_args(source, output);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = self.run(&args, Some(dir)).await?;

        if result.exit_code != 0 {
            return Err(PlugError::CompileFailed {
                command: self.command_line(&args),
                exit_code: Some(result.exit_code),
                output: result.output,
            });
        }

        Ok(result.output)
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.program.display().to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    async fn run(&self, args: &[&str], dir: Option<&Path>) -> Result<CommandResult> {
        let mut command = TokioCommand::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        debug!(command = %self.command_line(args), "running");
        let output = command.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                PlugError::ToolchainNotFound(self.program.display().to_string())
            }
            _ => PlugError::CompileFailed {
                command: self.command_line(args),
                exit_code: None,
                output: e.to_string(),
            },
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            output: text,
        })
    }
}

/// Arguments for building `source` as a C shared library at `output`.
pub fn build_args(source: &str, output: &Path) -> Vec<String> {
    vec![
        "build".to_string(),
        "-buildmode=c-shared".to_string(),
        "-ldflags=-s -w".to_string(),
        "-o".to_string(),
        output.display().to_string(),
        format!("./{}", source),
    ]
}

/// Extracts `1.22.1` from `go version go1.22.1 linux/amd64`.
pub fn parse_version(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .nth(2)
        .and_then(|v| v.strip_prefix("go"))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Path of the C header `go build -buildmode=c-shared` writes next to `artifact`.
pub fn header_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("h")
}
