//! fuzzplug CLI - packages Go fuzzing plugins as C shared libraries.

mod commands;
mod discovery;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fuzzplug_core::Role;
use miette::Result;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fuzzplug")]
#[command(
    author,
    version,
    about = "Wraps Go fuzzing plugins and compiles them into shared libraries"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Go binary to use (resolved on PATH when not specified)
    #[arg(long, global = true, env = "FUZZPLUG_GO", value_name = "PATH")]
    go: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a plugin into a shared library
    Build {
        /// Plugin role (payloadProc, reactor, preprocess, payloadGen, reqSender)
        role: Role,

        /// Plugin file, or a directory containing plugin.go
        path: PathBuf,

        /// Artifact path (default: FuzzGIU<Entry>.<dylib extension> next to the plugin)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep wrappedPlugin.go and the generated C header
        #[arg(long)]
        keep_intermediate: bool,

        /// Disable build cache
        #[arg(long)]
        no_cache: bool,

        /// Go module name (read from go.mod if not specified)
        #[arg(long)]
        module: Option<String>,
    },

    /// Create a new plugin project
    New {
        /// Plugin role
        role: Role,

        /// Project directory
        dir: PathBuf,

        /// Overwrite an existing plugin.go
        #[arg(short, long)]
        force: bool,

        /// Use this file as the shared fuzzTypes declarations
        #[arg(long, value_name = "FILE")]
        types: Option<PathBuf>,

        /// Go module name
        #[arg(long)]
        module: Option<String>,
    },

    /// Validate a plugin without compiling it
    Check {
        /// Plugin role
        role: Role,

        /// Plugin file, or a directory containing plugin.go
        path: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List plugin roles and their required signatures
    Roles,

    /// Cache management
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Rebuild a plugin whenever its source changes
    Watch {
        /// Plugin role
        role: Role,

        /// Plugin file, or a directory containing plugin.go
        path: PathBuf,

        /// Artifact path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Go module name (read from go.mod if not specified)
        #[arg(long)]
        module: Option<String>,

        /// Clear the screen before each rebuild
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Clear all cached builds
    Clean {
        /// Plugin directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Show cached builds
    Status {
        /// Plugin directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let go = cli.go;

    match cli.command {
        Commands::Build {
            role,
            path,
            output,
            keep_intermediate,
            no_cache,
            module,
        } => {
            let settings = commands::build::BuildSettings {
                output,
                module,
                keep_intermediate,
                use_cache: !no_cache,
            };
            commands::build::execute(role, &path, go.as_deref(), settings).await
        }

        Commands::New {
            role,
            dir,
            force,
            types,
            module,
        } => commands::new::execute(role, &dir, go.as_deref(), force, types, module).await,

        Commands::Check { role, path, json } => commands::check::execute(role, &path, json),

        Commands::Roles => commands::roles::execute(),

        Commands::Cache { action } => match action {
            CacheAction::Clean { dir } => commands::cache::clean(&dir),
            CacheAction::Status { dir } => commands::cache::status(&dir),
        },

        Commands::Watch {
            role,
            path,
            output,
            module,
            clear,
        } => {
            let settings = commands::build::BuildSettings {
                output,
                module,
                keep_intermediate: false,
                use_cache: true,
            };
            commands::watch::execute(role, &path, go.as_deref(), settings, clear).await
        }
    }
}
