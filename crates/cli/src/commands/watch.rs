//! Watch command implementation.
//!
//! Watches a plugin source file and rebuilds it when it changes.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use console::style;
use fuzzplug_core::Role;
use fuzzplug_engine::{PluginBuilder, resolve_plugin_file};
use miette::{Result, miette};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::commands::build::{self, BuildSettings};
use crate::discovery;
use crate::output;

/// Minimum interval between rebuilds (debounce).
const DEBOUNCE_MS: u64 = 300;

/// Executes watch mode.
pub async fn execute(
    role: Role,
    path: &Path,
    go: Option<&Path>,
    settings: BuildSettings,
    clear_screen: bool,
) -> Result<()> {
    let plugin_file = resolve_plugin_file(path)?;
    let builder = build::builder(role, &plugin_file, go, &settings)?;

    run_watch_loop(&builder, &plugin_file, clear_screen).await
}

/// Whether a watcher event concerns the plugin file.
fn is_relevant(event: &Event, plugin_file: &Path) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }

    event
        .paths
        .iter()
        .any(|p| p.file_name() == plugin_file.file_name())
}

/// Main watch loop.
async fn run_watch_loop(
    builder: &PluginBuilder,
    plugin_file: &Path,
    clear_screen: bool,
) -> Result<()> {
    // The directory is watched so editors that save by renaming are seen.
    let plugin_dir = discovery::plugin_dir(plugin_file);

    println!(
        "\n{} Watching {} for changes...\n",
        style("👁").cyan(),
        style(plugin_file.display()).cyan().bold()
    );

    let (tx, mut rx) = mpsc::channel::<PathBuf>(100);

    let watched = plugin_file.to_path_buf();
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res
                && is_relevant(&event, &watched)
            {
                for path in event.paths {
                    let _ = tx.blocking_send(path);
                }
            }
        },
        Config::default().with_poll_interval(Duration::from_millis(200)),
    )
    .map_err(|e| miette!("Failed to create file watcher: {}", e))?;

    watcher
        .watch(&plugin_dir, RecursiveMode::NonRecursive)
        .map_err(|e| miette!("Failed to watch {}: {}", plugin_dir.display(), e))?;

    rebuild(builder, plugin_file).await;

    let spinner = output::create_spinner("Waiting for changes...");
    let mut last_rebuild = Instant::now();

    while let Some(changed_path) = rx.recv().await {
        if last_rebuild.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            continue;
        }

        // Drain any additional pending events
        while rx.try_recv().is_ok() {}

        spinner.finish_and_clear();

        println!(
            "\n{} File changed: {}\n",
            style("↻").yellow().bold(),
            style(changed_path.display()).yellow()
        );

        if clear_screen {
            print!("\x1B[2J\x1B[1;1H");
        }

        rebuild(builder, plugin_file).await;
        last_rebuild = Instant::now();

        spinner.reset();
        spinner.set_message("Waiting for changes...");
        spinner.enable_steady_tick(Duration::from_millis(80));
    }

    Ok(())
}

/// Runs a single build, reporting failures without leaving watch mode.
async fn rebuild(builder: &PluginBuilder, plugin_file: &Path) {
    if let Err(e) = build::run_build(builder, plugin_file).await {
        output::error(&format!("{:?}", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    #[test]
    fn test_only_plugin_file_events_are_relevant() {
        let plugin = Path::new("/proj/plugin.go");

        let modify = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/proj/plugin.go"));
        assert!(is_relevant(&modify, plugin));

        let wrapper = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/proj/wrappedPlugin.go"));
        assert!(!is_relevant(&wrapper, plugin));

        let access = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/proj/plugin.go"));
        assert!(!is_relevant(&access, plugin));
    }
}
