//! Cache command implementation.

use std::fs;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use console::style;
use fuzzplug_engine::BuildCache;
use miette::{Result, miette};

use crate::discovery;
use crate::output;

/// Clears the build cache of the plugin project in `dir`.
pub fn clean(dir: &Path) -> Result<()> {
    let cache_dir = discovery::cache_dir(dir);

    if cache_dir.exists() {
        fs::remove_dir_all(&cache_dir)
            .map_err(|e| miette!("Failed to remove cache directory: {}", e))?;

        output::success("Cache cleared");
    } else {
        output::info("Cache directory does not exist");
    }

    Ok(())
}

/// Shows the cached builds of the plugin project in `dir`.
pub fn status(dir: &Path) -> Result<()> {
    let cache_dir = discovery::cache_dir(dir);

    if !cache_dir.exists() {
        output::info("No cache exists");
        return Ok(());
    }

    let cache = BuildCache::new(&cache_dir)?;
    let entries = cache.entries();

    if entries.is_empty() {
        output::info("Cache is empty");
        return Ok(());
    }

    println!("Cache status:");
    println!("  Location: {}", cache.cache_dir().display());
    println!("  Entries: {}", entries.len());
    println!();

    for entry in entries {
        let fresh = BuildCache::hash_file(&entry.artifact)
            .is_ok_and(|hash| hash == entry.artifact_hash);
        let state = if fresh {
            style("up to date").green()
        } else {
            style("stale").yellow()
        };

        println!(
            "  {} {} ({}, go {}) - cached at {}",
            entry.artifact.display(),
            state,
            entry.role,
            entry.go_version,
            format_timestamp(entry.timestamp)
        );
    }

    Ok(())
}

/// Simple timestamp formatting (without a date-time dependency).
fn format_timestamp(timestamp: u64) -> String {
    let datetime = UNIX_EPOCH + Duration::from_secs(timestamp);
    format!("{:?}", datetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzzplug_core::Role;
    use fuzzplug_engine::BuildKey;
    use tempfile::tempdir;

    #[test]
    fn test_clean_removes_cache() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("out.so");
        fs::write(&artifact, "binary").unwrap();

        let mut cache = BuildCache::for_plugin_dir(dir.path()).unwrap();
        cache
            .record(&BuildKey {
                role: Role::Reactor,
                source: "package main",
                go_version: "1.22.1",
                artifact: &artifact,
            })
            .unwrap();

        status(dir.path()).unwrap();
        clean(dir.path()).unwrap();
        assert!(!discovery::cache_dir(dir.path()).exists());
        assert!(artifact.exists());
    }

    #[test]
    fn test_status_without_cache() {
        let dir = tempdir().unwrap();
        status(dir.path()).unwrap();
        clean(dir.path()).unwrap();
    }
}
