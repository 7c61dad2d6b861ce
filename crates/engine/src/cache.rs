//! Build cache for skipping recompilation of unchanged plugins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fuzzplug_core::{PlugError, Result, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cache location relative to a plugin directory.
pub const CACHE_DIR: &str = ".fuzzplug/cache";

const CACHE_FILE: &str = "cache.json";

/// Records of previous builds, keyed by artifact path.
pub struct BuildCache {
    /// Directory where the cache file is stored.
    cache_dir: PathBuf,

    entries: HashMap<String, CacheEntry>,
}

/// One successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub role: Role,

    /// Shared library the build produced.
    pub artifact: PathBuf,

    /// Hash of the merged wrapper source.
    pub source_hash: String,

    pub go_version: String,

    /// Hash of the artifact right after the build.
    pub artifact_hash: String,

    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

/// Inputs that identify a build.
#[derive(Debug, Clone, Copy)]
pub struct BuildKey<'a> {
    pub role: Role,
    pub source: &'a str,
    pub go_version: &'a str,
    pub artifact: &'a Path,
}

impl BuildKey<'_> {
    fn id(&self) -> String {
        self.artifact.display().to_string()
    }

    fn source_hash(&self) -> String {
        blake3::hash(self.source.as_bytes()).to_hex().to_string()
    }
}

impl BuildCache {
    /// Opens (or creates) a cache in `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();

        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).map_err(|e| PlugError::write(&cache_dir, e))?;
        }

        let entries = Self::load_entries(&cache_dir)?;

        Ok(Self { cache_dir, entries })
    }

    /// Opens the cache belonging to the plugin project in `plugin_dir`.
    pub fn for_plugin_dir(plugin_dir: &Path) -> Result<Self> {
        Self::new(plugin_dir.join(CACHE_DIR))
    }

    fn load_entries(cache_dir: &Path) -> Result<HashMap<String, CacheEntry>> {
        let cache_file = cache_dir.join(CACHE_FILE);

        if !cache_file.exists() {
            return Ok(HashMap::new());
        }

        let content = fuzzplug_core::fs::read_to_string(&cache_file)?;
        // A corrupt cache only costs a rebuild.
        let entries = serde_json::from_str(&content).unwrap_or_default();

        Ok(entries)
    }

    fn save_entries(&self) -> Result<()> {
        let cache_file = self.cache_dir.join(CACHE_FILE);
        let content = serde_json::to_string_pretty(&self.entries).map_err(std::io::Error::other)?;
        fuzzplug_core::fs::write(&cache_file, content)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Entries sorted by artifact path.
    pub fn entries(&self) -> Vec<&CacheEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.artifact.cmp(&b.artifact));
        entries
    }

    /// Whether the artifact for `key` was built from the same inputs and is unchanged.
    pub fn is_up_to_date(&self, key: &BuildKey) -> bool {
        let Some(entry) = self.entries.get(&key.id()) else {
            return false;
        };

        if entry.role != key.role
            || entry.go_version != key.go_version
            || entry.source_hash != key.source_hash()
        {
            return false;
        }

        match Self::hash_file(key.artifact) {
            Ok(hash) => hash == entry.artifact_hash,
            Err(_) => false,
        }
    }

    /// Records a successful build of `key`.
    pub fn record(&mut self, key: &BuildKey) -> Result<()> {
        let entry = CacheEntry {
            role: key.role,
            artifact: key.artifact.to_path_buf(),
            source_hash: key.source_hash(),
            go_version: key.go_version.to_string(),
            artifact_hash: Self::hash_file(key.artifact)?,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
        };

        debug!(artifact = %entry.artifact.display(), "recording build");
        self.entries.insert(key.id(), entry);
        self.save_entries()
    }

    /// Clears all cache entries.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save_entries()
    }

    /// Forgets the build of `artifact`.
    pub fn invalidate(&mut self, artifact: &Path) -> Result<()> {
        self.entries.remove(&artifact.display().to_string());
        self.save_entries()
    }

    /// Hashes a file using blake3.
    pub fn hash_file(path: &Path) -> Result<String> {
        let content = fs::read(path).map_err(|e| PlugError::read(path, e))?;
        Ok(blake3::hash(&content).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cache_creation() {
        let dir = tempdir().unwrap();
        let cache = BuildCache::for_plugin_dir(dir.path()).unwrap();
        assert!(cache.entries().is_empty());
        assert!(dir.path().join(".fuzzplug/cache").is_dir());
    }

    #[test]
    fn test_cache_record_and_check() {
        let dir = tempdir().unwrap();
        let mut cache = BuildCache::for_plugin_dir(dir.path()).unwrap();

        let artifact = dir.path().join("FuzzGIUReact.so");
        fs::write(&artifact, "binary").unwrap();

        let key = BuildKey {
            role: Role::Reactor,
            source: "package main",
            go_version: "1.22.1",
            artifact: &artifact,
        };

        assert!(!cache.is_up_to_date(&key));
        cache.record(&key).unwrap();
        assert!(cache.is_up_to_date(&key));

        let changed_source = BuildKey {
            source: "package main\n",
            ..key
        };
        assert!(!cache.is_up_to_date(&changed_source));

        let changed_go = BuildKey {
            go_version: "1.23.0",
            ..key
        };
        assert!(!cache.is_up_to_date(&changed_go));

        fs::write(&artifact, "tampered").unwrap();
        assert!(!cache.is_up_to_date(&key));
    }

    #[test]
    fn test_cache_persists_and_clears() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("out.so");
        fs::write(&artifact, "binary").unwrap();
        let key = BuildKey {
            role: Role::PayloadGenerator,
            source: "x",
            go_version: "1.22.1",
            artifact: &artifact,
        };

        BuildCache::for_plugin_dir(dir.path()).unwrap().record(&key).unwrap();

        let mut reopened = BuildCache::for_plugin_dir(dir.path()).unwrap();
        assert!(reopened.is_up_to_date(&key));
        assert_eq!(reopened.entries().len(), 1);

        reopened.invalidate(&artifact).unwrap();
        assert!(!reopened.is_up_to_date(&key));

        reopened.record(&key).unwrap();
        reopened.clear().unwrap();
        assert!(BuildCache::for_plugin_dir(dir.path()).unwrap().entries().is_empty());
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join(CACHE_DIR);
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join("cache.json"), "{not json").unwrap();

        assert!(BuildCache::new(&cache_dir).unwrap().entries().is_empty());
    }
}
