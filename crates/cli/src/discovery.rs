//! Plugin project discovery logic.

use std::path::{Path, PathBuf};

use miette::{Result, miette};

/// Go module file name.
const GO_MOD: &str = "go.mod";

/// Finds the nearest `go.mod` by searching from `start` upwards.
pub fn find_go_mod_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(GO_MOD))
        .find(|candidate| candidate.is_file())
}

/// Reads the module path from the contents of a `go.mod` file.
pub fn parse_module_name(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest.split("//").next()?.trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Module name of the Go project containing `plugin_dir`, if it has one.
pub fn module_name(plugin_dir: &Path) -> Option<String> {
    let go_mod = find_go_mod_from(plugin_dir)?;
    let content = std::fs::read_to_string(&go_mod).ok()?;
    parse_module_name(&content)
}

/// Directory of the plugin named by `path` (a file or a project directory).
pub fn plugin_dir(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.to_path_buf();
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Resolves a user-supplied output path against the current directory.
pub fn absolute_output(output: &Path) -> Result<PathBuf> {
    if output.is_absolute() {
        return Ok(output.to_path_buf());
    }

    let cwd =
        std::env::current_dir().map_err(|e| miette!("Cannot get current directory: {}", e))?;
    Ok(cwd.join(output))
}

/// Returns the cache directory for a plugin project.
pub fn cache_dir(plugin_dir: &Path) -> PathBuf {
    plugin_dir.join(fuzzplug_engine::CACHE_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_go_mod_in_parent() {
        let dir = tempdir().unwrap();
        let go_mod = dir.path().join("go.mod");
        fs::write(&go_mod, "module example.com/fuzz\n").unwrap();

        let subdir = dir.path().join("plugins").join("react");
        fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_go_mod_from(&subdir), Some(go_mod));
        assert_eq!(module_name(&subdir).as_deref(), Some("example.com/fuzz"));
    }

    #[test]
    fn test_parse_module_name() {
        assert_eq!(
            parse_module_name("module ReactFuzzGIU\n\ngo 1.22.1\n").as_deref(),
            Some("ReactFuzzGIU")
        );
        assert_eq!(
            parse_module_name("// header\nmodule \"quoted/mod\" // trailing\n").as_deref(),
            Some("quoted/mod")
        );
        assert_eq!(parse_module_name("modules foo\n"), None);
        assert_eq!(parse_module_name("go 1.22\n"), None);
    }

    #[test]
    fn test_plugin_dir() {
        let dir = tempdir().unwrap();
        assert_eq!(plugin_dir(dir.path()), dir.path());
        assert_eq!(
            plugin_dir(&dir.path().join("plugin.go")),
            dir.path().to_path_buf()
        );
        assert_eq!(plugin_dir(Path::new("plugin.go")), Path::new("."));
    }

    #[test]
    fn test_absolute_output() {
        let absolute = Path::new("/tmp/out.so");
        assert_eq!(absolute_output(absolute).unwrap(), absolute);

        let relative = absolute_output(Path::new("out.so")).unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("out.so"));
    }

    #[test]
    fn test_cache_dir() {
        assert_eq!(
            cache_dir(Path::new("/some/plugin")),
            Path::new("/some/plugin/.fuzzplug/cache")
        );
    }
}
