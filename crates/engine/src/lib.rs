//! fuzzplug Engine - Wrapper generation and Go toolchain driver.

mod builder;
mod cache;
mod merge;
mod scaffold;
mod template;
mod toolchain;

pub use builder::{
    BuildOptions, BuildReport, Inspection, PLUGIN_FILE, PluginBuilder, PreparedBuild, inspect,
    resolve_plugin_file,
};
pub use cache::{BuildCache, BuildKey, CACHE_DIR, CacheEntry};
pub use merge::{MergedSource, WRAPPER_FILE, dedup_imports, import_block, merge};
pub use scaffold::{
    FUZZ_TYPES_DIR, ScaffoldOptions, ScaffoldReport, go_mod, plugin_source, scaffold,
    stub_function,
};
pub use template::{FUZZ_TYPES_SOURCE, Marker, Template};
pub use toolchain::{CommandResult, GoToolchain, build_args, header_path, parse_version};
