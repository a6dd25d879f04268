//! Configuration module for the vector index.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary after loading)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `VS_` and use double underscores
//! to separate nested levels:
//! - `VS_ENGINE__DIMENSION=768` sets `engine.dimension`
//! - `VS_ENGINE__PARALLEL_THREADS=8` sets `engine.parallel_threads`
//! - `VS_SEARCH__TOP_K=5` sets `search.top_k`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

use crate::error::{VectorError, VectorResult};
use crate::vector::{DEFAULT_MIN_PARALLEL_LEN, DuplicateIdPolicy, SearchParams, VectorDimension};

/// Directory holding the workspace settings file.
const CONFIG_DIR: &str = ".vecscan";

/// Settings file name inside [`CONFIG_DIR`].
const CONFIG_FILE: &str = "settings.toml";

/// Environment variable prefix.
const ENV_PREFIX: &str = "VS_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Engine construction settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Default search parameters
    #[serde(default)]
    pub search: SearchConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Vector dimension, fixed for the engine's lifetime
    #[serde(default)]
    pub dimension: VectorDimension,

    /// Worker threads for search (0 lets rayon decide)
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Minimum number of candidates scored by one rayon split
    #[serde(default = "default_min_parallel_len")]
    pub min_parallel_len: usize,

    /// Behavior when an id is added twice
    #[serde(default)]
    pub duplicate_ids: DuplicateIdPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Number of results per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Inclusive similarity floor
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Maximum level: "off", "error", "warn", "info", "debug" or "trace"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Colorize log output
    #[serde(default = "default_true")]
    pub ansi: bool,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_min_parallel_len() -> usize {
    DEFAULT_MIN_PARALLEL_LEN
}
fn default_top_k() -> usize {
    SearchParams::default().top_k
}
fn default_min_similarity() -> f32 {
    SearchParams::default().min_similarity
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            engine: EngineConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dimension: VectorDimension::default(),
            parallel_threads: default_parallel_threads(),
            min_parallel_len: default_min_parallel_len(),
            duplicate_ids: DuplicateIdPolicy::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn params(&self) -> SearchParams {
        SearchParams::new(self.top_k, self.min_similarity)
    }
}

impl LoggingConfig {
    /// Parses `level` into a filter.
    pub fn level_filter(&self) -> VectorResult<LevelFilter> {
        self.level.parse().map_err(|_| {
            VectorError::Config(format!(
                "unknown log level '{}', expected off/error/warn/info/debug/trace",
                self.level
            ))
        })
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .vecscan directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::layered(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::layered(path.as_ref())
    }

    fn layered(path: &Path) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Double underscore becomes a dot, single underscores stay in field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for .vecscan directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(CONFIG_FILE))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(
        dir: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# vecscan configuration

# Version of the configuration schema
version = 1

[engine]
# Vector dimension (must match the embedding model)
dimension = 384

# Worker threads for search (0 = rayon default)
parallel_threads = {}

# Minimum candidates scored by one worker split
min_parallel_len = {DEFAULT_MIN_PARALLEL_LEN}

# Re-adding an id: "alias" keeps both entries searchable, "reject" fails
duplicate_ids = "alias"

[search]
# Results per query
top_k = 10

# Inclusive similarity floor (-1.0 to 1.0)
min_similarity = 0.0

[logging]
# off, error, warn, info, debug, trace
level = "warn"
ansi = true
"#,
            num_cpus::get()
        );

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}
