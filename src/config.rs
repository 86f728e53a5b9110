//! Configuration management for the reading curator
//!
//! Provides strongly-typed configuration with validation, environment variable parsing,
//! and sensible defaults. Scoring weights can be overridden from a TOML file.
//!
//! # Example
//! ```no_run
//! use curator::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("Catalog: {}", config.data.catalog_path.display());
//! ```

use crate::error::{Error, Result};
use crate::recommendation::{EngineSettings, ScoringWeights};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Input file locations
    pub data: DataConfig,
    /// Curation engine configuration
    pub engine: EngineConfig,
}

/// Where the loaders read their inputs
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// JSON array of content items
    pub catalog_path: PathBuf,
    /// JSON task log document
    pub logs_path: PathBuf,
    /// Optional JSON word -> mastery map
    pub vocabulary_path: Option<PathBuf>,
}

/// Curation engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Candidates kept for weighted sampling
    pub top_k: usize,
    /// Maximum items in a category-focused ranking
    pub focus_limit: usize,
    /// Fixed seed for reproducible sampling
    pub rng_seed: Option<u64>,
    /// Pool size from which scoring runs in parallel
    pub parallel_threshold: usize,
    /// Recommendations slower than this are logged as warnings
    pub slow_threshold_ms: u64,
    /// File the weights were loaded from, if any
    pub weights_file: Option<PathBuf>,
    pub weights: ScoringWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let settings = EngineSettings::default();
        Self {
            top_k: settings.top_k,
            focus_limit: settings.focus_limit,
            rng_seed: None,
            parallel_threshold: settings.parallel_threshold,
            slow_threshold_ms: settings.slow_threshold_ms,
            weights_file: None,
            weights: ScoringWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            top_k: self.top_k,
            focus_limit: self.focus_limit,
            parallel_threshold: self.parallel_threshold,
            slow_threshold_ms: self.slow_threshold_ms,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Prefer a directory of files (FFOLDER) where secrets are mounted as files
        // Each file name is the env var name and its contents is the value.
        if let Ok(folder) = std::env::var("FFOLDER") {
            load_env_folder(Path::new(&folder));
        } else {
            // Try to load .env file (ignore if not found)
            dotenvy::dotenv().ok();
        }

        let config = Self {
            data: DataConfig::from_env(),
            engine: EngineConfig::from_env()?,
        };

        config.validate()?;
        config.log_summary();

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.top_k == 0 {
            return Err(Error::InvalidConfig {
                key: "CURATOR_TOP_K",
                message: "top_k must be at least 1".into(),
            });
        }

        if self.engine.focus_limit == 0 {
            return Err(Error::InvalidConfig {
                key: "CURATOR_FOCUS_LIMIT",
                message: "focus_limit must be at least 1".into(),
            });
        }

        self.engine.weights.validate()
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  Data:");
        info!("    Catalog: {}", self.data.catalog_path.display());
        info!("    Logs: {}", self.data.logs_path.display());
        match &self.data.vocabulary_path {
            Some(path) => info!("    Vocabulary: {}", path.display()),
            None => info!("    Vocabulary: none"),
        }
        info!("  Engine:");
        info!("    Top K: {}", self.engine.top_k);
        info!("    Focus Limit: {}", self.engine.focus_limit);
        info!("    Parallel Threshold: {}", self.engine.parallel_threshold);
        info!("    Slow Threshold: {}ms", self.engine.slow_threshold_ms);
        match self.engine.rng_seed {
            Some(seed) => info!("    RNG Seed: {}", seed),
            None => info!("    RNG Seed: random"),
        }
        if let Some(path) = &self.engine.weights_file {
            info!("    Weights: {}", path.display());
        }
    }
}

impl DataConfig {
    fn from_env() -> Self {
        Self {
            catalog_path: get_env_or("CURATOR_CATALOG_PATH", "reading_materials.json").into(),
            logs_path: get_env_or("CURATOR_LOGS_PATH", "task_logs.json").into(),
            vocabulary_path: get_env_opt("CURATOR_VOCABULARY_PATH").map(PathBuf::from),
        }
    }
}

impl EngineConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let weights_file = get_env_opt("CURATOR_WEIGHTS_FILE").map(PathBuf::from);
        let weights = match &weights_file {
            Some(path) => load_weights(path)?,
            None => ScoringWeights::default(),
        };

        let rng_seed = match get_env_opt("CURATOR_RNG_SEED") {
            Some(_) => Some(get_env_parsed("CURATOR_RNG_SEED")?),
            None => None,
        };

        Ok(Self {
            top_k: get_env_or("CURATOR_TOP_K", &defaults.top_k.to_string())
                .parse()
                .unwrap_or(defaults.top_k),
            focus_limit: get_env_or("CURATOR_FOCUS_LIMIT", &defaults.focus_limit.to_string())
                .parse()
                .unwrap_or(defaults.focus_limit),
            rng_seed,
            parallel_threshold: get_env_or(
                "CURATOR_PARALLEL_THRESHOLD",
                &defaults.parallel_threshold.to_string(),
            )
            .parse()
            .unwrap_or(defaults.parallel_threshold),
            slow_threshold_ms: get_env_or(
                "CURATOR_SLOW_THRESHOLD_MS",
                &defaults.slow_threshold_ms.to_string(),
            )
            .parse()
            .unwrap_or(defaults.slow_threshold_ms),
            weights_file,
            weights,
        })
    }
}

/// Read scoring weights from a TOML file; missing keys keep their defaults
pub fn load_weights(path: &Path) -> Result<ScoringWeights> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let weights: ScoringWeights = toml::from_str(&contents)?;
    weights.validate()?;
    Ok(weights)
}

// ============================================================================
// Helper functions
// ============================================================================

/// Export every file in `folder` as an env var named after the file
fn load_env_folder(folder: &Path) {
    if !folder.is_dir() {
        return;
    }

    match std::fs::read_dir(folder) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if !path.is_file() {
                    continue;
                }
                if let Ok(contents) = std::fs::read_to_string(&path) {
                    // Only set env var if not already set in the environment
                    if std::env::var(&name).is_err() {
                        std::env::set_var(&name, contents.trim());
                    }
                }
            }
        }
        Err(err) => {
            log::warn!("Failed to read FFOLDER {}: {}", folder.display(), err);
        }
    }
    log::info!("Loaded configuration from FFOLDER={}", folder.display());
}

/// Get required environment variable
fn get_env(key: &'static str) -> Result<String> {
    std::env::var(key).map_err(|_| Error::MissingEnvVar { var: key })
}

/// Get environment variable with default
fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a non-empty environment variable, if set
fn get_env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get and parse environment variable
fn get_env_parsed<T: std::str::FromStr>(key: &'static str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let value = get_env(key)?;
    value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
        key,
        message: format!("Invalid value '{}': {}", value, e).into(),
    })
}
