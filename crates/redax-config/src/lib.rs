use anyhow::Context;
use redax_core::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for redax
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,

    #[serde(default)]
    pub staging: StagingConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Explicit converter binary; tried before `program` on PATH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_program")]
    pub program: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StagingConfig {
    /// Defaults to `<system temp>/redax_processing`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// 0 means unlimited
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default)]
    pub default_format: OutputFormat,

    /// Rule keys used when none are given on the command line
    #[serde(default)]
    pub default_rules: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            path: None,
            program: default_program(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            default_format: OutputFormat::default(),
            default_rules: Vec::new(),
        }
    }
}

fn default_program() -> String {
    "pandoc".to_string()
}

fn default_max_files() -> usize {
    5
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if it is missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "redax", "redax") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.redax/config.toml")
        }
    }

    /// Whether a batch of `count` files is within the configured limit
    pub fn allows_batch_of(&self, count: usize) -> bool {
        self.batch.max_files == 0 || count <= self.batch.max_files
    }
}
