//! Configuration parsing and management.

use crate::paths::SitePaths;
use crate::publish::RepoConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Main configuration struct matching the quire.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_sites_dir")]
    pub sites_dir: PathBuf,

    #[serde(default)]
    pub blocks: BlocksConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub html: HtmlConfig,

    #[serde(default)]
    pub publish: Option<RepoConfig>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_sites_dir() -> PathBuf {
    PathBuf::from("sites")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocksConfig {
    /// Cap applied to every relation list
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_max_items() -> usize {
    5
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    10
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HtmlConfig {
    /// Render draft content as well
    #[serde(default)]
    pub include_drafts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sites_dir: default_sites_dir(),
            blocks: BlocksConfig::default(),
            pagination: PaginationConfig::default(),
            html: HtmlConfig::default(),
            publish: None,
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Configuration rooted at `sites_dir` with every other value defaulted
    pub fn with_sites_dir(sites_dir: impl Into<PathBuf>) -> Self {
        Self {
            sites_dir: sites_dir.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Sites base directory, resolved relative to config file
    pub fn sites_dir(&self) -> PathBuf {
        self.resolve_path(&self.sites_dir)
    }

    /// Filesystem layout of one site
    pub fn site_paths(&self, slug: &str) -> SitePaths {
        SitePaths::new(self.sites_dir(), slug)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Get a nested config value using dotted path (e.g., "blocks.max_items")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["sites_dir"] => Some(self.sites_dir().display().to_string()),
            ["blocks", "max_items"] => Some(self.blocks.max_items.to_string()),
            ["pagination", "page_size"] => Some(self.pagination.page_size.to_string()),
            ["html", "include_drafts"] => Some(self.html.include_drafts.to_string()),
            ["publish", "branch"] => self.publish.as_ref().map(|p| p.branch.clone()),
            ["publish", "remote_url"] => self.publish.as_ref().map(|p| p.remote_url.clone()),
            _ => None,
        }
    }
}
