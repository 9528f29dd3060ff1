//! CLI command implementations.

pub mod config;
pub mod html;
pub mod markdown;
pub mod paths;
pub mod plan;

pub use config::show_config;
pub use html::render_html;
pub use markdown::export_markdown;
pub use paths::show_paths;
pub use plan::plan_publish;

use anyhow::{Context, Result};
use clap::Args;
use quire_core::{Config, MemoryStore};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "quire.yml";

/// Site selection shared by the generation commands
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Site slug
    #[arg(long)]
    pub site: String,

    /// JSON snapshot holding the site's sections and content
    #[arg(long)]
    pub snapshot: PathBuf,
}

impl SourceArgs {
    pub fn load_store(&self) -> Result<MemoryStore> {
        MemoryStore::load(&self.snapshot)
            .with_context(|| format!("Failed to load snapshot {:?}", self.snapshot))
    }
}

/// Load the given config file, or `quire.yml` when present, or defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => {
            tracing::debug!("No {} found; using defaults", DEFAULT_CONFIG);
            return Ok(Config::default());
        }
    };
    tracing::debug!("Loading config from {:?}", path);
    Config::from_file(path).with_context(|| format!("Failed to load configuration {:?}", path))
}
