//! Error taxonomy for generation runs.

use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`GenerateError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Render,
    Io,
    Cancelled,
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Render failed for {site}/{target}: {message}")]
    Render {
        site: String,
        target: String,
        message: String,
    },

    #[error("I/O failed for {site} at {path:?}: {source}")]
    Io {
        site: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store failed for {site}: {source}")]
    Store {
        site: String,
        #[source]
        source: StoreError,
    },

    #[error("Run for {site} cancelled after {written} files")]
    Cancelled { site: String, written: usize },
}

impl GenerateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::NotFound(_) => ErrorKind::NotFound,
            GenerateError::Validation(_) => ErrorKind::Validation,
            GenerateError::Render { .. } => ErrorKind::Render,
            GenerateError::Io { .. } | GenerateError::Store { .. } => ErrorKind::Io,
            GenerateError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn render(site: &str, target: impl Into<String>, err: impl std::fmt::Display) -> Self {
        GenerateError::Render {
            site: site.to_string(),
            target: target.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(site: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            site: site.to_string(),
            path: path.into(),
            source,
        }
    }

    pub(crate) fn store(site: &str, source: StoreError) -> Self {
        match source {
            StoreError::SiteNotFound(slug) => GenerateError::NotFound(format!("site '{}'", slug)),
            source => GenerateError::Store {
                site: site.to_string(),
                source,
            },
        }
    }
}
