//! Publishing the generated tree.
//!
//! The engine does not push anywhere itself. It defines the [`Publisher`]
//! seam, the dry-run [`PlanReport`] and a [`DirectoryPublisher`] that
//! mirrors a tree into a local checkout (`file://` remotes).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Unsupported remote: {0}")]
    UnsupportedRemote(String),

    #[error("Publish source {0:?} is not a directory")]
    MissingSource(PathBuf),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {path:?}: {message}")]
    Walk { path: PathBuf, message: String },
}

fn default_branch() -> String {
    String::from("main")
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

/// Target repository of a publish
#[derive(Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    pub remote_url: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Never written back out or logged
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub author: CommitAuthor,
}

impl fmt::Debug for RepoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoConfig")
            .field("remote_url", &self.remote_url)
            .field("branch", &self.branch)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("author", &self.author)
            .finish()
    }
}

/// Files a publish would add, change or remove, as sorted relative paths
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct PlanReport {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl PlanReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Result of an actual publish
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Commit reference, when the publisher produces one
    pub commit: Option<String>,
    pub report: PlanReport,
}

/// Publish collaborator
pub trait Publisher {
    /// Apply the tree to the target
    fn publish(&self, tree: &Path, repo: &RepoConfig) -> Result<PublishOutcome, PublishError>;

    /// Describe what `publish` would do without touching the target
    fn plan(&self, tree: &Path, repo: &RepoConfig) -> Result<PlanReport, PublishError>;
}

/// Mirrors the tree into the directory named by a `file://` remote
#[derive(Debug, Clone, Default)]
pub struct DirectoryPublisher;

impl DirectoryPublisher {
    fn destination(repo: &RepoConfig) -> Result<PathBuf, PublishError> {
        repo.remote_url
            .strip_prefix("file://")
            .filter(|p| !p.is_empty())
            .map(|p| PathBuf::from(p).join(&repo.branch))
            .ok_or_else(|| PublishError::UnsupportedRemote(repo.remote_url.clone()))
    }
}

impl Publisher for DirectoryPublisher {
    fn publish(&self, tree: &Path, repo: &RepoConfig) -> Result<PublishOutcome, PublishError> {
        let dest = Self::destination(repo)?;
        let report = plan_tree(tree, &dest)?;

        for rel in report.added.iter().chain(report.changed.iter()) {
            let to = dest.join(rel);
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent).map_err(|source| PublishError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::copy(tree.join(rel), &to).map_err(|source| PublishError::Io { path: to, source })?;
        }
        for rel in &report.removed {
            let path = dest.join(rel);
            fs::remove_file(&path).map_err(|source| PublishError::Io { path, source })?;
        }

        tracing::info!(
            destination = %dest.display(),
            added = report.added.len(),
            changed = report.changed.len(),
            removed = report.removed.len(),
            "published tree"
        );
        Ok(PublishOutcome {
            commit: None,
            report,
        })
    }

    fn plan(&self, tree: &Path, repo: &RepoConfig) -> Result<PlanReport, PublishError> {
        plan_tree(tree, &Self::destination(repo)?)
    }
}

/// Compare `source` against `destination` file by file.
///
/// A missing destination means everything is added.
pub fn plan_tree(source: &Path, destination: &Path) -> Result<PlanReport, PublishError> {
    if !source.is_dir() {
        return Err(PublishError::MissingSource(source.to_path_buf()));
    }

    let ours = list_files(source)?;
    let theirs = if destination.is_dir() {
        list_files(destination)?
    } else {
        BTreeMap::new()
    };

    let mut report = PlanReport::default();
    for (rel, path) in &ours {
        match theirs.get(rel) {
            None => report.added.push(rel.clone()),
            Some(existing) => {
                if read(path)? != read(existing)? {
                    report.changed.push(rel.clone());
                }
            }
        }
    }
    report.removed = theirs
        .keys()
        .filter(|rel| !ours.contains_key(*rel))
        .cloned()
        .collect();

    Ok(report)
}

fn read(path: &Path) -> Result<Vec<u8>, PublishError> {
    fs::read(path).map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Relative path (forward slashes) to absolute path, skipping `.git`
fn list_files(root: &Path) -> Result<BTreeMap<String, PathBuf>, PublishError> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = entry.map_err(|e| PublishError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(rel, entry.path().to_path_buf());
    }
    Ok(files)
}
