//! Read access to sites, sections and content.
//!
//! Persistence lives elsewhere; the engine only needs full fetches per run.
//! [`MemoryStore`] backs the CLI (JSON snapshots) and the tests.

use crate::models::{Content, ModelError, Section, SetPolicy, Site};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Failed to read snapshot {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Full-fetch read access used by the generators
pub trait ContentStore: Send + Sync {
    fn site(&self, slug: &str) -> Result<Site, StoreError>;

    fn sections(&self, site: &str) -> Result<Vec<Section>, StoreError>;

    /// All content of a site, in store order
    fn contents(&self, site: &str) -> Result<Vec<Content>, StoreError>;
}

/// One site with its records, as stored in a snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSnapshot {
    #[serde(flatten)]
    pub site: Site,

    #[serde(default)]
    pub sections: Vec<Section>,

    #[serde(default)]
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub sites: Vec<SiteSnapshot>,
}

/// In-memory store keyed by site slug
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sites: BTreeMap<String, SiteSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON snapshot file
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        let store = Self::from_snapshot(snapshot)?;
        tracing::debug!(path = %path.display(), sites = store.sites.len(), "loaded snapshot");
        Ok(store)
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for entry in snapshot.sites {
            store.insert_site(entry.site, entry.sections, entry.contents)?;
        }
        Ok(store)
    }

    /// Add or replace a site.
    ///
    /// Records without ids get fresh ones, and each content item's section
    /// path is joined in from its section.
    pub fn insert_site(
        &mut self,
        site: Site,
        mut sections: Vec<Section>,
        mut contents: Vec<Content>,
    ) -> Result<(), StoreError> {
        for section in &mut sections {
            if section.id.is_nil() {
                section.id = Uuid::new_v4();
            }
        }

        let paths: HashMap<Uuid, &str> = sections
            .iter()
            .map(|s| (s.id, s.path.as_str()))
            .collect();
        for content in &mut contents {
            content.set_id(Uuid::new_v4(), SetPolicy::IfAbsent)?;
            if let Some(path) = paths.get(&content.section_id) {
                content.section_path = path.to_string();
            }
        }

        self.sites.insert(
            site.slug.clone(),
            SiteSnapshot {
                site,
                sections,
                contents,
            },
        );
        Ok(())
    }

    fn entry(&self, slug: &str) -> Result<&SiteSnapshot, StoreError> {
        self.sites
            .get(slug)
            .ok_or_else(|| StoreError::SiteNotFound(slug.to_string()))
    }
}

impl ContentStore for MemoryStore {
    fn site(&self, slug: &str) -> Result<Site, StoreError> {
        self.entry(slug).map(|e| e.site.clone())
    }

    fn sections(&self, site: &str) -> Result<Vec<Section>, StoreError> {
        self.entry(site).map(|e| e.sections.clone())
    }

    fn contents(&self, site: &str) -> Result<Vec<Content>, StoreError> {
        self.entry(site).map(|e| e.contents.clone())
    }
}
