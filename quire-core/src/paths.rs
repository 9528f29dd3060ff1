//! URL and file path algebra for both site modes.
//!
//! Everything here is pure: the same inputs always produce the same paths
//! and no function touches the filesystem. URLs never contain `//` and
//! file paths for pages always terminate in `index.html`.

use crate::models::{ContentKind, SiteMode};
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.html";

/// Computes canonical URLs and output files for one site mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathResolver {
    mode: SiteMode,
}

impl PathResolver {
    pub fn new(mode: SiteMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SiteMode {
        self.mode
    }

    /// URL of a content item
    ///
    /// ```
    /// use quire_core::{PathResolver, SiteMode};
    ///
    /// let blog = PathResolver::new(SiteMode::Blog);
    /// assert_eq!(blog.content_path("guides", "hello"), "/hello");
    ///
    /// let structured = PathResolver::new(SiteMode::Structured);
    /// assert_eq!(structured.content_path("guides", "hello"), "/guides/hello");
    /// assert_eq!(structured.content_path("/", "hello"), "/hello");
    /// ```
    pub fn content_path(&self, section_path: &str, slug: &str) -> String {
        let slug = trim_segment(slug);
        match self.mode {
            SiteMode::Blog => format!("/{}", slug),
            SiteMode::Structured => {
                let section = normalize_segment(section_path);
                if section.is_empty() {
                    format!("/{}", slug)
                } else {
                    format!("/{}/{}", section, slug)
                }
            }
        }
    }

    /// URL of the index listing items of `kind` in a section
    pub fn index_path(&self, section_path: &str, kind: ContentKind) -> String {
        match self.mode {
            SiteMode::Blog => "/".to_string(),
            SiteMode::Structured => {
                let section = normalize_segment(section_path);
                match (section.is_empty(), kind) {
                    (true, ContentKind::Blog) => "/blog/".to_string(),
                    (false, ContentKind::Blog) => format!("/{}/blog/", section),
                    (true, _) => "/".to_string(),
                    (false, _) => format!("/{}/", section),
                }
            }
        }
    }

    /// URL of page `page` of an index. Pages at or below 1 are the index
    /// path itself.
    pub fn pagination_path(&self, index_path: &str, page: usize) -> String {
        pagination_path(index_path, page)
    }

    /// Output file of a content item: one directory per item
    pub fn content_file(&self, html_root: &Path, section_path: &str, slug: &str) -> PathBuf {
        url_to_file(html_root, &self.content_path(section_path, slug))
    }

    /// Output file of the first page of an index
    pub fn index_file(&self, html_root: &Path, section_path: &str, kind: ContentKind) -> PathBuf {
        url_to_file(html_root, &self.index_path(section_path, kind))
    }

    /// Output file of page `page` of an index
    pub fn pagination_file(&self, html_root: &Path, index_path: &str, page: usize) -> PathBuf {
        url_to_file(html_root, &self.pagination_path(index_path, page))
    }
}

/// Mode-independent pagination rule.
///
/// The first page is the index path as given (an empty path reads as
/// `/`); later pages are normalized before the `page/{n}/` suffix.
pub fn pagination_path(index_path: &str, page: usize) -> String {
    if page <= 1 {
        return if index_path.is_empty() {
            "/".to_string()
        } else {
            index_path.to_string()
        };
    }
    let base = normalize_url(index_path);
    if base.ends_with('/') {
        format!("{}page/{}/", base, page)
    } else {
        format!("{}/page/{}/", base, page)
    }
}

/// Map a site URL onto `{html_root}/{segments...}/index.html`
pub fn url_to_file(html_root: &Path, url: &str) -> PathBuf {
    let mut path = html_root.to_path_buf();
    for segment in url.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push(INDEX_FILE);
    path
}

/// Collapse repeated slashes and ensure a leading slash; empty becomes `/`
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let mut out = String::with_capacity(trimmed.len() + 1);
    if !trimmed.starts_with('/') {
        out.push('/');
    }
    for c in trimmed.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Section path without surrounding or repeated slashes ("" for the root)
pub fn normalize_segment(section_path: &str) -> String {
    section_path
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn trim_segment(slug: &str) -> &str {
    slug.trim().trim_matches('/')
}

/// Per-site filesystem layout rooted at a shared sites directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    base: PathBuf,
    slug: String,
}

impl SitePaths {
    pub fn new(base: impl Into<PathBuf>, slug: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            slug: slug.into(),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn root(&self) -> PathBuf {
        self.base.join(&self.slug)
    }

    pub fn db_path(&self) -> PathBuf {
        self.root().join("db").join(format!("{}.db", self.slug))
    }

    /// SQLite DSN with a shared cache, creating the database if missing
    pub fn dsn(&self) -> String {
        format!("file:{}?cache=shared&mode=rwc", self.db_path().display())
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.root().join("documents")
    }

    pub fn markdown_dir(&self) -> PathBuf {
        self.documents_dir().join("markdown")
    }

    pub fn html_dir(&self) -> PathBuf {
        self.documents_dir().join("html")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.documents_dir().join("assets")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.assets_dir().join("images")
    }
}
