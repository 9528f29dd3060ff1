//! Content model structs for sites, sections, tags and content items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::slug::slugify;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid site mode: {0}")]
    InvalidMode(String),

    #[error("Invalid content kind: {0}")]
    InvalidKind(String),

    #[error("Protected field '{field}' already set on {entity}")]
    ProtectedField { entity: String, field: &'static str },
}

/// How a field assignment treats a value that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPolicy {
    /// Only assign when the field is still empty.
    IfAbsent,
    /// Replace whatever is there.
    Overwrite,
}

/// URL layout philosophy of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    /// Flat, date-stream URLs
    #[default]
    Blog,
    /// Section-nested URLs
    Structured,
}

impl SiteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteMode::Blog => "blog",
            SiteMode::Structured => "structured",
        }
    }
}

impl FromStr for SiteMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blog" => Ok(SiteMode::Blog),
            "structured" => Ok(SiteMode::Structured),
            _ => Err(ModelError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for SiteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Page,
    Article,
    Blog,
    Series,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Page => "page",
            ContentKind::Article => "article",
            ContentKind::Blog => "blog",
            ContentKind::Series => "series",
        }
    }

    /// Kinds that take part in tag/recency relations
    pub fn is_stream(&self) -> bool {
        matches!(self, ContentKind::Article | ContentKind::Blog)
    }
}

impl FromStr for ContentKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "page" => Ok(ContentKind::Page),
            "article" => Ok(ContentKind::Article),
            "blog" => Ok(ContentKind::Blog),
            "series" => Ok(ContentKind::Series),
            _ => Err(ModelError::InvalidKind(s.to_string())),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A site: selects the path algebra and the output root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub slug: String,

    #[serde(default)]
    pub mode: SiteMode,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    String::from("/")
}

impl Site {
    pub fn new(slug: impl Into<String>, mode: SiteMode) -> Self {
        let slug = slug.into();
        Self {
            title: slug.clone(),
            slug,
            mode,
            active: true,
            description: String::new(),
            base_url: default_base_url(),
        }
    }
}

/// Grouping and URL namespace for content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,

    pub name: String,

    /// URL path prefix ("/" or "" for the root section)
    #[serde(default)]
    pub path: String,

    /// Layout reference used for template lookup
    #[serde(default)]
    pub layout: Option<String>,
}

impl Section {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            layout: None,
        }
    }

    /// Layout name used for section-scoped template lookup
    pub fn layout_name(&self) -> &str {
        self.layout.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// SEO and presentation metadata attached to a content item
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Meta {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub keywords: String,

    #[serde(default)]
    pub robots: String,

    #[serde(default)]
    pub canonical_url: String,

    #[serde(default)]
    pub sitemap: String,

    #[serde(default)]
    pub table_of_contents: bool,

    #[serde(default)]
    pub comments: bool,

    #[serde(default)]
    pub share: bool,
}

/// A single content item (page, article, blog post or series part)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,

    #[serde(default = "Uuid::nil")]
    pub section_id: Uuid,

    /// Denormalised section path, filled in by the store
    #[serde(default)]
    pub section_path: String,

    pub kind: ContentKind,

    pub heading: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub featured: bool,

    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub series: Option<String>,

    #[serde(default)]
    pub series_order: Option<i64>,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default)]
    pub image: Option<String>,

    /// Explicit slug; derived from the heading when absent
    #[serde(default)]
    pub slug: Option<String>,
}

impl Content {
    pub fn new(kind: ContentKind, heading: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            section_id: Uuid::nil(),
            section_path: String::new(),
            kind,
            heading: heading.into(),
            body: String::new(),
            tags: Vec::new(),
            draft: false,
            featured: false,
            published_at: None,
            series: None,
            series_order: None,
            meta: Meta::default(),
            image: None,
            slug: None,
        }
    }

    /// Short, URL-friendly form of the id (first 8 hex digits)
    pub fn short_id(&self) -> String {
        let simple = self.id.simple().to_string();
        simple[..8].to_string()
    }

    /// URL slug: explicit slug or `{heading}-{shortid}`
    pub fn slug(&self) -> String {
        match self.slug.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => slugify(s),
            _ => {
                let base = slugify(&self.heading);
                if base.is_empty() {
                    self.short_id()
                } else {
                    format!("{}-{}", base, self.short_id())
                }
            }
        }
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    pub fn shares_tag_with(&self, other: &Content) -> bool {
        self.tags
            .iter()
            .any(|t| other.tags.iter().any(|o| o.name == t.name))
    }

    /// Series name, if the item belongs to a non-empty series
    pub fn series_name(&self) -> Option<&str> {
        self.series
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn series_position(&self) -> i64 {
        self.series_order.unwrap_or(0)
    }

    /// Assign the id according to `policy`.
    ///
    /// Returns whether the id changed. Overwriting an id that is already
    /// set is refused: the id is a protected field.
    pub fn set_id(&mut self, id: Uuid, policy: SetPolicy) -> Result<bool, ModelError> {
        if self.id.is_nil() {
            self.id = id;
            return Ok(true);
        }
        match policy {
            SetPolicy::IfAbsent => Ok(false),
            SetPolicy::Overwrite if self.id == id => Ok(false),
            SetPolicy::Overwrite => Err(ModelError::ProtectedField {
                entity: format!("content '{}'", self.heading),
                field: "id",
            }),
        }
    }

    /// Assign the header image according to `policy`. Returns whether it changed.
    pub fn set_image(&mut self, image: impl Into<String>, policy: SetPolicy) -> bool {
        if self.image.is_some() && policy == SetPolicy::IfAbsent {
            return false;
        }
        self.image = Some(image.into());
        true
    }
}

/// Frontmatter header written ahead of each exported markdown document
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Frontmatter {
    pub title: String,

    pub slug: String,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub featured: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub keywords: String,

    #[serde(default)]
    pub robots: String,

    #[serde(default)]
    pub canonical_url: String,

    #[serde(default)]
    pub sitemap: String,

    #[serde(default)]
    pub table_of_contents: bool,

    #[serde(default)]
    pub comments: bool,

    #[serde(default)]
    pub share: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl From<&Content> for Frontmatter {
    fn from(content: &Content) -> Self {
        Self {
            title: content.heading.clone(),
            slug: content.slug(),
            draft: content.draft,
            featured: content.featured,
            description: content.meta.description.clone(),
            keywords: content.meta.keywords.clone(),
            robots: content.meta.robots.clone(),
            canonical_url: content.meta.canonical_url.clone(),
            sitemap: content.meta.sitemap.clone(),
            table_of_contents: content.meta.table_of_contents,
            comments: content.meta.comments,
            share: content.meta.share,
            image: content.image.clone().filter(|i| !i.trim().is_empty()),
            tags: content.tag_names(),
        }
    }
}
