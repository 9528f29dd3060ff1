//! Data handed to templates.
//!
//! These are owned, serializable views so a template engine never needs to
//! borrow from the content snapshot.

use crate::blocks::GeneratedBlocks;
use crate::models::{Content, Meta, Section, Site};
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SiteView {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub base_url: String,
    pub mode: String,
}

impl From<&Site> for SiteView {
    fn from(site: &Site) -> Self {
        Self {
            slug: site.slug.clone(),
            title: if site.title.is_empty() {
                site.slug.clone()
            } else {
                site.title.clone()
            },
            description: site.description.clone(),
            base_url: site.base_url.clone(),
            mode: site.mode.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectionView {
    pub name: String,
    pub path: String,
    pub layout: String,
}

impl From<&Section> for SectionView {
    fn from(section: &Section) -> Self {
        Self {
            name: section.name.clone(),
            path: section.path.clone(),
            layout: section.layout_name().to_string(),
        }
    }
}

/// Compact reference used in lists and navigation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContentSummary {
    pub heading: String,
    pub url: String,
    pub kind: String,
    pub description: String,
    pub published: Option<String>,
    pub featured: bool,
    pub image: Option<String>,
    pub series_order: Option<i64>,
}

impl ContentSummary {
    pub fn new(content: &Content, url: String) -> Self {
        Self {
            heading: content.heading.clone(),
            url,
            kind: content.kind.to_string(),
            description: content.meta.description.clone(),
            published: content
                .published_at
                .map(|d| d.format(DATE_FORMAT).to_string()),
            featured: content.featured,
            image: content.image.clone(),
            series_order: content.series_order,
        }
    }
}

/// The focal item with its rendered body
#[derive(Debug, Clone, Serialize)]
pub struct ContentView {
    #[serde(flatten)]
    pub summary: ContentSummary,
    pub slug: String,
    pub html: String,
    pub tags: Vec<String>,
    pub draft: bool,
    pub series: Option<String>,
    pub meta: Meta,
}

impl ContentView {
    pub fn new(content: &Content, url: String, html: String) -> Self {
        Self {
            summary: ContentSummary::new(content, url),
            slug: content.slug(),
            html,
            tags: content.tag_names(),
            draft: content.draft,
            series: content.series_name().map(str::to_string),
            meta: content.meta.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct BlocksView {
    pub tag_related: Vec<ContentSummary>,
    pub recent: Vec<ContentSummary>,
    pub prev: Option<ContentSummary>,
    pub next: Option<ContentSummary>,
    pub index_forward: Vec<ContentSummary>,
    pub index_backward: Vec<ContentSummary>,
}

impl BlocksView {
    pub fn new<F>(blocks: &GeneratedBlocks<'_>, summarize: F) -> Self
    where
        F: Fn(&Content) -> ContentSummary,
    {
        let list = |items: &[&Content]| items.iter().copied().map(&summarize).collect::<Vec<_>>();
        Self {
            tag_related: list(&blocks.tag_related),
            recent: list(&blocks.recent),
            prev: blocks.prev.map(&summarize),
            next: blocks.next.map(&summarize),
            index_forward: list(&blocks.index_forward),
            index_backward: list(&blocks.index_backward),
        }
    }

    pub fn has_series(&self) -> bool {
        self.prev.is_some()
            || self.next.is_some()
            || !self.index_forward.is_empty()
            || !self.index_backward.is_empty()
    }
}

/// Everything a content layout can draw on
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub site: SiteView,
    pub section: Option<SectionView>,
    pub content: ContentView,
    pub blocks: BlocksView,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub current: usize,
    pub total: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// One page of a section/kind listing
#[derive(Debug, Clone, Serialize)]
pub struct IndexContext {
    pub site: SiteView,
    pub section: Option<SectionView>,
    pub title: String,
    pub url: String,
    pub items: Vec<ContentSummary>,
    pub pagination: Pagination,
}
