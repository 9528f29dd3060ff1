//! Template rendering capability and layout lookup keys.

use crate::context::{IndexContext, PageContext};
use crate::models::ContentKind;
use std::fmt;
use thiserror::Error;

/// Layout name used when no kind-specific layout exists
pub const DEFAULT_LAYOUT: &str = "default";

/// Layout name for paginated listings
pub const INDEX_LAYOUT: &str = "index";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No template registered for {0}")]
    Missing(String),

    #[error("Template {key} failed: {message}")]
    Template { key: String, message: String },

    #[error("Template {key} cannot render {data} data")]
    WrongData { key: String, data: &'static str },
}

/// Where a layout lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayoutScope {
    Global,
    Section(String),
}

/// Composite lookup key: layout scope plus layout name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateKey {
    pub scope: LayoutScope,
    pub name: String,
}

impl TemplateKey {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            scope: LayoutScope::Global,
            name: name.into(),
        }
    }

    pub fn section(layout: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: LayoutScope::Section(layout.into()),
            name: name.into(),
        }
    }

    /// Lookup order for a content page: section layouts first, then global
    pub fn content_chain(section_layout: Option<&str>, kind: ContentKind) -> Vec<TemplateKey> {
        let mut chain = Vec::with_capacity(4);
        if let Some(layout) = section_layout.filter(|l| !l.trim().is_empty()) {
            chain.push(Self::section(layout, kind.as_str()));
            chain.push(Self::section(layout, DEFAULT_LAYOUT));
        }
        chain.push(Self::global(kind.as_str()));
        chain.push(Self::global(DEFAULT_LAYOUT));
        chain
    }

    /// Lookup order for an index page
    pub fn index_chain(section_layout: Option<&str>) -> Vec<TemplateKey> {
        let mut chain = Vec::with_capacity(2);
        if let Some(layout) = section_layout.filter(|l| !l.trim().is_empty()) {
            chain.push(Self::section(layout, INDEX_LAYOUT));
        }
        chain.push(Self::global(INDEX_LAYOUT));
        chain
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            LayoutScope::Global => write!(f, "global/{}", self.name),
            LayoutScope::Section(layout) => write!(f, "section:{}/{}", layout, self.name),
        }
    }
}

/// Data passed to a layout
#[derive(Debug, Clone, Copy)]
pub enum TemplateData<'a> {
    Content(&'a PageContext),
    Index(&'a IndexContext),
}

impl TemplateData<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            TemplateData::Content(_) => "content",
            TemplateData::Index(_) => "index",
        }
    }
}

/// Template rendering capability
pub trait TemplateRenderer: Send + Sync {
    fn has(&self, key: &TemplateKey) -> bool;

    fn render(&self, key: &TemplateKey, data: TemplateData<'_>) -> Result<String, RenderError>;
}

/// Render with the first key in `chain` the renderer knows
pub fn render_first(
    renderer: &dyn TemplateRenderer,
    chain: &[TemplateKey],
    data: TemplateData<'_>,
) -> Result<String, RenderError> {
    let key = chain.iter().find(|k| renderer.has(k)).ok_or_else(|| {
        RenderError::Missing(
            chain
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )
    })?;
    tracing::trace!(template = %key, "resolved layout");
    renderer.render(key, data)
}
