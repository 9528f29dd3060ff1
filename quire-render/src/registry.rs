//! Layout registry with the built-in askama layouts.

use crate::templates::{ContentTemplate, IndexTemplate};
use askama::Template;
use quire_core::models::ContentKind;
use quire_core::template::{DEFAULT_LAYOUT, INDEX_LAYOUT};
use quire_core::{RenderError, TemplateData, TemplateKey, TemplateRenderer};
use std::collections::HashMap;
use std::sync::Arc;

/// A layout: renders one kind of template data to HTML
pub type Layout =
    Arc<dyn Fn(&TemplateKey, TemplateData<'_>) -> Result<String, RenderError> + Send + Sync>;

const CONTENT_KINDS: [ContentKind; 4] = [
    ContentKind::Page,
    ContentKind::Article,
    ContentKind::Blog,
    ContentKind::Series,
];

/// Layouts keyed by scope and name.
///
/// Filled once at startup and only read while rendering.
#[derive(Clone, Default)]
pub struct TemplateRegistry {
    layouts: HashMap<TemplateKey, Layout>,
}

impl TemplateRegistry {
    /// Registry holding the built-in global layouts
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for kind in CONTENT_KINDS {
            registry.register(TemplateKey::global(kind.as_str()), content_layout);
        }
        registry.register(TemplateKey::global(DEFAULT_LAYOUT), content_layout);
        registry.register(TemplateKey::global(INDEX_LAYOUT), index_layout);
        registry
    }

    /// Registry without any layouts
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace the layout under `key`
    pub fn register<F>(&mut self, key: TemplateKey, layout: F) -> &mut Self
    where
        F: Fn(&TemplateKey, TemplateData<'_>) -> Result<String, RenderError> + Send + Sync + 'static,
    {
        tracing::debug!(template = %key, "registered layout");
        self.layouts.insert(key, Arc::new(layout));
        self
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Registered keys in a stable order
    pub fn keys(&self) -> Vec<&TemplateKey> {
        let mut keys: Vec<_> = self.layouts.keys().collect();
        keys.sort();
        keys
    }
}

impl TemplateRenderer for TemplateRegistry {
    fn has(&self, key: &TemplateKey) -> bool {
        self.layouts.contains_key(key)
    }

    fn render(&self, key: &TemplateKey, data: TemplateData<'_>) -> Result<String, RenderError> {
        let layout = self
            .layouts
            .get(key)
            .ok_or_else(|| RenderError::Missing(key.to_string()))?;
        layout(key, data)
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("layouts", &self.keys())
            .finish()
    }
}

/// Built-in layout for content pages
pub fn content_layout(key: &TemplateKey, data: TemplateData<'_>) -> Result<String, RenderError> {
    match data {
        TemplateData::Content(page) => ContentTemplate::new(page)
            .render()
            .map_err(|e| template_error(key, e)),
        other => Err(wrong_data(key, other)),
    }
}

/// Built-in layout for index pages
pub fn index_layout(key: &TemplateKey, data: TemplateData<'_>) -> Result<String, RenderError> {
    match data {
        TemplateData::Index(index) => IndexTemplate::new(index)
            .render()
            .map_err(|e| template_error(key, e)),
        other => Err(wrong_data(key, other)),
    }
}

fn template_error(key: &TemplateKey, err: askama::Error) -> RenderError {
    RenderError::Template {
        key: key.to_string(),
        message: err.to_string(),
    }
}

fn wrong_data(key: &TemplateKey, data: TemplateData<'_>) -> RenderError {
    RenderError::WrongData {
        key: key.to_string(),
        data: data.label(),
    }
}
