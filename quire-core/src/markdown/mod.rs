//! Markdown to HTML conversion with an optional image enhancement pass.

pub mod images;

use pulldown_cmark::{html, Options, Parser};
use std::sync::Arc;
use thiserror::Error;

pub use images::{enhance_images, ImageCatalog, ImageContext, ImageMeta, CAPTION_SEPARATOR, IMAGE_CLASS};

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("Markdown renderer failed: {0}")]
    Render(String),
}

/// Markdown rendering capability
///
/// The engine only depends on this seam so another renderer can be
/// plugged in; [`CmarkRenderer`] is the default.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String, MarkdownError>;
}

/// pulldown-cmark backed renderer
#[derive(Debug, Clone, Copy)]
pub struct CmarkRenderer {
    options: Options,
}

impl CmarkRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }
}

impl Default for CmarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> Result<String, MarkdownError> {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        Ok(html_output)
    }
}

/// Markdown processor, optionally bound to an image metadata lookup
#[derive(Clone)]
pub struct MarkdownProcessor {
    renderer: Arc<dyn MarkdownRenderer>,
    images: Option<Arc<dyn ImageContext>>,
}

impl MarkdownProcessor {
    /// Context-free processor
    pub fn new() -> Self {
        Self {
            renderer: Arc::new(CmarkRenderer::new()),
            images: None,
        }
    }

    /// Processor that enriches images from `images`
    pub fn with_image_context(images: Arc<dyn ImageContext>) -> Self {
        Self {
            images: Some(images),
            ..Self::new()
        }
    }

    /// Swap the underlying renderer
    pub fn with_renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Plain render. Empty input yields empty output.
    pub fn to_html(&self, markdown: &str) -> Result<String, MarkdownError> {
        if markdown.is_empty() {
            return Ok(String::new());
        }
        self.renderer.render(markdown)
    }

    /// Render, then decorate every `<img>` and turn `alt|||caption` into figures
    ///
    /// ```
    /// use quire_core::markdown::MarkdownProcessor;
    ///
    /// let processor = MarkdownProcessor::new();
    /// let html = processor
    ///     .to_html_with_image_context("![Dunes|||Taken at dusk](dunes.jpg)")
    ///     .unwrap();
    /// assert!(html.contains("<figcaption>Taken at dusk</figcaption>"));
    /// ```
    pub fn to_html_with_image_context(&self, markdown: &str) -> Result<String, MarkdownError> {
        let html = self.to_html(markdown)?;
        Ok(enhance_images(&html, self.images.as_deref()))
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MarkdownProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownProcessor")
            .field("images", &self.images.is_some())
            .finish()
    }
}
