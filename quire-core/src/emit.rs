//! Markdown export: one frontmatter document per content item.

use crate::error::GenerateError;
use crate::frontmatter::render_document;
use crate::models::{Content, Frontmatter};
use crate::paths::{normalize_segment, SitePaths};
use crate::run::RunContext;
use std::fs;
use std::path::PathBuf;
use tracing::Span;

/// Writes `{markdown_dir}/{section}/{slug}.md` documents for a site
pub struct MarkdownEmitter {
    paths: SitePaths,
    span: Span,
}

impl MarkdownEmitter {
    pub fn new(paths: SitePaths) -> Self {
        let span = tracing::info_span!("markdown", site = %paths.slug());
        Self { paths, span }
    }

    /// Log under `span` instead of the default one
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Output path of one content item's document
    pub fn document_path(&self, content: &Content) -> PathBuf {
        let mut path = self.paths.markdown_dir();
        for segment in normalize_segment(&content.section_path).split('/') {
            if !segment.is_empty() {
                path.push(segment);
            }
        }
        path.push(format!("{}.md", content.slug()));
        path
    }

    /// Write every item, overwriting existing documents.
    ///
    /// Returns the written paths in input order. An empty collection does
    /// no I/O at all. The run's cancel token is checked before each
    /// document. The first failure aborts the run; documents already
    /// written stay on disk.
    pub fn generate<'c, I>(&self, ctx: &RunContext, contents: I) -> Result<Vec<PathBuf>, GenerateError>
    where
        I: IntoIterator<Item = &'c Content>,
    {
        let _guard = self.span.enter();
        let site = self.paths.slug();
        let contents = contents.into_iter();
        let mut written = Vec::with_capacity(contents.size_hint().0);

        for content in contents {
            ctx.checkpoint(site, written.len())?;

            let path = self.document_path(content);
            let document = render_document(&Frontmatter::from(content), &content.body)
                .map_err(|e| GenerateError::render(site, content.heading.as_str(), e))?;

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| GenerateError::io(site, parent, e))?;
            }
            fs::write(&path, document).map_err(|e| GenerateError::io(site, &path, e))?;

            tracing::debug!(content = %content.heading, path = %path.display(), "wrote document");
            written.push(path);
        }

        if written.is_empty() {
            tracing::debug!("nothing to export");
        } else {
            tracing::info!(documents = written.len(), "markdown export finished");
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::frontmatter::parse_document;
    use crate::models::{ContentKind, Tag};
    use crate::run::CancelToken;
    use tempfile::tempdir;

    fn test_article() -> Content {
        let mut content = Content::new(ContentKind::Article, "Test Article");
        content.section_path = "blog".into();
        content.body = "This is a test article.\n\nSecond paragraph.".into();
        content.featured = true;
        content.tags = vec![Tag::new("rust")];
        content.meta.description = "A test".into();
        content
    }

    #[test]
    fn test_writes_test_article_document() {
        let dir = tempdir().unwrap();
        let paths = SitePaths::new(dir.path(), "acme");
        let content = test_article();

        let written = MarkdownEmitter::new(paths.clone())
            .generate(&RunContext::for_site("acme"), std::slice::from_ref(&content))
            .unwrap();

        let expected = paths
            .markdown_dir()
            .join("blog")
            .join(format!("test-article-{}.md", content.short_id()));
        assert_eq!(written, vec![expected.clone()]);

        let raw = fs::read_to_string(&expected).unwrap();
        assert!(raw.starts_with("---\n"));
        let (fm, body) = parse_document(&raw).unwrap();
        assert_eq!(fm.title, "Test Article");
        assert!(!fm.draft);
        assert!(fm.featured);
        assert_eq!(fm.description, "A test");
        assert_eq!(fm.tags, vec!["rust"]);
        assert_eq!(body, content.body);
    }

    #[test]
    fn test_empty_collection_does_no_io() {
        let dir = tempdir().unwrap();
        let paths = SitePaths::new(dir.path(), "acme");
        let none: &[Content] = &[];
        let written = MarkdownEmitter::new(paths.clone())
            .generate(&RunContext::for_site("acme"), none)
            .unwrap();
        assert!(written.is_empty());
        assert!(!paths.root().exists());
    }

    #[test]
    fn test_root_section_and_overwrite() {
        let dir = tempdir().unwrap();
        let paths = SitePaths::new(dir.path(), "acme");
        let mut content = Content::new(ContentKind::Page, "About");
        content.section_path = "/".into();
        content.slug = Some("about".into());
        let emitter = MarkdownEmitter::new(paths.clone());
        let ctx = RunContext::for_site("acme");

        emitter.generate(&ctx, std::slice::from_ref(&content)).unwrap();
        content.body = "Updated".into();
        let written = emitter.generate(&ctx, std::slice::from_ref(&content)).unwrap();

        assert_eq!(written[0], paths.markdown_dir().join("about.md"));
        let (_, body) = parse_document(&fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(body, "Updated");
    }

    #[test]
    fn test_io_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A file where the site directory should be
        fs::write(dir.path().join("acme"), "").unwrap();
        let err = MarkdownEmitter::new(SitePaths::new(dir.path(), "acme"))
            .generate(&RunContext::for_site("acme"), &[test_article()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_cancel_between_documents_stops_export() {
        let dir = tempdir().unwrap();
        let paths = SitePaths::new(dir.path(), "acme");
        let contents: Vec<Content> = ["One", "Two", "Three"]
            .iter()
            .map(|h| Content::new(ContentKind::Page, *h))
            .collect();

        let token = CancelToken::new();
        let ctx = RunContext::for_site("acme").with_cancel(token.clone());
        // Trip the token once the first document has been written
        let items = contents.iter().enumerate().map(|(i, content)| {
            if i == 1 {
                token.cancel();
            }
            content
        });

        let err = MarkdownEmitter::new(paths.clone())
            .generate(&ctx, items)
            .unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled { written: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::Cancelled);

        let emitter = MarkdownEmitter::new(paths);
        assert!(emitter.document_path(&contents[0]).exists());
        assert!(!emitter.document_path(&contents[1]).exists());
        assert!(!emitter.document_path(&contents[2]).exists());
    }

    #[test]
    fn test_cancelled_before_start_writes_nothing() {
        let dir = tempdir().unwrap();
        let paths = SitePaths::new(dir.path(), "acme");
        let token = CancelToken::new();
        token.cancel();
        let ctx = RunContext::for_site("acme").with_cancel(token);

        let err = MarkdownEmitter::new(paths.clone())
            .generate(&ctx, &[test_article()])
            .unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled { written: 0, .. }));
        assert!(!paths.root().exists());
    }
}
