//! Generation runs: resolve the site, pull its content and write output trees.

use crate::blocks::build_blocks;
use crate::config::Config;
use crate::context::{
    BlocksView, ContentSummary, ContentView, IndexContext, PageContext, Pagination, SectionView,
    SiteView,
};
use crate::emit::MarkdownEmitter;
use crate::error::GenerateError;
use crate::markdown::{ImageContext, MarkdownProcessor};
use crate::models::{Content, ContentKind, Section, Site, SiteMode};
use crate::paths::{normalize_segment, PathResolver, SitePaths};
use crate::run::RunContext;
use crate::store::ContentStore;
use crate::template::{render_first, TemplateData, TemplateKey, TemplateRenderer};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Span;
use uuid::Uuid;

/// Outcome of an HTML run
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct HtmlReport {
    /// Content pages written
    pub pages: usize,
    /// Index pages written, counting every pagination page
    pub indexes: usize,
    /// Every file written, in write order
    pub files: Vec<PathBuf>,
}

/// Look up a site and refuse inactive ones
pub fn resolve_site(store: &dyn ContentStore, slug: &str) -> Result<Site, GenerateError> {
    let site = store.site(slug).map_err(|e| GenerateError::store(slug, e))?;
    if !site.active {
        return Err(GenerateError::Validation(format!("site '{}' is inactive", slug)));
    }
    Ok(site)
}

/// Export every content item of the run's site as a markdown document
pub fn generate_markdown(
    store: &dyn ContentStore,
    config: &Config,
    ctx: &RunContext,
) -> Result<Vec<PathBuf>, GenerateError> {
    let slug = ctx.site_slug()?;
    resolve_site(store, slug)?;
    let contents = store
        .contents(slug)
        .map_err(|e| GenerateError::store(slug, e))?;
    MarkdownEmitter::new(config.site_paths(slug)).generate(ctx, &contents)
}

/// Renders a site's content and index pages through a template renderer
pub struct HtmlGenerator {
    store: Arc<dyn ContentStore>,
    renderer: Arc<dyn TemplateRenderer>,
    processor: MarkdownProcessor,
    sites_dir: PathBuf,
    max_items: usize,
    page_size: usize,
    include_drafts: bool,
    span: Option<Span>,
}

impl HtmlGenerator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        renderer: Arc<dyn TemplateRenderer>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            renderer,
            processor: MarkdownProcessor::new(),
            sites_dir: config.sites_dir(),
            max_items: config.blocks.max_items,
            page_size: config.pagination.page_size.max(1),
            include_drafts: config.html.include_drafts,
            span: None,
        }
    }

    /// Fill image alt text and titles from `images` while rendering bodies
    pub fn with_image_context(mut self, images: Arc<dyn ImageContext>) -> Self {
        self.processor = MarkdownProcessor::with_image_context(images);
        self
    }

    /// Log under `span` instead of a per-run `html` span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Run one HTML generation.
    ///
    /// The first failure aborts the run; files already written are kept.
    pub fn generate(&self, ctx: &RunContext) -> Result<HtmlReport, GenerateError> {
        let slug = ctx.site_slug()?;
        let span = self
            .span
            .clone()
            .unwrap_or_else(|| tracing::info_span!("html", site = %slug));
        let _guard = span.enter();

        let site = resolve_site(self.store.as_ref(), slug)?;
        let sections = self
            .store
            .sections(slug)
            .map_err(|e| GenerateError::store(slug, e))?;
        let contents = self
            .store
            .contents(slug)
            .map_err(|e| GenerateError::store(slug, e))?;

        let total = contents.len();
        let rendered: Vec<Content> = contents
            .into_iter()
            .filter(|c| self.include_drafts || !c.draft)
            .collect();
        tracing::info!(
            mode = %site.mode,
            contents = rendered.len(),
            skipped = total - rendered.len(),
            "rendering site"
        );

        let run = SiteRun {
            generator: self,
            ctx,
            site_view: SiteView::from(&site),
            resolver: PathResolver::new(site.mode),
            html_root: SitePaths::new(&self.sites_dir, slug).html_dir(),
            sections: SectionLookup::new(&sections),
            slug,
        };

        let mut report = HtmlReport::default();
        for content in &rendered {
            run.content_page(content, &rendered, &mut report)?;
        }
        run.index_pages(&rendered, &mut report)?;

        tracing::info!(
            pages = report.pages,
            indexes = report.indexes,
            "html generation finished"
        );
        Ok(report)
    }
}

/// Section records by id, with a path fallback for unlinked content
struct SectionLookup<'s> {
    by_id: HashMap<Uuid, &'s Section>,
    by_path: HashMap<String, &'s Section>,
}

impl<'s> SectionLookup<'s> {
    fn new(sections: &'s [Section]) -> Self {
        Self {
            by_id: sections.iter().map(|s| (s.id, s)).collect(),
            by_path: sections
                .iter()
                .map(|s| (normalize_segment(&s.path), s))
                .collect(),
        }
    }

    fn of(&self, content: &Content) -> Option<&'s Section> {
        self.by_id
            .get(&content.section_id)
            .or_else(|| self.by_path.get(&normalize_segment(&content.section_path)))
            .copied()
    }
}

/// State shared by every page of one run
struct SiteRun<'r> {
    generator: &'r HtmlGenerator,
    ctx: &'r RunContext,
    site_view: SiteView,
    resolver: PathResolver,
    html_root: PathBuf,
    sections: SectionLookup<'r>,
    slug: &'r str,
}

impl SiteRun<'_> {
    fn url(&self, content: &Content) -> String {
        self.resolver
            .content_path(&content.section_path, &content.slug())
    }

    fn summarize(&self, content: &Content) -> ContentSummary {
        ContentSummary::new(content, self.url(content))
    }

    fn content_page(
        &self,
        content: &Content,
        snapshot: &[Content],
        report: &mut HtmlReport,
    ) -> Result<(), GenerateError> {
        self.ctx.checkpoint(self.slug, report.files.len())?;

        let blocks = build_blocks(content, snapshot, self.generator.max_items);
        let html = self
            .generator
            .processor
            .to_html_with_image_context(&content.body)
            .map_err(|e| GenerateError::render(self.slug, content.heading.as_str(), e))?;

        let section = self.sections.of(content);
        let page = PageContext {
            site: self.site_view.clone(),
            section: section.map(SectionView::from),
            content: ContentView::new(content, self.url(content), html),
            blocks: BlocksView::new(&blocks, |c| self.summarize(c)),
        };

        let chain = TemplateKey::content_chain(section.map(Section::layout_name), content.kind);
        let output = render_first(
            self.generator.renderer.as_ref(),
            &chain,
            TemplateData::Content(&page),
        )
        .map_err(|e| GenerateError::render(self.slug, content.heading.as_str(), e))?;

        let file = self
            .resolver
            .content_file(&self.html_root, &content.section_path, &content.slug());
        self.write(&file, &output)?;
        tracing::debug!(content = %content.heading, path = %file.display(), "wrote page");

        report.pages += 1;
        report.files.push(file);
        Ok(())
    }

    fn index_pages(&self, rendered: &[Content], report: &mut HtmlReport) -> Result<(), GenerateError> {
        let mut groups: BTreeMap<String, IndexGroup<'_>> = BTreeMap::new();
        for content in rendered.iter().filter(|c| c.kind != ContentKind::Page) {
            let index = self.resolver.index_path(&content.section_path, content.kind);
            groups
                .entry(index)
                .or_insert_with(|| IndexGroup {
                    section: self.index_section(content),
                    items: Vec::new(),
                })
                .items
                .push(content);
        }

        let page_size = self.generator.page_size;
        for (index, mut group) in groups {
            group
                .items
                .sort_by_key(|c| (c.published_at.is_none(), Reverse(c.published_at)));
            let total = group.items.len().div_ceil(page_size);
            let title = group
                .section
                .map(|s| s.name.clone())
                .unwrap_or_else(|| self.site_view.title.clone());
            let chain = TemplateKey::index_chain(group.section.map(Section::layout_name));

            for (i, chunk) in group.items.chunks(page_size).enumerate() {
                self.ctx.checkpoint(self.slug, report.files.len())?;
                let current = i + 1;
                let page = IndexContext {
                    site: self.site_view.clone(),
                    section: group.section.map(SectionView::from),
                    title: title.clone(),
                    url: self.resolver.pagination_path(&index, current),
                    items: chunk.iter().map(|c| self.summarize(c)).collect(),
                    pagination: Pagination {
                        current,
                        total,
                        prev_url: (current > 1)
                            .then(|| self.resolver.pagination_path(&index, current - 1)),
                        next_url: (current < total)
                            .then(|| self.resolver.pagination_path(&index, current + 1)),
                    },
                };

                let output = render_first(
                    self.generator.renderer.as_ref(),
                    &chain,
                    TemplateData::Index(&page),
                )
                .map_err(|e| GenerateError::render(self.slug, page.url.as_str(), e))?;

                let file = self
                    .resolver
                    .pagination_file(&self.html_root, &index, current);
                self.write(&file, &output)?;
                tracing::debug!(index = %page.url, path = %file.display(), "wrote index page");

                report.indexes += 1;
                report.files.push(file);
            }
        }
        Ok(())
    }

    /// Blog sites have a single site-wide index with no section
    fn index_section(&self, content: &Content) -> Option<&Section> {
        match self.resolver.mode() {
            SiteMode::Blog => None,
            SiteMode::Structured => self.sections.of(content),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), GenerateError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GenerateError::io(self.slug, parent, e))?;
        }
        fs::write(path, contents).map_err(|e| GenerateError::io(self.slug, path, e))
    }
}

struct IndexGroup<'a> {
    section: Option<&'a Section>,
    items: Vec<&'a Content>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::markdown::{ImageCatalog, ImageMeta};
    use crate::models::Tag;
    use crate::run::CancelToken;
    use crate::store::MemoryStore;
    use crate::template::{LayoutScope, RenderError};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    /// Knows only the global layouts plus any extra keys given
    struct StubRenderer {
        extra: Vec<TemplateKey>,
    }

    impl StubRenderer {
        fn global() -> Self {
            Self { extra: Vec::new() }
        }
    }

    impl TemplateRenderer for StubRenderer {
        fn has(&self, key: &TemplateKey) -> bool {
            key.scope == LayoutScope::Global || self.extra.contains(key)
        }

        fn render(&self, key: &TemplateKey, data: TemplateData<'_>) -> Result<String, RenderError> {
            Ok(match data {
                TemplateData::Content(page) => format!(
                    "{key}|{}|{}|related={}",
                    page.content.summary.heading,
                    page.content.html.trim(),
                    page.blocks
                        .tag_related
                        .iter()
                        .map(|s| s.heading.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                ),
                TemplateData::Index(index) => format!(
                    "{key}|{}|{}/{}|prev={:?}|next={:?}|{}",
                    index.title,
                    index.pagination.current,
                    index.pagination.total,
                    index.pagination.prev_url,
                    index.pagination.next_url,
                    index
                        .items
                        .iter()
                        .map(|s| s.heading.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                ),
            })
        }
    }

    fn post(kind: ContentKind, heading: &str, day: u32) -> Content {
        let mut c = Content::new(kind, heading);
        c.slug = Some(slug_of(heading));
        c.body = format!("Body of {heading}");
        c.published_at = Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap());
        c
    }

    fn slug_of(heading: &str) -> String {
        crate::slug::slugify(heading)
    }

    fn generator(
        store: MemoryStore,
        renderer: StubRenderer,
        config: &Config,
    ) -> HtmlGenerator {
        HtmlGenerator::new(Arc::new(store), Arc::new(renderer), config)
    }

    fn blog_store() -> MemoryStore {
        let section = Section::new("Posts", "posts");
        let mut first = post(ContentKind::Article, "First", 1);
        first.tags = vec![Tag::new("rust")];
        let mut second = post(ContentKind::Article, "Second", 2);
        second.tags = vec![Tag::new("rust")];
        let mut draft = post(ContentKind::Article, "Draft", 3);
        draft.draft = true;
        let about = post(ContentKind::Page, "About", 4);

        let mut contents = vec![first, second, draft, about];
        for c in &mut contents {
            c.section_id = section.id;
        }
        let mut store = MemoryStore::new();
        store
            .insert_site(Site::new("acme", SiteMode::Blog), vec![section], contents)
            .unwrap();
        store
    }

    #[test]
    fn test_blog_site_pages_and_index() {
        let dir = tempdir().unwrap();
        let config = Config::with_sites_dir(dir.path());
        let report = generator(blog_store(), StubRenderer::global(), &config)
            .generate(&RunContext::for_site("acme"))
            .unwrap();

        let html = config.site_paths("acme").html_dir();
        assert_eq!(report.pages, 3);
        assert_eq!(report.indexes, 1);
        assert!(!html.join("draft/index.html").exists());

        let first = fs::read_to_string(html.join("first/index.html")).unwrap();
        assert!(first.starts_with("global/article|First|<p>Body of First</p>"));
        assert!(first.ends_with("related=Second"));

        let index = fs::read_to_string(html.join("index.html")).unwrap();
        assert!(index.starts_with("global/index|acme|1/1"));
        assert!(index.ends_with("|Second,First"));
        assert!(report.files.contains(&html.join("about/index.html")));
    }

    #[test]
    fn test_drafts_included_when_configured() {
        let dir = tempdir().unwrap();
        let mut config = Config::with_sites_dir(dir.path());
        config.html.include_drafts = true;
        let report = generator(blog_store(), StubRenderer::global(), &config)
            .generate(&RunContext::for_site("acme"))
            .unwrap();
        assert_eq!(report.pages, 4);
        assert!(config
            .site_paths("acme")
            .html_dir()
            .join("draft/index.html")
            .exists());
    }

    #[test]
    fn test_structured_pagination() {
        let dir = tempdir().unwrap();
        let mut config = Config::with_sites_dir(dir.path());
        config.pagination.page_size = 2;

        let section = Section::new("News", "news");
        let contents = (1..=5)
            .map(|day| {
                let mut c = post(ContentKind::Blog, &format!("Post {day}"), day);
                c.section_id = section.id;
                c
            })
            .collect();
        let mut store = MemoryStore::new();
        store
            .insert_site(Site::new("acme", SiteMode::Structured), vec![section], contents)
            .unwrap();

        let report = generator(store, StubRenderer::global(), &config)
            .generate(&RunContext::for_site("acme"))
            .unwrap();
        assert_eq!(report.pages, 5);
        assert_eq!(report.indexes, 3);

        let html = config.site_paths("acme").html_dir();
        assert!(html.join("news/post-5/index.html").exists());
        let first = fs::read_to_string(html.join("news/blog/index.html")).unwrap();
        assert_eq!(
            first,
            "global/index|News|1/3|prev=None|next=Some(\"/news/blog/page/2/\")|Post 5,Post 4"
        );
        let last = fs::read_to_string(html.join("news/blog/page/3/index.html")).unwrap();
        assert_eq!(
            last,
            "global/index|News|3/3|prev=Some(\"/news/blog/page/2/\")|next=None|Post 1"
        );
    }

    #[test]
    fn test_section_layout_preferred() {
        let dir = tempdir().unwrap();
        let config = Config::with_sites_dir(dir.path());
        let mut section = Section::new("Docs", "docs");
        section.layout = Some("manual".into());
        let mut page = post(ContentKind::Page, "Install", 1);
        page.section_id = section.id;
        let mut store = MemoryStore::new();
        store
            .insert_site(Site::new("acme", SiteMode::Structured), vec![section], vec![page])
            .unwrap();

        let renderer = StubRenderer {
            extra: vec![TemplateKey::section("manual", "default")],
        };
        let report = generator(store, renderer, &config)
            .generate(&RunContext::for_site("acme"))
            .unwrap();
        assert_eq!(report.indexes, 0);
        let out = fs::read_to_string(
            config
                .site_paths("acme")
                .html_dir()
                .join("docs/install/index.html"),
        )
        .unwrap();
        assert!(out.starts_with("section:manual/default|Install"));
    }

    #[test]
    fn test_image_context_applied_to_bodies() {
        let dir = tempdir().unwrap();
        let config = Config::with_sites_dir(dir.path());
        let mut page = post(ContentKind::Page, "Gallery", 1);
        page.body = "![](cat.png)".into();
        let mut store = MemoryStore::new();
        store
            .insert_site(Site::new("acme", SiteMode::Blog), Vec::new(), vec![page])
            .unwrap();

        let mut catalog = ImageCatalog::new();
        catalog.insert(
            "cat.png",
            ImageMeta {
                alt: Some("A cat".into()),
                title: None,
            },
        );
        generator(store, StubRenderer::global(), &config)
            .with_image_context(Arc::new(catalog))
            .generate(&RunContext::for_site("acme"))
            .unwrap();
        let out = fs::read_to_string(
            config.site_paths("acme").html_dir().join("gallery/index.html"),
        )
        .unwrap();
        assert!(out.contains(r#"alt="A cat""#));
        assert!(out.contains(r#"class="prose-img""#));
    }

    #[test]
    fn test_site_resolution_errors() {
        let dir = tempdir().unwrap();
        let config = Config::with_sites_dir(dir.path());
        let mut store = blog_store();
        let mut dormant = Site::new("dormant", SiteMode::Blog);
        dormant.active = false;
        store.insert_site(dormant, Vec::new(), Vec::new()).unwrap();
        let gen = generator(store, StubRenderer::global(), &config);

        let kind = |ctx: RunContext| gen.generate(&ctx).unwrap_err().kind();
        assert_eq!(kind(RunContext::default()), ErrorKind::Validation);
        assert_eq!(kind(RunContext::for_site("nope")), ErrorKind::NotFound);
        assert_eq!(kind(RunContext::for_site("dormant")), ErrorKind::Validation);
    }

    #[test]
    fn test_missing_layout_is_render_error() {
        struct Empty;
        impl TemplateRenderer for Empty {
            fn has(&self, _: &TemplateKey) -> bool {
                false
            }
            fn render(&self, key: &TemplateKey, _: TemplateData<'_>) -> Result<String, RenderError> {
                Err(RenderError::Missing(key.to_string()))
            }
        }

        let dir = tempdir().unwrap();
        let config = Config::with_sites_dir(dir.path());
        let err = HtmlGenerator::new(Arc::new(blog_store()), Arc::new(Empty), &config)
            .generate(&RunContext::for_site("acme"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
        assert!(err.to_string().contains("acme/First"));
    }

    #[test]
    fn test_cancelled_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = Config::with_sites_dir(dir.path());
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = generator(blog_store(), StubRenderer::global(), &config)
            .generate(&RunContext::for_site("acme").with_cancel(cancel))
            .unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled { written: 0, .. }));
        assert!(!config.site_paths("acme").html_dir().exists());
    }

    #[test]
    fn test_generate_markdown_exports_all_contents() {
        let dir = tempdir().unwrap();
        let config = Config::with_sites_dir(dir.path());
        let written =
            generate_markdown(&blog_store(), &config, &RunContext::for_site("acme")).unwrap();
        assert_eq!(written.len(), 4);
        assert!(written[0].starts_with(config.site_paths("acme").markdown_dir().join("posts")));
        assert!(written[0].ends_with("first.md"));
    }

    #[test]
    fn test_generate_markdown_honours_cancel() {
        let dir = tempdir().unwrap();
        let config = Config::with_sites_dir(dir.path());
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = RunContext::for_site("acme").with_cancel(cancel);

        let err = generate_markdown(&blog_store(), &config, &ctx).unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled { written: 0, .. }));
        assert!(!config.site_paths("acme").markdown_dir().exists());
    }
}
