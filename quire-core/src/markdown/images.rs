//! Post-render image enhancement.
//!
//! Works on the rendered HTML string so the source markdown is never
//! rewritten. Each `<img>` gains the presentation class; an alt text of the
//! form `alt|||caption` turns the image into a `<figure>` with a
//! `<figcaption>`. Tags are edited in place: attributes that are not
//! touched keep their original text, and nothing outside `<img>` changes
//! unless a captioned image has to be lifted out of its paragraph.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

/// Presentation class added to every image
pub const IMAGE_CLASS: &str = "prose-img";

/// Separates alt text from a caption inside the markdown alt text
pub const CAPTION_SEPARATOR: &str = "|||";

/// Alt/title hints for an image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMeta {
    pub alt: Option<String>,
    pub title: Option<String>,
}

/// Lookup of image metadata keyed by image source
pub trait ImageContext: Send + Sync {
    fn lookup(&self, key: &str) -> Option<ImageMeta>;
}

/// Map-backed [`ImageContext`]
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    entries: HashMap<String, ImageMeta>,
}

impl ImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, meta: ImageMeta) {
        self.entries.insert(key.into(), meta);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ImageContext for ImageCatalog {
    fn lookup(&self, key: &str) -> Option<ImageMeta> {
        self.entries.get(key).cloned().or_else(|| {
            let file_name = key.rsplit('/').next()?;
            self.entries.get(file_name).cloned()
        })
    }
}

static BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static IMG_REGEX: OnceLock<Regex> = OnceLock::new();
static ATTR_REGEX: OnceLock<Regex> = OnceLock::new();

const IMG_PATTERN: &str = r#"<img\b(?:[^>"']|"[^"]*"|'[^']*')*>"#;

fn block_regex() -> &'static Regex {
    // Paragraphs are matched whole so a captioned image can be lifted out
    // of them; images anywhere else are matched on their own.
    BLOCK_REGEX.get_or_init(|| {
        Regex::new(&format!(r"(?is)<p>(.*?)</p>|{}", IMG_PATTERN)).expect("valid block regex")
    })
}

fn img_regex() -> &'static Regex {
    IMG_REGEX.get_or_init(|| Regex::new(&format!("(?i){}", IMG_PATTERN)).expect("valid img regex"))
}

fn attr_regex() -> &'static Regex {
    ATTR_REGEX.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:@][-A-Za-z0-9_:.@]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("valid attr regex")
    })
}

/// Decorate all images in `html`
pub fn enhance_images(html: &str, images: Option<&dyn ImageContext>) -> String {
    if !img_regex().is_match(html) {
        return html.to_string();
    }

    block_regex()
        .replace_all(html, |caps: &Captures<'_>| match caps.get(1) {
            Some(body) => enhance_paragraph(&caps[0], body.as_str(), images),
            None => ImageTag::rewrite(&caps[0], images).into_figure(),
        })
        .into_owned()
}

/// Rewrites the images of one paragraph. Without captions only the tags
/// change; a captioned image splits the paragraph around its figure.
fn enhance_paragraph(paragraph: &str, body: &str, images: Option<&dyn ImageContext>) -> String {
    let tags: Vec<_> = img_regex().find_iter(body).collect();
    if tags.is_empty() {
        return paragraph.to_string();
    }

    let rewritten: Vec<_> = tags
        .iter()
        .map(|m| ImageTag::rewrite(m.as_str(), images))
        .collect();

    if rewritten.iter().all(|image| image.caption.is_none()) {
        let (open, close) = (&paragraph[..3], &paragraph[paragraph.len() - 4..]);
        let mut out = String::with_capacity(paragraph.len() + 32);
        out.push_str(open);
        let mut last = 0;
        for (m, image) in tags.iter().zip(&rewritten) {
            out.push_str(&body[last..m.start()]);
            out.push_str(&image.html);
            last = m.end();
        }
        out.push_str(&body[last..]);
        out.push_str(close);
        return out;
    }

    let mut out = String::new();
    let mut text = String::new();
    let mut last = 0;
    for (m, image) in tags.iter().zip(rewritten) {
        text.push_str(&body[last..m.start()]);
        last = m.end();
        if image.caption.is_some() {
            flush_paragraph(&mut out, &mut text);
            out.push_str(&image.into_figure());
        } else {
            text.push_str(&image.html);
        }
    }
    text.push_str(&body[last..]);
    flush_paragraph(&mut out, &mut text);
    out
}

fn flush_paragraph(out: &mut String, text: &mut String) {
    if !text.trim().is_empty() {
        out.push_str("<p>");
        out.push_str(text.trim());
        out.push_str("</p>");
    }
    text.clear();
}

/// One rewritten `<img>` tag and the caption lifted from its alt text
struct ImageTag {
    html: String,
    caption: Option<String>,
}

impl ImageTag {
    fn rewrite(tag: &str, images: Option<&dyn ImageContext>) -> Self {
        let mut editor = TagEditor::parse(tag);

        let mut caption = None;
        let mut alt = editor.value("alt");
        let mut new_alt = None;
        if let Some((before, after)) = alt.and_then(|a| a.split_once(CAPTION_SEPARATOR)) {
            let after = after.trim();
            if !after.is_empty() {
                caption = Some(after.to_string());
            }
            alt = Some(before.trim());
            new_alt = Some(before.trim().to_string());
        }

        let meta = images.zip(editor.value("src")).and_then(|(ctx, src)| ctx.lookup(src));
        let mut new_title = None;
        if let Some(meta) = meta {
            if alt.map_or(true, str::is_empty) {
                if let Some(text) = meta.alt.filter(|a| !a.is_empty()) {
                    new_alt = Some(escape_attr(&text));
                }
            }
            if editor.value("title").map_or(true, str::is_empty) {
                new_title = meta.title.filter(|t| !t.is_empty()).map(|t| escape_attr(&t));
            }
        }

        if let Some(value) = new_alt {
            editor.set("alt", value);
        }
        if let Some(value) = new_title {
            editor.set("title", value);
        }

        match editor.value("class") {
            Some(existing) if existing.split_whitespace().any(|c| c == IMAGE_CLASS) => {}
            Some(existing) if !existing.trim().is_empty() => {
                let merged = format!("{} {}", existing.trim_end(), IMAGE_CLASS);
                editor.set("class", merged);
            }
            _ => editor.set("class", IMAGE_CLASS.to_string()),
        }

        Self {
            html: editor.finish(),
            caption,
        }
    }

    fn into_figure(self) -> String {
        match self.caption {
            Some(caption) => format!(
                "<figure>{}<figcaption>{}</figcaption></figure>",
                self.html, caption
            ),
            None => self.html,
        }
    }
}

/// An attribute as written in the source tag
struct Attr {
    name: String,
    span: Range<usize>,
    value: Option<Range<usize>>,
    quote: Option<char>,
}

/// Edits an `<img>` tag in place. Attributes that are not touched keep
/// their original text, quoting included.
struct TagEditor<'t> {
    tag: &'t str,
    attrs: Vec<Attr>,
    insert_at: usize,
    edits: Vec<(Range<usize>, String)>,
}

impl<'t> TagEditor<'t> {
    fn parse(tag: &'t str) -> Self {
        // Attributes start after "<img" and end before the closing '>'.
        let inner_end = tag.len().saturating_sub(1);
        let inner = tag.get(4..inner_end).unwrap_or("");

        let attrs: Vec<Attr> = attr_regex()
            .captures_iter(inner)
            .filter_map(|c| {
                let whole = c.get(0)?;
                let (value, quote) = match (c.get(2), c.get(3), c.get(4)) {
                    (Some(v), _, _) => (Some(v.range()), Some('"')),
                    (_, Some(v), _) => (Some(v.range()), Some('\'')),
                    (_, _, Some(v)) => (Some(v.range()), None),
                    _ => (None, None),
                };
                Some(Attr {
                    name: c[1].to_ascii_lowercase(),
                    span: shift(whole.range(), 4),
                    value: value.map(|r| shift(r, 4)),
                    quote,
                })
            })
            .collect();

        // New attributes go before a trailing "/>" or ">".
        let head = tag[..inner_end].trim_end();
        let head = head.strip_suffix('/').map_or(head, str::trim_end);
        let last_attr_end = attrs.last().map_or(0, |a| a.span.end);
        let insert_at = head.len().max(last_attr_end).min(inner_end);

        Self {
            tag,
            attrs,
            insert_at,
            edits: Vec::new(),
        }
    }

    fn find(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Raw value text; bare attributes read as empty
    fn value(&self, name: &str) -> Option<&'t str> {
        let tag = self.tag;
        self.find(name)
            .map(|a| a.value.clone().map_or("", |r| &tag[r]))
    }

    /// Replace or add an attribute. `value` must already be attribute-encoded.
    fn set(&mut self, name: &str, value: String) {
        let edit = match self.find(name) {
            Some(Attr {
                value: Some(range),
                quote: Some(quote),
                ..
            }) => {
                let value = if *quote == '\'' {
                    value.replace('\'', "&#39;")
                } else {
                    value.replace('"', "&quot;")
                };
                (range.clone(), value)
            }
            Some(attr) => {
                let written = &self.tag[attr.span.start..attr.span.start + attr.name.len()];
                (attr.span.clone(), format!("{}=\"{}\"", written, value.replace('"', "&quot;")))
            }
            None => (
                self.insert_at..self.insert_at,
                format!(" {}=\"{}\"", name, value.replace('"', "&quot;")),
            ),
        };
        self.edits.push(edit);
    }

    fn finish(mut self) -> String {
        // Stable sort keeps insertions at the same offset in call order.
        self.edits.sort_by_key(|(range, _)| range.start);
        let mut out = String::with_capacity(self.tag.len() + 32);
        let mut last = 0;
        for (range, text) in &self.edits {
            out.push_str(&self.tag[last..range.start]);
            out.push_str(text);
            last = range.end;
        }
        out.push_str(&self.tag[last..]);
        out
    }
}

fn shift(range: Range<usize>, by: usize) -> Range<usize> {
    range.start + by..range.end + by
}

fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat_catalog() -> ImageCatalog {
        let mut catalog = ImageCatalog::new();
        catalog.insert(
            "cat.png",
            ImageMeta {
                alt: Some("A cat".into()),
                title: None,
            },
        );
        catalog
    }

    #[test]
    fn test_multiple_images() {
        let html = "<p><img src=\"a.png\" alt=\"A|||First\" /></p>\n<p>Text <img src=\"b.png\" alt=\"B\" /> inline</p>\n";
        let out = enhance_images(html, None);
        assert_eq!(
            out,
            "<figure><img src=\"a.png\" alt=\"A\" class=\"prose-img\" /><figcaption>First</figcaption></figure>\n\
             <p>Text <img src=\"b.png\" alt=\"B\" class=\"prose-img\" /> inline</p>\n"
        );
    }

    #[test]
    fn test_unrelated_html_untouched() {
        let html = "<div class=\"x\"><p>No images</p><a href=\"/img\">img</a></div>";
        assert_eq!(enhance_images(html, None), html);
    }

    #[test]
    fn test_paragraph_whitespace_kept() {
        let out = enhance_images("<p>\n  <img src=\"u\" alt=\"a\">\n</p>\n<p>after</p>", None);
        assert_eq!(
            out,
            "<p>\n  <img src=\"u\" alt=\"a\" class=\"prose-img\">\n</p>\n<p>after</p>"
        );
    }

    #[test]
    fn test_inline_caption_splits_paragraph() {
        let html = "<p>See <img src=\"u\" alt=\"a|||cap\" /> here</p>";
        let out = enhance_images(html, None);
        assert_eq!(
            out,
            "<p>See</p><figure><img src=\"u\" alt=\"a\" class=\"prose-img\" /><figcaption>cap</figcaption></figure><p>here</p>"
        );
    }

    #[test]
    fn test_single_quoted_attributes_kept() {
        let out = enhance_images("<p><img src='cat.png' alt='A cat'></p>", None);
        assert_eq!(out, "<p><img src='cat.png' alt='A cat' class=\"prose-img\"></p>");
    }

    #[test]
    fn test_unquoted_and_bare_attributes_kept() {
        let out = enhance_images("<img src=\"u.png\" alt=\"x\" width=300 loading=lazy ismap>", None);
        assert_eq!(
            out,
            "<img src=\"u.png\" alt=\"x\" width=300 loading=lazy ismap class=\"prose-img\">"
        );
    }

    #[test]
    fn test_single_quoted_caption() {
        let out = enhance_images("<img src='dog.png' alt='Dog|||Good boy'>", None);
        assert_eq!(
            out,
            "<figure><img src='dog.png' alt='Dog' class=\"prose-img\"><figcaption>Good boy</figcaption></figure>"
        );
    }

    #[test]
    fn test_existing_class_is_merged() {
        let out = enhance_images("<img class=\"wide\" src=\"u\" alt=\"\">", None);
        assert_eq!(out, "<img class=\"wide prose-img\" src=\"u\" alt=\"\">");

        let out = enhance_images("<img class=wide src=\"u\">", None);
        assert_eq!(out, "<img class=\"wide prose-img\" src=\"u\">");

        let tagged = "<img src=\"u\" class='prose-img'>";
        assert_eq!(enhance_images(tagged, None), tagged);
    }

    #[test]
    fn test_title_attribute_preserved() {
        let out = enhance_images("<img src=\"u\" alt=\"x|||y\" title=\"T\" />", None);
        assert_eq!(
            out,
            "<figure><img src=\"u\" alt=\"x\" title=\"T\" class=\"prose-img\" /><figcaption>y</figcaption></figure>"
        );
    }

    #[test]
    fn test_context_fills_missing_alt_and_title() {
        let mut catalog = ImageCatalog::new();
        catalog.insert(
            "cat.jpg",
            ImageMeta {
                alt: Some("A \"cat\"".into()),
                title: Some("Whiskers".into()),
            },
        );
        let out = enhance_images("<img src=\"/images/cat.jpg\" alt=\"\" />", Some(&catalog));
        assert_eq!(
            out,
            "<img src=\"/images/cat.jpg\" alt=\"A &quot;cat&quot;\" title=\"Whiskers\" class=\"prose-img\" />"
        );
    }

    #[test]
    fn test_context_fills_bare_and_single_quoted_alt() {
        let catalog = cat_catalog();
        let out = enhance_images("<img src=cat.png alt>", Some(&catalog));
        assert_eq!(out, "<img src=cat.png alt=\"A cat\" class=\"prose-img\">");

        let out = enhance_images("<img src='cat.png' alt=''>", Some(&catalog));
        assert_eq!(out, "<img src='cat.png' alt='A cat' class=\"prose-img\">");
    }

    #[test]
    fn test_context_never_overrides_author_alt() {
        let mut catalog = ImageCatalog::new();
        catalog.insert(
            "u",
            ImageMeta {
                alt: Some("from catalog".into()),
                title: None,
            },
        );
        let out = enhance_images("<img src=\"u\" alt=\"mine\" />", Some(&catalog));
        assert_eq!(out, "<img src=\"u\" alt=\"mine\" class=\"prose-img\" />");
    }
}
