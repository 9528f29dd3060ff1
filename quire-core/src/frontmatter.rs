//! Frontmatter documents: a `---` delimited YAML header followed by the raw body.

use crate::models::Frontmatter;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing frontmatter block")]
    MissingBlock,

    #[error("Missing required field: {0}")]
    MissingField(String),
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|$)(.*)$")
            .expect("valid frontmatter regex")
    })
}

/// Serialize a header and body into a markdown document
///
/// ```
/// use quire_core::frontmatter::render_document;
/// use quire_core::Frontmatter;
///
/// let fm = Frontmatter { title: "Hello".into(), slug: "hello".into(), ..Default::default() };
/// let doc = render_document(&fm, "Body text.").unwrap();
/// assert!(doc.starts_with("---\ntitle: Hello\n"));
/// assert!(doc.ends_with("---\nBody text."));
/// ```
pub fn render_document(frontmatter: &Frontmatter, body: &str) -> Result<String, FrontmatterError> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    let mut doc = String::with_capacity(yaml.len() + body.len() + 8);
    doc.push_str(DELIMITER);
    doc.push('\n');
    doc.push_str(&yaml);
    if !yaml.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str(DELIMITER);
    doc.push('\n');
    doc.push_str(body);
    Ok(doc)
}

/// Parse a document produced by [`render_document`]
///
/// Returns the header and the body exactly as it followed the closing
/// delimiter.
pub fn parse_document(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let captures = frontmatter_regex()
        .captures(content)
        .ok_or(FrontmatterError::MissingBlock)?;
    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let frontmatter: Frontmatter = serde_yaml::from_str(yaml)?;
    if frontmatter.title.trim().is_empty() {
        return Err(FrontmatterError::MissingField("title".to_string()));
    }

    Ok((frontmatter, body.to_string()))
}
