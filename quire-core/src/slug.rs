//! Slug generation for headings, section names and tags.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUN: OnceLock<Regex> = OnceLock::new();

fn hyphen_run() -> &'static Regex {
    HYPHEN_RUN.get_or_init(|| Regex::new(r"-+").expect("valid hyphen regex"))
}

/// Convert a heading to a URL-safe slug
///
/// Lowercases, maps whitespace and underscores to hyphens, drops punctuation
/// (unicode letters survive), collapses hyphen runs and trims them from both
/// ends.
///
/// ```
/// use quire_core::slugify;
///
/// assert_eq!(slugify("Test Article"), "test-article");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// ```
pub fn slugify(input: &str) -> String {
    let cleaned = input
        .to_lowercase()
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if g.chars().all(char::is_whitespace) || c == '_' || c == '/' {
                Some("-")
            } else if c.is_alphanumeric() || c == '-' {
                Some(g)
            } else {
                None
            }
        })
        .collect::<String>();

    hyphen_run()
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}
