//! HTML generation command.

use super::SourceArgs;
use anyhow::{Context, Result};
use quire_core::markdown::{ImageCatalog, ImageMeta};
use quire_core::{Config, HtmlGenerator, RunContext};
use quire_render::TemplateRegistry;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One entry of an `--images` file
#[derive(Debug, Deserialize)]
struct ImageHint {
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Render every content and index page of the site
pub fn render_html(
    config: &Config,
    source: &SourceArgs,
    images: Option<&Path>,
    json: bool,
) -> Result<()> {
    let store = source.load_store()?;
    let mut generator = HtmlGenerator::new(
        Arc::new(store),
        Arc::new(TemplateRegistry::new()),
        config,
    );
    if let Some(path) = images {
        let catalog = load_catalog(path)?;
        tracing::info!("Loaded {} image hints", catalog.len());
        generator = generator.with_image_context(Arc::new(catalog));
    }

    let report = generator
        .generate(&RunContext::for_site(&source.site))
        .with_context(|| format!("Failed to render {}", source.site))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "✓ Rendered {} pages and {} index pages into {}",
            report.pages,
            report.indexes,
            config.site_paths(&source.site).html_dir().display()
        );
    }
    Ok(())
}

fn load_catalog(path: &Path) -> Result<ImageCatalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read image hints {:?}", path))?;
    let hints: HashMap<String, ImageHint> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse image hints {:?}", path))?;

    let mut catalog = ImageCatalog::new();
    for (src, hint) in hints {
        catalog.insert(
            src,
            ImageMeta {
                alt: hint.alt,
                title: hint.title,
            },
        );
    }
    Ok(catalog)
}
