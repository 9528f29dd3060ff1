//! Path inspection command.

use super::SourceArgs;
use anyhow::{Context, Result};
use quire_core::{Config, ContentStore, PathResolver};
use serde::Serialize;

#[derive(Serialize)]
struct SiteLayout {
    site: String,
    mode: String,
    root: String,
    db: String,
    dsn: String,
    markdown: String,
    html: String,
    images: String,
    contents: Vec<ContentRoute>,
}

#[derive(Serialize)]
struct ContentRoute {
    heading: String,
    url: String,
    index: String,
    file: String,
}

/// Print the site's directories and every content item's URL and file
pub fn show_paths(config: &Config, source: &SourceArgs, json: bool) -> Result<()> {
    let store = source.load_store()?;
    let site = store
        .site(&source.site)
        .with_context(|| format!("Unknown site {}", source.site))?;
    let contents = store.contents(&source.site)?;

    let paths = config.site_paths(&site.slug);
    let resolver = PathResolver::new(site.mode);
    let html_root = paths.html_dir();

    let layout = SiteLayout {
        site: site.slug.clone(),
        mode: site.mode.to_string(),
        root: paths.root().display().to_string(),
        db: paths.db_path().display().to_string(),
        dsn: paths.dsn(),
        markdown: paths.markdown_dir().display().to_string(),
        html: html_root.display().to_string(),
        images: paths.images_dir().display().to_string(),
        contents: contents
            .iter()
            .map(|c| ContentRoute {
                heading: c.heading.clone(),
                url: resolver.content_path(&c.section_path, &c.slug()),
                index: resolver.index_path(&c.section_path, c.kind),
                file: resolver
                    .content_file(&html_root, &c.section_path, &c.slug())
                    .display()
                    .to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    println!("{} ({})", layout.site, layout.mode);
    println!("  root:     {}", layout.root);
    println!("  db:       {}", layout.db);
    println!("  markdown: {}", layout.markdown);
    println!("  html:     {}", layout.html);
    println!("  images:   {}", layout.images);
    for route in &layout.contents {
        println!("  {} -> {}", route.url, route.heading);
    }
    Ok(())
}
