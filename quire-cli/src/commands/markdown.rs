//! Markdown export command.

use super::SourceArgs;
use anyhow::{Context, Result};
use quire_core::{generate_markdown, Config, RunContext};

/// Write one frontmatter document per content item of the site
pub fn export_markdown(config: &Config, source: &SourceArgs, json: bool) -> Result<()> {
    let store = source.load_store()?;
    let ctx = RunContext::for_site(&source.site);
    let written = generate_markdown(&store, config, &ctx)
        .with_context(|| format!("Failed to export markdown for {}", source.site))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&written)?);
    } else {
        println!("✓ Exported {} documents", written.len());
        for path in &written {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
