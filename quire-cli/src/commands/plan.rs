//! Publish dry-run command.

use anyhow::{bail, Context, Result};
use quire_core::publish::DirectoryPublisher;
use quire_core::{plan_tree, Config, PlanReport, Publisher};
use std::path::Path;

/// Diff the site's HTML tree against `dest` or the configured publish remote
pub fn plan_publish(config: &Config, site: &str, dest: Option<&Path>, json: bool) -> Result<()> {
    let tree = config.site_paths(site).html_dir();
    if !tree.is_dir() {
        bail!("No HTML output for {} at {:?}; run `quire html` first", site, tree);
    }

    let report = match (dest, config.publish.as_ref()) {
        (Some(dest), _) => plan_tree(&tree, dest)
            .with_context(|| format!("Failed to compare with {:?}", dest))?,
        (None, Some(repo)) => {
            tracing::debug!(remote = %repo.remote_url, branch = %repo.branch, "planning against remote");
            DirectoryPublisher
                .plan(&tree, repo)
                .with_context(|| format!("Failed to plan publish to {}", repo.remote_url))?
        }
        (None, None) => bail!("No --dest given and no publish section in the configuration"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PlanReport) {
    if report.is_empty() {
        println!("Nothing to publish");
        return;
    }
    for path in &report.added {
        println!("+ {}", path);
    }
    for path in &report.changed {
        println!("~ {}", path);
    }
    for path in &report.removed {
        println!("- {}", path);
    }
    println!(
        "{} added, {} changed, {} removed",
        report.added.len(),
        report.changed.len(),
        report.removed.len()
    );
}
