//! # quire CLI
//!
//! Command-line interface for the quire static site generator.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to quire.yml when present)
    #[arg(long, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a site's content as markdown documents with frontmatter
    Markdown {
        #[command(flatten)]
        source: commands::SourceArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render a site's content and index pages to HTML
    Html {
        #[command(flatten)]
        source: commands::SourceArgs,

        /// JSON map of image source to alt/title hints
        #[arg(long)]
        images: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the directories and URLs a site resolves to
    Paths {
        #[command(flatten)]
        source: commands::SourceArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show configuration values by dotted key (e.g. blocks.max_items)
    Config {
        /// Dotted key; all known keys when omitted
        key: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Compare a site's HTML tree with a publish destination
    Plan {
        /// Site slug
        #[arg(long)]
        site: String,

        /// Destination directory (defaults to the configured publish remote)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Markdown { source, json } => commands::export_markdown(&config, &source, json),
        Commands::Html {
            source,
            images,
            json,
        } => commands::render_html(&config, &source, images.as_deref(), json),
        Commands::Paths { source, json } => commands::show_paths(&config, &source, json),
        Commands::Config { key, json } => commands::show_config(&config, key.as_deref(), json),
        Commands::Plan { site, dest, json } => {
            commands::plan_publish(&config, &site, dest.as_deref(), json)
        }
    }
}
