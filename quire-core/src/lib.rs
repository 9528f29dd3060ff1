//! # quire-core
//!
//! Core library for the quire static site generator.
//!
//! This crate turns a snapshot of site content into a markdown document
//! tree and a static HTML tree: URL algebra for blog and structured sites,
//! related-content bundles, markdown rendering with image enhancement,
//! frontmatter export and the HTML generation driver.

pub mod blocks;
pub mod config;
pub mod context;
pub mod emit;
pub mod error;
pub mod frontmatter;
pub mod generate;
pub mod markdown;
pub mod models;
pub mod paths;
pub mod publish;
pub mod run;
pub mod slug;
pub mod store;
pub mod template;

pub use blocks::{build_blocks, GeneratedBlocks};
pub use config::Config;
pub use context::{IndexContext, PageContext};
pub use emit::MarkdownEmitter;
pub use error::{ErrorKind, GenerateError};
pub use generate::{generate_markdown, HtmlGenerator, HtmlReport};
pub use models::{Content, ContentKind, Frontmatter, Section, SetPolicy, Site, SiteMode, Tag};
pub use paths::{PathResolver, SitePaths};
pub use publish::{plan_tree, PlanReport, Publisher, RepoConfig};
pub use run::{CancelToken, RunContext};
pub use slug::slugify;
pub use store::{ContentStore, MemoryStore};
pub use template::{LayoutScope, RenderError, TemplateData, TemplateKey, TemplateRenderer};
