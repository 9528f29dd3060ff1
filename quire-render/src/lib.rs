//! # quire-render
//!
//! Template rendering library for quire.
//!
//! This crate provides the askama layouts and the [`TemplateRegistry`]
//! the HTML generator renders through.

pub mod registry;
pub mod templates;

pub use registry::{content_layout, index_layout, Layout, TemplateRegistry};
pub use templates::{ContentTemplate, IndexTemplate};
