//! Askama template definitions.

use askama::Template;
use quire_core::context::{IndexContext, PageContext, SiteView};

/// Content page template (every content kind)
#[derive(Template)]
#[template(path = "content.html")]
pub struct ContentTemplate<'a> {
    pub site: &'a SiteView,
    pub page: &'a PageContext,
}

impl<'a> ContentTemplate<'a> {
    pub fn new(page: &'a PageContext) -> Self {
        Self {
            site: &page.site,
            page,
        }
    }
}

/// Paginated listing template
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub site: &'a SiteView,
    pub index: &'a IndexContext,
}

impl<'a> IndexTemplate<'a> {
    pub fn new(index: &'a IndexContext) -> Self {
        Self {
            site: &index.site,
            index,
        }
    }
}
