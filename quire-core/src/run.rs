//! Per-run context: which site to generate and whether to stop early.

use crate::error::GenerateError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one run
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Caller-supplied context of a generation run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    site_slug: Option<String>,
    cancel: CancelToken,
}

impl RunContext {
    pub fn for_site(slug: impl Into<String>) -> Self {
        Self {
            site_slug: Some(slug.into()),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Site slug of this run; a missing or blank slug is a validation failure
    pub fn site_slug(&self) -> Result<&str, GenerateError> {
        self.site_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GenerateError::Validation("no site in run context".to_string()))
    }

    /// Fail with `Cancelled` once the token has been tripped
    pub fn checkpoint(&self, site: &str, written: usize) -> Result<(), GenerateError> {
        if self.cancel.is_cancelled() {
            tracing::warn!(site, written, "run cancelled");
            return Err(GenerateError::Cancelled {
                site: site.to_string(),
                written,
            });
        }
        Ok(())
    }
}
