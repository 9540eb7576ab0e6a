//! Page acquisition abstraction.
//!
//! Defines the `PageRenderer` trait that hands the pipeline a rendered DOM
//! plus the raw page source, backed by Chromium via chromiumoxide in
//! production and by pre-captured HTML offline.

pub mod chromium;

use crate::error::{RenderError, RenderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A rendered page snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPage {
    /// URL after redirects.
    pub final_url: String,
    /// Serialized DOM after scripts ran and the settle interval elapsed.
    pub dom: String,
    /// Page source including the bodies of inline scripts.
    pub source: String,
}

impl RenderedPage {
    /// A snapshot where the DOM and the source are the same captured HTML.
    pub fn from_html(url: &str, html: impl Into<String>) -> Self {
        let html = html.into();
        Self {
            final_url: url.to_string(),
            source: html.clone(),
            dom: html,
        }
    }
}

/// Something that can turn a URL into a rendered page.
///
/// Implementations own whatever process they start for the duration of one
/// call and must release it before returning, on success and failure alike.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> RenderResult<RenderedPage>;
}

/// Serves pre-captured HTML keyed by URL. Unknown URLs fail like a navigation
/// error would.
#[derive(Debug, Clone, Default)]
pub struct StaticRenderer {
    pages: HashMap<String, RenderedPage>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `html` as both DOM and source for `url`.
    pub fn with_html(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages
            .insert(url.to_string(), RenderedPage::from_html(url, html));
        self
    }

    /// Register a page with a distinct DOM and source.
    pub fn with_page(mut self, url: &str, page: RenderedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }
}

#[async_trait]
impl PageRenderer for StaticRenderer {
    async fn render(&self, url: &str) -> RenderResult<RenderedPage> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| RenderError::Navigation {
                url: url.to_string(),
                reason: "no captured page for this URL".to_string(),
            })
    }
}
