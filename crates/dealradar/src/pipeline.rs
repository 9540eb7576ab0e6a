//! The extraction pipeline: render, run the strategy chain, resolve prices,
//! and build one finished [`ProductRecord`].
//!
//! `extract` never fails. A render failure is logged and degrades to the
//! defaulted record, with manual overrides still applied, so callers detect
//! "needs manual data" from `current_price == 0` alone.

use crate::category::classify_category;
use crate::config::{DealThresholds, ExtractorConfig};
use crate::discount::{classify_deal, discount_percent};
use crate::extract::{default_chain, run_chain, FieldStrategy, PageContext};
use crate::renderer::{PageRenderer, RenderedPage};
use crate::resolve::{resolve_prices, ResolvedPrices};
use crate::types::{Category, ManualOverrides, Platform, ProductRecord, TITLE_PLACEHOLDER};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Collects stage outputs and produces a [`ProductRecord`] exactly once.
#[derive(Debug, Clone)]
pub struct ProductRecordBuilder {
    product_url: String,
    platform: Platform,
    title: Option<String>,
    image_url: Option<String>,
    prices: ResolvedPrices,
    manual: ManualOverrides,
}

impl ProductRecordBuilder {
    pub fn new(product_url: &str) -> Self {
        Self {
            product_url: product_url.to_string(),
            platform: Platform::from_url(product_url),
            title: None,
            image_url: None,
            prices: ResolvedPrices::UNKNOWN,
            manual: ManualOverrides::default(),
        }
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn prices(mut self, prices: ResolvedPrices) -> Self {
        self.prices = prices;
        self
    }

    pub fn manual(mut self, manual: ManualOverrides) -> Self {
        self.manual = manual;
        self
    }

    /// Apply manual overrides, derive the discount and labels, and hand back
    /// the finished record.
    pub fn finish(self, thresholds: &DealThresholds) -> ProductRecord {
        let valid = |v: f64| v.is_finite() && v >= 0.0;

        let mut current = self.prices.current;
        let mut original = self.prices.original;
        if let Some(v) = self.manual.current_price.filter(|v| valid(*v)) {
            current = v;
        }
        if let Some(v) = self.manual.original_price.filter(|v| valid(*v)) {
            original = v;
        }
        if original < current {
            original = current;
        }

        let discount = match self.manual.discount_percent {
            Some(d) => d.min(100),
            None => discount_percent(current, original),
        };

        let (title, category) = match self.title {
            Some(title) => {
                let category = classify_category(&title);
                (title, category)
            }
            None => (TITLE_PLACEHOLDER.to_string(), Category::Other),
        };

        ProductRecord {
            title,
            platform: self.platform,
            category,
            current_price: current,
            original_price: original,
            discount_percent: discount,
            image_url: self.image_url.unwrap_or_default(),
            product_url: self.product_url,
            real_deal_status: classify_deal(discount, thresholds),
        }
    }
}

/// Runs one extraction per call with a single renderer.
pub struct DealExtractor<R> {
    renderer: R,
    config: ExtractorConfig,
    strategies: Vec<Box<dyn FieldStrategy>>,
}

impl<R: PageRenderer> DealExtractor<R> {
    /// An extractor with the default strategy order.
    pub fn new(renderer: R, config: ExtractorConfig) -> Self {
        Self::with_strategies(renderer, config, default_chain())
    }

    /// An extractor with a custom strategy order.
    pub fn with_strategies(
        renderer: R,
        config: ExtractorConfig,
        strategies: Vec<Box<dyn FieldStrategy>>,
    ) -> Self {
        Self {
            renderer,
            config,
            strategies,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Render `product_url` and extract a record from it.
    pub async fn extract(&self, product_url: &str, manual: &ManualOverrides) -> ProductRecord {
        let started = Instant::now();
        let record = match self.renderer.render(product_url).await {
            Ok(page) => self.extract_page(product_url, &page, manual),
            Err(e) => {
                warn!(url = product_url, error = %e, "render failed; returning defaulted record");
                ProductRecordBuilder::new(product_url)
                    .manual(*manual)
                    .finish(&self.config.thresholds)
            }
        };
        info!(
            url = product_url,
            platform = %record.platform,
            current_price = record.current_price,
            original_price = record.original_price,
            discount = record.discount_percent,
            status = %record.real_deal_status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extraction finished"
        );
        record
    }

    /// Extract from an already rendered page. Performs no I/O.
    pub fn extract_page(
        &self,
        product_url: &str,
        page: &RenderedPage,
        manual: &ManualOverrides,
    ) -> ProductRecord {
        let ctx = PageContext::new(product_url, page);
        let outcome = run_chain(&self.strategies, &ctx, self.config.price_floor);
        let prices = resolve_prices(outcome.trusted_price, &outcome.pool);

        debug!(
            url = product_url,
            trusted = ?outcome.trusted_price,
            pooled = outcome.pool.candidates().len(),
            below_floor = outcome.pool.rejected(),
            current = prices.current,
            original = prices.original,
            "prices resolved"
        );

        ProductRecordBuilder::new(product_url)
            .platform(ctx.platform)
            .title(outcome.title)
            .image_url(outcome.image)
            .prices(prices)
            .manual(*manual)
            .finish(&self.config.thresholds)
    }

    /// Blocking wrapper around [`extract`](Self::extract) for synchronous
    /// callers. Must not be called from inside a Tokio runtime.
    pub fn extract_blocking(&self, product_url: &str, manual: &ManualOverrides) -> ProductRecord {
        match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt.block_on(self.extract(product_url, manual)),
            Err(e) => {
                warn!(url = product_url, error = %e, "could not start runtime; returning defaulted record");
                ProductRecordBuilder::new(product_url)
                    .manual(*manual)
                    .finish(&self.config.thresholds)
            }
        }
    }
}
