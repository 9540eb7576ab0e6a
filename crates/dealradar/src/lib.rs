//! DealRadar: product field extraction for e-commerce discount tracking.
//!
//! Given a retailer product page, recover a structured [`ProductRecord`]:
//! title, current and original price, image, platform, category and a
//! discount tier. Extraction runs a chain of strategies of decreasing trust
//! over one rendered page and reconciles their price candidates.

pub mod category;
pub mod config;
pub mod discount;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod renderer;
pub mod resolve;
pub mod store;
pub mod types;

pub use category::classify_category;
pub use config::{DealThresholds, ExtractorConfig, DEFAULT_PRICE_FLOOR};
pub use discount::{classify_deal, discount_percent};
pub use error::{RenderError, RenderResult, StoreError, StoreResult};
pub use extract::{FieldStrategy, PageContext, PartialFields, Probe};
pub use pipeline::{DealExtractor, ProductRecordBuilder};
pub use renderer::chromium::{find_chromium, ChromiumRenderer};
pub use renderer::{PageRenderer, RenderedPage, StaticRenderer};
pub use resolve::{resolve_prices, CandidatePool, PriceCandidate, ResolvedPrices};
pub use store::{
    record_sighting, AlertSink, LogAlertSink, PriceObservation, ProductStore, SqliteStore,
    StoredProduct, UpsertOutcome,
};
pub use types::*;
