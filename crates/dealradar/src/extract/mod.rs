//! Field extraction strategies and the ordered chain that runs them.
//!
//! Each strategy looks at one rendered page and reports what it found as a
//! [`Probe`]. The chain folds strategies in priority order into a single
//! [`ChainOutcome`]: the first strategy to supply a title or image wins that
//! field, and price candidates of a kind already satisfied by an earlier
//! strategy are dropped. Social-preview prices join the pool without
//! satisfying anything.

pub mod meta;
pub mod script_scanner;
pub mod selectors;
pub mod structured;

use crate::renderer::RenderedPage;
use crate::resolve::{passes_floor, CandidatePool, PriceCandidate, PriceKind};
use crate::types::Platform;
use scraper::Html;
use tracing::debug;

pub use meta::{DocumentFallback, SocialPreview};
pub use script_scanner::ScriptScanner;
pub use selectors::RetailerSelectors;
pub use structured::StructuredData;

/// Outcome of one strategy against one page.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    /// The strategy produced at least one usable value.
    Found(T),
    /// Nothing relevant on this page. Not an error.
    NotFound,
    /// Relevant markup was present but could not be interpreted.
    Malformed(String),
}

impl<T> Probe<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Probe::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Probe::Found(_))
    }
}

/// Values one strategy contributed. Unset fields are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialFields {
    pub title: Option<String>,
    pub image: Option<String>,
    /// A price the strategy vouches for outright (structured data only).
    pub trusted_price: Option<f64>,
    pub candidates: Vec<PriceCandidate>,
}

impl PartialFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.image.is_none()
            && self.trusted_price.is_none()
            && self.candidates.is_empty()
    }

    /// `Found` when anything was filled in, `NotFound` otherwise.
    pub fn into_probe(self) -> Probe<PartialFields> {
        if self.is_empty() {
            Probe::NotFound
        } else {
            Probe::Found(self)
        }
    }
}

/// Everything a strategy may look at for one page.
pub struct PageContext {
    /// The URL the caller asked for.
    pub product_url: String,
    /// Base for resolving relative URLs found in the page.
    pub base_url: String,
    pub platform: Platform,
    pub document: Html,
    /// Raw page source including inline script bodies.
    pub source: String,
}

impl PageContext {
    pub fn new(product_url: &str, page: &RenderedPage) -> Self {
        // Short links redirect to the retailer, so fall back to the final URL.
        let platform = match Platform::from_url(product_url) {
            Platform::Other => Platform::from_url(&page.final_url),
            known => known,
        };
        let base_url = if page.final_url.is_empty() {
            product_url.to_string()
        } else {
            page.final_url.clone()
        };
        Self {
            product_url: product_url.to_string(),
            base_url,
            platform,
            document: Html::parse_document(&page.dom),
            source: page.source.clone(),
        }
    }
}

/// Which fields earlier strategies have already settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolved {
    pub title: bool,
    pub image: bool,
    pub current_price: bool,
    pub original_price: bool,
}

impl Resolved {
    pub fn all(&self) -> bool {
        self.title && self.image && self.current_price && self.original_price
    }

    pub fn price_kind(&self, kind: PriceKind) -> bool {
        match kind {
            PriceKind::Current => self.current_price,
            PriceKind::Original => self.original_price,
        }
    }
}

/// One way of pulling product fields out of a page.
pub trait FieldStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inspect the page. `resolved` lets a strategy skip work for fields
    /// that can no longer change the outcome.
    fn probe(&self, ctx: &PageContext, resolved: &Resolved) -> Probe<PartialFields>;
}

/// The default strategy order, highest trust first.
pub fn default_chain() -> Vec<Box<dyn FieldStrategy>> {
    vec![
        Box::new(StructuredData),
        Box::new(SocialPreview),
        Box::new(ScriptScanner),
        Box::new(RetailerSelectors),
        Box::new(DocumentFallback),
    ]
}

/// Merged result of running the chain over one page.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub title: Option<String>,
    pub image: Option<String>,
    pub trusted_price: Option<f64>,
    pub pool: CandidatePool,
}

/// Fold `strategies` over the page in order.
pub fn run_chain(
    strategies: &[Box<dyn FieldStrategy>],
    ctx: &PageContext,
    price_floor: f64,
) -> ChainOutcome {
    let mut outcome = ChainOutcome {
        title: None,
        image: None,
        trusted_price: None,
        pool: CandidatePool::new(price_floor),
    };
    let mut resolved = Resolved::default();

    for strategy in strategies {
        if resolved.all() {
            break;
        }
        let fields = match strategy.probe(ctx, &resolved) {
            Probe::Found(fields) => fields,
            Probe::NotFound => {
                debug!(strategy = strategy.name(), "nothing found");
                continue;
            }
            Probe::Malformed(reason) => {
                debug!(strategy = strategy.name(), %reason, "malformed input skipped");
                continue;
            }
        };
        debug!(
            strategy = strategy.name(),
            title = fields.title.is_some(),
            image = fields.image.is_some(),
            trusted_price = ?fields.trusted_price,
            candidates = fields.candidates.len(),
            "strategy found fields"
        );
        merge(&mut outcome, &mut resolved, fields);
    }

    outcome
}

fn merge(outcome: &mut ChainOutcome, resolved: &mut Resolved, fields: PartialFields) {
    if outcome.title.is_none() {
        outcome.title = fields.title;
    }
    if outcome.image.is_none() {
        outcome.image = fields.image;
    }

    // Kinds satisfied before this strategy ran; candidates of those kinds are
    // ignored, but a strategy may satisfy both kinds at once.
    let before = *resolved;

    if outcome.trusted_price.is_none() && !before.current_price {
        if let Some(price) = fields.trusted_price {
            if passes_floor(price, outcome.pool.floor()) {
                outcome.trusted_price = Some(price);
                resolved.current_price = true;
            } else {
                debug!(price, "structured price below floor, not trusted");
            }
        }
    }

    for candidate in fields.candidates {
        if before.price_kind(candidate.kind) {
            continue;
        }
        if outcome.pool.offer(candidate) && candidate.source.settles_kind() {
            match candidate.kind {
                PriceKind::Current => resolved.current_price = true,
                PriceKind::Original => resolved.original_price = true,
            }
        }
    }

    resolved.title = outcome.title.is_some();
    resolved.image = outcome.image.is_some();
}
