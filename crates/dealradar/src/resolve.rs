//! Price resolution: turn a noisy pool of numeric candidates into one
//! `(current, original)` pair.
//!
//! Every candidate passes the price floor on entry, so installment and
//! shipping amounts never reach resolution. A trusted structured-data price
//! always wins the current slot. Otherwise the smallest pooled value is the
//! sale price and the largest, when strictly greater, is the strike-through
//! price.

use serde::Serialize;

/// Which price slot a candidate was labelled with at its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    Current,
    Original,
}

/// The extraction strategy that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    StructuredData,
    SocialPreview,
    ScriptScanner,
    RetailerSelector,
}

impl CandidateSource {
    /// Whether an accepted candidate from this source settles its price kind
    /// for later strategies. Link-preview tags often repeat the list price,
    /// so they only add to the pool.
    pub fn settles_kind(&self) -> bool {
        !matches!(self, CandidateSource::SocialPreview)
    }
}

/// One numeric value gathered during a single extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceCandidate {
    pub value: f64,
    pub kind: PriceKind,
    pub source: CandidateSource,
}

impl PriceCandidate {
    pub fn current(value: f64, source: CandidateSource) -> Self {
        Self {
            value,
            kind: PriceKind::Current,
            source,
        }
    }

    pub fn original(value: f64, source: CandidateSource) -> Self {
        Self {
            value,
            kind: PriceKind::Original,
            source,
        }
    }
}

/// Call-local collection of candidates that survived the price floor.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    floor: f64,
    accepted: Vec<PriceCandidate>,
    rejected: usize,
}

impl CandidatePool {
    pub fn new(floor: f64) -> Self {
        Self {
            floor,
            accepted: Vec::new(),
            rejected: 0,
        }
    }

    /// Offer a candidate. Returns `false` when it is at or below the floor
    /// (or not a finite number) and was discarded.
    pub fn offer(&mut self, candidate: PriceCandidate) -> bool {
        if passes_floor(candidate.value, self.floor) {
            self.accepted.push(candidate);
            true
        } else {
            self.rejected += 1;
            false
        }
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn candidates(&self) -> &[PriceCandidate] {
        &self.accepted
    }

    /// Number of offered candidates discarded by the floor.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn has_kind(&self, kind: PriceKind) -> bool {
        self.accepted.iter().any(|c| c.kind == kind)
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.accepted.iter().map(|c| c.value)
    }

    fn values_of(&self, kind: PriceKind) -> impl Iterator<Item = f64> + '_ {
        self.accepted
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| c.value)
    }
}

/// Whether a value is a plausible product price under `floor`.
pub fn passes_floor(value: f64, floor: f64) -> bool {
    value.is_finite() && value > floor
}

/// The resolved price pair. `original >= current` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedPrices {
    pub current: f64,
    pub original: f64,
}

impl ResolvedPrices {
    /// Neither price could be determined.
    pub const UNKNOWN: ResolvedPrices = ResolvedPrices {
        current: 0.0,
        original: 0.0,
    };

    pub fn is_unknown(&self) -> bool {
        self.current == 0.0
    }
}

/// Reconcile the pool into a price pair.
///
/// `trusted` is the structured-data price, already known to pass the floor.
/// When present it is the current price verbatim and only candidates
/// labelled as original prices may raise the original price above it.
pub fn resolve_prices(trusted: Option<f64>, pool: &CandidatePool) -> ResolvedPrices {
    if let Some(current) = trusted.filter(|v| passes_floor(*v, pool.floor())) {
        let original = pool
            .values_of(PriceKind::Original)
            .fold(current, f64::max);
        return ResolvedPrices { current, original };
    }

    let mut values = pool.values();
    let Some(first) = values.next() else {
        return ResolvedPrices::UNKNOWN;
    };
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    ResolvedPrices {
        current: min,
        original: if max > min { max } else { min },
    }
}
