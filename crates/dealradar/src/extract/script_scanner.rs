//! Textual key/value scan over the raw page source.
//!
//! Render-time props and analytics payloads repeat the product price many
//! times as `"currentPrice": 123.45`-style text inside inline scripts that are
//! not standalone JSON documents. The scanner collects every occurrence of the
//! known price keys and leaves adjudication to the resolver. A bare `"price"`
//! inside an installment plan entry is skipped. The first image
//! URL under a known image key that looks like a product photo is also taken.

use super::{FieldStrategy, PageContext, PartialFields, Probe, Resolved};
use crate::normalize::{looks_like_product_image, parse_machine_price, resolve_url, unescape_script_url};
use crate::resolve::{CandidateSource, PriceCandidate, PriceKind};
use regex::Regex;
use std::sync::LazyLock;

/// Keys that carry the price a shopper pays now.
const CURRENT_PRICE_KEYS: &[&str] = &[
    "currentprice",
    "sellingprice",
    "discountedprice",
    "saleprice",
    "finalprice",
    "price",
];

/// Keys that carry the strike-through price.
const ORIGINAL_PRICE_KEYS: &[&str] = &[
    "originalprice",
    "oldprice",
    "listprice",
    "marketprice",
    "strikethroughprice",
    "regularprice",
];

/// Scalar sibling keys that mark an object as an installment plan entry.
const INSTALLMENT_KEYS: &[&str] = &["month", "months", "count", "installment", "taksit"];

/// `"key": 123.45`, `"key": "1.299,90"` or `"key": {"value": 123.45`.
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)"(currentPrice|sellingPrice|discountedPrice|salePrice|finalPrice|price|originalPrice|oldPrice|listPrice|marketPrice|strikeThroughPrice|regularPrice)"\s*:\s*(?:\{\s*"(?:value|amount)"\s*:\s*)?"?(\d[\d.,]*)"?"#,
    )
    .expect("price regex is valid")
});

/// `"image": "..."` and friends, plus the first entry of an `"images": [...]` list.
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)"(?:image|imageUrl|image_url|mainImage|originalImage|thumbnail|images)"\s*:\s*\[?\s*"((?:https?:)?(?:\\?/){2}[^"\s]+|/[^"\s]+)""#,
    )
    .expect("image regex is valid")
});

/// A quoted key, and the opening bracket when its value is a container.
static SIBLING_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([A-Za-z_]+)"\s*:\s*([\[{]?)"#).expect("sibling key regex is valid")
});

/// Inline-script scanner strategy.
pub struct ScriptScanner;

impl FieldStrategy for ScriptScanner {
    fn name(&self) -> &'static str {
        "script_scanner"
    }

    fn probe(&self, ctx: &PageContext, resolved: &Resolved) -> Probe<PartialFields> {
        let candidates = if resolved.current_price && resolved.original_price {
            Vec::new()
        } else {
            scan_prices(&ctx.source)
        };
        let image = if resolved.image {
            None
        } else {
            scan_image(&ctx.source, &ctx.base_url)
        };

        PartialFields {
            title: None,
            image,
            trusted_price: None,
            candidates,
        }
        .into_probe()
    }
}

/// Every recognized price key/value pair in `source`, in document order.
pub fn scan_prices(source: &str) -> Vec<PriceCandidate> {
    PRICE_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let key = caps.get(1)?;
            let kind = price_kind(&key.as_str().to_lowercase())?;
            if key.as_str().eq_ignore_ascii_case("price")
                && in_installment_object(source, key.start(), key.end())
            {
                return None;
            }
            let value = parse_machine_price(caps.get(2)?.as_str().trim_end_matches(&['.', ','][..]))?;
            Some(PriceCandidate {
                value,
                kind,
                source: CandidateSource::ScriptScanner,
            })
        })
        .collect()
}

/// Whether the object level holding `start..end` also has a scalar
/// installment key (`{"months": 6, "price": 216.65}`).
fn in_installment_object(source: &str, start: usize, end: usize) -> bool {
    let is_brace = |c: char| c == '{' || c == '}';
    let open = source[..start].rfind(is_brace).map_or(0, |i| i + 1);
    let close = source[end..].find(is_brace).map_or(source.len(), |i| end + i);
    SIBLING_KEY_RE.captures_iter(&source[open..close]).any(|caps| {
        let scalar = caps.get(2).map_or(true, |m| m.as_str().is_empty());
        let key = caps[1].to_ascii_lowercase();
        scalar
            && (INSTALLMENT_KEYS.contains(&key.as_str())
                || key.starts_with("installment")
                || key.starts_with("taksit"))
    })
}

fn price_kind(key: &str) -> Option<PriceKind> {
    if CURRENT_PRICE_KEYS.contains(&key) {
        Some(PriceKind::Current)
    } else if ORIGINAL_PRICE_KEYS.contains(&key) {
        Some(PriceKind::Original)
    } else {
        None
    }
}

/// First image URL under a known key that looks like a product photo.
pub fn scan_image(source: &str, base_url: &str) -> Option<String> {
    IMAGE_RE.captures_iter(source).find_map(|caps| {
        let raw = unescape_script_url(caps.get(1)?.as_str());
        let url = resolve_url(base_url, &raw)?;
        looks_like_product_image(&url).then_some(url)
    })
}
