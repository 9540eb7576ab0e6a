//! Field normalization: price text parsing, title cleanup, image URL handling.
//!
//! Price text on the supported retailers follows the Turkish convention,
//! which is the inverse of the invariant one used by machine-readable values:
//! `.` groups thousands and `,` separates decimals (`1.299,90 TL`). Machine
//! values embedded in JSON or `content` attributes use `.` as the decimal
//! separator. Both parsers return `None` for anything they cannot interpret.

use std::sync::LazyLock;

use regex::Regex;

/// Currency markers stripped before parsing price text.
const CURRENCY_MARKERS: &[&str] = &["TRY", "TL", "\u{20BA}", "$", "\u{20AC}", "USD", "EUR"];

/// Trailing words that mark a title as a "... price" listing page.
const PRICE_MARKER_WORDS: &[&str] = &["fiyatları", "fiyatı", "fiyat", "prices", "price"];

/// Path markers that make an image URL look like a product photo.
const PRODUCT_IMAGE_MARKERS: &[&str] = &[
    "/mnresize/",
    "/resize/",
    "productimages",
    "/product/",
    "/prod/",
    "/images/i/",
    "dsmcdn.com",
    "n11scdn",
    "cdn",
];

/// Paths that look like images but are page chrome, not products.
const NON_PRODUCT_IMAGE_MARKERS: &[&str] = &["logo", "sprite", "icon", "favicon", "placeholder"];

/// Storefront names retailers append to their page titles.
const SITE_NAMES: &[&str] = &[
    "trendyol",
    "hepsiburada",
    "n11",
    "amazon",
    "amazon türkiye",
    "amazon.com.tr",
];

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// A bare domain such as `n11.com` or `shop.example.com.tr`.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:www\.)?[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}$").expect("domain regex is valid")
});

/// Parse locale-formatted price text such as `1.299,90 TL` or `₺64,99`.
///
/// Dots are thousands separators and a comma is the decimal separator. Text
/// with no comma and a single dot followed by exactly one or two digits
/// (`64.99`) is accepted as an invariant decimal, since some retailers render
/// machine values verbatim.
pub fn parse_locale_price(text: &str) -> Option<f64> {
    let mut cleaned = text.trim().to_string();
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let numeric: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if numeric.is_empty() {
        return None;
    }

    let normalized = if numeric.contains(',') {
        let mut parts = numeric.rsplitn(2, ',');
        let decimals = parts.next().unwrap_or("");
        let whole = parts.next().unwrap_or("");
        if decimals.contains('.') || whole.contains(',') {
            return None;
        }
        format!("{}.{}", whole.replace('.', ""), decimals)
    } else {
        let dots = numeric.matches('.').count();
        let tail = numeric.rsplit('.').next().unwrap_or("");
        if dots == 1 && (1..=2).contains(&tail.len()) {
            numeric
        } else {
            numeric.replace('.', "")
        }
    };

    normalized
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse an invariant machine value (`1299.90`, `"1299"`), falling back to the
/// locale parser when the value is not a plain number.
pub fn parse_machine_price(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        Ok(_) => None,
        Err(_) => parse_locale_price(trimmed),
    }
}

/// Collapse runs of whitespace and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Clean a product title: collapse whitespace, strip a trailing storefront
/// name after ` - ` or ` | `, then strip trailing price marker words.
///
/// Returns `None` when nothing meaningful remains.
pub fn clean_title(raw: &str) -> Option<String> {
    let mut title = collapse_whitespace(raw);

    loop {
        let cut = [" | ", " - ", " – "]
            .iter()
            .filter_map(|sep| title.rfind(sep).map(|i| (i, sep.len())))
            .max_by_key(|(i, _)| *i);
        let Some((idx, sep_len)) = cut else {
            break;
        };
        if idx == 0 || !is_site_name(&title[idx + sep_len..]) {
            break;
        }
        title.truncate(idx);
        title = title.trim().to_string();
    }

    while let Some(last) = title.split_whitespace().last() {
        if !PRICE_MARKER_WORDS.contains(&last.to_lowercase().as_str()) {
            break;
        }
        let keep = title.len() - last.len();
        title.truncate(keep);
        title = title.trim_end().to_string();
    }

    let title = title
        .trim_end_matches(&[',', '-', '|', ':'][..])
        .trim()
        .to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

fn is_site_name(segment: &str) -> bool {
    let lower = segment.trim().to_lowercase();
    SITE_NAMES.contains(&lower.as_str()) || DOMAIN_RE.is_match(&lower)
}

/// Unescape a URL captured from script text (`https:\/\/...`, `/`).
pub fn unescape_script_url(raw: &str) -> String {
    raw.replace("\\/", "/")
        .replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("&amp;", "&")
}

/// Resolve a possibly relative or protocol-relative URL against the page URL.
pub fn resolve_url(base_url: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.starts_with("data:") {
        return None;
    }
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Some(candidate.to_string());
    }
    if let Some(rest) = candidate.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    url::Url::parse(base_url)
        .ok()
        .and_then(|base| base.join(candidate).ok())
        .map(|u| u.to_string())
}

/// Whether an image URL is site furniture (logos, icons, sprites).
pub fn looks_like_page_chrome(image_url: &str) -> bool {
    let lower = image_url.to_lowercase();
    NON_PRODUCT_IMAGE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Whether an image URL looks like a product photo rather than page chrome.
pub fn looks_like_product_image(image_url: &str) -> bool {
    if looks_like_page_chrome(image_url) {
        return false;
    }
    let lower = image_url.to_lowercase();
    PRODUCT_IMAGE_MARKERS.iter().any(|m| lower.contains(m))
}
