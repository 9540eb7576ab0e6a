//! schema.org product metadata: JSON-LD blocks first, microdata second.
//!
//! This is the highest-trust source. An `offers.price` found here becomes the
//! trusted current price. Blocks that fail to parse are skipped and the scan
//! moves on to the next one.

use super::{FieldStrategy, PageContext, PartialFields, Probe, Resolved};
use crate::normalize::{clean_title, parse_locale_price, parse_machine_price, resolve_url};
use crate::resolve::{CandidateSource, PriceCandidate};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

static JSONLD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("JSON-LD selector is valid")
});

static MICRODATA_PRODUCT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[itemscope][itemtype*="schema.org/Product"]"#)
        .expect("microdata selector is valid")
});

/// Product fields pulled from one metadata block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductData {
    pub name: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    /// `highPrice` of an aggregate offer.
    pub high_price: Option<f64>,
}

impl ProductData {
    fn into_fields(self, base_url: &str) -> PartialFields {
        let mut candidates = Vec::new();
        if let (Some(price), Some(high)) = (self.price, self.high_price) {
            if high > price {
                candidates.push(PriceCandidate::original(high, CandidateSource::StructuredData));
            }
        }
        PartialFields {
            title: self.name.as_deref().and_then(clean_title),
            image: self.image.and_then(|i| resolve_url(base_url, &i)),
            trusted_price: self.price,
            candidates,
        }
    }
}

/// Structured-data strategy.
pub struct StructuredData;

impl FieldStrategy for StructuredData {
    fn name(&self) -> &'static str {
        "structured_data"
    }

    fn probe(&self, ctx: &PageContext, _resolved: &Resolved) -> Probe<PartialFields> {
        let (product, malformed) = scan_jsonld(&ctx.document);
        let product = product.or_else(|| scan_microdata(&ctx.document));

        match product {
            Some(p) => p.into_fields(&ctx.base_url).into_probe(),
            None if malformed > 0 => {
                Probe::Malformed(format!("{malformed} JSON-LD block(s) failed to parse"))
            }
            None => Probe::NotFound,
        }
    }
}

/// First product found across all JSON-LD blocks, plus the number of blocks
/// that were not valid JSON.
pub fn scan_jsonld(document: &Html) -> (Option<ProductData>, usize) {
    let mut malformed = 0;
    for element in document.select(&JSONLD) {
        let text: String = element.text().collect();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                if let Some(product) = find_product(&value) {
                    return (Some(parse_product(product)), malformed);
                }
            }
            Err(_) => malformed += 1,
        }
    }
    (None, malformed)
}

/// Locate the first `Product`/`ProductGroup` node, descending into `@graph`
/// and top-level arrays.
fn find_product(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_product),
        Value::Object(map) => {
            if is_product_type(map.get("@type")) {
                return Some(value);
            }
            map.get("@graph").and_then(find_product)
        }
        _ => None,
    }
}

fn is_product_type(ld_type: Option<&Value>) -> bool {
    let is_product = |t: &str| matches!(t, "Product" | "ProductGroup" | "IndividualProduct");
    match ld_type {
        Some(Value::String(t)) => is_product(t.as_str()),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(is_product),
        _ => false,
    }
}

fn parse_product(v: &Value) -> ProductData {
    let offer = first_offer(v).or_else(|| {
        // ProductGroup pages often carry prices only on their variants.
        v.get("hasVariant")
            .and_then(|variants| variants.as_array())
            .and_then(|variants| variants.iter().find_map(first_offer))
    });

    let (price, high_price) = match offer {
        Some(offer) => {
            let price = offer
                .get("price")
                .and_then(json_price)
                .or_else(|| offer.get("lowPrice").and_then(json_price))
                .or_else(|| {
                    offer
                        .get("priceSpecification")
                        .and_then(|spec| spec.get("price"))
                        .and_then(json_price)
                });
            (price, offer.get("highPrice").and_then(json_price))
        }
        None => (None, None),
    };

    ProductData {
        name: v
            .get("name")
            .and_then(|n| n.as_str())
            .map(|s| s.to_string()),
        image: v.get("image").and_then(json_image),
        price,
        high_price,
    }
}

fn first_offer(v: &Value) -> Option<&Value> {
    v.get("offers").and_then(|o| match o {
        Value::Array(arr) => arr.first(),
        Value::Object(_) => Some(o),
        _ => None,
    })
}

fn json_price(p: &Value) -> Option<f64> {
    p.as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .or_else(|| p.as_str().and_then(parse_machine_price))
}

/// `image` may be a URL, a list of URLs, an `ImageObject` or a list of those.
fn json_image(i: &Value) -> Option<String> {
    match i {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(json_image),
        Value::Object(obj) => obj
            .get("url")
            .or_else(|| obj.get("contentUrl"))
            .and_then(|u| u.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}

/// Read the first microdata `Product` scope.
pub fn scan_microdata(document: &Html) -> Option<ProductData> {
    let scope = document.select(&MICRODATA_PRODUCT).next()?;

    let mut product = ProductData::default();

    if let Ok(sel) = Selector::parse(r#"[itemprop="name"]"#) {
        product.name = scope
            .select(&sel)
            .next()
            .map(|el| itemprop_value(&el))
            .filter(|s| !s.is_empty());
    }

    if let Ok(sel) = Selector::parse(r#"[itemprop="price"]"#) {
        product.price = scope.select(&sel).find_map(|el| {
            match el.value().attr("content") {
                Some(content) => parse_machine_price(content),
                None => parse_locale_price(&el.text().collect::<String>()),
            }
        });
    }

    if let Ok(sel) = Selector::parse(r#"[itemprop="highPrice"]"#) {
        product.high_price = scope
            .select(&sel)
            .find_map(|el| el.value().attr("content").and_then(parse_machine_price));
    }

    if let Ok(sel) = Selector::parse(r#"[itemprop="image"]"#) {
        product.image = scope.select(&sel).find_map(|el| {
            let v = el.value();
            v.attr("src")
                .or_else(|| v.attr("content"))
                .or_else(|| v.attr("href"))
                .map(|s| s.to_string())
        });
    }

    if product == ProductData::default() {
        None
    } else {
        Some(product)
    }
}

fn itemprop_value(el: &ElementRef<'_>) -> String {
    el.value()
        .attr("content")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| el.text().collect::<String>().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderedPage;
    use crate::resolve::PriceKind;

    fn probe(html: &str) -> Probe<PartialFields> {
        let url = "https://www.trendyol.com/marka/urun-p-1";
        let ctx = PageContext::new(url, &RenderedPage::from_html(url, html));
        StructuredData.probe(&ctx, &Resolved::default())
    }

    #[test]
    fn test_extract_jsonld_product() {
        let html = r#"<html><head>
        <script type="application/ld+json">
        {"@context":"https://schema.org","@type":"Product","name":"Apple iPhone 15 128 GB",
         "image":["https://cdn.dsmcdn.com/ty1/prod/a.jpg","https://cdn.dsmcdn.com/ty1/prod/b.jpg"],
         "offers":{"@type":"Offer","price":"899.90","priceCurrency":"TRY"}}
        </script></head><body></body></html>"#;

        let fields = probe(html).found().expect("product should be found");
        assert_eq!(fields.title.as_deref(), Some("Apple iPhone 15 128 GB"));
        assert_eq!(fields.image.as_deref(), Some("https://cdn.dsmcdn.com/ty1/prod/a.jpg"));
        assert_eq!(fields.trusted_price, Some(899.90));
        assert!(fields.candidates.is_empty());
    }

    #[test]
    fn test_first_offer_wins() {
        let html = r#"<script type="application/ld+json">
        {"@type":"Product","name":"X","offers":[{"price":120.5},{"price":99.0}]}
        </script>"#;
        let fields = probe(html).found().unwrap();
        assert_eq!(fields.trusted_price, Some(120.5));
    }

    #[test]
    fn test_extract_graph_and_type_array() {
        let html = r#"<script type="application/ld+json">
        {"@context":"https://schema.org","@graph":[
            {"@type":"BreadcrumbList","itemListElement":[]},
            {"@type":["Product","Thing"],"name":"Dyson V15","offers":{"price":24999}}
        ]}</script>"#;
        let fields = probe(html).found().unwrap();
        assert_eq!(fields.title.as_deref(), Some("Dyson V15"));
        assert_eq!(fields.trusted_price, Some(24999.0));
    }

    #[test]
    fn test_aggregate_offer_high_price_is_original_candidate() {
        let html = r#"<script type="application/ld+json">
        [{"@type":"Product","name":"Kulaklık",
          "offers":{"@type":"AggregateOffer","lowPrice":"1.499,00","highPrice":1999}}]
        </script>"#;
        let fields = probe(html).found().unwrap();
        assert_eq!(fields.trusted_price, Some(1499.0));
        assert_eq!(fields.candidates.len(), 1);
        assert_eq!(fields.candidates[0].kind, PriceKind::Original);
        assert_eq!(fields.candidates[0].value, 1999.0);
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let html = r#"
        <script type="application/ld+json">{ this is not json </script>
        <script type="application/ld+json">{"@type":"Product","name":"Saat","offers":{"price":"450"}}</script>"#;
        let fields = probe(html).found().unwrap();
        assert_eq!(fields.trusted_price, Some(450.0));
    }

    #[test]
    fn test_only_malformed_blocks_report_malformed() {
        let html = r#"<script type="application/ld+json">{ "@type": "Product", </script>"#;
        assert!(matches!(probe(html), Probe::Malformed(_)));
    }

    #[test]
    fn test_no_product_is_not_found() {
        let html = r#"<script type="application/ld+json">{"@type":"WebSite","name":"Shop"}</script>"#;
        assert_eq!(probe(html), Probe::NotFound);
        assert_eq!(probe("<html><body>plain</body></html>"), Probe::NotFound);
    }

    #[test]
    fn test_image_object_and_relative_url() {
        let html = r#"<script type="application/ld+json">
        {"@type":"Product","name":"Koltuk","image":{"@type":"ImageObject","url":"/img/koltuk.jpg"}}
        </script>"#;
        let fields = probe(html).found().unwrap();
        assert_eq!(fields.image.as_deref(), Some("https://www.trendyol.com/img/koltuk.jpg"));
        assert_eq!(fields.trusted_price, None);
    }

    #[test]
    fn test_extract_microdata_product() {
        let html = r#"<div itemscope itemtype="https://schema.org/Product">
            <h1 itemprop="name">Philips Airfryer XXL</h1>
            <img itemprop="image" src="https://productimages.hepsiburada.net/a.jpg">
            <div itemprop="offers" itemscope itemtype="https://schema.org/Offer">
                <span itemprop="price" content="3499.00">3.499,00 TL</span>
            </div>
        </div>"#;
        let fields = probe(html).found().unwrap();
        assert_eq!(fields.title.as_deref(), Some("Philips Airfryer XXL"));
        assert_eq!(fields.trusted_price, Some(3499.0));
        assert_eq!(
            fields.image.as_deref(),
            Some("https://productimages.hepsiburada.net/a.jpg")
        );
    }

    #[test]
    fn test_microdata_price_text_uses_locale() {
        let html = r#"<div itemscope itemtype="http://schema.org/Product">
            <span itemprop="price">1.299,90 TL</span></div>"#;
        let fields = probe(html).found().unwrap();
        assert_eq!(fields.trusted_price, Some(1299.90));
    }
}
