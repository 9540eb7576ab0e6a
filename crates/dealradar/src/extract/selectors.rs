//! Retailer-specific markup lookups.
//!
//! Last resort for fields the generic strategies missed. Each known retailer
//! gets a short list of CSS lookups per field, tried in order. Retailers
//! change their markup often; when a lookup stops matching, capture the page
//! and update the table here.

use super::{FieldStrategy, PageContext, PartialFields, Probe, Resolved};
use crate::normalize::{clean_title, parse_locale_price, parse_machine_price, resolve_url};
use crate::resolve::{CandidateSource, PriceCandidate};
use crate::types::Platform;
use scraper::{Html, Selector};

/// One CSS lookup. `attr: None` reads the element's text.
#[derive(Debug, Clone, Copy)]
pub struct Lookup {
    pub css: &'static str,
    pub attr: Option<&'static str>,
}

const fn text(css: &'static str) -> Lookup {
    Lookup { css, attr: None }
}

const fn attr(css: &'static str, attr: &'static str) -> Lookup {
    Lookup {
        css,
        attr: Some(attr),
    }
}

/// Lookups for one retailer.
#[derive(Debug)]
pub struct RetailerTable {
    pub platform: Platform,
    pub title: &'static [Lookup],
    pub current_price: &'static [Lookup],
    pub original_price: &'static [Lookup],
    pub image: &'static [Lookup],
}

pub const RETAILER_TABLES: &[RetailerTable] = &[
    RetailerTable {
        platform: Platform::Trendyol,
        title: &[text("h1.pr-new-br"), text("h1.product-title"), text("h1")],
        current_price: &[
            text(".product-price-container .prc-dsc"),
            text("span.prc-dsc"),
            text(".price-view-discounted"),
            text(".featured-prices .discounted"),
        ],
        original_price: &[
            text(".product-price-container .prc-org"),
            text("span.prc-org"),
            text(".price-view-original"),
        ],
        image: &[
            attr("img.detail-section-img", "src"),
            attr(".base-product-image img", "src"),
            attr(".gallery-modal-content img", "src"),
        ],
    },
    RetailerTable {
        platform: Platform::Hepsiburada,
        title: &[
            text("h1[data-test-id='title']"),
            text("h1#product-name"),
            text("h1"),
        ],
        current_price: &[
            attr("#offering-price", "content"),
            text("[data-test-id='price-current-price']"),
            text("[data-test-id='default-price'] span"),
        ],
        original_price: &[
            text("[data-test-id='price-prev-price']"),
            text("#originalPrice"),
        ],
        image: &[
            attr("img[data-test-id='product-image']", "src"),
            attr("img.product-image", "src"),
            attr("#productDetailsCarousel img", "src"),
        ],
    },
    RetailerTable {
        platform: Platform::N11,
        title: &[text("h1.title"), text("h1.proName"), text("h1")],
        current_price: &[
            attr(".newPrice ins", "content"),
            text(".newPrice ins"),
            text(".unf-p-summary-price"),
        ],
        original_price: &[text(".oldPrice del"), text(".unf-p-summary-old-price")],
        image: &[
            attr(".imgObj img", "data-original"),
            attr(".imgObj img", "src"),
            attr(".unf-p-img-box img", "src"),
        ],
    },
    RetailerTable {
        platform: Platform::Amazon,
        title: &[text("#productTitle"), text("#title")],
        current_price: &[
            text("#corePrice_feature_div .a-price .a-offscreen"),
            text("#corePriceDisplay_desktop_feature_div .a-price .a-offscreen"),
            text(".a-price .a-offscreen"),
        ],
        original_price: &[
            text(".basisPrice .a-offscreen"),
            text(".a-text-price .a-offscreen"),
        ],
        image: &[
            attr("#landingImage", "data-old-hires"),
            attr("#landingImage", "src"),
            attr("#imgBlkFront", "src"),
        ],
    },
];

/// The lookup table for `platform`, if it is a known retailer.
pub fn table_for(platform: Platform) -> Option<&'static RetailerTable> {
    RETAILER_TABLES.iter().find(|t| t.platform == platform)
}

/// Retailer selector strategy.
pub struct RetailerSelectors;

impl FieldStrategy for RetailerSelectors {
    fn name(&self) -> &'static str {
        "retailer_selectors"
    }

    fn probe(&self, ctx: &PageContext, resolved: &Resolved) -> Probe<PartialFields> {
        let Some(table) = table_for(ctx.platform) else {
            return Probe::NotFound;
        };
        let doc = &ctx.document;
        let mut fields = PartialFields::default();

        if !resolved.title {
            fields.title = first_value(doc, table.title).and_then(|t| clean_title(&t));
        }
        if !resolved.image {
            fields.image = first_value(doc, table.image).and_then(|i| resolve_url(&ctx.base_url, &i));
        }
        if !resolved.current_price {
            if let Some(v) = first_price(doc, table.current_price) {
                fields
                    .candidates
                    .push(PriceCandidate::current(v, CandidateSource::RetailerSelector));
            }
        }
        if !resolved.original_price {
            if let Some(v) = first_price(doc, table.original_price) {
                fields
                    .candidates
                    .push(PriceCandidate::original(v, CandidateSource::RetailerSelector));
            }
        }

        fields.into_probe()
    }
}

fn read(doc: &Html, lookup: &Lookup) -> Option<String> {
    let sel = Selector::parse(lookup.css).ok()?;
    doc.select(&sel).find_map(|el| {
        let value = match lookup.attr {
            Some(name) => el.value().attr(name)?.trim().to_string(),
            None => el.text().collect::<String>().trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    })
}

fn first_value(doc: &Html, lookups: &[Lookup]) -> Option<String> {
    lookups.iter().find_map(|l| read(doc, l))
}

/// Attribute values are machine formatted, element text is locale formatted.
fn first_price(doc: &Html, lookups: &[Lookup]) -> Option<f64> {
    lookups.iter().find_map(|l| {
        let raw = read(doc, l)?;
        match l.attr {
            Some(_) => parse_machine_price(&raw),
            None => parse_locale_price(&raw),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderedPage;
    use crate::resolve::PriceKind;

    fn probe(url: &str, html: &str, resolved: Resolved) -> Probe<PartialFields> {
        let ctx = PageContext::new(url, &RenderedPage::from_html(url, html));
        RetailerSelectors.probe(&ctx, &resolved)
    }

    #[test]
    fn test_every_table_selector_parses() {
        for table in RETAILER_TABLES {
            let all = table
                .title
                .iter()
                .chain(table.current_price)
                .chain(table.original_price)
                .chain(table.image);
            for lookup in all {
                assert!(Selector::parse(lookup.css).is_ok(), "{}", lookup.css);
            }
        }
    }

    #[test]
    fn test_trendyol_lookups() {
        let html = r#"<h1 class="pr-new-br"><a>Apple</a> <span>iPhone 15 128 GB</span></h1>
            <div class="product-price-container">
              <span class="prc-org">89,99 TL</span>
              <span class="prc-dsc">64,99 TL</span>
            </div>
            <img class="detail-section-img" src="https://cdn.dsmcdn.com/ty1/prod/a.jpg">"#;
        let fields = probe("https://www.trendyol.com/apple/x-p-1", html, Resolved::default())
            .found()
            .unwrap();
        assert_eq!(fields.title.as_deref(), Some("Apple iPhone 15 128 GB"));
        assert_eq!(fields.image.as_deref(), Some("https://cdn.dsmcdn.com/ty1/prod/a.jpg"));
        let current: Vec<_> = fields.candidates.iter().filter(|c| c.kind == PriceKind::Current).collect();
        let original: Vec<_> = fields.candidates.iter().filter(|c| c.kind == PriceKind::Original).collect();
        assert_eq!(current[0].value, 64.99);
        assert_eq!(original[0].value, 89.99);
    }

    #[test]
    fn test_hepsiburada_content_attribute_is_machine_value() {
        let html = r#"<span id="offering-price" content="1299.90">1.299,90 TL</span>"#;
        let fields = probe("https://www.hepsiburada.com/x-p-HB1", html, Resolved::default())
            .found()
            .unwrap();
        assert_eq!(fields.candidates[0].value, 1299.90);
    }

    #[test]
    fn test_resolved_fields_are_not_queried() {
        let html = r#"<h1 id="productTitle">Kindle</h1><span class="a-price"><span class="a-offscreen">3.499,00 TL</span></span>"#;
        let resolved = Resolved {
            title: true,
            current_price: true,
            ..Resolved::default()
        };
        assert_eq!(
            probe("https://www.amazon.com.tr/dp/B0", html, resolved),
            Probe::NotFound
        );
    }

    #[test]
    fn test_unknown_retailer_is_not_found() {
        let html = r#"<h1>Something</h1>"#;
        assert_eq!(
            probe("https://shop.example.com/p/1", html, Resolved::default()),
            Probe::NotFound
        );
    }
}
