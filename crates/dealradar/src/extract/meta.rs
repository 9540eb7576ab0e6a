//! Page-level metadata strategies.
//!
//! `SocialPreview` reads the OpenGraph/product meta tags that retailers emit
//! for link previews. `DocumentFallback` is the last resort: the `<title>`
//! element and the first real `<img>`.

use super::{FieldStrategy, PageContext, PartialFields, Probe, Resolved};
use crate::normalize::{clean_title, looks_like_page_chrome, parse_machine_price, resolve_url};
use crate::resolve::{CandidateSource, PriceCandidate};
use scraper::{Html, Selector};

/// Social-preview meta tags (`og:*`, `product:price:amount`).
pub struct SocialPreview;

impl FieldStrategy for SocialPreview {
    fn name(&self) -> &'static str {
        "social_preview"
    }

    fn probe(&self, ctx: &PageContext, _resolved: &Resolved) -> Probe<PartialFields> {
        let doc = &ctx.document;

        let title = meta_content(doc, &[r#"meta[property="og:title"]"#, r#"meta[name="twitter:title"]"#])
            .and_then(|t| clean_title(&t));

        let image = meta_content(
            doc,
            &[
                r#"meta[property="og:image"]"#,
                r#"meta[property="og:image:secure_url"]"#,
                r#"meta[name="twitter:image"]"#,
            ],
        )
        .and_then(|i| resolve_url(&ctx.base_url, &i));

        let candidates = meta_content(
            doc,
            &[
                r#"meta[property="product:price:amount"]"#,
                r#"meta[property="og:price:amount"]"#,
            ],
        )
        .and_then(|p| parse_machine_price(&p))
        .map(|v| PriceCandidate::current(v, CandidateSource::SocialPreview))
        .into_iter()
        .collect();

        PartialFields {
            title,
            image,
            trusted_price: None,
            candidates,
        }
        .into_probe()
    }
}

/// Content of the first non-empty meta tag matching any of `selectors`.
fn meta_content(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let sel = Selector::parse(css).ok()?;
        doc.select(&sel)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty())
            .map(|c| c.to_string())
    })
}

/// `<title>` plus the first rendered image that is not site furniture.
pub struct DocumentFallback;

impl FieldStrategy for DocumentFallback {
    fn name(&self) -> &'static str {
        "document_fallback"
    }

    fn probe(&self, ctx: &PageContext, resolved: &Resolved) -> Probe<PartialFields> {
        let mut fields = PartialFields::default();

        if !resolved.title {
            if let Ok(sel) = Selector::parse("title") {
                fields.title = ctx
                    .document
                    .select(&sel)
                    .next()
                    .and_then(|el| clean_title(&el.text().collect::<String>()));
            }
        }

        if !resolved.image {
            if let Ok(sel) = Selector::parse("img") {
                fields.image = ctx.document.select(&sel).find_map(|el| {
                    let v = el.value();
                    let src = v.attr("src").or_else(|| v.attr("data-src"))?;
                    let url = resolve_url(&ctx.base_url, src)?;
                    (!looks_like_page_chrome(&url)).then_some(url)
                });
            }
        }

        fields.into_probe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderedPage;
    use crate::resolve::PriceKind;

    const URL: &str = "https://www.n11.com/urun/kulaklik-123";

    fn ctx(html: &str) -> PageContext {
        PageContext::new(URL, &RenderedPage::from_html(URL, html))
    }

    #[test]
    fn test_social_preview_reads_og_tags() {
        let c = ctx(r#"<head>
            <meta property="og:title" content="Sony WH-1000XM5 Kulaklık Fiyatı | n11">
            <meta property="og:image" content="//n11scdn.akamaized.net/a/1/sony.jpg">
            <meta property="product:price:amount" content="8999.00">
        </head>"#);
        let fields = SocialPreview.probe(&c, &Resolved::default()).found().unwrap();
        assert_eq!(fields.title.as_deref(), Some("Sony WH-1000XM5 Kulaklık"));
        assert_eq!(
            fields.image.as_deref(),
            Some("https://n11scdn.akamaized.net/a/1/sony.jpg")
        );
        assert_eq!(fields.candidates.len(), 1);
        assert_eq!(fields.candidates[0].value, 8999.0);
        assert_eq!(fields.candidates[0].kind, PriceKind::Current);
        assert_eq!(fields.trusted_price, None);
    }

    #[test]
    fn test_social_preview_skips_empty_content() {
        let c = ctx(r#"<meta property="og:title" content="  ">
            <meta name="twitter:title" content="Lego Technic">"#);
        let fields = SocialPreview.probe(&c, &Resolved::default()).found().unwrap();
        assert_eq!(fields.title.as_deref(), Some("Lego Technic"));
    }

    #[test]
    fn test_social_preview_not_found() {
        assert_eq!(
            SocialPreview.probe(&ctx("<p>nothing</p>"), &Resolved::default()),
            Probe::NotFound
        );
    }

    #[test]
    fn test_document_fallback_title_and_first_image() {
        let c = ctx(r#"<html><head><title>Bambu Sehpa - N11</title></head><body>
            <img src="/static/logo.svg">
            <img src="/resim/sehpa.jpg">
            <img src="/resim/other.jpg">
        </body></html>"#);
        let fields = DocumentFallback.probe(&c, &Resolved::default()).found().unwrap();
        assert_eq!(fields.title.as_deref(), Some("Bambu Sehpa"));
        assert_eq!(fields.image.as_deref(), Some("https://www.n11.com/resim/sehpa.jpg"));
    }

    #[test]
    fn test_document_fallback_respects_resolved_fields() {
        let c = ctx(r#"<title>Bambu Sehpa</title><img src="/resim/sehpa.jpg">"#);
        let resolved = Resolved {
            title: true,
            image: true,
            ..Resolved::default()
        };
        assert_eq!(DocumentFallback.probe(&c, &resolved), Probe::NotFound);
    }
}
