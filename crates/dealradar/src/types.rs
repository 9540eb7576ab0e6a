//! Core data types produced by the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title reported when no source on the page yielded a usable product name.
pub const TITLE_PLACEHOLDER: &str = "Untitled product";

/// The finished output of one `extract` call.
///
/// A record is never partially constructed: every field carries either a
/// scraped value or its documented default. `current_price == 0.0` is the one
/// signal that no usable price was found and manual entry is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub platform: Platform,
    pub category: Category,
    pub current_price: f64,
    pub original_price: f64,
    pub discount_percent: u8,
    pub image_url: String,
    pub product_url: String,
    pub real_deal_status: DealStatus,
}

impl ProductRecord {
    /// A defaulted record for `product_url` with the platform inferred from the URL.
    pub fn placeholder(product_url: &str) -> Self {
        Self {
            title: TITLE_PLACEHOLDER.to_string(),
            platform: Platform::from_url(product_url),
            category: Category::Other,
            current_price: 0.0,
            original_price: 0.0,
            discount_percent: 0,
            image_url: String::new(),
            product_url: product_url.to_string(),
            real_deal_status: DealStatus::Normal,
        }
    }

    /// True when no price could be resolved and the caller should ask for one.
    pub fn needs_manual_price(&self) -> bool {
        self.current_price == 0.0
    }
}

/// Known retailers. Anything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Trendyol,
    Hepsiburada,
    N11,
    Amazon,
    Other,
}

/// Host suffixes that identify each known retailer.
const PLATFORM_HOSTS: &[(&str, Platform)] = &[
    ("trendyol.com", Platform::Trendyol),
    ("ty.gl", Platform::Trendyol),
    ("hepsiburada.com", Platform::Hepsiburada),
    ("n11.com", Platform::N11),
    ("amazon.com.tr", Platform::Amazon),
    ("amazon.com", Platform::Amazon),
    ("amzn.to", Platform::Amazon),
];

impl Platform {
    /// Infer the retailer from the URL's host. Unparsable URLs map to `Other`.
    pub fn from_url(product_url: &str) -> Self {
        let host = match url::Url::parse(product_url) {
            Ok(u) => u.host_str().map(|h| h.to_lowercase()),
            Err(_) => None,
        };
        let Some(host) = host else {
            return Platform::Other;
        };

        PLATFORM_HOSTS
            .iter()
            .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{suffix}")))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Trendyol => "Trendyol",
            Platform::Hepsiburada => "Hepsiburada",
            Platform::N11 => "N11",
            Platform::Amazon => "Amazon",
            Platform::Other => "Other",
        }
    }

    /// Parse a stored platform name. Unknown names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Trendyol" => Platform::Trendyol,
            "Hepsiburada" => Platform::Hepsiburada,
            "N11" => Platform::N11,
            "Amazon" => Platform::Amazon,
            _ => Platform::Other,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product category inferred from the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Electronics,
    Fashion,
    Home,
    Supermarket,
    Cosmetics,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Fashion => "fashion",
            Category::Home => "home",
            Category::Supermarket => "supermarket",
            Category::Cosmetics => "cosmetics",
            Category::Other => "other",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "electronics" => Category::Electronics,
            "fashion" => Category::Fashion,
            "home" => Category::Home,
            "supermarket" => Category::Supermarket,
            "cosmetics" => Category::Cosmetics,
            _ => Category::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse authenticity label on a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Real,
    Normal,
    Fake,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Real => "real",
            DealStatus::Normal => "normal",
            DealStatus::Fake => "fake",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "real" => Some(DealStatus::Real),
            "normal" => Some(DealStatus::Normal),
            "fake" => Some(DealStatus::Fake),
            _ => None,
        }
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied values that take precedence over scraped ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualOverrides {
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_percent: Option<u8>,
}

impl ManualOverrides {
    pub fn is_empty(&self) -> bool {
        self.current_price.is_none()
            && self.original_price.is_none()
            && self.discount_percent.is_none()
    }
}
