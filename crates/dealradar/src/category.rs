//! Keyword-based category inference from a product title.

use crate::types::Category;

/// Keyword sets in priority order. The first category with a keyword
/// contained in the lower-cased title wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Electronics,
        &[
            "telefon", "iphone", "samsung galaxy", "laptop", "notebook", "bilgisayar",
            "tablet", "ipad", "televizyon", "tv", "kulaklık", "kulaklik", "airpods",
            "akıllı saat", "smartwatch", "kamera", "monitör", "monitor", "playstation",
            "xbox", "konsol", "klavye", "mouse", "ssd", "şarj", "powerbank",
        ],
    ),
    (
        Category::Fashion,
        &[
            "ayakkabı", "ayakkabi", "sneaker", "tişört", "tisort", "t-shirt", "elbise",
            "pantolon", "ceket", "mont", "gömlek", "gomlek", "etek", "kazak", "çanta",
            "canta", "sweatshirt", "jean",
        ],
    ),
    (
        Category::Home,
        &[
            "mobilya", "dekorasyon", "mutfak", "banyo", "yatak", "nevresim", "halı",
            "hali", "perde", "aydınlatma", "aydinlatma", "tencere", "süpürge",
            "supurge", "airfryer", "kahve makinesi", "koltuk",
        ],
    ),
    (
        Category::Supermarket,
        &[
            "gıda", "gida", "içecek", "icecek", "atıştırmalık", "atistirmalik", "kahve",
            "çay", "deterjan", "temizlik", "bebek bezi", "makarna",
        ],
    ),
    (
        Category::Cosmetics,
        &[
            "parfüm", "parfum", "makyaj", "ruj", "maskara", "cilt", "serum", "krem",
            "şampuan", "sampuan", "saç", "sac bakım", "güzellik", "guzellik",
        ],
    ),
];

/// Infer a category from a title. No match yields `Category::Other`.
pub fn classify_category(title: &str) -> Category {
    // `İ` lowercases to `i` plus a combining dot above.
    let lower: String = title.to_lowercase().chars().filter(|c| *c != '\u{307}').collect();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_category_basic() {
        assert_eq!(classify_category("Apple iPhone 15 128 GB"), Category::Electronics);
        assert_eq!(classify_category("Nike Air Force 1 Sneaker"), Category::Fashion);
        assert_eq!(classify_category("Philips Airfryer XXL"), Category::Home);
        assert_eq!(classify_category("Fairy Bulaşık Deterjanı 1.5 L"), Category::Supermarket);
        assert_eq!(classify_category("Maybelline Lash Sensational Maskara"), Category::Cosmetics);
    }

    #[test]
    fn test_classify_category_turkish_upper_case() {
        assert_eq!(classify_category("İÇECEK SETİ"), Category::Supermarket);
        assert_eq!(classify_category("BLUETOOTH KULAKLIK"), Category::Electronics);
        assert_eq!(classify_category("APPLE IPHONE 15"), Category::Electronics);
    }

    #[test]
    fn test_classify_category_priority_order() {
        // Matches both electronics ("kulaklık") and fashion ("çanta").
        assert_eq!(classify_category("Kulaklık Taşıma Çantası"), Category::Electronics);
        // Matches both home ("kahve makinesi") and supermarket ("kahve").
        assert_eq!(classify_category("De'Longhi Kahve Makinesi"), Category::Home);
    }

    #[test]
    fn test_classify_category_default() {
        assert_eq!(classify_category("Lego Technic 42115"), Category::Other);
        assert_eq!(classify_category(""), Category::Other);
    }
}
