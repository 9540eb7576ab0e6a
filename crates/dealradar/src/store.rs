//! Persistence collaborator: products keyed by URL with an append-only
//! price history, plus the alert hook fired on price changes.
//!
//! The pipeline itself never touches storage. Callers hand a finished
//! [`ProductRecord`] to a [`ProductStore`], which assigns identity and decides
//! whether a new price observation is due.

use crate::error::{StoreError, StoreResult};
use crate::types::{Category, DealStatus, Platform, ProductRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpsertOutcome {
    pub product_id: i64,
    /// First sighting of this URL.
    pub inserted: bool,
    /// A new price observation was appended for an existing product.
    pub price_changed: bool,
    /// Stored current price before this upsert, for existing products.
    pub previous_price: Option<f64>,
}

/// One entry of a product's price history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceObservation {
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

/// A stored product with its identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredProduct {
    pub id: i64,
    #[serde(flatten)]
    pub record: ProductRecord,
    pub updated_at: DateTime<Utc>,
}

/// Storage for extracted products.
pub trait ProductStore {
    /// Insert a first sighting or update an existing product.
    ///
    /// A first sighting appends one observation. A later sighting updates the
    /// mutable fields and appends an observation only when the current price
    /// changed. A price-unknown record never overwrites a stored price.
    fn upsert(&mut self, record: &ProductRecord, now: DateTime<Utc>) -> StoreResult<UpsertOutcome>;

    fn find_by_url(&self, product_url: &str) -> StoreResult<Option<StoredProduct>>;

    /// Observations for a product, oldest first.
    fn price_history(&self, product_id: i64) -> StoreResult<Vec<PriceObservation>>;

    /// All products, most recently updated first.
    fn list_products(&self) -> StoreResult<Vec<StoredProduct>>;
}

/// Receives price changes of known products. Threshold evaluation and
/// delivery belong to the implementation.
pub trait AlertSink {
    fn price_updated(&self, product_id: i64, record: &ProductRecord);
}

/// Alert sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn price_updated(&self, product_id: i64, record: &ProductRecord) {
        info!(
            product_id,
            url = %record.product_url,
            price = record.current_price,
            "price changed"
        );
    }
}

/// Upsert `record` and notify `alerts` when an existing product's price moved.
pub fn record_sighting<S, A>(
    store: &mut S,
    alerts: &A,
    record: &ProductRecord,
    now: DateTime<Utc>,
) -> StoreResult<UpsertOutcome>
where
    S: ProductStore + ?Sized,
    A: AlertSink + ?Sized,
{
    let outcome = store.upsert(record, now)?;
    if outcome.price_changed {
        alerts.price_updated(outcome.product_id, record);
    }
    Ok(outcome)
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    platform TEXT NOT NULL,
    category TEXT NOT NULL,
    current_price REAL NOT NULL,
    original_price REAL NOT NULL,
    discount_percent INTEGER NOT NULL,
    image_url TEXT NOT NULL,
    real_deal_status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS price_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    price REAL NOT NULL,
    observed_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_price_history_product ON price_history(product_id, id);
";

const PRODUCT_COLUMNS: &str = "id, product_url, title, platform, category, current_price, \
     original_price, discount_percent, image_url, real_deal_status, updated_at";

/// SQLite-backed [`ProductStore`].
pub struct SqliteStore {
    db: Connection,
}

impl SqliteStore {
    /// Open or create a store at `path`, creating parent directories.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// `~/.dealradar/dealradar.db`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dealradar")
            .join("dealradar.db")
    }

    fn init(db: Connection) -> StoreResult<Self> {
        db.execute_batch("PRAGMA foreign_keys = ON;")?;
        db.execute_batch(SCHEMA)?;
        Ok(Self { db })
    }

    fn product_id_and_price(&self, product_url: &str) -> StoreResult<Option<(i64, f64)>> {
        let row = self
            .db
            .query_row(
                "SELECT id, current_price FROM products WHERE product_url = ?1",
                params![product_url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }
}

impl ProductStore for SqliteStore {
    fn upsert(&mut self, record: &ProductRecord, now: DateTime<Utc>) -> StoreResult<UpsertOutcome> {
        let existing = self.product_id_and_price(&record.product_url)?;
        let stamp = now.to_rfc3339();
        let tx = self.db.transaction()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    "INSERT INTO products (product_url, title, platform, category, current_price,
                        original_price, discount_percent, image_url, real_deal_status,
                        created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                    params![
                        record.product_url,
                        record.title,
                        record.platform.as_str(),
                        record.category.as_str(),
                        record.current_price,
                        record.original_price,
                        record.discount_percent,
                        record.image_url,
                        record.real_deal_status.as_str(),
                        stamp,
                    ],
                )?;
                let product_id = tx.last_insert_rowid();
                tx.execute(
                    "INSERT INTO price_history (product_id, price, observed_at) VALUES (?1, ?2, ?3)",
                    params![product_id, record.current_price, stamp],
                )?;
                debug!(product_id, url = %record.product_url, "product inserted");
                UpsertOutcome {
                    product_id,
                    inserted: true,
                    price_changed: false,
                    previous_price: None,
                }
            }
            Some((product_id, previous)) if record.needs_manual_price() => {
                tx.execute(
                    "UPDATE products SET updated_at = ?2 WHERE id = ?1",
                    params![product_id, stamp],
                )?;
                debug!(product_id, "price unknown in new sighting; stored data kept");
                UpsertOutcome {
                    product_id,
                    inserted: false,
                    price_changed: false,
                    previous_price: Some(previous),
                }
            }
            Some((product_id, previous)) => {
                tx.execute(
                    "UPDATE products SET title = ?2, platform = ?3, category = ?4,
                        current_price = ?5, original_price = ?6, discount_percent = ?7,
                        image_url = ?8, real_deal_status = ?9, updated_at = ?10
                     WHERE id = ?1",
                    params![
                        product_id,
                        record.title,
                        record.platform.as_str(),
                        record.category.as_str(),
                        record.current_price,
                        record.original_price,
                        record.discount_percent,
                        record.image_url,
                        record.real_deal_status.as_str(),
                        stamp,
                    ],
                )?;
                let price_changed = previous != record.current_price;
                if price_changed {
                    tx.execute(
                        "INSERT INTO price_history (product_id, price, observed_at) VALUES (?1, ?2, ?3)",
                        params![product_id, record.current_price, stamp],
                    )?;
                }
                debug!(product_id, price_changed, "product updated");
                UpsertOutcome {
                    product_id,
                    inserted: false,
                    price_changed,
                    previous_price: Some(previous),
                }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn find_by_url(&self, product_url: &str) -> StoreResult<Option<StoredProduct>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_url = ?1");
        let row = self
            .db
            .query_row(&sql, params![product_url], ProductRow::from_row)
            .optional()?;
        row.map(ProductRow::into_stored).transpose()
    }

    fn price_history(&self, product_id: i64) -> StoreResult<Vec<PriceObservation>> {
        let mut stmt = self.db.prepare(
            "SELECT price, observed_at FROM price_history WHERE product_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![product_id], |row| {
            Ok((row.get::<_, f64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (price, observed_at) = row?;
            history.push(PriceObservation {
                price,
                observed_at: parse_timestamp(&observed_at)?,
            });
        }
        Ok(history)
    }

    fn list_products(&self) -> StoreResult<Vec<StoredProduct>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY updated_at DESC, id DESC");
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt.query_map([], ProductRow::from_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?.into_stored()?);
        }
        Ok(products)
    }
}

/// Raw column values, converted into domain types outside the row closure.
struct ProductRow {
    id: i64,
    product_url: String,
    title: String,
    platform: String,
    category: String,
    current_price: f64,
    original_price: f64,
    discount_percent: i64,
    image_url: String,
    real_deal_status: String,
    updated_at: String,
}

impl ProductRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            product_url: row.get(1)?,
            title: row.get(2)?,
            platform: row.get(3)?,
            category: row.get(4)?,
            current_price: row.get(5)?,
            original_price: row.get(6)?,
            discount_percent: row.get(7)?,
            image_url: row.get(8)?,
            real_deal_status: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_stored(self) -> StoreResult<StoredProduct> {
        let real_deal_status = DealStatus::from_name(&self.real_deal_status).ok_or_else(|| {
            StoreError::InvalidValue(format!("real_deal_status {:?}", self.real_deal_status))
        })?;
        let discount_percent = u8::try_from(self.discount_percent)
            .map_err(|_| StoreError::InvalidValue(format!("discount_percent {}", self.discount_percent)))?;

        Ok(StoredProduct {
            id: self.id,
            record: ProductRecord {
                title: self.title,
                platform: Platform::from_name(&self.platform),
                category: Category::from_name(&self.category),
                current_price: self.current_price,
                original_price: self.original_price,
                discount_percent,
                image_url: self.image_url,
                product_url: self.product_url,
                real_deal_status,
            },
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidValue(format!("timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn record(url: &str, price: f64) -> ProductRecord {
        ProductRecord {
            title: "Philips Airfryer XXL".into(),
            platform: Platform::from_url(url),
            category: Category::Home,
            current_price: price,
            original_price: 4999.0,
            discount_percent: 30,
            image_url: "https://cdn.dsmcdn.com/ty1/prod/a.jpg".into(),
            product_url: url.into(),
            real_deal_status: DealStatus::Real,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    const URL: &str = "https://www.trendyol.com/philips/airfryer-p-42";

    #[test]
    fn test_first_sighting_inserts_with_one_observation() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let outcome = store.upsert(&record(URL, 3499.0), at(0)).unwrap();
        assert!(outcome.inserted);
        assert!(!outcome.price_changed);
        assert_eq!(outcome.previous_price, None);

        let history = store.price_history(outcome.product_id).unwrap();
        assert_eq!(
            history,
            vec![PriceObservation {
                price: 3499.0,
                observed_at: at(0)
            }]
        );

        let stored = store.find_by_url(URL).unwrap().unwrap();
        assert_eq!(stored.id, outcome.product_id);
        assert_eq!(stored.record, record(URL, 3499.0));
        assert_eq!(stored.updated_at, at(0));
    }

    #[test]
    fn test_unchanged_price_appends_nothing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let first = store.upsert(&record(URL, 3499.0), at(0)).unwrap();
        let second = store.upsert(&record(URL, 3499.0), at(6)).unwrap();
        assert_eq!(first.product_id, second.product_id);
        assert!(!second.inserted);
        assert!(!second.price_changed);
        assert_eq!(store.price_history(first.product_id).unwrap().len(), 1);
        assert_eq!(store.find_by_url(URL).unwrap().unwrap().updated_at, at(6));
    }

    #[test]
    fn test_changed_price_appends_observation() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let first = store.upsert(&record(URL, 3499.0), at(0)).unwrap();
        let second = store.upsert(&record(URL, 2999.0), at(6)).unwrap();
        assert!(second.price_changed);
        assert_eq!(second.previous_price, Some(3499.0));

        let prices: Vec<f64> = store
            .price_history(first.product_id)
            .unwrap()
            .iter()
            .map(|o| o.price)
            .collect();
        assert_eq!(prices, vec![3499.0, 2999.0]);
        assert_eq!(store.find_by_url(URL).unwrap().unwrap().record.current_price, 2999.0);
    }

    #[test]
    fn test_price_unknown_sighting_keeps_stored_data() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let first = store.upsert(&record(URL, 3499.0), at(0)).unwrap();
        let failed = ProductRecord::placeholder(URL);
        let outcome = store.upsert(&failed, at(6)).unwrap();
        assert!(!outcome.price_changed);

        let stored = store.find_by_url(URL).unwrap().unwrap();
        assert_eq!(stored.record.current_price, 3499.0);
        assert_eq!(stored.record.title, "Philips Airfryer XXL");
        assert_eq!(store.price_history(first.product_id).unwrap().len(), 1);
    }

    #[test]
    fn test_list_products_most_recent_first() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let other = "https://www.n11.com/urun/kulaklik-9";
        store.upsert(&record(URL, 3499.0), at(0)).unwrap();
        store.upsert(&record(other, 899.0), at(1)).unwrap();
        let urls: Vec<String> = store
            .list_products()
            .unwrap()
            .into_iter()
            .map(|p| p.record.product_url)
            .collect();
        assert_eq!(urls, vec![other.to_string(), URL.to_string()]);
    }

    #[test]
    fn test_find_missing_url() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.find_by_url("https://nope.example/x").unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deals.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.upsert(&record(URL, 3499.0), at(0)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let stored = store.find_by_url(URL).unwrap().unwrap();
        assert_eq!(stored.record.platform, Platform::Trendyol);
    }

    #[derive(Default)]
    struct Recording(RefCell<Vec<(i64, f64)>>);

    impl AlertSink for Recording {
        fn price_updated(&self, product_id: i64, record: &ProductRecord) {
            self.0.borrow_mut().push((product_id, record.current_price));
        }
    }

    #[test]
    fn test_alerts_fire_only_on_price_change() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let alerts = Recording::default();

        let first = record_sighting(&mut store, &alerts, &record(URL, 3499.0), at(0)).unwrap();
        record_sighting(&mut store, &alerts, &record(URL, 3499.0), at(6)).unwrap();
        record_sighting(&mut store, &alerts, &record(URL, 2999.0), at(12)).unwrap();

        assert_eq!(*alerts.0.borrow(), vec![(first.product_id, 2999.0)]);
    }
}
