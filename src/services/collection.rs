//! Personal card collection, keyed by `(catalog_id, condition)`.
//!
//! Valuations come from an external [`PriceSource`]. A failed lookup never
//! blocks an add or aborts a batch refresh: the affected item keeps its
//! previous price.

use chrono::Utc;
use std::sync::Arc;

use crate::config::{COLLECTION_KEY, DEFAULT_CONDITION, DEFAULT_CURRENCY};
use crate::error::{Result, RivalsError};
use crate::models::{CollectionItem, NewCollectionItem};
use crate::pricing::{MarketQuote, PriceSource};
use crate::storage::{self, KeyValueStore};

/// Blank or missing conditions mean near-mint.
pub fn condition_or_default(condition: Option<&str>) -> &str {
    match condition.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => DEFAULT_CONDITION,
    }
}

/// Outcome of [`Collection::refresh_valuations`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValuationReport {
    pub refreshed: usize,
    pub failed: usize,
}

pub struct Collection {
    store: Arc<dyn KeyValueStore>,
    items: Vec<CollectionItem>,
    currency: String,
    hydrated: bool,
}

impl Collection {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            items: Vec::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            hydrated: false,
        }
    }

    pub fn hydrate(&mut self) {
        self.items = storage::load_json(self.store.as_ref(), COLLECTION_KEY);
        if let Some(first) = self.items.first() {
            self.currency = first.currency.clone();
        }
        self.hydrated = true;
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    fn ensure_hydrated(&self) -> Result<()> {
        if self.hydrated {
            Ok(())
        } else {
            Err(RivalsError::NotHydrated("collection"))
        }
    }

    fn persist(&self) {
        storage::save_json(self.store.as_ref(), COLLECTION_KEY, &self.items);
    }

    fn position(&self, catalog_id: &str, condition: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.catalog_id == catalog_id && i.condition == condition)
    }

    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    pub fn get(&self, catalog_id: &str, condition: Option<&str>) -> Option<&CollectionItem> {
        let condition = condition_or_default(condition);
        self.position(catalog_id, condition).map(|i| &self.items[i])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Currency of the most recent successful quote (`"USD"` until then).
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Sum of `last_price × quantity`, counting unvalued items as zero.
    pub fn total_value(&self) -> f64 {
        self.items.iter().map(CollectionItem::value).sum()
    }

    fn apply_quote(&mut self, pos: usize, quote: &MarketQuote) {
        let item = &mut self.items[pos];
        if let Some(price) = quote.price {
            item.last_price = Some(price);
        }
        if let Some(currency) = &quote.currency {
            item.currency = currency.clone();
            self.currency = currency.clone();
        }
        item.updated_at = Some(Utc::now());
    }

    // -- Mutations ---------------------------------------------------------

    /// Add `qty` units (at least one) of a card, valuing it on the way in.
    ///
    /// An existing `(catalog_id, condition)` row grows by `qty` and takes the
    /// new descriptive fields; a new row goes to the front.
    pub fn add_or_increment(
        &mut self,
        base: NewCollectionItem,
        qty: i64,
        prices: &dyn PriceSource,
    ) -> Result<()> {
        self.ensure_hydrated()?;
        let qty = qty.clamp(1, i64::from(u32::MAX)) as u32;
        let condition = condition_or_default(base.condition.as_deref()).to_string();

        let quote = match prices.market_price(&base.catalog_id, &condition) {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!(
                    catalog_id = %base.catalog_id,
                    condition = %condition,
                    error = %e,
                    "market price lookup failed"
                );
                None
            }
        };

        let pos = match self.position(&base.catalog_id, &condition) {
            Some(pos) => {
                let item = &mut self.items[pos];
                item.quantity = item.quantity.saturating_add(qty);
                item.name = base.name;
                item.set_name = base.set_name.or(item.set_name.take());
                item.number = base.number.or(item.number.take());
                item.image_url = base.image_url.or(item.image_url.take());
                item.rarity = base.rarity.or(item.rarity.take());
                pos
            }
            None => {
                self.items.insert(
                    0,
                    CollectionItem {
                        catalog_id: base.catalog_id,
                        name: base.name,
                        set_name: base.set_name,
                        number: base.number,
                        image_url: base.image_url,
                        rarity: base.rarity,
                        condition,
                        quantity: qty,
                        last_price: None,
                        currency: self.currency.clone(),
                        updated_at: None,
                    },
                );
                0
            }
        };
        if let Some(quote) = quote {
            self.apply_quote(pos, &quote);
        }
        self.persist();
        Ok(())
    }

    /// Set the quantity of one row, clamped to at least one.
    pub fn set_quantity(&mut self, catalog_id: &str, condition: Option<&str>, qty: i64) -> Result<()> {
        self.ensure_hydrated()?;
        let condition = condition_or_default(condition);
        if let Some(pos) = self.position(catalog_id, condition) {
            self.items[pos].quantity = qty.clamp(1, i64::from(u32::MAX)) as u32;
            self.persist();
        }
        Ok(())
    }

    pub fn remove_item(&mut self, catalog_id: &str, condition: Option<&str>) -> Result<()> {
        self.ensure_hydrated()?;
        let condition = condition_or_default(condition).to_string();
        let before = self.items.len();
        self.items
            .retain(|i| !(i.catalog_id == catalog_id && i.condition == condition));
        if self.items.len() != before {
            self.persist();
        }
        Ok(())
    }

    /// Re-value every row independently. Failed lookups are logged and
    /// counted; those rows keep their previous valuation.
    pub fn refresh_valuations(&mut self, prices: &dyn PriceSource) -> Result<ValuationReport> {
        self.ensure_hydrated()?;
        let mut report = ValuationReport::default();
        for pos in 0..self.items.len() {
            let (catalog_id, condition) = {
                let item = &self.items[pos];
                (item.catalog_id.clone(), item.condition.clone())
            };
            match prices.market_price(&catalog_id, &condition) {
                Ok(quote) => {
                    self.apply_quote(pos, &quote);
                    report.refreshed += 1;
                }
                Err(e) => {
                    tracing::warn!(%catalog_id, %condition, error = %e, "valuation refresh failed");
                    report.failed += 1;
                }
            }
        }
        self.persist();
        tracing::info!(refreshed = report.refreshed, failed = report.failed, "collection revalued");
        Ok(report)
    }

    /// Remove every row and the stored document.
    pub fn clear_all(&mut self) -> Result<()> {
        self.ensure_hydrated()?;
        self.items.clear();
        storage::remove_key(self.store.as_ref(), COLLECTION_KEY);
        Ok(())
    }
}
