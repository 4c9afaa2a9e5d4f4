//! Shopping cart: (item, quantity) lines with a floor of one unit.
//!
//! Arithmetic never removes a line; only [`Cart::remove`] and
//! [`Cart::clear`] do. Totals are derived on every read.

use std::sync::Arc;

use crate::config::CART_KEY;
use crate::error::{Result, RivalsError};
use crate::models::{CartItem, OrderLine};
use crate::storage::{self, KeyValueStore};

/// Clamp a requested quantity to at least one unit.
fn at_least_one(qty: i64) -> u32 {
    qty.clamp(1, i64::from(u32::MAX)) as u32
}

pub struct Cart {
    store: Arc<dyn KeyValueStore>,
    items: Vec<CartItem>,
    hydrated: bool,
}

impl Cart {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            items: Vec::new(),
            hydrated: false,
        }
    }

    /// Load the persisted cart. Lines with a zero quantity are lifted to one.
    pub fn hydrate(&mut self) {
        let mut items: Vec<CartItem> = storage::load_json(self.store.as_ref(), CART_KEY);
        for item in &mut items {
            item.quantity = item.quantity.max(1);
        }
        self.items = items;
        self.hydrated = true;
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    fn ensure_hydrated(&self) -> Result<()> {
        if self.hydrated {
            Ok(())
        } else {
            Err(RivalsError::NotHydrated("cart"))
        }
    }

    fn persist(&self) {
        storage::save_json(self.store.as_ref(), CART_KEY, &self.items);
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // -- Mutations ---------------------------------------------------------

    /// Add `qty` units of `item`. An existing line for the same id grows by
    /// `qty`; otherwise a new line is inserted. `qty` is clamped to at least 1.
    pub fn add(&mut self, item: impl Into<CartItem>, qty: i64) -> Result<()> {
        self.ensure_hydrated()?;
        let qty = at_least_one(qty);
        let mut item: CartItem = item.into();
        match self.find_mut(&item.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(qty);
            }
            None => {
                item.quantity = qty;
                self.items.push(item);
            }
        }
        self.persist();
        Ok(())
    }

    /// Drop the line for `id`. Missing ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.ensure_hydrated()?;
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() != before {
            self.persist();
        }
        Ok(())
    }

    pub fn increment(&mut self, id: &str, delta: u32) -> Result<()> {
        self.ensure_hydrated()?;
        if let Some(item) = self.find_mut(id) {
            item.quantity = item.quantity.saturating_add(delta).max(1);
            self.persist();
        }
        Ok(())
    }

    /// Decrease a line by `delta`, stopping at one unit.
    pub fn decrement(&mut self, id: &str, delta: u32) -> Result<()> {
        self.ensure_hydrated()?;
        if let Some(item) = self.find_mut(id) {
            item.quantity = item.quantity.saturating_sub(delta).max(1);
            self.persist();
        }
        Ok(())
    }

    pub fn set_quantity(&mut self, id: &str, qty: i64) -> Result<()> {
        self.ensure_hydrated()?;
        if let Some(item) = self.find_mut(id) {
            item.quantity = at_least_one(qty);
            self.persist();
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_hydrated()?;
        self.items.clear();
        self.persist();
        Ok(())
    }

    // -- Derived values ----------------------------------------------------

    /// Sum of all line quantities.
    pub fn total_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of `price × quantity`, counting a missing price as zero.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Purchase lines for fulfillment.
    pub fn lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|i| OrderLine::new(i.id.clone(), i.quantity))
            .collect()
    }
}
