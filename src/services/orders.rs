//! Completed-order history, newest first.

use std::sync::Arc;

use crate::config::ORDERS_KEY;
use crate::csv_import;
use crate::error::{Result, RivalsError};
use crate::models::Order;
use crate::storage::{self, KeyValueStore};

pub struct OrderHistory {
    store: Arc<dyn KeyValueStore>,
    orders: Vec<Order>,
    hydrated: bool,
}

impl OrderHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            orders: Vec::new(),
            hydrated: false,
        }
    }

    pub fn hydrate(&mut self) {
        self.orders = storage::load_json(self.store.as_ref(), ORDERS_KEY);
        self.hydrated = true;
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    fn ensure_hydrated(&self) -> Result<()> {
        if self.hydrated {
            Ok(())
        } else {
            Err(RivalsError::NotHydrated("order history"))
        }
    }

    fn persist(&self) {
        storage::save_json(self.store.as_ref(), ORDERS_KEY, &self.orders);
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Record an order at the front of the history.
    pub fn add(&mut self, order: Order) -> Result<()> {
        self.ensure_hydrated()?;
        self.orders.insert(0, order);
        self.persist();
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.ensure_hydrated()?;
        self.orders.retain(|o| o.id != id);
        self.persist();
        Ok(())
    }

    pub fn clear_all(&mut self) -> Result<()> {
        self.ensure_hydrated()?;
        self.orders.clear();
        self.persist();
        Ok(())
    }

    /// One CSV row per purchased line across every order.
    pub fn export_csv(&self) -> Result<String> {
        csv_import::export_orders_csv(&self.orders)
    }
}
