//! Order completion: drains the cart into an inventory decrement exactly once.
//!
//! Completing an order touches three documents (inventory, cart, history)
//! that cannot be written atomically. A journal entry is persisted before
//! anything else. The inventory decrement is saved in one write together
//! with a marker naming the order (see [`InventoryStore::fulfill_order`]),
//! and the order id is added to a persisted processed set at the end. A
//! repeated completion of the same order is a no-op, and
//! [`Checkout::recover_pending`] finishes an order that was interrupted
//! part-way. Whether stock still needs taking is decided by the inventory
//! marker, so a crash at any point never decrements twice.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::{ORDER_JOURNAL_KEY, PROCESSED_ORDERS_KEY};
use crate::error::{Result, RivalsError};
use crate::models::{JournalStage, Order, OrderItem, OrderJournal, SkuLine};
use crate::remote::{CompleteOrderRequest, InventoryApi};
use crate::services::cart::Cart;
use crate::services::inventory::InventoryStore;
use crate::services::orders::OrderHistory;
use crate::storage::{self, KeyValueStore};

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The order was fulfilled by this call.
    Completed(Order),
    /// The order id had already been fulfilled; nothing changed.
    AlreadyProcessed,
}

pub struct Checkout {
    store: Arc<dyn KeyValueStore>,
    processed: BTreeSet<String>,
}

impl Checkout {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            processed: BTreeSet::new(),
        }
    }

    pub fn hydrate(&mut self) {
        self.processed = storage::load_json(self.store.as_ref(), PROCESSED_ORDERS_KEY);
    }

    pub fn is_processed(&self, order_id: &str) -> bool {
        self.processed.contains(order_id)
    }

    /// The journal entry of an interrupted completion, if any.
    pub fn pending(&self) -> Option<OrderJournal> {
        storage::load_json(self.store.as_ref(), ORDER_JOURNAL_KEY)
    }

    fn write_journal(&self, journal: &OrderJournal) {
        storage::save_json(self.store.as_ref(), ORDER_JOURNAL_KEY, journal);
    }

    /// Complete `order_id` from the current cart contents.
    ///
    /// Any interrupted completion is recovered first. When `mirror` is given,
    /// the order is also reported to the remote order endpoint; a failure
    /// there is logged and does not undo the local completion.
    pub fn complete_order(
        &mut self,
        order_id: &str,
        user_email: &str,
        cart: &mut Cart,
        inventory: &mut InventoryStore,
        history: &mut OrderHistory,
        mirror: Option<&dyn InventoryApi>,
    ) -> Result<CompletionOutcome> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(RivalsError::InvalidArgument("order id is empty".into()));
        }
        self.recover_pending(cart, inventory, history)?;

        if self.is_processed(order_id) {
            tracing::info!(order_id, "order already fulfilled; skipping");
            return Ok(CompletionOutcome::AlreadyProcessed);
        }
        if !cart.is_hydrated() {
            return Err(RivalsError::NotHydrated("cart"));
        }
        if !inventory.is_hydrated() {
            return Err(RivalsError::NotHydrated("inventory"));
        }
        if cart.is_empty() {
            return Err(RivalsError::InvalidArgument("cart is empty".into()));
        }

        let order = Order {
            id: order_id.to_string(),
            user_email: user_email.to_string(),
            total: cart.subtotal(),
            items: cart
                .items()
                .iter()
                .map(|c| OrderItem {
                    id: c.id.clone(),
                    name: c.display_name().to_string(),
                    price: c.price.unwrap_or(0.0),
                    qty: c.quantity,
                    image_url: c.image_url.clone(),
                })
                .collect(),
            created_at: Utc::now(),
        };

        let mut journal = OrderJournal {
            order,
            stage: JournalStage::Pending,
        };
        self.write_journal(&journal);

        let lines = journal.order.lines();
        let changed = inventory.fulfill_order(order_id, &lines)?.unwrap_or(0);
        journal.stage = JournalStage::InventoryApplied;
        self.write_journal(&journal);
        tracing::info!(order_id, lines = lines.len(), changed, "inventory fulfilled");

        if let Some(api) = mirror {
            let request = CompleteOrderRequest {
                lines: lines
                    .iter()
                    .map(|l| SkuLine {
                        sku: inventory
                            .get(&l.id)
                            .map(|i| i.sku.clone())
                            .unwrap_or_else(|| l.id.clone()),
                        quantity: l.quantity,
                    })
                    .collect(),
                order_id: Some(order_id.to_string()),
            };
            if let Err(e) = api.complete_order(&request) {
                tracing::warn!(order_id, error = %e, "remote order mirror failed");
            }
        }

        let order = self.finish(journal, cart, inventory, history)?;
        Ok(CompletionOutcome::Completed(order))
    }

    /// Finish an interrupted completion, if one is journaled.
    ///
    /// Returns the id of the recovered order. Inventory is only decremented
    /// when neither the journal nor the inventory snapshot shows the order as
    /// already applied.
    pub fn recover_pending(
        &mut self,
        cart: &mut Cart,
        inventory: &mut InventoryStore,
        history: &mut OrderHistory,
    ) -> Result<Option<String>> {
        let Some(mut journal) = self.pending() else {
            return Ok(None);
        };
        let order_id = journal.order.id.clone();

        if self.is_processed(&order_id) {
            inventory.forget_order(&order_id);
            storage::remove_key(self.store.as_ref(), ORDER_JOURNAL_KEY);
            return Ok(None);
        }

        tracing::warn!(order_id = %order_id, stage = ?journal.stage, "recovering interrupted order");
        if journal.stage == JournalStage::Pending {
            inventory.fulfill_order(&order_id, &journal.order.lines())?;
            journal.stage = JournalStage::InventoryApplied;
            self.write_journal(&journal);
        }
        self.finish(journal, cart, inventory, history)?;
        Ok(Some(order_id))
    }

    /// Steps after the inventory decrement. Each one is safe to repeat.
    fn finish(
        &mut self,
        journal: OrderJournal,
        cart: &mut Cart,
        inventory: &mut InventoryStore,
        history: &mut OrderHistory,
    ) -> Result<Order> {
        let order = journal.order;
        cart.clear()?;
        if history.get(&order.id).is_none() {
            history.add(order.clone())?;
        }
        self.processed.insert(order.id.clone());
        storage::save_json(self.store.as_ref(), PROCESSED_ORDERS_KEY, &self.processed);
        inventory.forget_order(&order.id);
        storage::remove_key(self.store.as_ref(), ORDER_JOURNAL_KEY);
        Ok(order)
    }
}
