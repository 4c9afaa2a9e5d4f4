//! The inventory store: the client's copy of sellable stock.
//!
//! Items are kept in input order and looked up by `id`. Every successful
//! mutation persists a snapshot; persistence is best-effort.
//!
//! The snapshot also records which orders have already been taken out of
//! stock. An order decrement and its marker land in the same write, so a
//! crash can never leave one without the other.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::config::INVENTORY_KEY;
use crate::csv_import;
use crate::error::{Result, RivalsError};
use crate::models::{FulfillmentChange, InventoryItem, OrderLine, RawRow, SkuLine};
use crate::normalize::{canonicalize, normalize};
use crate::remote::InventoryApi;
use crate::storage::{self, KeyValueStore};

/// Outcome of [`InventoryStore::merge_upsert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    /// Ids that appeared more than once in the same batch.
    pub collisions: usize,
}

/// Persisted form of the store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot<'a> {
    items: &'a [InventoryItem],
    applied_orders: &'a BTreeSet<String>,
}

/// Stored snapshot as read back. Items stay untyped so that every row goes
/// through normalization again.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    applied_orders: BTreeSet<String>,
}

pub struct InventoryStore {
    store: Arc<dyn KeyValueStore>,
    items: Vec<InventoryItem>,
    applied_orders: BTreeSet<String>,
    hydrated: bool,
    last_error: Option<String>,
}

impl InventoryStore {
    /// Create an empty, un-hydrated store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            items: Vec::new(),
            applied_orders: BTreeSet::new(),
            hydrated: false,
            last_error: None,
        }
    }

    /// Load the persisted snapshot. A missing or corrupt snapshot leaves the
    /// store empty. A bare item array, as older snapshots were written, is
    /// read as items with no applied orders.
    pub fn hydrate(&mut self) {
        let stored: Value = storage::load_json(self.store.as_ref(), INVENTORY_KEY);
        let snapshot = match stored {
            Value::Null => StoredSnapshot::default(),
            Value::Array(items) => StoredSnapshot {
                items,
                applied_orders: BTreeSet::new(),
            },
            other => serde_json::from_value(other).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "unreadable inventory snapshot; starting empty");
                StoredSnapshot::default()
            }),
        };
        self.items = snapshot
            .items
            .iter()
            .filter_map(Value::as_object)
            .map(normalize)
            .collect();
        self.applied_orders = snapshot.applied_orders;
        self.hydrated = true;
        tracing::debug!(count = self.items.len(), "inventory hydrated");
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Items whose name, set, number or sku contain `filter`.
    pub fn search(&self, filter: &str) -> Vec<&InventoryItem> {
        self.items.iter().filter(|i| i.matches(filter)).collect()
    }

    /// Message of the most recent failed refresh, cleared by the next
    /// successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True once the stock for `order_id` has been decremented.
    pub fn has_applied(&self, order_id: &str) -> bool {
        self.applied_orders.contains(order_id)
    }

    fn persist(&self) {
        let snapshot = Snapshot {
            items: &self.items,
            applied_orders: &self.applied_orders,
        };
        storage::save_json(self.store.as_ref(), INVENTORY_KEY, &snapshot);
    }

    /// Mutations that build on the stored items need them loaded first, or
    /// the next write would drop whatever was persisted.
    fn ensure_hydrated(&self) -> Result<()> {
        if self.hydrated {
            Ok(())
        } else {
            Err(RivalsError::NotHydrated("inventory"))
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    // -- Mutations ---------------------------------------------------------

    /// Discard every item and store the normalized `rows` instead.
    ///
    /// Rows that resolve to the same id collapse onto the first position,
    /// last row winning. Returns the number of stored items.
    pub fn replace_all<I>(&mut self, rows: I) -> usize
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut items: Vec<InventoryItem> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut collisions = 0usize;

        for row in rows {
            let item = normalize(&row);
            match index.get(&item.id) {
                Some(&pos) => {
                    collisions += 1;
                    items[pos] = item;
                }
                None => {
                    index.insert(item.id.clone(), items.len());
                    items.push(item);
                }
            }
        }

        if collisions > 0 {
            tracing::warn!(collisions, "identity collisions while replacing inventory");
        }
        self.items = items;
        self.hydrated = true;
        self.persist();
        tracing::info!(count = self.items.len(), "inventory replaced");
        self.items.len()
    }

    /// [`replace_all`](Self::replace_all) for already-normalized items.
    pub fn replace_items(&mut self, items: &[InventoryItem]) -> usize {
        self.replace_all(items.iter().map(InventoryItem::to_raw))
    }

    /// Update-or-insert each row by `id`.
    ///
    /// Existing items are shallow-merged: fields present on the incoming row
    /// overwrite, everything else on the stored item is kept. Rows without an
    /// `id` get one from identity resolution. Later rows in the same batch win
    /// over earlier ones.
    pub fn merge_upsert<I>(&mut self, rows: I) -> Result<MergeReport>
    where
        I: IntoIterator<Item = RawRow>,
    {
        self.ensure_hydrated()?;
        let mut report = MergeReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        for row in rows {
            let fresh = normalize(&row);
            let id = fresh.id.clone();
            if !seen.insert(id.clone()) {
                report.collisions += 1;
            }

            match self.position(&id) {
                Some(pos) => {
                    let mut merged = self.items[pos].to_raw();
                    merged.extend(canonicalize(&row));
                    merged.insert("id".into(), Value::String(id));
                    self.items[pos] = normalize(&merged);
                    report.updated += 1;
                }
                None => {
                    self.items.push(fresh);
                    report.added += 1;
                }
            }
        }

        if report.collisions > 0 {
            tracing::warn!(collisions = report.collisions, "identity collisions while merging inventory");
        }
        self.persist();
        tracing::info!(added = report.added, updated = report.updated, "inventory merged");
        Ok(report)
    }

    /// [`merge_upsert`](Self::merge_upsert) for already-normalized items.
    pub fn merge_items(&mut self, items: &[InventoryItem]) -> Result<MergeReport> {
        self.merge_upsert(items.iter().map(InventoryItem::to_raw))
    }

    /// Decrement stock for a completed order.
    ///
    /// Each item takes the first line whose id matches and loses that many
    /// units, flooring at zero. Lines naming unknown ids are ignored. Returns
    /// the number of items whose quantity changed.
    pub fn fulfill(&mut self, lines: &[OrderLine]) -> Result<usize> {
        self.ensure_hydrated()?;
        let changed = self.decrement(lines);
        self.persist();
        Ok(changed)
    }

    /// [`fulfill`](Self::fulfill) once per order.
    ///
    /// The decrement and the record that `order_id` was applied are saved
    /// together. Returns `None`, without touching stock, when the order had
    /// already been applied.
    pub fn fulfill_order(&mut self, order_id: &str, lines: &[OrderLine]) -> Result<Option<usize>> {
        self.ensure_hydrated()?;
        if self.has_applied(order_id) {
            tracing::debug!(order_id, "order already taken out of stock");
            return Ok(None);
        }
        let changed = self.decrement(lines);
        self.applied_orders.insert(order_id.to_string());
        self.persist();
        Ok(Some(changed))
    }

    /// Drop the applied marker for an order whose completion is fully
    /// recorded elsewhere.
    pub fn forget_order(&mut self, order_id: &str) {
        if self.applied_orders.remove(order_id) {
            self.persist();
        }
    }

    fn decrement(&mut self, lines: &[OrderLine]) -> usize {
        let mut changed = 0;
        for item in &mut self.items {
            let Some(line) = lines.iter().find(|l| l.id == item.id) else {
                continue;
            };
            let after = item.quantity.saturating_sub(line.quantity);
            if after != item.quantity {
                item.quantity = after;
                changed += 1;
            }
        }
        let unmatched = lines
            .iter()
            .filter(|l| !self.items.iter().any(|i| i.id == l.id))
            .count();
        if unmatched > 0 {
            tracing::debug!(unmatched, "order lines reference unknown inventory ids");
        }
        changed
    }

    /// Decrement stock by sku, reporting one change per matched line.
    pub fn fulfill_by_sku(&mut self, lines: &[SkuLine]) -> Result<Vec<FulfillmentChange>> {
        self.ensure_hydrated()?;
        let mut changes = Vec::new();
        for line in lines {
            let Some(item) = self.items.iter_mut().find(|i| i.sku == line.sku) else {
                continue;
            };
            let before = item.quantity;
            let after = before.saturating_sub(line.quantity);
            item.quantity = after;
            changes.push(FulfillmentChange {
                sku: line.sku.clone(),
                before,
                purchased: line.quantity,
                after,
            });
        }
        self.persist();
        Ok(changes)
    }

    /// Replace the store with the remote inventory.
    ///
    /// On failure the current items stay in place and the error is recorded
    /// in [`last_error`](Self::last_error) as well as returned.
    pub fn refresh(&mut self, api: &dyn InventoryApi) -> Result<usize> {
        match api.fetch_inventory() {
            Ok(rows) => {
                self.last_error = None;
                Ok(self.replace_all(rows))
            }
            Err(e) => {
                tracing::warn!(error = %e, kept = self.items.len(), "inventory refresh failed");
                self.last_error = Some(e.to_string());
                self.hydrated = true;
                Err(e)
            }
        }
    }

    /// Export the current items as CSV.
    pub fn export_csv(&self) -> Result<String> {
        csv_import::export_inventory_csv(&self.items)
    }
}
