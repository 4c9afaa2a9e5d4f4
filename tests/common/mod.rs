//! Shared fixtures for the Rivals SDK integration tests.
//!
//! Provides sample inventory rows, a scriptable in-process [`FakeApi`] and
//! helpers for building services over a [`MemoryStore`] or a temporary
//! directory.

#![allow(dead_code)]

use rivals_sdk::remote::{
    CompleteOrderRequest, CompleteOrderResponse, ReplaceResponse, UpsertResponse,
};
use rivals_sdk::{
    InventoryApi, InventoryItem, KeyValueStore, MemoryStore, RawRow, Result, RivalsError,
    RivalsSdk,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Turn a `json!` object literal into a raw row.
pub fn row(value: Value) -> RawRow {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Three rows in the shapes the backend and spreadsheets actually send.
pub fn sample_rows() -> Vec<RawRow> {
    vec![
        row(json!({
            "id": "inv-1",
            "name": "Charizard",
            "set": "Base",
            "number": "4",
            "forSalePrice": 250.0,
            "marketPrice": 310.5,
            "quantity": 2,
            "imageUrl": "https://img.example/charizard.png",
            "foil": false
        })),
        row(json!({
            "cardName": "Pikachu",
            "Set": "Jungle",
            "No": "60",
            "sale_price": "$1.50",
            "quantity": "7",
            "Rarity": "Common"
        })),
        row(json!({
            "sku": "SKU-BLASTOISE",
            "title": "Blastoise",
            "series": "Base",
            "num": 2,
            "tcg_market": 120,
            "cost": 80,
            "quantity": 1,
            "Condition": "LP"
        })),
    ]
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

pub fn item(id: &str, name: &str, price: f64, quantity: u32) -> InventoryItem {
    rivals_sdk::normalize::normalize(&row(json!({
        "id": id,
        "name": name,
        "forSalePrice": price,
        "quantity": quantity
    })))
}

// ---------------------------------------------------------------------------
// FakeApi
// ---------------------------------------------------------------------------

/// In-process backend that records every call.
#[derive(Default)]
pub struct FakeApi {
    pub rows: Mutex<Vec<RawRow>>,
    pub fail_fetch: AtomicBool,
    pub fail_complete: AtomicBool,
    pub replaced: Mutex<Vec<Vec<InventoryItem>>>,
    pub upserted: Mutex<Vec<Vec<InventoryItem>>>,
    pub completed: Mutex<Vec<CompleteOrderRequest>>,
}

impl FakeApi {
    pub fn with_rows(rows: Vec<RawRow>) -> Arc<Self> {
        let api = Self::default();
        *api.rows.lock().unwrap() = rows;
        Arc::new(api)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_fetch.store(failing, Ordering::SeqCst);
    }
}

impl InventoryApi for FakeApi {
    fn fetch_inventory(&self) -> Result<Vec<RawRow>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RivalsError::Remote {
                status: 503,
                message: "backend unavailable".into(),
            });
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    fn replace(&self, items: &[InventoryItem]) -> Result<ReplaceResponse> {
        self.replaced.lock().unwrap().push(items.to_vec());
        *self.rows.lock().unwrap() = items.iter().map(InventoryItem::to_raw).collect();
        Ok(ReplaceResponse {
            ok: true,
            replaced: items.len(),
        })
    }

    fn bulk_upsert(&self, items: &[InventoryItem]) -> Result<UpsertResponse> {
        self.upserted.lock().unwrap().push(items.to_vec());
        let mut rows = self.rows.lock().unwrap();
        let (mut added, mut updated) = (0, 0);
        for item in items {
            let raw = item.to_raw();
            match rows.iter_mut().find(|r| r.get("sku") == raw.get("sku")) {
                Some(existing) => {
                    *existing = raw;
                    updated += 1;
                }
                None => {
                    rows.push(raw);
                    added += 1;
                }
            }
        }
        Ok(UpsertResponse {
            ok: true,
            added,
            updated,
            total: rows.len(),
        })
    }

    fn complete_order(&self, request: &CompleteOrderRequest) -> Result<CompleteOrderResponse> {
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(RivalsError::Remote {
                status: 500,
                message: "order endpoint down".into(),
            });
        }
        self.completed.lock().unwrap().push(request.clone());
        Ok(CompleteOrderResponse {
            ok: true,
            lines: Vec::new(),
            order_id: request.order_id.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// SDK fixtures
// ---------------------------------------------------------------------------

/// An in-memory SDK backed by `api`, with order mirroring on.
pub fn sdk_with_api(api: Arc<FakeApi>) -> RivalsSdk {
    RivalsSdk::builder()
        .in_memory()
        .api(api)
        .mirror_orders(true)
        .build()
        .unwrap()
}

/// An SDK persisting under `dir`.
pub fn sdk_in_dir(dir: &std::path::Path, api: Arc<FakeApi>) -> RivalsSdk {
    RivalsSdk::builder()
        .storage_dir(dir)
        .api(api)
        .build()
        .unwrap()
}
