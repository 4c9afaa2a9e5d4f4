//! Inventory store tests: replace, merge, fulfill, refresh and persistence.

mod common;

use common::{memory_store, row, sample_rows, FakeApi};
use rivals_sdk::models::{OrderLine, SkuLine};
use rivals_sdk::{InventoryStore, KeyValueStore, RivalsError};
use serde_json::json;

fn hydrated_store() -> InventoryStore {
    let mut store = InventoryStore::new(memory_store());
    store.hydrate();
    store
}

// ---------------------------------------------------------------------------
// replace_all
// ---------------------------------------------------------------------------

#[test]
fn replace_all_stores_normalized_rows() {
    let mut inv = hydrated_store();
    assert_eq!(inv.replace_all(sample_rows()), 3);
    assert!(inv.is_hydrated());
    assert_eq!(inv.get("inv-1").unwrap().name, "Charizard");
    assert_eq!(inv.get("Jungle|60|Pikachu").unwrap().quantity, 7);
}

#[test]
fn replace_all_is_idempotent() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    let first = inv.items().to_vec();
    inv.replace_all(sample_rows());
    assert_eq!(inv.items(), first.as_slice());
}

#[test]
fn replace_all_discards_previous_items() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    inv.replace_all(vec![row(json!({"id": "only", "name": "Only"}))]);
    assert_eq!(inv.len(), 1);
    assert!(inv.get("inv-1").is_none());
}

#[test]
fn replace_all_collapses_duplicate_ids_last_wins() {
    let mut inv = hydrated_store();
    let count = inv.replace_all(vec![
        row(json!({"id": "a", "name": "First", "quantity": 1})),
        row(json!({"id": "b", "name": "Other"})),
        row(json!({"id": "a", "name": "Second", "quantity": 5})),
    ]);
    assert_eq!(count, 2);
    assert_eq!(inv.items()[0].id, "a");
    assert_eq!(inv.items()[0].name, "Second");
    assert_eq!(inv.items()[0].quantity, 5);
}

#[test]
fn replace_with_empty_list_empties_the_store() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    assert_eq!(inv.replace_all(Vec::new()), 0);
    assert!(inv.is_empty());
}

// ---------------------------------------------------------------------------
// merge_upsert
// ---------------------------------------------------------------------------

#[test]
fn merge_preserves_fields_missing_from_the_row() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());

    let report = inv
        .merge_upsert(vec![row(json!({"id": "inv-1", "quantity": 9}))])
        .unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.added, 0);

    let charizard = inv.get("inv-1").unwrap();
    assert_eq!(charizard.quantity, 9);
    assert_eq!(charizard.name, "Charizard");
    assert_eq!(charizard.for_sale_price, Some(250.0));
    assert_eq!(charizard.market_price, Some(310.5));
    assert_eq!(charizard.extra.get("foil"), Some(&json!(false)));
}

#[test]
fn merge_adds_price_without_losing_rarity() {
    let mut inv = hydrated_store();
    inv.replace_all(vec![row(json!({"id": "a", "name": "Foo", "rarity": "Rare"}))]);
    inv.merge_upsert(vec![row(json!({"id": "a", "price": 5}))]).unwrap();

    let merged = inv.get("a").unwrap();
    assert_eq!(merged.name, "Foo");
    assert_eq!(merged.rarity.as_deref(), Some("Rare"));
    assert_eq!(merged.price, Some(5.0));
}

#[test]
fn merged_legacy_price_also_sets_the_sale_price() {
    let mut inv = hydrated_store();
    inv.replace_all(vec![row(json!({"id": "a", "forSalePrice": 10}))]);
    inv.merge_upsert(vec![row(json!({"id": "a", "price": 5}))])
        .unwrap();

    let merged = inv.get("a").unwrap();
    assert_eq!(merged.price, Some(5.0));
    assert_eq!(merged.for_sale_price, Some(5.0));
    assert_eq!(merged.current_price(), Some(5.0));
}

#[test]
fn merge_overwrites_fields_present_on_the_row() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    inv.merge_upsert(vec![row(json!({"id": "inv-1", "forSalePrice": "199.99"}))])
        .unwrap();
    assert_eq!(inv.get("inv-1").unwrap().for_sale_price, Some(199.99));
}

#[test]
fn merge_appends_unknown_ids_and_keeps_order() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    let report = inv
        .merge_upsert(vec![row(json!({"id": "new-1", "name": "Mew"}))])
        .unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(inv.len(), 4);
    assert_eq!(inv.items()[0].id, "inv-1");
    assert_eq!(inv.items()[3].id, "new-1");
}

#[test]
fn merge_of_an_empty_batch_changes_nothing() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    let before = inv.items().to_vec();
    let report = inv.merge_upsert(Vec::new()).unwrap();
    assert_eq!(report, Default::default());
    assert_eq!(inv.items(), before.as_slice());
}

#[test]
fn merge_counts_collisions_within_a_batch() {
    let mut inv = hydrated_store();
    let report = inv
        .merge_upsert(vec![
            row(json!({"id": "a", "quantity": 1})),
            row(json!({"id": "a", "quantity": 3})),
        ])
        .unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.collisions, 1);
    assert_eq!(inv.get("a").unwrap().quantity, 3);
}

// ---------------------------------------------------------------------------
// fulfill
// ---------------------------------------------------------------------------

#[test]
fn fulfill_decrements_matching_items() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    let changed = inv.fulfill(&[OrderLine::new("Jungle|60|Pikachu", 3)]).unwrap();
    assert_eq!(changed, 1);
    assert_eq!(inv.get("Jungle|60|Pikachu").unwrap().quantity, 4);
    assert_eq!(inv.get("inv-1").unwrap().quantity, 2);
}

#[test]
fn fulfill_floors_at_zero() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    inv.fulfill(&[OrderLine::new("inv-1", 50)]).unwrap();
    assert_eq!(inv.get("inv-1").unwrap().quantity, 0);
}

#[test]
fn fulfill_ignores_unknown_ids() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    let before = inv.items().to_vec();
    assert_eq!(inv.fulfill(&[OrderLine::new("ghost", 1)]).unwrap(), 0);
    assert_eq!(inv.items(), before.as_slice());
}

#[test]
fn fulfill_uses_first_line_per_item() {
    let mut inv = hydrated_store();
    inv.replace_all(vec![row(json!({"id": "a", "quantity": 10}))]);
    inv.fulfill(&[OrderLine::new("a", 2), OrderLine::new("a", 5)]).unwrap();
    assert_eq!(inv.get("a").unwrap().quantity, 8);
}

#[test]
fn fulfill_by_sku_reports_changes() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    let changes = inv.fulfill_by_sku(&[
        SkuLine {
            sku: "SKU-BLASTOISE".into(),
            quantity: 3,
        },
        SkuLine {
            sku: "missing".into(),
            quantity: 1,
        },
    ])
    .unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].before, 1);
    assert_eq!(changes[0].purchased, 3);
    assert_eq!(changes[0].after, 0);
}

#[test]
fn fulfill_order_applies_each_order_once() {
    let store = memory_store();
    let mut inv = InventoryStore::new(store.clone());
    inv.replace_all(sample_rows());

    let lines = [OrderLine::new("inv-1", 1)];
    assert_eq!(inv.fulfill_order("ord-1", &lines).unwrap(), Some(1));
    assert_eq!(inv.fulfill_order("ord-1", &lines).unwrap(), None);
    assert_eq!(inv.get("inv-1").unwrap().quantity, 1);

    let mut reloaded = InventoryStore::new(store);
    reloaded.hydrate();
    assert!(reloaded.has_applied("ord-1"));
    assert_eq!(reloaded.fulfill_order("ord-1", &lines).unwrap(), None);
    assert_eq!(reloaded.get("inv-1").unwrap().quantity, 1);

    reloaded.forget_order("ord-1");
    assert!(!reloaded.has_applied("ord-1"));
}

#[test]
fn mutations_before_hydration_are_refused() {
    let store = memory_store();
    InventoryStore::new(store.clone()).replace_all(sample_rows());

    let mut cold = InventoryStore::new(store.clone());
    assert!(matches!(
        cold.fulfill(&[OrderLine::new("inv-1", 1)]),
        Err(RivalsError::NotHydrated("inventory"))
    ));
    assert!(matches!(
        cold.fulfill_order("ord-1", &[OrderLine::new("inv-1", 1)]),
        Err(RivalsError::NotHydrated("inventory"))
    ));
    assert!(matches!(
        cold.merge_upsert(vec![row(json!({"id": "inv-1", "quantity": 9}))]),
        Err(RivalsError::NotHydrated("inventory"))
    ));
    assert!(matches!(
        cold.fulfill_by_sku(&[SkuLine {
            sku: "SKU-BLASTOISE".into(),
            quantity: 1,
        }]),
        Err(RivalsError::NotHydrated("inventory"))
    ));

    let mut reloaded = InventoryStore::new(store);
    reloaded.hydrate();
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded.get("inv-1").unwrap().quantity, 2);
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

#[test]
fn refresh_replaces_with_remote_rows() {
    let api = FakeApi::with_rows(sample_rows());
    let mut inv = InventoryStore::new(memory_store());
    assert_eq!(inv.refresh(&*api).unwrap(), 3);
    assert!(inv.is_hydrated());
    assert!(inv.last_error().is_none());
}

#[test]
fn failed_refresh_keeps_cached_items() {
    let api = FakeApi::with_rows(sample_rows());
    let mut inv = hydrated_store();
    inv.refresh(&*api).unwrap();
    let before = inv.items().to_vec();

    api.set_failing(true);
    let err = inv.refresh(&*api).unwrap_err();
    assert!(matches!(err, RivalsError::Remote { status: 503, .. }));
    assert_eq!(inv.items(), before.as_slice());
    assert!(inv.last_error().unwrap().contains("backend unavailable"));

    api.set_failing(false);
    inv.refresh(&*api).unwrap();
    assert!(inv.last_error().is_none());
}

#[test]
fn failed_first_refresh_still_marks_hydrated() {
    let api = FakeApi::with_rows(Vec::new());
    api.set_failing(true);
    let mut inv = InventoryStore::new(memory_store());
    assert!(inv.refresh(&*api).is_err());
    assert!(inv.is_hydrated());
    assert!(inv.is_empty());
}

// ---------------------------------------------------------------------------
// persistence and queries
// ---------------------------------------------------------------------------

#[test]
fn snapshot_survives_a_new_store() {
    let store = memory_store();
    let mut inv = InventoryStore::new(store.clone());
    inv.replace_all(sample_rows());
    inv.fulfill(&[OrderLine::new("inv-1", 1)]).unwrap();

    let mut reloaded = InventoryStore::new(store);
    reloaded.hydrate();
    assert_eq!(reloaded.items(), inv.items());
}

#[test]
fn corrupt_snapshot_hydrates_empty() {
    let store = memory_store();
    store.set("rivals.inventory.v1", "{not json").unwrap();
    let mut inv = InventoryStore::new(store.clone());
    inv.hydrate();
    assert!(inv.is_empty());
    assert!(store.get("rivals.inventory.v1").unwrap().is_none());
}

#[test]
fn bare_item_array_snapshot_still_loads() {
    let store = memory_store();
    store
        .set(
            "rivals.inventory.v1",
            r#"[{"id":"a","name":"Mew","quantity":3}]"#,
        )
        .unwrap();
    let mut inv = InventoryStore::new(store);
    inv.hydrate();
    assert_eq!(inv.get("a").unwrap().quantity, 3);
    assert!(!inv.has_applied("a"));
}

#[test]
fn search_is_case_insensitive() {
    let mut inv = hydrated_store();
    inv.replace_all(sample_rows());
    assert_eq!(inv.search("pika").len(), 1);
    assert_eq!(inv.search("BASE").len(), 2);
    assert_eq!(inv.search("  ").len(), 3);
}

#[test]
fn export_csv_uses_standard_headers() {
    let mut inv = hydrated_store();
    inv.replace_all(vec![row(json!({"id": "a", "name": "Eevee, Promo", "price": 3, "quantity": 2}))]);
    let csv = inv.export_csv().unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,sku,name,set,number,rarity,condition,price,quantity,imageUrl"
    );
    assert_eq!(lines.next().unwrap(), "a,\"Eevee, Promo\",\"Eevee, Promo\",,,,,3,2,");
}
