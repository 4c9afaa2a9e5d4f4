//! Collection aggregator tests, including market-price valuation.

mod common;

use common::memory_store;
use rivals_sdk::{
    Collection, KeyValueStore, MarketQuote, NewCollectionItem, Result, RivalsError,
};

fn collection() -> Collection {
    let mut c = Collection::new(memory_store());
    c.hydrate();
    c
}

fn fixed_price(_: &str, _: &str) -> Result<MarketQuote> {
    Ok(MarketQuote::new(12.5, "USD"))
}

fn offline_prices(_: &str, _: &str) -> Result<MarketQuote> {
    Err(RivalsError::Remote {
        status: 502,
        message: "price service down".into(),
    })
}

/// Prices everything except `"bad"`.
fn picky_prices(catalog_id: &str, condition: &str) -> Result<MarketQuote> {
    match (catalog_id, condition) {
        ("bad", _) => offline_prices(catalog_id, condition),
        (_, "NM") => Ok(MarketQuote::new(20.0, "EUR")),
        _ => Ok(MarketQuote::new(8.0, "EUR")),
    }
}

#[test]
fn add_values_new_items_and_defaults_condition() {
    let mut c = collection();
    c.add_or_increment(NewCollectionItem::new("c-1", "Charizard"), 2, &fixed_price)
        .unwrap();
    let entry = c.get("c-1", None).unwrap();
    assert_eq!(entry.condition, "NM");
    assert_eq!(entry.quantity, 2);
    assert_eq!(entry.last_price, Some(12.5));
    assert!(entry.updated_at.is_some());
    assert_eq!(c.total_value(), 25.0);
}

#[test]
fn same_card_in_another_condition_is_a_separate_row() {
    let mut c = collection();
    c.add_or_increment(NewCollectionItem::new("c-1", "Charizard"), 1, &picky_prices)
        .unwrap();
    c.add_or_increment(
        NewCollectionItem::new("c-1", "Charizard").with_condition("LP"),
        1,
        &picky_prices,
    )
    .unwrap();
    assert_eq!(c.len(), 2);
    assert_eq!(c.get("c-1", Some("NM")).unwrap().last_price, Some(20.0));
    assert_eq!(c.get("c-1", Some("LP")).unwrap().last_price, Some(8.0));
    assert_eq!(c.currency(), "EUR");
}

#[test]
fn adding_an_existing_key_increments() {
    let mut c = collection();
    c.add_or_increment(NewCollectionItem::new("c-1", "Charizard"), 1, &fixed_price)
        .unwrap();
    c.add_or_increment(NewCollectionItem::new("c-1", "Charizard"), 3, &fixed_price)
        .unwrap();
    assert_eq!(c.len(), 1);
    assert_eq!(c.get("c-1", Some(" ")).unwrap().quantity, 4);
}

#[test]
fn failed_price_lookup_does_not_block_add() {
    let mut c = collection();
    c.add_or_increment(NewCollectionItem::new("c-1", "Charizard"), 1, &offline_prices)
        .unwrap();
    let entry = c.get("c-1", None).unwrap();
    assert_eq!(entry.last_price, None);
    assert_eq!(entry.quantity, 1);
    assert_eq!(c.total_value(), 0.0);
}

#[test]
fn refresh_tolerates_per_item_failures() {
    let mut c = collection();
    c.add_or_increment(NewCollectionItem::new("good", "Good"), 2, &fixed_price)
        .unwrap();
    c.add_or_increment(NewCollectionItem::new("bad", "Bad"), 1, &fixed_price)
        .unwrap();

    let report = c.refresh_valuations(&picky_prices).unwrap();
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(c.get("good", None).unwrap().last_price, Some(20.0));
    // The failed row keeps its previous valuation.
    assert_eq!(c.get("bad", None).unwrap().last_price, Some(12.5));
    assert_eq!(c.total_value(), 52.5);
}

#[test]
fn set_quantity_clamps_and_remove_drops_the_row() {
    let mut c = collection();
    c.add_or_increment(NewCollectionItem::new("c-1", "Charizard"), 5, &fixed_price)
        .unwrap();
    c.set_quantity("c-1", None, 0).unwrap();
    assert_eq!(c.get("c-1", None).unwrap().quantity, 1);
    c.remove_item("c-1", Some("NM")).unwrap();
    assert!(c.is_empty());
}

#[test]
fn clear_all_removes_the_stored_document() {
    let store = memory_store();
    let mut c = Collection::new(store.clone());
    c.hydrate();
    c.add_or_increment(NewCollectionItem::new("c-1", "Charizard"), 1, &fixed_price)
        .unwrap();
    assert!(store.get("rivals.collection.v1").unwrap().is_some());

    c.clear_all().unwrap();
    assert!(c.is_empty());
    assert!(store.get("rivals.collection.v1").unwrap().is_none());
}

#[test]
fn collection_reloads_from_storage() {
    let store = memory_store();
    let mut c = Collection::new(store.clone());
    c.hydrate();
    c.add_or_increment(NewCollectionItem::new("c-1", "Charizard"), 2, &picky_prices)
        .unwrap();

    let mut reloaded = Collection::new(store);
    reloaded.hydrate();
    assert_eq!(reloaded.items(), c.items());
    assert_eq!(reloaded.currency(), "EUR");
}

#[test]
fn mutations_before_hydration_are_rejected() {
    let mut c = Collection::new(memory_store());
    let err = c
        .add_or_increment(NewCollectionItem::new("c-1", "x"), 1, &fixed_price)
        .unwrap_err();
    assert!(matches!(err, RivalsError::NotHydrated("collection")));
}
