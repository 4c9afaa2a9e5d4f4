//! Favorites and order history tests.

mod common;

use chrono::{TimeZone, Utc};
use common::memory_store;
use rivals_sdk::{Favorites, Order, OrderHistory, OrderItem, RivalsError};

fn order(id: &str) -> Order {
    Order {
        id: id.into(),
        user_email: "buyer@example.com".into(),
        total: 5.5,
        items: vec![
            OrderItem {
                id: "a".into(),
                name: "Pikachu, Promo".into(),
                price: 1.5,
                qty: 1,
                image_url: None,
            },
            OrderItem {
                id: "b".into(),
                name: "Eevee".into(),
                price: 2.0,
                qty: 2,
                image_url: None,
            },
        ],
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// favorites
// ---------------------------------------------------------------------------

#[test]
fn toggle_flips_membership() {
    let mut favs = Favorites::new(memory_store(), None);
    favs.hydrate();
    assert_eq!(favs.user_id(), "guest");
    assert!(favs.toggle("card-1").unwrap());
    assert!(favs.is_favorite("card-1"));
    assert!(!favs.toggle("card-1").unwrap());
    assert!(!favs.is_favorite("card-1"));
}

#[test]
fn favorites_are_kept_per_user() {
    let store = memory_store();
    let mut favs = Favorites::new(store.clone(), Some("ash"));
    favs.hydrate();
    favs.add("card-1").unwrap();
    favs.add("card-2").unwrap();

    favs.switch_user(Some("misty"));
    assert!(favs.ids().is_empty());
    favs.add("card-9").unwrap();

    let mut ash = Favorites::new(store, Some("ash"));
    ash.hydrate();
    assert_eq!(ash.ids().len(), 2);
    assert!(!ash.is_favorite("card-9"));

    ash.remove("card-1").unwrap();
    ash.clear().unwrap();
    assert!(ash.ids().is_empty());
}

#[test]
fn favorites_need_hydration() {
    let mut favs = Favorites::new(memory_store(), None);
    assert!(matches!(
        favs.add("x"),
        Err(RivalsError::NotHydrated("favorites"))
    ));
}

// ---------------------------------------------------------------------------
// order history
// ---------------------------------------------------------------------------

#[test]
fn newest_order_comes_first() {
    let mut history = OrderHistory::new(memory_store());
    history.hydrate();
    history.add(order("ord-1")).unwrap();
    history.add(order("ord-2")).unwrap();
    assert_eq!(history.orders()[0].id, "ord-2");
    assert!(history.get("ord-1").is_some());

    history.remove("ord-2").unwrap();
    assert_eq!(history.orders().len(), 1);
    history.clear_all().unwrap();
    assert!(history.orders().is_empty());
}

#[test]
fn history_persists() {
    let store = memory_store();
    let mut history = OrderHistory::new(store.clone());
    history.hydrate();
    history.add(order("ord-1")).unwrap();

    let mut reloaded = OrderHistory::new(store);
    reloaded.hydrate();
    assert_eq!(reloaded.orders(), history.orders());
}

#[test]
fn export_writes_one_row_per_line_item() {
    let mut history = OrderHistory::new(memory_store());
    history.hydrate();
    history.add(order("ord-1")).unwrap();

    let csv = history.export_csv().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "order_id,created_at,user_email,item_id,item_name,qty,price,line_total,order_total"
    );
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "ord-1,2024-05-01T12:00:00+00:00,buyer@example.com,a,\"Pikachu, Promo\",1,1.5,1.5,5.5"
    );
    assert_eq!(
        lines[2],
        "ord-1,2024-05-01T12:00:00+00:00,buyer@example.com,b,Eevee,2,2,4,5.5"
    );
}
