//! Identity resolution for inventory rows that arrive without an explicit key.
//!
//! The composite `set|number|name` key is not globally unique: two physical
//! cards sharing all three components collapse onto one key.

use rand::Rng;

use crate::config::{ID_FIELDS, NAME_FIELDS, NUMBER_FIELDS, SET_FIELDS, SKU_FIELDS};
use crate::models::RawRow;
use crate::normalize::first_string;

/// Join the non-empty components with `"|"`. Returns `None` when all three
/// are blank.
pub fn composite_key(set: &str, number: &str, name: &str) -> Option<String> {
    let parts: Vec<&str> = [set, number, name]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("|"))
    }
}

/// Compute the sku for a raw row.
///
/// Uses the composite key when any of set, number or name is present,
/// then an explicit `sku`, then an explicit `id`, then a random token.
pub fn compute_sku(row: &RawRow) -> String {
    let set = first_string(row, SET_FIELDS).unwrap_or_default();
    let number = first_string(row, NUMBER_FIELDS).unwrap_or_default();
    let name = first_string(row, NAME_FIELDS).unwrap_or_default();

    composite_key(&set, &number, &name)
        .or_else(|| first_string(row, SKU_FIELDS))
        .or_else(|| first_string(row, ID_FIELDS))
        .unwrap_or_else(random_token)
}

/// A throwaway key for rows with nothing to identify them by.
pub fn random_token() -> String {
    let n: u64 = rand::thread_rng().gen();
    format!("tmp-{n:016x}")
}

/// A fresh order id: millisecond timestamp plus a random suffix.
pub fn new_order_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x0100_0000);
    format!(
        "ord-{}-{suffix:06x}",
        chrono::Utc::now().timestamp_millis()
    )
}
