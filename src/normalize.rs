//! Normalization from heterogeneous source rows to [`InventoryItem`].
//!
//! Every canonical field is resolved from an ordered list of candidate
//! column names (see [`config::field_table`]). Nothing here fails: malformed
//! numbers fall back to `None` for prices and `0` for quantity, missing text
//! falls back to an empty string (or `"Unknown"` for the name).

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use crate::config::{
    self, CONDITION_FIELDS, COST_PRICE_FIELDS, FOR_SALE_PRICE_FIELDS, ID_FIELDS,
    IMAGE_URL_FIELDS, MARKET_PRICE_FIELDS, NAME_FIELDS, NUMBER_FIELDS, PRICE_FIELDS,
    QUANTITY_FIELDS, RARITY_FIELDS, SET_FIELDS, SKU_FIELDS,
};
use crate::identity;
use crate::models::{InventoryItem, RawRow};

pub const UNKNOWN_NAME: &str = "Unknown";

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// A value counts as present unless it is null or a blank string.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// The first present value among `candidates`, in order.
pub fn first_present<'a>(row: &'a RawRow, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| row.get(*key))
        .find(|v| is_present(v))
}

/// The first present value among `candidates`, rendered as a string.
pub fn first_string(row: &RawRow, candidates: &[&str]) -> Option<String> {
    first_present(row, candidates).map(value_to_string)
}

/// Render a scalar JSON value the way it would appear in a CSV cell.
/// Whole floats print without a fractional part.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                    _ => n.to_string(),
                }
            }
        }
        other => other.to_string(),
    }
}

/// Parse a loosely formatted number such as `"$1,299.50"`.
///
/// Everything except digits, `.` and `-` is stripped before parsing. Returns
/// `None` for blank input or anything that does not parse to a finite value.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let text = match value {
        Value::Null => return None,
        Value::Number(n) => return n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Coerce a stock or order quantity. Unparseable input is `0`, negatives
/// clamp to `0` and fractions are floored.
pub fn coerce_quantity(value: Option<&Value>) -> u32 {
    match value.and_then(coerce_number) {
        Some(q) if q > 0.0 => q.floor().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Row normalization
// ---------------------------------------------------------------------------

/// Every canonical key and alias in the field table.
fn mapped_columns() -> &'static HashSet<&'static str> {
    static MAPPED: OnceLock<HashSet<&'static str>> = OnceLock::new();
    MAPPED.get_or_init(|| {
        config::field_table()
            .into_iter()
            .flat_map(|(target, candidates)| {
                std::iter::once(target).chain(candidates.iter().copied())
            })
            .collect()
    })
}

/// Collapse alias columns onto their canonical keys.
///
/// Only columns actually present on the row are emitted, so the result is a
/// partial record suitable for shallow-merging over an existing item. The
/// legacy `price` column is also the last sale-price alias, so a row carrying
/// only `price` updates `forSalePrice` too.
pub fn canonicalize(row: &RawRow) -> RawRow {
    let mapped = mapped_columns();
    let mut out = RawRow::new();
    for (target, candidates) in config::field_table() {
        if let Some(value) = first_present(row, candidates) {
            out.insert(target.to_string(), value.clone());
        }
    }
    for (key, value) in row {
        if !mapped.contains(key.as_str()) {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

/// Normalize one source row into a canonical [`InventoryItem`].
pub fn normalize(row: &RawRow) -> InventoryItem {
    let name = first_string(row, NAME_FIELDS).unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let set = first_string(row, SET_FIELDS).unwrap_or_default();
    let number = first_string(row, NUMBER_FIELDS).unwrap_or_default();

    let for_sale_price = first_present(row, FOR_SALE_PRICE_FIELDS).and_then(coerce_number);
    let market_price = first_present(row, MARKET_PRICE_FIELDS).and_then(coerce_number);
    let cost_price = first_present(row, COST_PRICE_FIELDS).and_then(coerce_number);
    let price = first_present(row, PRICE_FIELDS)
        .and_then(coerce_number)
        .or(for_sale_price);

    let explicit_id = first_string(row, ID_FIELDS);
    let explicit_sku = first_string(row, SKU_FIELDS);
    let (id, sku) = match (explicit_id, explicit_sku) {
        (Some(id), Some(sku)) => (id, sku),
        (id, sku) => {
            let computed = identity::compute_sku(row);
            (
                id.unwrap_or_else(|| computed.clone()),
                sku.unwrap_or(computed),
            )
        }
    };

    let mapped = mapped_columns();
    let extra: BTreeMap<String, Value> = row
        .iter()
        .filter(|(k, _)| !mapped.contains(k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    InventoryItem {
        id,
        sku,
        name,
        set,
        number,
        rarity: first_string(row, RARITY_FIELDS),
        condition: first_string(row, CONDITION_FIELDS),
        price,
        for_sale_price,
        market_price,
        cost_price,
        quantity: coerce_quantity(first_present(row, QUANTITY_FIELDS)),
        image_url: first_string(row, IMAGE_URL_FIELDS),
        extra,
    }
}

/// Normalize every row, preserving order.
pub fn normalize_all<'a, I>(rows: I) -> Vec<InventoryItem>
where
    I: IntoIterator<Item = &'a RawRow>,
{
    rows.into_iter().map(normalize).collect()
}
