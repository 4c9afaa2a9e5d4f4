use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// An untyped source row: a remote JSON object or a parsed CSV record.
pub type RawRow = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// InventoryItem: Canonical, normalized inventory record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub set: String,
    #[serde(default)]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Legacy single price, kept in step with `for_sale_price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_sale_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<f64>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Source columns with no canonical field, carried verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl InventoryItem {
    /// The price a buyer pays: for-sale, then legacy, then market, then cost.
    pub fn current_price(&self) -> Option<f64> {
        self.for_sale_price
            .or(self.price)
            .or(self.market_price)
            .or(self.cost_price)
    }

    /// True if any of the four price fields is set.
    pub fn has_price(&self) -> bool {
        self.current_price().is_some()
    }

    /// Serialize back into an open row, canonical keys plus extras.
    pub fn to_raw(&self) -> RawRow {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RawRow::new(),
        }
    }

    /// Case-insensitive substring match over name, set, number and sku.
    /// A blank needle matches everything.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.name, &self.set, &self.number, &self.sku]
            .iter()
            .filter(|v| !v.is_empty())
            .any(|v| v.to_lowercase().contains(&needle))
    }
}
