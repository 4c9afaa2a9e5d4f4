use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::normalize::coerce_quantity;

/// Accepts any JSON value; anything that is not a finite, non-negative
/// number (or numeric string) becomes zero.
fn lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_quantity(Some(&value)))
}

// ---------------------------------------------------------------------------
// OrderLine: One purchased (id, quantity) pair, consumed by fulfillment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(id: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// SkuLine: Order line keyed by sku, as sent to the remote order endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuLine {
    pub sku: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// FulfillmentChange: Per-line stock movement report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentChange {
    pub sku: String,
    pub before: u32,
    pub purchased: u32,
    pub after: u32,
}

// ---------------------------------------------------------------------------
// Order: A completed purchase, kept in order history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.qty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub user_email: String,
    pub total: f64,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Purchase lines for inventory fulfillment.
    pub fn lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|i| OrderLine::new(i.id.clone(), i.qty))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// OrderJournal: Write-ahead record of an order being completed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JournalStage {
    /// Recorded. The inventory snapshot may or may not show the order as
    /// applied yet.
    Pending,
    /// Inventory decremented; cart, history and processed set not yet updated.
    InventoryApplied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderJournal {
    pub order: Order,
    pub stage: JournalStage,
}
