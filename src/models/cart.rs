use serde::{Deserialize, Serialize};

use super::inventory::InventoryItem;

// ---------------------------------------------------------------------------
// CartItem: One cart line, a snapshot of the item at add time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Inventory id this line refers to. Not enforced; orphans are tolerated.
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl CartItem {
    /// `price × quantity`, with a missing price counted as zero.
    pub fn line_total(&self) -> f64 {
        self.price.unwrap_or(0.0) * f64::from(self.quantity)
    }

    /// Display name, falling back to the id for orphaned lines.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

impl From<&InventoryItem> for CartItem {
    fn from(item: &InventoryItem) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            quantity: 1,
            price: item.current_price(),
            image_url: item.image_url.clone(),
            sku: non_empty(&item.sku),
            set: non_empty(&item.set),
            number: non_empty(&item.number),
        }
    }
}
