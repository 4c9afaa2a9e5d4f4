use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_CONDITION, DEFAULT_CURRENCY};

fn default_condition() -> String {
    DEFAULT_CONDITION.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

// ---------------------------------------------------------------------------
// CollectionItem: A held card, keyed by (catalog_id, condition)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub catalog_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(default = "default_condition")]
    pub condition: String,
    pub quantity: u32,
    /// Per-card estimated market price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// When the item was last valued successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CollectionItem {
    pub fn value(&self) -> f64 {
        self.last_price.unwrap_or(0.0) * f64::from(self.quantity)
    }
}

// ---------------------------------------------------------------------------
// NewCollectionItem: Descriptive fields supplied when adding to a collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollectionItem {
    pub catalog_id: String,
    pub name: String,
    pub set_name: Option<String>,
    pub number: Option<String>,
    pub image_url: Option<String>,
    pub rarity: Option<String>,
    /// Defaults to `"NM"` when absent or blank.
    pub condition: Option<String>,
}

impl NewCollectionItem {
    pub fn new(catalog_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}
