use std::path::PathBuf;
use std::time::Duration;

pub const CART_KEY: &str = "rivals.cart.v1";
pub const COLLECTION_KEY: &str = "rivals.collection.v1";
pub const ORDERS_KEY: &str = "rivals.orders.v1";
pub const INVENTORY_KEY: &str = "rivals.inventory.v1";
pub const PROCESSED_ORDERS_KEY: &str = "rivals.orders.processed.v1";
pub const ORDER_JOURNAL_KEY: &str = "rivals.orders.journal.v1";

pub const DEFAULT_CONDITION: &str = "NM";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const GUEST_USER: &str = "guest";

/// Remote calls are abandoned after this long and the caller falls back to
/// whatever data it already holds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Storage key for the favorites document of one user.
pub fn favorites_key(user_id: &str) -> String {
    let user = if user_id.is_empty() { GUEST_USER } else { user_id };
    format!("favorites:{user}")
}

// ---------------------------------------------------------------------------
// Field mapping table
// ---------------------------------------------------------------------------

// Candidate column names per canonical field, in precedence order.
pub const ID_FIELDS: &[&str] = &["id"];
pub const SKU_FIELDS: &[&str] = &["sku"];
pub const NAME_FIELDS: &[&str] = &["name", "cardName", "title"];
pub const SET_FIELDS: &[&str] = &["set", "Set", "series"];
pub const NUMBER_FIELDS: &[&str] = &["number", "No", "num"];
pub const RARITY_FIELDS: &[&str] = &["rarity", "Rarity"];
pub const CONDITION_FIELDS: &[&str] = &["condition", "Condition"];
pub const PRICE_FIELDS: &[&str] = &["price"];
pub const FOR_SALE_PRICE_FIELDS: &[&str] = &[
    "forSalePrice",
    "sale_price",
    "salePrice",
    "listPrice",
    "list_price",
    "price",
];
pub const MARKET_PRICE_FIELDS: &[&str] = &[
    "market",
    "marketPrice",
    "tcg_market",
    "tcgMarket",
    "tcgplayerMarketPrice",
    "tcg_low",
    "lowPrice",
];
pub const COST_PRICE_FIELDS: &[&str] = &["cost", "costPrice", "wholesale", "buy_price", "purchasePrice"];
pub const QUANTITY_FIELDS: &[&str] = &["quantity"];
pub const IMAGE_URL_FIELDS: &[&str] = &[
    "imageUrl",
    "image_url",
    "image",
    "imgUrl",
    "img_url",
    "img",
    "Image URL",
    "Image",
    "imageLink",
];

/// Every canonical field with its candidate columns.
///
/// Columns listed here are consumed by normalization; anything else on a
/// source row is carried through untouched.
pub fn field_table() -> Vec<(&'static str, &'static [&'static str])> {
    vec![
        ("id", ID_FIELDS),
        ("sku", SKU_FIELDS),
        ("name", NAME_FIELDS),
        ("set", SET_FIELDS),
        ("number", NUMBER_FIELDS),
        ("rarity", RARITY_FIELDS),
        ("condition", CONDITION_FIELDS),
        ("price", PRICE_FIELDS),
        ("forSalePrice", FOR_SALE_PRICE_FIELDS),
        ("marketPrice", MARKET_PRICE_FIELDS),
        ("costPrice", COST_PRICE_FIELDS),
        ("quantity", QUANTITY_FIELDS),
        ("imageUrl", IMAGE_URL_FIELDS),
    ]
}

/// Column order used when exporting inventory to CSV.
pub const INVENTORY_EXPORT_HEADERS: &[&str] = &[
    "id",
    "sku",
    "name",
    "set",
    "number",
    "rarity",
    "condition",
    "price",
    "quantity",
    "imageUrl",
];

pub const ORDER_EXPORT_HEADERS: &[&str] = &[
    "order_id",
    "created_at",
    "user_email",
    "item_id",
    "item_name",
    "qty",
    "price",
    "line_total",
    "order_total",
];

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// URLs and credentials for the remote inventory and admin collaborators.
///
/// Every entry is optional; operations that need a missing entry fail with
/// [`RivalsError::NotConfigured`](crate::error::RivalsError::NotConfigured).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub inventory_url: Option<String>,
    pub replace_url: Option<String>,
    pub bulk_upsert_url: Option<String>,
    pub orders_complete_url: Option<String>,
    pub admin_token: Option<String>,
}

impl Endpoints {
    /// Load endpoints from the environment, reading a `.env` file first if
    /// one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build endpoints from an arbitrary lookup, so tests never touch the
    /// process environment. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            inventory_url: get("RIVALS_INVENTORY_URL"),
            replace_url: get("RIVALS_ADMIN_REPLACE_URL"),
            bulk_upsert_url: get("RIVALS_ADMIN_BULK_UPSERT_URL"),
            orders_complete_url: get("RIVALS_ORDERS_COMPLETE_URL"),
            admin_token: get("RIVALS_ADMIN_TOKEN"),
        }
    }
}

pub fn default_storage_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("rivals-sdk")
    } else {
        PathBuf::from(".rivals-sdk-data")
    }
}
