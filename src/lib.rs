//! Rivals SDK for Rust.
//!
//! Client-side core of a trading-card marketplace: normalizes loosely
//! structured inventory rows from spreadsheets and remote APIs, keeps a local
//! inventory mirror, and runs the shopping cart, personal collection,
//! favorites, order history and seller publishing workflows on top of a small
//! key/value store.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use rivals_sdk::{PriceTransform, PublishMode, RivalsSdk};
//!
//! # fn main() -> rivals_sdk::Result<()> {
//! let mut sdk = RivalsSdk::builder().endpoints_from_env().build()?;
//!
//! // Pull the latest stock; on failure the cached copy stays usable.
//! let _ = sdk.refresh_inventory();
//!
//! // Put the first item in the cart and check out.
//! if let Some(item) = sdk.inventory().items().first().cloned() {
//!     sdk.cart_mut().add(&item, 2)?;
//!     sdk.place_order("buyer@example.com")?;
//! }
//!
//! // Seller side: import a spreadsheet with a 10% markup and publish it.
//! let mut import = sdk.import_csv_file(Path::new("stock.csv"), PriceTransform::new(1.1, true))?;
//! import.set_dry_run(false);
//! sdk.publish(&import, PublishMode::BulkUpsert, true)?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod csv_import;
pub mod error;
pub mod identity;
pub mod models;
pub mod normalize;
pub mod pricing;
pub mod remote;
pub mod services;
pub mod storage;
pub mod transform;

#[cfg(feature = "async")]
pub use async_client::AsyncRivalsSdk;
pub use config::Endpoints;
pub use error::{Result, RivalsError};
pub use models::{
    CartItem, CollectionItem, InventoryItem, NewCollectionItem, Order, OrderItem, OrderLine,
    RawRow,
};
pub use pricing::{MarketQuote, PriceSource};
pub use remote::{HttpInventoryApi, InventoryApi};
pub use services::{
    Cart, Checkout, Collection, CompletionOutcome, CsvImport, Favorites, InventoryStore,
    OrderHistory, PublishMode, PublishReceipt,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transform::PriceTransform;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// RivalsSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`RivalsSdk`] instance.
///
/// Use [`RivalsSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](RivalsSdkBuilder::build) to create the SDK.
pub struct RivalsSdkBuilder {
    storage_dir: Option<PathBuf>,
    in_memory: bool,
    offline: bool,
    timeout: Duration,
    endpoints: Endpoints,
    user_id: Option<String>,
    mirror_orders: Option<bool>,
    store: Option<Arc<dyn KeyValueStore>>,
    api: Option<Arc<dyn InventoryApi>>,
}

impl Default for RivalsSdkBuilder {
    fn default() -> Self {
        Self {
            storage_dir: None,
            in_memory: false,
            offline: false,
            timeout: config::DEFAULT_TIMEOUT,
            endpoints: Endpoints::default(),
            user_id: None,
            mirror_orders: None,
            store: None,
            api: None,
        }
    }
}

impl RivalsSdkBuilder {
    /// Set a custom storage directory.
    ///
    /// If not set, the platform data directory is used (e.g.
    /// `~/.local/share/rivals-sdk` on Linux).
    pub fn storage_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep all state in memory; nothing survives the SDK instance.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Use a caller-provided store. Takes precedence over the storage options.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, the SDK makes no network calls: refreshes keep the
    /// cached inventory and publishing is refused. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout. Defaults to 8 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Read endpoints from the environment (and a `.env` file, if present).
    pub fn endpoints_from_env(mut self) -> Self {
        self.endpoints = Endpoints::from_env();
        self
    }

    pub fn admin_token(mut self, token: impl Into<String>) -> Self {
        self.endpoints.admin_token = Some(token.into());
        self
    }

    /// Signed-in user whose favorites are loaded. Defaults to the guest user.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Use a custom inventory backend instead of the HTTP client.
    pub fn api(mut self, api: Arc<dyn InventoryApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Report completed orders to the backend.
    ///
    /// Defaults to on when an order-completion URL is configured.
    pub fn mirror_orders(mut self, mirror: bool) -> Self {
        self.mirror_orders = Some(mirror);
        self
    }

    /// Build the SDK, opening storage and hydrating every service from it.
    ///
    /// An order completion interrupted by a previous process is finished
    /// here. No network request is made.
    pub fn build(self) -> Result<RivalsSdk> {
        let store: Arc<dyn KeyValueStore> = match self.store {
            Some(store) => store,
            None if self.in_memory => Arc::new(MemoryStore::new()),
            None => Arc::new(FileStore::new(self.storage_dir)?),
        };

        let api: Option<Arc<dyn InventoryApi>> = match self.api {
            Some(api) => Some(api),
            None if self.offline => None,
            None => Some(Arc::new(HttpInventoryApi::new(
                self.endpoints.clone(),
                self.timeout,
            )?)),
        };
        let mirror_orders = !self.offline
            && self
                .mirror_orders
                .unwrap_or(self.endpoints.orders_complete_url.is_some());

        let mut sdk = RivalsSdk {
            inventory: InventoryStore::new(store.clone()),
            cart: Cart::new(store.clone()),
            collection: Collection::new(store.clone()),
            favorites: Favorites::new(store.clone(), self.user_id.as_deref()),
            orders: OrderHistory::new(store.clone()),
            checkout: Checkout::new(store.clone()),
            store,
            api,
            endpoints: self.endpoints,
            offline: self.offline,
            mirror_orders,
        };
        sdk.hydrate();
        if let Some(order_id) = sdk.recover_pending_order()? {
            tracing::info!(order_id = %order_id, "finished interrupted order on startup");
        }
        Ok(sdk)
    }
}

// ---------------------------------------------------------------------------
// RivalsSdk
// ---------------------------------------------------------------------------

/// The main entry point for the Rivals SDK.
///
/// Owns the key/value store, the inventory backend and every service object.
/// Services are exposed through borrowing accessors; workflows that span
/// several services (checkout, publishing) are methods here.
///
/// Created via [`RivalsSdk::builder()`].
pub struct RivalsSdk {
    store: Arc<dyn KeyValueStore>,
    api: Option<Arc<dyn InventoryApi>>,
    endpoints: Endpoints,
    offline: bool,
    mirror_orders: bool,
    inventory: InventoryStore,
    cart: Cart,
    collection: Collection,
    favorites: Favorites,
    orders: OrderHistory,
    checkout: Checkout,
}

impl RivalsSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> RivalsSdkBuilder {
        RivalsSdkBuilder::default()
    }

    /// Reload every service from storage.
    pub fn hydrate(&mut self) {
        self.inventory.hydrate();
        self.cart.hydrate();
        self.collection.hydrate();
        self.favorites.hydrate();
        self.orders.hydrate();
        self.checkout.hydrate();
    }

    // -- Service accessors -------------------------------------------------

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut InventoryStore {
        &mut self.inventory
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut Collection {
        &mut self.collection
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn favorites_mut(&mut self) -> &mut Favorites {
        &mut self.favorites
    }

    pub fn orders(&self) -> &OrderHistory {
        &self.orders
    }

    pub fn orders_mut(&mut self) -> &mut OrderHistory {
        &mut self.orders
    }

    pub fn checkout(&self) -> &Checkout {
        &self.checkout
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// The underlying key/value store, for advanced usage.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // -- Inventory ---------------------------------------------------------

    /// Replace the local inventory with the backend's.
    ///
    /// Offline, this returns the cached item count without a network call.
    /// On failure the cached items stay available and the error is returned.
    pub fn refresh_inventory(&mut self) -> Result<usize> {
        if self.offline {
            return Ok(self.inventory.len());
        }
        let api = self
            .api
            .as_deref()
            .ok_or_else(|| RivalsError::NotConfigured("inventory api".into()))?;
        self.inventory.refresh(api)
    }

    // -- Collection --------------------------------------------------------

    /// Add a card to the collection, valuing it through `prices`.
    pub fn add_to_collection(
        &mut self,
        item: NewCollectionItem,
        qty: i64,
        prices: &dyn PriceSource,
    ) -> Result<()> {
        self.collection.add_or_increment(item, qty, prices)
    }

    // -- Checkout ----------------------------------------------------------

    /// Complete `order_id` from the current cart.
    ///
    /// Repeating a completed order id is a no-op that returns
    /// [`CompletionOutcome::AlreadyProcessed`].
    pub fn complete_order(&mut self, order_id: &str, user_email: &str) -> Result<CompletionOutcome> {
        let mirror = if self.mirror_orders {
            self.api.as_deref()
        } else {
            None
        };
        self.checkout.complete_order(
            order_id,
            user_email,
            &mut self.cart,
            &mut self.inventory,
            &mut self.orders,
            mirror,
        )
    }

    /// Complete the current cart under a freshly generated order id.
    pub fn place_order(&mut self, user_email: &str) -> Result<CompletionOutcome> {
        let order_id = identity::new_order_id();
        self.complete_order(&order_id, user_email)
    }

    /// Finish an order completion interrupted by a crash, if one is journaled.
    pub fn recover_pending_order(&mut self) -> Result<Option<String>> {
        self.checkout
            .recover_pending(&mut self.cart, &mut self.inventory, &mut self.orders)
    }

    // -- Seller publishing -------------------------------------------------

    pub fn import_csv(&self, text: &str, transform: PriceTransform) -> CsvImport {
        CsvImport::from_text(text, transform)
    }

    pub fn import_csv_file(&self, path: &Path, transform: PriceTransform) -> Result<CsvImport> {
        CsvImport::from_path(path, transform)
    }

    /// Publish an import to the backend and mirror it into local inventory.
    pub fn publish(
        &mut self,
        import: &CsvImport,
        mode: PublishMode,
        is_seller: bool,
    ) -> Result<PublishReceipt> {
        if self.offline {
            return Err(RivalsError::NotConfigured(
                "publishing is unavailable offline".into(),
            ));
        }
        let api = self
            .api
            .as_deref()
            .ok_or_else(|| RivalsError::NotConfigured("inventory api".into()))?;
        import.publish(mode, api, &mut self.inventory, is_seller)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for RivalsSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RivalsSdk(inventory={}, cart={}, collection={}, orders={}, user={}, offline={})",
            self.inventory.len(),
            self.cart.len(),
            self.collection.len(),
            self.orders.orders().len(),
            self.favorites.user_id(),
            self.offline
        )
    }
}
