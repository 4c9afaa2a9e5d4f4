//! Async wrapper around [`RivalsSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free while
//! storage and HTTP calls block.
//!
//! # Example
//!
//! ```no_run
//! use rivals_sdk::AsyncRivalsSdk;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sdk = AsyncRivalsSdk::builder().build().await.unwrap();
//!
//!     // Run any sync SDK method via closure
//!     let total = sdk.run(|s| Ok(s.cart().subtotal())).await.unwrap();
//!
//!     // Convenience method for refreshing inventory
//!     let count = sdk.refresh_inventory().await.unwrap_or(0);
//!     println!("{count} items, cart total {total:.2}");
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{Endpoints, DEFAULT_TIMEOUT};
use crate::error::{Result, RivalsError};
use crate::remote::InventoryApi;
use crate::services::CompletionOutcome;
use crate::RivalsSdk;

// ---------------------------------------------------------------------------
// AsyncRivalsSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncRivalsSdk`] instance.
pub struct AsyncRivalsSdkBuilder {
    storage_dir: Option<PathBuf>,
    in_memory: bool,
    offline: bool,
    timeout: Duration,
    endpoints: Option<Endpoints>,
    user_id: Option<String>,
    api: Option<Arc<dyn InventoryApi>>,
}

impl Default for AsyncRivalsSdkBuilder {
    fn default() -> Self {
        Self {
            storage_dir: None,
            in_memory: false,
            offline: false,
            timeout: DEFAULT_TIMEOUT,
            endpoints: None,
            user_id: None,
            api: None,
        }
    }
}

impl AsyncRivalsSdkBuilder {
    /// Set a custom storage directory.
    pub fn storage_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep all state in memory.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Enable or disable offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn api(mut self, api: Arc<dyn InventoryApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Build the async SDK.
    ///
    /// Opening storage and hydration run on the blocking thread pool so they
    /// won't block the async event loop.
    pub async fn build(self) -> Result<AsyncRivalsSdk> {
        tokio::task::spawn_blocking(move || {
            let mut builder = RivalsSdk::builder()
                .offline(self.offline)
                .timeout(self.timeout);
            if let Some(dir) = self.storage_dir {
                builder = builder.storage_dir(dir);
            }
            if self.in_memory {
                builder = builder.in_memory();
            }
            builder = match self.endpoints {
                Some(endpoints) => builder.endpoints(endpoints),
                None => builder.endpoints_from_env(),
            };
            if let Some(user_id) = self.user_id {
                builder = builder.user_id(user_id);
            }
            if let Some(api) = self.api {
                builder = builder.api(api);
            }
            let sdk = builder.build()?;
            Ok(AsyncRivalsSdk {
                inner: Arc::new(Mutex::new(sdk)),
            })
        })
        .await
        .map_err(|e| RivalsError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncRivalsSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`RivalsSdk`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The underlying [`RivalsSdk`] is
/// protected by a [`Mutex`], so operations are serialized.
#[derive(Clone)]
pub struct AsyncRivalsSdk {
    inner: Arc<Mutex<RivalsSdk>>,
}

impl AsyncRivalsSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncRivalsSdkBuilder {
        AsyncRivalsSdkBuilder::default()
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives a `&mut RivalsSdk` and should return a
    /// `Result<T>`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use rivals_sdk::AsyncRivalsSdk;
    /// # async fn example() -> rivals_sdk::Result<()> {
    /// # let sdk = AsyncRivalsSdk::builder().in_memory().build().await?;
    /// sdk.run(|s| s.favorites_mut().add("card-1")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut RivalsSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = sdk
                .lock()
                .map_err(|_| RivalsError::InvalidArgument("SDK lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| RivalsError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Replace the local inventory with the backend's.
    pub async fn refresh_inventory(&self) -> Result<usize> {
        self.run(|s| s.refresh_inventory()).await
    }

    /// Complete `order_id` from the current cart.
    pub async fn complete_order(&self, order_id: &str, user_email: &str) -> Result<CompletionOutcome> {
        let order_id = order_id.to_string();
        let user_email = user_email.to_string();
        self.run(move |s| s.complete_order(&order_id, &user_email))
            .await
    }
}
