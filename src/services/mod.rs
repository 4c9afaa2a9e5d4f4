//! Service objects holding client state.
//!
//! Each service owns one persisted document in a shared
//! [`KeyValueStore`](crate::storage::KeyValueStore) and starts un-hydrated
//! until its `hydrate()` loads that document. [`RivalsSdk`](crate::RivalsSdk)
//! constructs and hydrates all of them.

pub mod cart;
pub mod checkout;
pub mod collection;
pub mod favorites;
pub mod inventory;
pub mod orders;
pub mod publish;

pub use cart::Cart;
pub use checkout::{Checkout, CompletionOutcome};
pub use collection::{Collection, ValuationReport};
pub use favorites::Favorites;
pub use inventory::{InventoryStore, MergeReport};
pub use orders::OrderHistory;
pub use publish::{CsvImport, ImportStats, PublishMode, PublishReceipt};
