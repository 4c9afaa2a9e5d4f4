pub mod cart;
pub mod collection;
pub mod inventory;
pub mod order;

pub use cart::*;
pub use collection::*;
pub use inventory::*;
pub use order::*;
