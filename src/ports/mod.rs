pub mod config_store;
pub mod observer;
pub mod snapshot_storage;

pub use config_store::*;
pub use observer::*;
pub use snapshot_storage::*;
