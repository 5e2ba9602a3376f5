pub mod error;
pub mod project_store;
pub mod session;

pub use error::*;
pub use project_store::*;
pub use session::*;
