pub mod analytics;
pub mod comment;
pub mod error;
pub mod id;
pub mod project;
pub mod submission;
pub mod task;
pub mod user;

pub use analytics::*;
pub use comment::*;
pub use error::*;
pub use id::*;
pub use project::*;
pub use submission::*;
pub use task::*;
pub use user::*;
