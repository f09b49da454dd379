pub mod actor;
pub mod error;
pub mod module;
pub mod types;

pub use actor::Actor;
pub use error::ServiceError;
pub use module::Module;
pub use types::{ListParams, ListResult, new_id, now_rfc3339};
