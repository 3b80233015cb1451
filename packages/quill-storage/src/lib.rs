pub mod db;
pub mod models;
pub mod schema;
pub mod store;

mod error;
mod pg;

pub use error::Error;
pub use store::{BoxFuture, OwnedEntity, OwnedRepository, RecordStore};

pub type Result<T, E = Error> = std::result::Result<T, E>;
