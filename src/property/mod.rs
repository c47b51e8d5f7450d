pub mod models;
pub mod repository;

pub use models::{Address, PropertyRecord, PropertyType, RawValue};
pub use repository::{InMemoryRepository, PropertyFilter, PropertyRepository};
