//! Storage domain - generic keyed storage for reference entities

mod entity;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use repository::Storage;
