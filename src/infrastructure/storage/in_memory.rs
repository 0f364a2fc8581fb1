//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Thread-safe in-memory storage implementation
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<HashMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Creates storage pre-populated with entities
    pub fn with_entities(entities: Vec<E>) -> Self {
        let map = entities
            .into_iter()
            .map(|entity| (entity.key().storage_key(), entity))
            .collect();

        Self {
            entities: RwLock::new(map),
        }
    }
}

fn lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::storage(format!("Failed to acquire storage lock: {}", e))
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let entities = self.entities.read().map_err(lock_error)?;

        Ok(entities.get(&key.storage_key()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let entities = self.entities.read().map_err(lock_error)?;

        Ok(entities.values().cloned().collect())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().storage_key();
        let mut entities = self.entities.write().map_err(lock_error)?;

        if entities.contains_key(&key) {
            return Err(DomainError::duplicate_key(format!("{} id", E::KIND), key));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().storage_key();
        let mut entities = self.entities.write().map_err(lock_error)?;

        if !entities.contains_key(&key) {
            return Err(DomainError::not_found(format!(
                "{} '{}' not found",
                E::KIND,
                key
            )));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut entities = self.entities.write().map_err(lock_error)?;

        Ok(entities.remove(&key.storage_key()).is_some())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut entities = self.entities.write().map_err(lock_error)?;

        entities.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let entities = self.entities.read().map_err(lock_error)?;

        Ok(entities.len())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let entities = self.entities.read().map_err(lock_error)?;

        Ok(entities.contains_key(&key.storage_key()))
    }
}
