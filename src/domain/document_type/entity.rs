use serde::{Deserialize, Serialize};

use crate::domain::storage::{StorageEntity, StorageKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentTypeId(i32);

impl DocumentTypeId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for DocumentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for DocumentTypeId {
    fn storage_key(&self) -> String {
        self.0.to_string()
    }
}

/// Kind of identification document a user id refers to (citizen card, passport, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    id: DocumentTypeId,
    name: String,
}

impl DocumentType {
    pub fn new(id: DocumentTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> DocumentTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl StorageEntity for DocumentType {
    type Key = DocumentTypeId;
    const KIND: &'static str = "document type";

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
