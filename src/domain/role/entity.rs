//! Role entity

use serde::{Deserialize, Serialize};

use crate::domain::storage::{StorageEntity, StorageKey};

/// Role identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(i32);

impl RoleId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for RoleId {
    fn storage_key(&self) -> String {
        self.0.to_string()
    }
}

/// A role users are assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: String,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> RoleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl StorageEntity for Role {
    type Key = RoleId;
    const KIND: &'static str = "role";

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_json() {
        let role: Role = serde_json::from_str(r#"{"id": 2, "name": "customer"}"#).unwrap();
        assert_eq!(role.id(), RoleId::new(2));
        assert_eq!(role.name(), "customer");
        assert_eq!(role.key().storage_key(), "2");
    }
}
