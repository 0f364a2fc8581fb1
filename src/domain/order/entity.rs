//! Order entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::user::UserId;

/// Order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for OrderId {
    fn storage_key(&self) -> String {
        self.0.to_string()
    }
}

/// An order placed by a user.
///
/// The order owns the relation: users never embed their orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default = "OrderId::generate")]
    id: OrderId,
    user_id: UserId,
    description: String,
    total_cents: i64,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: UserId, description: impl Into<String>, total_cents: i64) -> Self {
        Self {
            id: OrderId::generate(),
            user_id,
            description: description.into(),
            total_cents,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn total_cents(&self) -> i64 {
        self.total_cents
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl StorageEntity for Order {
    type Key = OrderId;
    const KIND: &'static str = "order";

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
