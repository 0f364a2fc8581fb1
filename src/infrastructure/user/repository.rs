//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{User, UserId, UserRepository, UserStatus};
use crate::domain::DomainError;

/// In-memory implementation of UserRepository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
    /// Index for email -> user ID lookup
    email_index: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users; later duplicates are dropped
    pub fn with_users(users: Vec<User>) -> Self {
        let mut users_map = HashMap::new();
        let mut email_map = HashMap::new();

        for user in users {
            let id = user.id().as_str().to_string();

            if users_map.contains_key(&id) || email_map.contains_key(user.email()) {
                continue;
            }

            email_map.insert(user.email().to_string(), id.clone());
            users_map.insert(id, user);
        }

        Self {
            users: Arc::new(RwLock::new(users_map)),
            email_index: Arc::new(RwLock::new(email_map)),
        }
    }
}

fn filter_by_status(users: &HashMap<String, User>, status: Option<UserStatus>) -> Vec<User> {
    let mut result: Vec<User> = users
        .values()
        .filter(|u| status.is_none_or(|s| u.status() == s))
        .cloned()
        .collect();

    result.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
    result
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(id.as_str()).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        // Same lock order as the writers: users, then email_index
        let users = self.users.read().await;
        let email_index = self.email_index.read().await;

        Ok(email_index
            .get(email)
            .and_then(|user_id| users.get(user_id))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        let mut email_index = self.email_index.write().await;

        let id = user.id().as_str().to_string();
        let email = user.email().to_string();

        if users.contains_key(&id) {
            return Err(DomainError::duplicate_key("id", id));
        }

        if email_index.contains_key(&email) {
            return Err(DomainError::duplicate_key("email", email));
        }

        email_index.insert(email, id.clone());
        users.insert(id, user.clone());

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        let mut email_index = self.email_index.write().await;

        let id = user.id().as_str().to_string();

        let Some(old_user) = users.get(&id) else {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        };

        let old_email = old_user.email().to_string();
        let new_email = user.email().to_string();

        if old_email != new_email {
            if email_index.contains_key(&new_email) {
                return Err(DomainError::duplicate_key("email", new_email));
            }

            email_index.remove(&old_email);
            email_index.insert(new_email, id.clone());
        }

        users.insert(id, user.clone());

        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let mut users = self.users.write().await;
        let mut email_index = self.email_index.write().await;

        if let Some(user) = users.remove(id.as_str()) {
            email_index.remove(user.email());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(&self, status: Option<UserStatus>) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().await;
        Ok(filter_by_status(&users, status))
    }

    async fn count(&self, status: Option<UserStatus>) -> Result<usize, DomainError> {
        let users = self.users.read().await;

        let count = users
            .values()
            .filter(|u| status.is_none_or(|s| u.status() == s))
            .count();

        Ok(count)
    }

    async fn exists(&self, id: &UserId) -> Result<bool, DomainError> {
        Ok(self.users.read().await.contains_key(id.as_str()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.email_index.read().await.contains_key(email))
    }
}
