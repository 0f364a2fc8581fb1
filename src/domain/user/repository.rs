//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::entity::{User, UserId, UserStatus};
use crate::domain::DomainError;

/// Storage collaborator for user records.
///
/// Implementations own uniqueness: `create` and `update` fail with
/// [`DomainError::DuplicateKey`] when the id or email is already taken by
/// another record.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their identification number
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their email address
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update an existing user
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Create the user if it does not exist yet, update it otherwise
    async fn save(&self, user: User) -> Result<User, DomainError> {
        if self.exists(user.id()).await? {
            self.update(&user).await
        } else {
            self.create(user).await
        }
    }

    /// Delete a user, returns true if it existed
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;

    /// List users (optionally filtered by status), oldest first
    async fn list(&self, status: Option<UserStatus>) -> Result<Vec<User>, DomainError>;

    /// Count users (optionally filtered by status)
    async fn count(&self, status: Option<UserStatus>) -> Result<usize, DomainError>;

    async fn exists(&self, id: &UserId) -> Result<bool, DomainError> {
        Ok(self.get(id).await?.is_some())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}
