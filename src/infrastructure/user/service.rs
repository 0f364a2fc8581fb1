//! User service: registration, profile changes and order lookups

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::storage::Storage;
use crate::domain::user::{
    PasswordChangeRequest, User, UserCandidate, UserId, UserPatch, UserRepository, UserStatus,
    DEFAULT_AREA_CODE,
};
use crate::domain::{DocumentType, DomainError, Order, Role, RoleId, DocumentTypeId};

use super::password::PasswordHasher;

/// Storage for the entities users reference by id
#[derive(Debug, Clone)]
pub struct ReferenceStores {
    pub roles: Arc<dyn Storage<Role>>,
    pub document_types: Arc<dyn Storage<DocumentType>>,
    pub orders: Arc<dyn Storage<Order>>,
}

/// User service orchestrating validation, reference checks and persistence.
///
/// Nothing cascades: every multi-entity write is an explicit call here.
#[derive(Debug)]
pub struct UserService<R: UserRepository + ?Sized, H: PasswordHasher + ?Sized> {
    repository: Arc<R>,
    hasher: Arc<H>,
    references: ReferenceStores,
    default_area_code: String,
}

/// Service type used when the backends are picked at runtime
pub type DynUserService = UserService<dyn UserRepository, dyn PasswordHasher>;

impl<R: UserRepository + ?Sized, H: PasswordHasher + ?Sized> UserService<R, H> {
    pub fn new(repository: Arc<R>, hasher: Arc<H>, references: ReferenceStores) -> Self {
        Self {
            repository,
            hasher,
            references,
            default_area_code: DEFAULT_AREA_CODE.to_string(),
        }
    }

    /// Use a different area code for candidates that leave it out
    pub fn with_default_area_code(mut self, area_code: impl Into<String>) -> Self {
        self.default_area_code = area_code.into();
        self
    }

    pub fn references(&self) -> &ReferenceStores {
        &self.references
    }

    /// Register a new user.
    ///
    /// Applies defaults, validates, checks the role and document type exist,
    /// hashes the password if one was given, then stores the record. Storage
    /// conflicts come back unchanged as `DuplicateKey`.
    pub async fn register(&self, candidate: UserCandidate) -> Result<User, DomainError> {
        let candidate = candidate.with_default_area_code(&self.default_area_code);
        let mut user = candidate.validate().map_err(DomainError::invalid_fields)?;

        self.ensure_references(user.role_id(), user.document_type_id())
            .await?;

        if let Some(password) = candidate.password.as_deref().filter(|p| !p.is_empty()) {
            user.set_password_hash(self.hasher.hash(password)?);
        }

        let user = self.repository.create(user).await?;
        info!(user_id = %user.id(), status = %user.status(), "User registered");

        Ok(user)
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>, DomainError> {
        let user_id = parse_id(id)?;
        self.repository.get(&user_id).await
    }

    /// Look up by email; surrounding whitespace is ignored, as it is on registration
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.repository.get_by_email(email.trim()).await
    }

    pub async fn list(&self, status: Option<UserStatus>) -> Result<Vec<User>, DomainError> {
        self.repository.list(status).await
    }

    pub async fn count(&self, status: Option<UserStatus>) -> Result<usize, DomainError> {
        self.repository.count(status).await
    }

    /// Apply a profile patch; the merged record goes through every field rule again
    pub async fn update_profile(&self, id: &str, patch: UserPatch) -> Result<User, DomainError> {
        let mut user = self.require(id).await?;
        let role_changed = patch.role_id.is_some_and(|r| r != user.role_id());
        let document_changed = patch
            .document_type_id
            .is_some_and(|d| d != user.document_type_id());

        user.apply_patch(patch).map_err(DomainError::invalid_fields)?;

        if role_changed || document_changed {
            self.ensure_references(user.role_id(), user.document_type_id())
                .await?;
        }

        let user = self.repository.update(&user).await?;
        debug!(user_id = %user.id(), "User profile updated");

        Ok(user)
    }

    pub async fn activate(&self, id: &str) -> Result<User, DomainError> {
        self.set_status(id, UserStatus::Active).await
    }

    pub async fn deactivate(&self, id: &str) -> Result<User, DomainError> {
        self.set_status(id, UserStatus::Inactive).await
    }

    async fn set_status(&self, id: &str, status: UserStatus) -> Result<User, DomainError> {
        let mut user = self.require(id).await?;
        user.set_status(status);

        let user = self.repository.update(&user).await?;
        info!(user_id = %user.id(), status = %status, "User status changed");

        Ok(user)
    }

    /// Validate a password change request and store the new hash
    pub async fn change_password(
        &self,
        id: &str,
        request: PasswordChangeRequest,
    ) -> Result<User, DomainError> {
        request.validate().map_err(DomainError::invalid_fields)?;

        let mut user = self.require(id).await?;
        user.set_password_hash(self.hasher.hash(&request.password)?);

        let user = self.repository.update(&user).await?;
        info!(user_id = %user.id(), "User password changed");

        Ok(user)
    }

    /// Check a plain-text password against the stored hash
    pub async fn verify_password(&self, id: &str, password: &str) -> Result<bool, DomainError> {
        let user = self.require(id).await?;

        Ok(user
            .password_hash()
            .is_some_and(|hash| self.hasher.verify(password, hash)))
    }

    /// Delete the user record only; the user's orders are left in place
    pub async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let user_id = parse_id(id)?;
        let deleted = self.repository.delete(&user_id).await?;

        if deleted {
            info!(user_id = %user_id, "User deleted");
        }

        Ok(deleted)
    }

    /// Orders that reference the user, oldest first
    pub async fn orders(&self, id: &str) -> Result<Vec<Order>, DomainError> {
        let user_id = parse_id(id)?;

        let mut orders: Vec<Order> = self
            .references
            .orders
            .list()
            .await?
            .into_iter()
            .filter(|order| order.user_id() == &user_id)
            .collect();

        orders.sort_by_key(|order| order.created_at());
        Ok(orders)
    }

    /// Store an order after checking the user it references exists
    pub async fn place_order(&self, order: Order) -> Result<Order, DomainError> {
        if !self.repository.exists(order.user_id()).await? {
            warn!(user_id = %order.user_id(), "Order references unknown user");
            return Err(DomainError::reference_not_found("user", order.user_id()));
        }

        let order = self.references.orders.create(order).await?;
        debug!(order_id = %order.id(), user_id = %order.user_id(), "Order placed");

        Ok(order)
    }

    async fn require(&self, id: &str) -> Result<User, DomainError> {
        let user_id = parse_id(id)?;

        self.repository
            .get(&user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user_id)))
    }

    async fn ensure_references(
        &self,
        role_id: RoleId,
        document_type_id: DocumentTypeId,
    ) -> Result<(), DomainError> {
        if !self.references.roles.exists(&role_id).await? {
            return Err(DomainError::reference_not_found("role", role_id));
        }

        if !self
            .references
            .document_types
            .exists(&document_type_id)
            .await?
        {
            return Err(DomainError::reference_not_found(
                "document type",
                document_type_id,
            ));
        }

        Ok(())
    }
}

fn parse_id(id: &str) -> Result<UserId, DomainError> {
    UserId::new(id).map_err(|e| DomainError::invalid_id(e.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{FieldErrorKind, MockUserRepository};
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::infrastructure::user::password::Argon2Hasher;
    use crate::infrastructure::user::repository::InMemoryUserRepository;
    use chrono::NaiveDate;

    fn references() -> ReferenceStores {
        ReferenceStores {
            roles: Arc::new(InMemoryStorage::with_entities(vec![
                Role::new(RoleId::new(1), "admin"),
                Role::new(RoleId::new(2), "customer"),
            ])),
            document_types: Arc::new(InMemoryStorage::with_entities(vec![DocumentType::new(
                DocumentTypeId::new(1),
                "Cédula de ciudadanía",
            )])),
            orders: Arc::new(InMemoryStorage::<Order>::new()),
        }
    }

    fn hasher() -> Arc<Argon2Hasher> {
        Arc::new(Argon2Hasher::with_params(8 * 1024, 1, 1).unwrap())
    }

    fn create_service() -> UserService<InMemoryUserRepository, Argon2Hasher> {
        UserService::new(Arc::new(InMemoryUserRepository::new()), hasher(), references())
    }

    fn candidate(id: &str, email: &str) -> UserCandidate {
        UserCandidate {
            id: Some(id.to_string()),
            first_name: Some("Carolina".to_string()),
            last_name: Some("Restrepo".to_string()),
            birthdate: NaiveDate::from_ymd_opt(1993, 8, 21),
            email: Some(email.to_string()),
            role_id: Some(RoleId::new(2)),
            document_type_id: Some(DocumentTypeId::new(1)),
            ..UserCandidate::default()
        }
    }

    #[tokio::test]
    async fn test_register_applies_defaults() {
        let service = create_service();

        let user = service.register(candidate("1001", "caro@example.com")).await.unwrap();

        assert_eq!(user.status(), UserStatus::Inactive);
        assert_eq!(user.area_code(), Some("57"));
        assert!(!user.terms_and_conditions());
        assert!(user.password_hash().is_none());
    }

    #[tokio::test]
    async fn test_register_uses_configured_area_code() {
        let service = create_service().with_default_area_code("1");

        let user = service.register(candidate("1001", "caro@example.com")).await.unwrap();
        assert_eq!(user.area_code(), Some("1"));
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let service = create_service();
        let input = UserCandidate {
            password: Some("Medellin#2024".to_string()),
            ..candidate("1001", "caro@example.com")
        };

        let user = service.register(input).await.unwrap();

        let hash = user.password_hash().unwrap();
        assert_ne!(hash, "Medellin#2024");
        assert!(service.verify_password("1001", "Medellin#2024").await.unwrap());
        assert!(!service.verify_password("1001", "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_invalid_candidate() {
        let service = create_service();
        let input = UserCandidate {
            email: Some("not-an-email".to_string()),
            ..candidate("1001", "unused@example.com")
        };

        let error = service.register(input).await.unwrap_err();
        let errors = error.field_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, FieldErrorKind::InvalidEmail);
        assert_eq!(service.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_unknown_role() {
        let service = create_service();
        let input = UserCandidate {
            role_id: Some(RoleId::new(99)),
            ..candidate("1001", "caro@example.com")
        };

        let error = service.register(input).await.unwrap_err();
        match error {
            DomainError::ReferenceNotFound { entity, id } => {
                assert_eq!(entity, "role");
                assert_eq!(id, "99");
            }
            other => panic!("expected ReferenceNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_unknown_document_type() {
        let service = create_service();
        let input = UserCandidate {
            document_type_id: Some(DocumentTypeId::new(5)),
            ..candidate("1001", "caro@example.com")
        };

        let error = service.register(input).await.unwrap_err();
        assert!(error.is_reference_not_found());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = create_service();

        service.register(candidate("1001", "same@example.com")).await.unwrap();
        let error = service
            .register(candidate("1002", "same@example.com"))
            .await
            .unwrap_err();

        assert!(error.is_duplicate_key());
    }

    #[tokio::test]
    async fn test_register_surfaces_storage_errors_unchanged() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_create()
            .returning(|user| Err(DomainError::duplicate_key("id", user.id().as_str())));

        let service = UserService::new(Arc::new(repository), hasher(), references());
        let error = service
            .register(candidate("1001", "caro@example.com"))
            .await
            .unwrap_err();

        match error {
            DomainError::DuplicateKey { field, value } => {
                assert_eq!(field, "id");
                assert_eq!(value, "1001");
            }
            other => panic!("expected DuplicateKey, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_profile() {
        let service = create_service();
        service.register(candidate("1001", "caro@example.com")).await.unwrap();

        let user = service
            .update_profile(
                "1001",
                UserPatch {
                    phone_number: Some("3109876543".to_string()),
                    role_id: Some(RoleId::new(1)),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(user.phone_number(), Some("3109876543"));
        assert_eq!(user.role_id(), RoleId::new(1));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_unknown_role() {
        let service = create_service();
        service.register(candidate("1001", "caro@example.com")).await.unwrap();

        let error = service
            .update_profile(
                "1001",
                UserPatch {
                    role_id: Some(RoleId::new(42)),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap_err();

        assert!(error.is_reference_not_found());
        let stored = service.get("1001").await.unwrap().unwrap();
        assert_eq!(stored.role_id(), RoleId::new(2));
    }

    #[tokio::test]
    async fn test_update_profile_missing_user() {
        let service = create_service();

        let error = service
            .update_profile("404", UserPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(error, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_activate_and_deactivate() {
        let service = create_service();
        service.register(candidate("1001", "caro@example.com")).await.unwrap();

        let active = service.activate("1001").await.unwrap();
        assert_eq!(active.status(), UserStatus::Active);
        assert_eq!(service.count(Some(UserStatus::Active)).await.unwrap(), 1);

        let inactive = service.deactivate("1001").await.unwrap();
        assert_eq!(inactive.status(), UserStatus::Inactive);
    }

    #[tokio::test]
    async fn test_change_password() {
        let service = create_service();
        service.register(candidate("1001", "caro@example.com")).await.unwrap();

        service
            .change_password("1001", PasswordChangeRequest::new("Nueva-clave-1", "Nueva-clave-1"))
            .await
            .unwrap();

        assert!(service.verify_password("1001", "Nueva-clave-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_change_password_mismatch_stores_nothing() {
        let service = create_service();
        service.register(candidate("1001", "caro@example.com")).await.unwrap();

        let error = service
            .change_password("1001", PasswordChangeRequest::new("first", "second"))
            .await
            .unwrap_err();

        assert_eq!(error.field_errors().unwrap()[0].kind, FieldErrorKind::Mismatch);
        let stored = service.get("1001").await.unwrap().unwrap();
        assert!(stored.password_hash().is_none());
    }

    #[tokio::test]
    async fn test_change_password_empty() {
        let service = create_service();
        service.register(candidate("1001", "caro@example.com")).await.unwrap();

        let error = service
            .change_password("1001", PasswordChangeRequest::new("", "x"))
            .await
            .unwrap_err();

        assert_eq!(error.field_errors().unwrap()[0].field, "password");
    }

    #[tokio::test]
    async fn test_orders_are_per_user_and_ordered() {
        let service = create_service();
        service.register(candidate("1001", "a@example.com")).await.unwrap();
        service.register(candidate("1002", "b@example.com")).await.unwrap();

        let first = service
            .place_order(Order::new(UserId::new("1001").unwrap(), "first", 1000))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service
            .place_order(Order::new(UserId::new("1002").unwrap(), "other", 500))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = service
            .place_order(Order::new(UserId::new("1001").unwrap(), "second", 2000))
            .await
            .unwrap();

        let orders = service.orders("1001").await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![first.id(), second.id()]);
    }

    #[tokio::test]
    async fn test_place_order_for_unknown_user() {
        let service = create_service();

        let error = service
            .place_order(Order::new(UserId::new("404").unwrap(), "ghost", 100))
            .await
            .unwrap_err();

        assert!(error.is_reference_not_found());
        assert_eq!(service.references().orders.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_leaves_orders() {
        let service = create_service();
        service.register(candidate("1001", "a@example.com")).await.unwrap();
        service
            .place_order(Order::new(UserId::new("1001").unwrap(), "kept", 100))
            .await
            .unwrap();

        assert!(service.delete("1001").await.unwrap());
        assert!(service.get("1001").await.unwrap().is_none());
        assert_eq!(service.orders("1001").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_email_ignores_surrounding_whitespace() {
        let service = create_service();
        service.register(candidate("1001", "caro@example.com")).await.unwrap();

        let found = service.get_by_email("  caro@example.com ").await.unwrap();
        assert_eq!(found.map(|u| u.id().as_str().to_string()), Some("1001".to_string()));
    }

    #[tokio::test]
    async fn test_blank_id_is_invalid() {
        let service = create_service();
        let error = service.get("  ").await.unwrap_err();
        assert!(matches!(error, DomainError::InvalidId { .. }));
    }

    #[tokio::test]
    async fn test_dyn_service() {
        let repository: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let hasher: Arc<dyn PasswordHasher> = hasher();
        let service: DynUserService = UserService::new(repository, hasher, references());

        service.register(candidate("1001", "caro@example.com")).await.unwrap();
        assert_eq!(service.count(None).await.unwrap(), 1);
    }
}
