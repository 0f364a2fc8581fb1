//! Import command - loads seed data through the user service

use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::storage::Storage;
use crate::domain::user::UserCandidate;
use crate::domain::{DocumentType, DomainError, Order, Role, UserRepository};
use crate::infrastructure::user::{PasswordHasher, UserService};

/// Arguments for the import command
#[derive(Args, Clone)]
pub struct ImportArgs {
    /// JSON file with `roles`, `documentTypes`, `users` and `orders` arrays
    pub file: PathBuf,
}

/// Seed data file contents; every section is optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportFile {
    pub roles: Vec<Role>,
    pub document_types: Vec<DocumentType>,
    pub users: Vec<UserCandidate>,
    pub orders: Vec<Order>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub roles: usize,
    pub document_types: usize,
    pub users_registered: usize,
    pub users_rejected: usize,
    pub orders_placed: usize,
    pub orders_rejected: usize,
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "roles: {}, document types: {}, users: {} registered / {} rejected, orders: {} placed / {} rejected",
            self.roles,
            self.document_types,
            self.users_registered,
            self.users_rejected,
            self.orders_placed,
            self.orders_rejected
        )
    }
}

/// Run the import command
pub async fn run(args: ImportArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let value = super::read_json(&args.file)?;
    let file: ImportFile = serde_json::from_value(value)?;

    let service = crate::create_user_service(&config).await?;
    let summary = import(&service, file).await?;

    info!(%summary, "Import finished");
    println!("{}", summary);

    Ok(())
}

/// Store reference data, then register users and place orders.
///
/// Rejected users and orders are logged and counted; storage failures abort.
pub async fn import<R, H>(
    service: &UserService<R, H>,
    file: ImportFile,
) -> Result<ImportSummary, DomainError>
where
    R: UserRepository + ?Sized,
    H: PasswordHasher + ?Sized,
{
    let mut summary = ImportSummary::default();
    let references = service.references();

    for role in file.roles {
        references.roles.save(role).await?;
        summary.roles += 1;
    }

    for document_type in file.document_types {
        references.document_types.save(document_type).await?;
        summary.document_types += 1;
    }

    for candidate in file.users {
        let id = candidate.id.clone().unwrap_or_default();

        match service.register(candidate).await {
            Ok(_) => summary.users_registered += 1,
            Err(e) if is_rejection(&e) => {
                warn!(user_id = %id, error = %e, "User rejected");
                summary.users_rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for order in file.orders {
        let order_id = order.id();

        match service.place_order(order).await {
            Ok(_) => summary.orders_placed += 1,
            Err(e) if is_rejection(&e) => {
                warn!(order_id = %order_id, error = %e, "Order rejected");
                summary.orders_rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

fn is_rejection(error: &DomainError) -> bool {
    matches!(
        error,
        DomainError::InvalidFields { .. }
            | DomainError::DuplicateKey { .. }
            | DomainError::ReferenceNotFound { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserStatus;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::infrastructure::user::{Argon2Hasher, InMemoryUserRepository, ReferenceStores};
    use serde_json::json;
    use std::sync::Arc;

    fn create_service() -> UserService<InMemoryUserRepository, Argon2Hasher> {
        UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(Argon2Hasher::with_params(8 * 1024, 1, 1).unwrap()),
            ReferenceStores {
                roles: Arc::new(InMemoryStorage::<Role>::new()),
                document_types: Arc::new(InMemoryStorage::<DocumentType>::new()),
                orders: Arc::new(InMemoryStorage::<Order>::new()),
            },
        )
    }

    fn user(id: &str, email: &str, role_id: i32) -> serde_json::Value {
        json!({
            "id": id,
            "firstName": "Laura",
            "lastName": "Pérez",
            "birthdate": "1988-11-03",
            "email": email,
            "status": "ACTIVE",
            "roleId": role_id,
            "documentTypeId": 1
        })
    }

    #[tokio::test]
    async fn test_import_counts_rejections() {
        let service = create_service();
        let file: ImportFile = serde_json::from_value(json!({
            "roles": [{"id": 1, "name": "admin"}],
            "documentTypes": [{"id": 1, "name": "Pasaporte"}],
            "users": [
                user("1", "laura@example.com", 1),
                user("2", "laura@example.com", 1),
                user("3", "other@example.com", 9),
                {"id": "4"}
            ],
            "orders": [
                {"userId": "1", "description": "Suscripción anual", "totalCents": 120000},
                {"userId": "404", "description": "Huérfana", "totalCents": 100}
            ]
        }))
        .unwrap();

        let summary = import(&service, file).await.unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                roles: 1,
                document_types: 1,
                users_registered: 1,
                users_rejected: 3,
                orders_placed: 1,
                orders_rejected: 1,
            }
        );
        let stored = service.get("1").await.unwrap().unwrap();
        assert_eq!(stored.status(), UserStatus::Active);
        assert_eq!(service.orders("1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_empty_file() {
        let service = create_service();
        let file: ImportFile = serde_json::from_value(json!({})).unwrap();

        let summary = import(&service, file).await.unwrap();
        assert_eq!(summary, ImportSummary::default());
    }

    #[test]
    fn test_summary_display() {
        let summary = ImportSummary {
            users_registered: 2,
            ..ImportSummary::default()
        };
        assert!(summary.to_string().contains("users: 2 registered / 0 rejected"));
    }
}
