//! User Registry
//!
//! User records with field validation, uniqueness enforced by storage and
//! explicit service-level handling of roles, document types and orders:
//! - In-memory and PostgreSQL storage backends
//! - Argon2 password hashing
//! - CLI for validating candidates and importing seed data

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::storage::Storage;
use domain::{DocumentType, DomainError, Order, Role, UserRepository};
use infrastructure::storage::{connect_pool, StorageConfig, StorageFactory};
use infrastructure::user::{
    Argon2Hasher, DynUserService, InMemoryUserRepository, PasswordHasher, PostgresUserRepository,
    ReferenceStores, UserService,
};
use tracing::info;

/// Create the user service on the configured storage backend
pub async fn create_user_service(config: &AppConfig) -> Result<DynUserService, DomainError> {
    config.registration.validate()?;
    let storage = config.storage.resolve()?;
    info!("Storage backend: {:?}", storage.storage_type());

    let (repository, references): (Arc<dyn UserRepository>, ReferenceStores) = match storage {
        StorageConfig::InMemory => (
            Arc::new(InMemoryUserRepository::new()),
            ReferenceStores {
                roles: StorageFactory::create_in_memory(Vec::new()),
                document_types: StorageFactory::create_in_memory(Vec::new()),
                orders: StorageFactory::create_in_memory(Vec::new()),
            },
        ),
        StorageConfig::Postgres(pg_config) => {
            info!("Connecting to PostgreSQL...");
            let pool = connect_pool(&pg_config).await?;
            info!("PostgreSQL connection established");

            let repository = PostgresUserRepository::new(pool.clone());
            repository.ensure_schema().await?;

            let roles: Arc<dyn Storage<Role>> =
                StorageFactory::create_postgres_with_pool(pool.clone(), "roles").await?;
            let document_types: Arc<dyn Storage<DocumentType>> =
                StorageFactory::create_postgres_with_pool(pool.clone(), "document_types").await?;
            let orders: Arc<dyn Storage<Order>> =
                StorageFactory::create_postgres_with_pool(pool, "orders").await?;

            (
                Arc::new(repository),
                ReferenceStores {
                    roles,
                    document_types,
                    orders,
                },
            )
        }
    };

    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::with_params(
        config.password.memory_kib,
        config.password.iterations,
        config.password.parallelism,
    )?);

    Ok(UserService::new(repository, hasher, references)
        .with_default_area_code(config.registration.default_area_code.clone()))
}
