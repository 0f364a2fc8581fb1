//! User infrastructure module
//!
//! In-memory and PostgreSQL user repositories, Argon2 password hashing and the
//! user service.

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::{DynUserService, ReferenceStores, UserService};
