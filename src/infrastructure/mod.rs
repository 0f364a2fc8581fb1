//! Infrastructure layer - storage backends, password hashing and services

pub mod logging;
pub mod storage;
pub mod user;
