//! Domain layer - entities, validation rules and storage traits

pub mod document_type;
pub mod error;
pub mod order;
pub mod role;
pub mod storage;
pub mod user;

pub use document_type::{DocumentType, DocumentTypeId};
pub use error::DomainError;
pub use order::{Order, OrderId};
pub use role::{Role, RoleId};
pub use storage::{Storage, StorageEntity, StorageKey};
pub use user::{
    FieldError, FieldErrorKind, PasswordChangeRequest, User, UserCandidate, UserId, UserPatch,
    UserRepository, UserStatus,
};
