//! User domain
//!
//! The user record, its unvalidated input shapes, field validation, and the
//! repository trait for the storage collaborator.

mod entity;
mod password_change;
mod repository;
mod validation;

pub use entity::{User, UserCandidate, UserId, UserPatch, UserStatus, DEFAULT_AREA_CODE};
pub use password_change::PasswordChangeRequest;
pub use repository::UserRepository;
pub use validation::{
    is_valid_email, is_valid_postal_code, postal_code_locale, FieldError, FieldErrorKind,
    MAX_ADDRESS_LENGTH, MAX_AREA_CODE_LENGTH, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH,
    MAX_PHONE_NUMBER_LENGTH,
};

#[cfg(test)]
pub use repository::MockUserRepository;
