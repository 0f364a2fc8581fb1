use thiserror::Error;

use crate::domain::user::FieldError;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation failed: {}", join_field_errors(.errors))]
    InvalidFields { errors: Vec<FieldError> },

    #[error("Invalid ID format: {message}")]
    InvalidId { message: String },

    #[error("Duplicate key: {field} '{value}' already exists")]
    DuplicateKey { field: String, value: String },

    #[error("Reference not found: {entity} '{id}' does not exist")]
    ReferenceNotFound { entity: String, id: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_fields(errors: Vec<FieldError>) -> Self {
        Self::InvalidFields { errors }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    pub fn duplicate_key(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::DuplicateKey {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn reference_not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::ReferenceNotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Field errors carried by a validation failure, if any
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::InvalidFields { errors } => Some(errors),
            _ => None,
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    pub fn is_reference_not_found(&self) -> bool {
        matches!(self, Self::ReferenceNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::FieldErrorKind;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("User '1020' not found");
        assert_eq!(error.to_string(), "Not found: User '1020' not found");
    }

    #[test]
    fn test_duplicate_key_error() {
        let error = DomainError::duplicate_key("email", "ana@example.com");
        assert_eq!(
            error.to_string(),
            "Duplicate key: email 'ana@example.com' already exists"
        );
        assert!(error.is_duplicate_key());
        assert!(!error.is_reference_not_found());
    }

    #[test]
    fn test_reference_not_found_error() {
        let error = DomainError::reference_not_found("role", 7);
        assert_eq!(
            error.to_string(),
            "Reference not found: role '7' does not exist"
        );
        assert!(error.is_reference_not_found());
    }

    #[test]
    fn test_invalid_fields_error() {
        let error = DomainError::invalid_fields(vec![
            FieldError::new("firstName", FieldErrorKind::Required, "First name is required"),
            FieldError::new("email", FieldErrorKind::InvalidEmail, "The email is not valid"),
        ]);

        assert_eq!(
            error.to_string(),
            "Validation failed: firstName: First name is required; email: The email is not valid"
        );
        assert_eq!(error.field_errors().map(|e| e.len()), Some(2));
    }
}
