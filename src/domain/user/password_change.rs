//! Password change input

use serde::{Deserialize, Serialize};

use super::validation::{FieldError, FieldErrorKind, FieldErrors};

/// New password typed twice; only ever validated, never stored as-is
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordChangeRequest {
    pub password: String,
    pub repeat_password: String,
}

impl std::fmt::Debug for PasswordChangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordChangeRequest")
            .field("password", &"[redacted]")
            .field("repeat_password", &"[redacted]")
            .finish()
    }
}

impl PasswordChangeRequest {
    pub fn new(password: impl Into<String>, repeat_password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            repeat_password: repeat_password.into(),
        }
    }

    /// Both fields are required and must match
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::default();

        let password =
            errors.require_text("password", Some(self.password.as_str()), "The password is required");
        let repeat = errors.require_text(
            "repeatPassword",
            Some(self.repeat_password.as_str()),
            "Repeat password is required",
        );

        // Compared untrimmed: the stored hash is of the exact password
        if password.is_some() && repeat.is_some() && self.password != self.repeat_password {
            errors.push(FieldError::new(
                "repeatPassword",
                FieldErrorKind::Mismatch,
                "Passwords do not match",
            ));
        }

        errors.into_result()
    }
}
