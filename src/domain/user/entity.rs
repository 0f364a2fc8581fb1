//! User entity and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{
    is_valid_email, is_valid_postal_code, FieldError, FieldErrorKind, FieldErrors,
    MAX_ADDRESS_LENGTH, MAX_AREA_CODE_LENGTH, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH,
    MAX_PHONE_NUMBER_LENGTH,
};
use crate::domain::document_type::DocumentTypeId;
use crate::domain::role::RoleId;
use crate::domain::DomainError;

/// Area code assigned when none is given
pub const DEFAULT_AREA_CODE: &str = "57";

/// User identifier - the user's identification document number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, FieldError> {
        let id = id.into();
        let trimmed = id.trim();

        if trimmed.is_empty() {
            return Err(FieldError::required("id", "Identification number is required"));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Registered but not yet enabled
    #[default]
    Inactive,
    Active,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Active => "ACTIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INACTIVE" => Some(Self::Inactive),
            "ACTIVE" => Some(Self::Active),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated user record
///
/// Every path to a `User` goes through [`UserCandidate::validate`], deserialization
/// included, so every `User` satisfies the presence, format and length rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredUser")]
pub struct User {
    id: UserId,
    first_name: String,
    last_name: String,
    birthdate: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    postal_code: Option<String>,
    email: String,
    /// Password hash - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    area_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
    terms_and_conditions: bool,
    status: UserStatus,
    role_id: RoleId,
    document_type_id: DocumentTypeId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// First and last name joined by a space
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn birthdate(&self) -> NaiveDate {
        self.birthdate
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn area_code(&self) -> Option<&str> {
        self.area_code.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn terms_and_conditions(&self) -> bool {
        self.terms_and_conditions
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    pub fn document_type_id(&self) -> DocumentTypeId {
        self.document_type_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    // Mutators

    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.touch();
    }

    pub fn activate(&mut self) {
        self.set_status(UserStatus::Active);
    }

    pub fn deactivate(&mut self) {
        self.set_status(UserStatus::Inactive);
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = Some(password_hash.into());
        self.touch();
    }

    /// Apply a profile patch, re-running every field rule on the result.
    ///
    /// On failure the record is left untouched.
    pub fn apply_patch(&mut self, patch: UserPatch) -> Result<(), Vec<FieldError>> {
        let mut candidate = self.to_candidate();
        patch.apply_to(&mut candidate);

        let mut updated = candidate.validate()?;
        updated.password_hash = self.password_hash.take();
        updated.created_at = self.created_at;
        updated.touch();

        *self = updated;
        Ok(())
    }

    /// Convert back into an unvalidated candidate carrying the same values
    pub fn to_candidate(&self) -> UserCandidate {
        UserCandidate {
            id: Some(self.id.as_str().to_string()),
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            birthdate: Some(self.birthdate),
            address: self.address.clone(),
            postal_code: self.postal_code.clone(),
            email: Some(self.email.clone()),
            password: None,
            area_code: self.area_code.clone(),
            phone_number: self.phone_number.clone(),
            terms_and_conditions: Some(self.terms_and_conditions),
            status: Some(self.status),
            role_id: Some(self.role_id),
            document_type_id: Some(self.document_type_id),
        }
    }

    /// Restore persisted state that validation does not carry
    pub(crate) fn restore(
        mut self,
        password_hash: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        self.password_hash = password_hash;
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Serialized user shape; converted into a [`User`] only through validation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(flatten)]
    candidate: UserCandidate,
    #[serde(default)]
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoredUser> for User {
    type Error = DomainError;

    fn try_from(stored: StoredUser) -> Result<Self, Self::Error> {
        let user = stored
            .candidate
            .validate()
            .map_err(DomainError::invalid_fields)?;

        Ok(user.restore(stored.password_hash, stored.created_at, stored.updated_at))
    }
}

/// Unvalidated user input, as received from a registration form or import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserCandidate {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub email: Option<String>,
    /// Plain-text password; hashed by the service before it reaches a record
    pub password: Option<String>,
    pub area_code: Option<String>,
    pub phone_number: Option<String>,
    pub terms_and_conditions: Option<bool>,
    pub status: Option<UserStatus>,
    pub role_id: Option<RoleId>,
    pub document_type_id: Option<DocumentTypeId>,
}

impl UserCandidate {
    /// Fill the defaulted fields that are absent
    pub fn with_defaults(self) -> Self {
        self.with_default_area_code(DEFAULT_AREA_CODE)
    }

    /// Same as [`with_defaults`](Self::with_defaults) with a configured area code
    pub fn with_default_area_code(mut self, area_code: &str) -> Self {
        self.status.get_or_insert(UserStatus::Inactive);
        self.terms_and_conditions.get_or_insert(false);
        if non_blank(self.area_code.as_deref()).is_none() {
            self.area_code = Some(area_code.to_string());
        }
        self
    }

    /// Check presence, format and length rules.
    ///
    /// Every violated rule yields one error; uniqueness is not checked here.
    pub fn validate(&self) -> Result<User, Vec<FieldError>> {
        let mut errors = FieldErrors::default();

        let id = errors.require_text("id", self.id.as_deref(), "Identification number is required");

        let first_name =
            errors.require_text("firstName", self.first_name.as_deref(), "First name is required");
        errors.max_length("firstName", "First name", first_name, MAX_NAME_LENGTH);

        let last_name =
            errors.require_text("lastName", self.last_name.as_deref(), "Last name is required");
        errors.max_length("lastName", "Last name", last_name, MAX_NAME_LENGTH);

        let birthdate = errors.require("birthdate", self.birthdate, "Date of birth is required");

        let address = non_blank(self.address.as_deref());
        errors.max_length("address", "Address", address, MAX_ADDRESS_LENGTH);

        let postal_code = non_blank(self.postal_code.as_deref());
        if let Some(code) = postal_code {
            if !is_valid_postal_code(code) {
                errors.push(FieldError::new(
                    "postalCode",
                    FieldErrorKind::InvalidPostalCode,
                    "The postal code is not valid",
                ));
            }
        }

        let email = errors.require_text("email", self.email.as_deref(), "Email is required");
        if let Some(email) = email {
            if !is_valid_email(email.trim()) {
                errors.push(FieldError::new(
                    "email",
                    FieldErrorKind::InvalidEmail,
                    "The email is not valid",
                ));
            }
        }
        errors.max_length("email", "Email", email, MAX_EMAIL_LENGTH);

        let area_code = non_blank(self.area_code.as_deref());
        errors.max_length("areaCode", "Area code", area_code, MAX_AREA_CODE_LENGTH);

        let phone_number = non_blank(self.phone_number.as_deref());
        errors.max_length("phoneNumber", "Phone number", phone_number, MAX_PHONE_NUMBER_LENGTH);

        let status = errors.require("status", self.status, "The user status is required");
        let document_type_id = errors.require(
            "documentTypeId",
            self.document_type_id,
            "The type of document is required",
        );
        let role_id = errors.require("roleId", self.role_id, "The role is required");

        let errors = errors.into_vec();

        match (id, first_name, last_name, birthdate, email, status, role_id, document_type_id) {
            (
                Some(id),
                Some(first_name),
                Some(last_name),
                Some(birthdate),
                Some(email),
                Some(status),
                Some(role_id),
                Some(document_type_id),
            ) if errors.is_empty() => {
                let now = Utc::now();

                Ok(User {
                    id: UserId(id.trim().to_string()),
                    first_name: first_name.trim().to_string(),
                    last_name: last_name.trim().to_string(),
                    birthdate,
                    address: address.map(str::to_string),
                    postal_code: postal_code.map(|c| c.trim().to_string()),
                    email: email.trim().to_string(),
                    password_hash: None,
                    area_code: area_code.map(str::to_string),
                    phone_number: phone_number.map(str::to_string),
                    terms_and_conditions: self.terms_and_conditions.unwrap_or(false),
                    status,
                    role_id,
                    document_type_id,
                    created_at: now,
                    updated_at: now,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Changes to a user's profile; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub email: Option<String>,
    pub area_code: Option<String>,
    pub phone_number: Option<String>,
    pub terms_and_conditions: Option<bool>,
    pub role_id: Option<RoleId>,
    pub document_type_id: Option<DocumentTypeId>,
}

impl UserPatch {
    fn apply_to(self, candidate: &mut UserCandidate) {
        fn overlay<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        overlay(&mut candidate.first_name, self.first_name);
        overlay(&mut candidate.last_name, self.last_name);
        overlay(&mut candidate.birthdate, self.birthdate);
        overlay(&mut candidate.address, self.address);
        overlay(&mut candidate.postal_code, self.postal_code);
        overlay(&mut candidate.email, self.email);
        overlay(&mut candidate.area_code, self.area_code);
        overlay(&mut candidate.phone_number, self.phone_number);
        overlay(&mut candidate.terms_and_conditions, self.terms_and_conditions);
        overlay(&mut candidate.role_id, self.role_id);
        overlay(&mut candidate.document_type_id, self.document_type_id);
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
