//! PostgreSQL user repository implementation

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::user::{User, UserCandidate, UserId, UserRepository, UserStatus};
use crate::domain::{DocumentTypeId, DomainError, RoleId};

const EMAIL_INDEX: &str = "idx_user_email";

const USER_COLUMNS: &str = "id, first_name, last_name, birthdate, address, postal_code, email, \
     password, area_code, phone_number, terms_and_conditions, status, role_id, \
     document_type_id, created_at, updated_at";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table and its unique email index if missing
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                first_name VARCHAR(50) NOT NULL,
                last_name VARCHAR(50) NOT NULL,
                birthdate DATE NOT NULL,
                address VARCHAR(50),
                postal_code VARCHAR(50),
                email VARCHAR(50) NOT NULL,
                password TEXT,
                area_code VARCHAR(5) DEFAULT '57',
                phone_number VARCHAR(20),
                terms_and_conditions BOOLEAN NOT NULL DEFAULT FALSE,
                status TEXT NOT NULL DEFAULT 'INACTIVE'
                    CHECK (status IN ('INACTIVE', 'ACTIVE')),
                role_id INTEGER NOT NULL,
                document_type_id INTEGER NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create users table: {}", e)))?;

        let index = format!("CREATE UNIQUE INDEX IF NOT EXISTS {} ON users (email)", EMAIL_INDEX);

        sqlx::query(&index)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create email index: {}", e)))?;

        Ok(())
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.fetch_one_by("id", id.as_str()).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.fetch_one_by("email", email).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, birthdate, address, postal_code,
                               email, password, area_code, phone_number, terms_and_conditions,
                               status, role_id, document_type_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(user.id().as_str())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.birthdate())
        .bind(user.address())
        .bind(user.postal_code())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.area_code())
        .bind(user.phone_number())
        .bind(user.terms_and_conditions())
        .bind(user.status().as_str())
        .bind(user.role_id().value())
        .bind(user.document_type_id().value())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user, "create"))?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, birthdate = $4, address = $5,
                postal_code = $6, email = $7, password = $8, area_code = $9,
                phone_number = $10, terms_and_conditions = $11, status = $12,
                role_id = $13, document_type_id = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_str())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.birthdate())
        .bind(user.address())
        .bind(user.postal_code())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.area_code())
        .bind(user.phone_number())
        .bind(user.terms_and_conditions())
        .bind(user.status().as_str())
        .bind(user.role_id().value())
        .bind(user.document_type_id().value())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, user, "update"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        }

        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, status: Option<UserStatus>) -> Result<Vec<User>, DomainError> {
        let rows = match status {
            Some(s) => {
                let query = format!(
                    "SELECT {} FROM users WHERE status = $1 ORDER BY created_at, id",
                    USER_COLUMNS
                );

                sqlx::query(&query)
                    .bind(s.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!("SELECT {} FROM users ORDER BY created_at, id", USER_COLUMNS);

                sqlx::query(&query).fetch_all(&self.pool).await
            }
        }
        .map_err(|e| DomainError::storage(format!("Failed to list users: {}", e)))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn count(&self, status: Option<UserStatus>) -> Result<usize, DomainError> {
        let count: i64 = match status {
            Some(s) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status = $1")
                    .bind(s.as_str())
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| DomainError::storage(format!("Failed to count users: {}", e)))?;

        Ok(count as usize)
    }
}

/// Map a failed insert/update to `DuplicateKey` when a unique constraint fired
fn map_write_error(error: sqlx::Error, user: &User, action: &str) -> DomainError {
    let constraint = error
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .map(|db| db.constraint().unwrap_or_default().to_string());

    match constraint {
        Some(name) => duplicate_for_constraint(&name, user),
        None => DomainError::storage(format!("Failed to {} user: {}", action, error)),
    }
}

fn duplicate_for_constraint(constraint: &str, user: &User) -> DomainError {
    if constraint == EMAIL_INDEX {
        DomainError::duplicate_key("email", user.email())
    } else {
        DomainError::duplicate_key("id", user.id().as_str())
    }
}

fn row_to_user(row: &PgRow) -> Result<User, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Failed to read user row: {}", e));

    let status: String = row.try_get("status").map_err(read)?;
    let password: Option<String> = row.try_get("password").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(read)?;
    let role_id: i32 = row.try_get("role_id").map_err(read)?;
    let document_type_id: i32 = row.try_get("document_type_id").map_err(read)?;
    let birthdate: NaiveDate = row.try_get("birthdate").map_err(read)?;

    let candidate = UserCandidate {
        id: Some(row.try_get("id").map_err(read)?),
        first_name: Some(row.try_get("first_name").map_err(read)?),
        last_name: Some(row.try_get("last_name").map_err(read)?),
        birthdate: Some(birthdate),
        address: row.try_get("address").map_err(read)?,
        postal_code: row.try_get("postal_code").map_err(read)?,
        email: Some(row.try_get("email").map_err(read)?),
        password: None,
        area_code: row.try_get("area_code").map_err(read)?,
        phone_number: row.try_get("phone_number").map_err(read)?,
        terms_and_conditions: Some(row.try_get("terms_and_conditions").map_err(read)?),
        status: UserStatus::parse(&status),
        role_id: Some(RoleId::new(role_id)),
        document_type_id: Some(DocumentTypeId::new(document_type_id)),
    };

    let user = candidate.validate().map_err(|errors| {
        DomainError::storage(format!(
            "Stored user violates field rules: {}",
            DomainError::invalid_fields(errors)
        ))
    })?;

    Ok(user.restore(password, created_at, updated_at))
}
