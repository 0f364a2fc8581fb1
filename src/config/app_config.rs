use serde::Deserialize;

use crate::domain::user::{DEFAULT_AREA_CODE, MAX_AREA_CODE_LENGTH};
use crate::domain::DomainError;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub registration: RegistrationConfig,
    pub password: PasswordConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    #[serde(rename = "type")]
    pub backend: String,
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Area code given to candidates that leave it out
    pub default_area_code: String,
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        let postgres = PostgresConfig::default();

        Self {
            backend: "memory".to_string(),
            url: None,
            max_connections: postgres.max_connections,
            min_connections: postgres.min_connections,
            connect_timeout_secs: postgres.connect_timeout_secs,
        }
    }
}

impl StorageSettings {
    /// Resolve the backend; PostgreSQL falls back to `DATABASE_URL` when no url is set
    pub fn resolve(&self) -> Result<StorageConfig, DomainError> {
        let backend = StorageType::parse(&self.backend).ok_or_else(|| {
            DomainError::configuration(format!("Unknown storage type '{}'", self.backend))
        })?;

        match backend {
            StorageType::InMemory => Ok(StorageConfig::in_memory()),
            StorageType::Postgres => {
                let url = self
                    .url
                    .clone()
                    .or_else(|| std::env::var("DATABASE_URL").ok())
                    .ok_or_else(|| {
                        DomainError::configuration(
                            "storage.url or DATABASE_URL is required for PostgreSQL storage",
                        )
                    })?;

                Ok(StorageConfig::postgres(
                    PostgresConfig::new(url)
                        .with_max_connections(self.max_connections)
                        .with_min_connections(self.min_connections)
                        .with_connect_timeout(self.connect_timeout_secs),
                ))
            }
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            default_area_code: DEFAULT_AREA_CODE.to_string(),
        }
    }
}

impl RegistrationConfig {
    /// The default area code must itself pass the area code rule
    pub fn validate(&self) -> Result<(), DomainError> {
        let area_code = self.default_area_code.trim();

        if area_code.is_empty() || area_code.chars().count() > MAX_AREA_CODE_LENGTH {
            return Err(DomainError::configuration(format!(
                "registration.default_area_code '{}' must be 1 to {} characters",
                self.default_area_code, MAX_AREA_CODE_LENGTH
            )));
        }

        Ok(())
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config
            .registration
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.registration.default_area_code, "57");
        assert_eq!(config.password.memory_kib, argon2::Params::DEFAULT_M_COST);
    }

    #[test]
    fn test_resolve_in_memory() {
        let storage = StorageSettings::default().resolve().unwrap();
        assert_eq!(storage.storage_type(), StorageType::InMemory);
    }

    #[test]
    fn test_resolve_postgres_with_url() {
        let settings = StorageSettings {
            backend: "postgres".to_string(),
            url: Some("postgres://localhost/users".to_string()),
            max_connections: 4,
            ..StorageSettings::default()
        };

        match settings.resolve().unwrap() {
            StorageConfig::Postgres(pg) => {
                assert_eq!(pg.url, "postgres://localhost/users");
                assert_eq!(pg.max_connections, 4);
            }
            other => panic!("expected postgres config, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unknown_backend() {
        let settings = StorageSettings {
            backend: "sqlite".to_string(),
            ..StorageSettings::default()
        };

        let error = settings.resolve().unwrap_err();
        assert!(matches!(error, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_default_area_code_limits() {
        let valid = RegistrationConfig {
            default_area_code: "12345".to_string(),
        };
        assert!(valid.validate().is_ok());
        assert!(RegistrationConfig::default().validate().is_ok());

        for bad in ["123456", "   "] {
            let config = RegistrationConfig {
                default_area_code: bad.to_string(),
            };
            let error = config.validate().unwrap_err();
            assert!(matches!(error, DomainError::Configuration { .. }));
        }
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: AppConfig = serde_json::from_str(
            r#"{"logging":{"format":"json"},"storage":{"type":"pg","url":"postgres://db/app"}}"#,
        )
        .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.backend, "pg");
        assert_eq!(config.registration.default_area_code, "57");
    }
}
