use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::SqliteConnectOptions;

use crate::auth::REFRESH_TOKEN_TTL_DAYS;
use crate::error::ConfigError;

/// Signing secret used when nothing else is configured. Fine for local runs only.
pub const DEFAULT_JWT_SECRET: &str = "super-secret-change-me";

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
/// Access tokens must expire before refresh tokens do.
const MAX_ACCESS_TOKEN_MINUTES: i64 = REFRESH_TOKEN_TTL_DAYS * 24 * 60 - 1;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub password: PasswordSettings,
    pub log: LogSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    /// SQLite file path, or `:memory:` for a throwaway database
    pub path: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            max_connections: 1,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    pub fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        if self.is_in_memory() {
            return SqliteConnectOptions::from_str("sqlite::memory:");
        }

        Ok(SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true))
    }

    /// Directory that must exist before a file database can be created
    pub fn parent_dir(&self) -> Option<&Path> {
        if self.is_in_memory() {
            return None;
        }
        Path::new(&self.path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry_minutes: i64,
}

#[derive(serde::Deserialize, Clone)]
pub struct PasswordSettings {
    /// bcrypt work factor
    pub hash_cost: u32,
}

#[derive(serde::Deserialize, Clone)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    pub json: bool,
}

impl Settings {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }

        if self.jwt.access_token_expiry_minutes <= 0 {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.access_token_expiry_minutes must be positive, got {}",
                self.jwt.access_token_expiry_minutes
            )));
        }

        if self.jwt.access_token_expiry_minutes > MAX_ACCESS_TOKEN_MINUTES {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.access_token_expiry_minutes must be below the {}-day refresh lifetime, got {}",
                REFRESH_TOKEN_TTL_DAYS, self.jwt.access_token_expiry_minutes
            )));
        }

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.password.hash_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "password.hash_cost must be between {} and {}, got {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST, self.password.hash_cost
            )));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt.secret == DEFAULT_JWT_SECRET
    }
}

/// Load settings from defaults, an optional `configuration` file, and the environment
///
/// Precedence (highest last): built-in defaults, `configuration.{yaml,toml,json}`,
/// `APP__SECTION__KEY` variables, then `PORT`, `DB_PATH` and `JWT_SECRET`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("database.path", "./database/auth.db")?
        .set_default("database.max_connections", 5)?
        .set_default("jwt.secret", DEFAULT_JWT_SECRET)?
        .set_default("jwt.access_token_expiry_minutes", 60)?
        .set_default("password.hash_cost", i64::from(bcrypt::DEFAULT_COST))?
        .set_default("log.level", "info")?
        .set_default("log.json", true)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .set_override_option("application.port", std::env::var("PORT").ok())?
        .set_override_option("database.path", std::env::var("DB_PATH").ok())?
        .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings {
            application: ApplicationSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseSettings::in_memory(),
            jwt: JwtSettings {
                secret: "test-secret".to_string(),
                access_token_expiry_minutes: 60,
            },
            password: PasswordSettings { hash_cost: 12 },
            log: LogSettings {
                level: "info".to_string(),
                json: true,
            },
        }
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut settings = valid_settings();
        settings.jwt.secret = "  ".to_string();

        assert_eq!(
            settings.validate(),
            Err(ConfigError::MissingRequired("jwt.secret".to_string()))
        );
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut settings = valid_settings();
        settings.jwt.access_token_expiry_minutes = 0;

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_access_ttl_must_stay_below_refresh_ttl() {
        let mut settings = valid_settings();

        settings.jwt.access_token_expiry_minutes = MAX_ACCESS_TOKEN_MINUTES;
        assert!(settings.validate().is_ok());

        settings.jwt.access_token_expiry_minutes = REFRESH_TOKEN_TTL_DAYS * 24 * 60;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue(_))
        ));

        settings.jwt.access_token_expiry_minutes = i64::MAX / 2;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_hash_cost_bounds() {
        let mut settings = valid_settings();
        settings.password.hash_cost = 3;
        assert!(settings.validate().is_err());

        settings.password.hash_cost = 32;
        assert!(settings.validate().is_err());

        settings.password.hash_cost = 4;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_default_secret_detected() {
        let mut settings = valid_settings();
        assert!(!settings.uses_default_secret());

        settings.jwt.secret = DEFAULT_JWT_SECRET.to_string();
        assert!(settings.uses_default_secret());
    }

    #[test]
    fn test_database_parent_dir() {
        let file = DatabaseSettings {
            path: "./database/auth.db".to_string(),
            max_connections: 5,
        };
        assert_eq!(file.parent_dir(), Some(Path::new("./database")));

        let bare = DatabaseSettings {
            path: "auth.db".to_string(),
            max_connections: 5,
        };
        assert_eq!(bare.parent_dir(), None);

        assert_eq!(DatabaseSettings::in_memory().parent_dir(), None);
    }

    #[test]
    fn test_address() {
        assert_eq!(valid_settings().application.address(), "127.0.0.1:8080");
    }
}
