//! Settings - environment-driven configuration loaded once at startup.

use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

pub const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported JWT_ALGORITHM '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("JWT_SECRET must be set to a secure, unique value in production")]
    InsecureSecret,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_secs: u64,

    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_expiration_hours: i64,

    pub admin_username: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,

    pub cors_origins: Vec<String>,
    pub environment: String,

    pub static_dir: PathBuf,
    pub frontend_dir: PathBuf,
    pub max_upload_bytes: usize,

    pub azure_connection_string: Option<String>,
    pub azure_container: String,

    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Read settings from the process environment (after `.env` was loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let algorithm_name = get("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string());
        let jwt_algorithm = parse_hmac_algorithm(&algorithm_name)?;

        let settings = Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://wedding.db?mode=rwc".to_string()),
            db_max_connections: parsed(&get, "DB_POOL_MAX").unwrap_or(5),
            db_connect_timeout_secs: parsed(&get, "DB_CONNECT_TIMEOUT").unwrap_or(10),

            jwt_secret: get("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            jwt_algorithm,
            jwt_expiration_hours: parsed(&get, "JWT_EXPIRATION_HOURS").unwrap_or(24),

            admin_username: get("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            admin_password: get("ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            bcrypt_cost: parsed(&get, "BCRYPT_COST").unwrap_or(bcrypt::DEFAULT_COST),

            cors_origins: get("CORS_ORIGINS")
                .map(|raw| parse_origin_list(&raw))
                .filter(|origins| !origins.is_empty())
                .unwrap_or_else(|| {
                    vec![
                        "http://localhost:5173".to_string(),
                        "http://localhost:3000".to_string(),
                    ]
                }),
            environment: get("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()),

            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static/uploads")),
            frontend_dir: get("FRONTEND_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("frontend/dist")),
            max_upload_bytes: parsed(&get, "MAX_UPLOAD_BYTES").unwrap_or(10 * 1024 * 1024),

            azure_connection_string: get("AZURE_STORAGE_CONNECTION_STRING"),
            azure_container: get("AZURE_STORAGE_CONTAINER")
                .unwrap_or_else(|| "uploads".to_string()),

            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&get, "PORT").unwrap_or(8000),
        };

        Ok(settings)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Refuse insecure defaults in production; warn about the weaker ones.
    pub fn check_production_safety(&self) -> Result<(), ConfigError> {
        if !self.is_production() {
            return Ok(());
        }
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::InsecureSecret);
        }
        if self.admin_password == DEFAULT_ADMIN_PASSWORD {
            tracing::warn!(
                "SECURITY: ADMIN_PASSWORD is using the insecure default. \
                 Set ADMIN_PASSWORD before exposing the admin panel."
            );
        }
        Ok(())
    }
}

/// Numeric values that fail to parse count as unset.
fn parsed<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|v| v.trim().parse().ok())
}

fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// Accepts either `a,b,c` or a JSON array of strings.
fn parse_origin_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
            return list;
        }
    }
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.admin_username, "admin");
        assert_eq!(settings.jwt_algorithm, Algorithm::HS256);
        assert_eq!(settings.jwt_expiration_hours, 24);
        assert_eq!(settings.static_dir, PathBuf::from("static/uploads"));
        assert_eq!(settings.cors_origins.len(), 2);
        assert!(settings.azure_connection_string.is_none());
        assert_eq!(settings.port, 8000);
    }

    #[test]
    fn test_cors_origins_accept_csv_and_json() {
        let csv = settings_from(&[("CORS_ORIGINS", "https://a.com, https://b.com")]).unwrap();
        assert_eq!(csv.cors_origins, vec!["https://a.com", "https://b.com"]);

        let json = settings_from(&[("CORS_ORIGINS", r#"["https://c.com"]"#)]).unwrap();
        assert_eq!(json.cors_origins, vec!["https://c.com"]);
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let settings = settings_from(&[("PORT", "not-a-port"), ("JWT_EXPIRATION_HOURS", "")])
            .unwrap();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.jwt_expiration_hours, 24);
    }

    #[test]
    fn test_numbers_parse_into_each_field_type() {
        let settings = settings_from(&[
            ("DB_POOL_MAX", "7"),
            ("DB_CONNECT_TIMEOUT", " 3 "),
            ("JWT_EXPIRATION_HOURS", "48"),
            ("BCRYPT_COST", "4"),
            ("MAX_UPLOAD_BYTES", "2048"),
            ("PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(settings.db_max_connections, 7);
        assert_eq!(settings.db_connect_timeout_secs, 3);
        assert_eq!(settings.jwt_expiration_hours, 48);
        assert_eq!(settings.bcrypt_cost, 4);
        assert_eq!(settings.max_upload_bytes, 2048);
        assert_eq!(settings.port, 9090);
    }

    #[test]
    fn test_rejects_non_hmac_algorithm() {
        let result = settings_from(&[("JWT_ALGORITHM", "RS256")]);
        assert!(matches!(result, Err(ConfigError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_production_refuses_default_secret() {
        let settings = settings_from(&[("ENVIRONMENT", "production")]).unwrap();
        assert!(matches!(
            settings.check_production_safety(),
            Err(ConfigError::InsecureSecret)
        ));

        let settings = settings_from(&[
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "a-long-random-secret"),
        ])
        .unwrap();
        assert!(settings.check_production_safety().is_ok());
    }
}
