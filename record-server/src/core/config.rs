use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::core::{Result, ServerError};

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | ./work_dir | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP port |
/// | DATABASE_FILE | records.redb | redb file, relative to WORK_DIR |
/// | LOG_LEVEL | info | Log level when RUST_LOG is unset |
/// | LOG_JSON | false | JSON log lines |
/// | ENVIRONMENT | development | development / staging / production |
/// | PROJECT_ID | unset | Required `X-Project-Id` when set |
/// | JWT_SECRET | generated | Token secret, at least 32 characters |
/// | JWT_EXPIRATION_MINUTES | 43200 | Token lifetime |
/// | JWT_ISSUER | record-server | Token issuer |
/// | JWT_AUDIENCE | cleanroom-forms | Token audience |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/forms HTTP_PORT=8080 cargo run -p record-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub database_file: String,
    pub log_level: String,
    pub log_json: bool,
    pub jwt: JwtConfig,
    /// development | staging | production
    pub environment: String,
    pub project_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Fails only when the JWT secret is unusable in production.
    pub fn from_env() -> Result<Self> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig::from_env(environment == "production")
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_file: std::env::var("DATABASE_FILE")
                .unwrap_or_else(|_| "records.redb".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            jwt,
            environment,
            project_id: std::env::var("PROJECT_ID").ok().filter(|p| !p.is_empty()),
        })
    }

    /// Configuration with explicit values, used by tests and embedded servers
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16, jwt: JwtConfig) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port,
            database_file: "records.redb".into(),
            log_level: "info".into(),
            log_json: false,
            jwt,
            environment: "development".into(),
            project_id: None,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.database_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_live_in_work_dir() {
        let config = Config::with_overrides("/srv/forms", 3000, JwtConfig::with_secret("s"));
        assert_eq!(config.database_path(), PathBuf::from("/srv/forms/records.redb"));
        assert_eq!(config.log_dir(), PathBuf::from("/srv/forms/logs"));
        assert!(!config.is_production());
    }
}
