use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::observability::LogFormat;
use std::env;

pub const DEFAULT_KRATOS_ADMIN_URL: &str = "http://localhost:4434";
pub const DEFAULT_KRATOS_PUBLIC_URL: &str = "http://localhost:4433";

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    #[serde(skip, default = "default_log_format")]
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
    pub auth: AuthConfig,
    pub kratos: KratosConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub admin_password: Secret<String>,
    pub jwt_secret: Secret<String>,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KratosConfig {
    pub admin_url: String,
    /// `None` when `KRATOS_PUBLIC_URL` is set to an empty string.
    pub public_url: Option<String>,
    /// Page size of the single large identity fetch used for paging and
    /// counting. Identity sets above this size are silently truncated.
    pub identity_fetch_cap: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

impl AdminConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let config = AdminConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("admin-service"))?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: get_env("LOG_LEVEL", Some("info"))?,
            log_format: get_env("LOG_FORMAT", Some("json"))?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            auth: AuthConfig {
                admin_password: Secret::new(get_required("ADMIN_PASSWORD")?),
                jwt_secret: Secret::new(get_required("JWT_SECRET")?),
                token_ttl_hours: parse_env("TOKEN_TTL_HOURS", "24")?,
            },
            kratos: KratosConfig {
                admin_url: normalize_url(&get_env(
                    "KRATOS_ADMIN_URL",
                    Some(DEFAULT_KRATOS_ADMIN_URL),
                )?),
                public_url: Some(normalize_url(&get_env(
                    "KRATOS_PUBLIC_URL",
                    Some(DEFAULT_KRATOS_PUBLIC_URL),
                )?))
                .filter(|url| !url.is_empty()),
                identity_fetch_cap: parse_env("IDENTITY_FETCH_CAP", "10000")?,
                timeout_seconds: parse_env("UPSTREAM_TIMEOUT_SECONDS", "30")?,
            },
            security: SecurityConfig {
                allowed_origins: parse_cors_origins(&env::var("CORS_ORIGINS").unwrap_or_default()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.admin_password.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ADMIN_PASSWORD environment variable is required"
            )));
        }

        if self.auth.jwt_secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET environment variable is required"
            )));
        }

        if self.auth.token_ttl_hours <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TOKEN_TTL_HOURS must be positive"
            )));
        }

        if self.kratos.identity_fetch_cap == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "IDENTITY_FETCH_CAP must be positive"
            )));
        }

        if self.kratos.timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "UPSTREAM_TIMEOUT_SECONDS must be positive"
            )));
        }

        if self.kratos.admin_url.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "KRATOS_ADMIN_URL must not be empty"
            )));
        }

        Ok(())
    }

    /// True when any origin is accepted (the request origin is mirrored back).
    pub fn allows_any_origin(&self) -> bool {
        self.security.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Splits a comma-separated origin list. An empty list means "any origin".
pub fn parse_cors_origins(origins: &str) -> Vec<String> {
    let parsed: Vec<String> = origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    if parsed.is_empty() {
        vec!["*".to_string()]
    } else {
        parsed
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

fn get_required(key: &str) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} environment variable is required",
            key
        ))),
    }
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default))?
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", key, e)))
}
