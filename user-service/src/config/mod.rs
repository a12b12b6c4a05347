use jsonwebtoken::Algorithm;
use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug)]
pub struct UserServiceConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub security: SecurityConfig,
    pub onboarding: OnboardingConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[derive(Debug)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug)]
pub struct JwtConfig {
    pub secret_key: SecretString,
    pub algorithm: Algorithm,
    pub access_token_expiry_minutes: i64,
}

impl JwtConfig {
    /// Refresh tokens live twice as long as access tokens.
    pub fn refresh_token_expiry_minutes(&self) -> i64 {
        self.access_token_expiry_minutes * 2
    }
}

#[derive(Debug)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

/// Settings for the email OTP flows and the links they send out.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    pub otp_expiry_minutes: i64,
    pub company_name: String,
    pub frontend_url: String,
}

impl UserServiceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = UserServiceConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("user-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: SecretString::new(database_url(is_prod)?),
                max_connections: parse_env("DB_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DB_MIN_CONNECTIONS", "1", is_prod)?,
                acquire_timeout_seconds: parse_env("DB_ACQUIRE_TIMEOUT_SECONDS", "5", is_prod)?,
            },
            jwt: JwtConfig {
                secret_key: SecretString::new(get_env("SECRET_KEY", None, is_prod)?),
                algorithm: parse_algorithm(&get_env("ALGORITHM", Some("HS256"), is_prod)?)?,
                access_token_expiry_minutes: parse_env(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    "1440",
                    is_prod,
                )?,
            },
            email: EmailConfig {
                host: get_env("EMAIL_HOST", Some("localhost"), is_prod)?,
                port: parse_env("EMAIL_PORT", "587", is_prod)?,
                username: get_env("EMAIL_USERNAME", Some(""), is_prod)?,
                password: SecretString::new(get_env("EMAIL_PASSWORD", Some(""), is_prod)?),
                from_email: get_env("EMAIL_FROM", Some("no-reply@localhost"), is_prod)?,
                from_name: get_env("EMAIL_FROM_NAME", Some("User CRUD"), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: split_list(&get_env(
                    "CORS_ALLOW_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?),
                allowed_methods: split_list(&get_env("CORS_ALLOW_METHODS", Some("*"), is_prod)?),
                allowed_headers: split_list(&get_env("CORS_ALLOW_HEADERS", Some("*"), is_prod)?),
            },
            onboarding: OnboardingConfig {
                otp_expiry_minutes: parse_env("OTP_CODE_EXPIRY_MINUTES", "5", is_prod)?,
                company_name: get_env("COMPANY_NAME", Some("User CRUD"), is_prod)?,
                frontend_url: get_env("FRONTEND_URL", Some("http://localhost:3000"), is_prod)?
                    .trim_end_matches('/')
                    .to_string(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.access_token_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be positive"
            )));
        }

        if self.onboarding.otp_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "OTP_CODE_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.jwt.secret_key.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SECRET_KEY must not be empty"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the individual
/// `DATABASE`/`DB_*` parts.
fn database_url(is_prod: bool) -> Result<String, AppError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Ok(url);
    }

    let scheme = get_env("DATABASE", Some("postgresql"), is_prod)?;
    let username = get_env("DB_USERNAME", Some("postgres"), is_prod)?;
    let password = get_env("DB_PASSWORD", Some("postgres"), is_prod)?;
    let host = get_env("DB_HOST", Some("localhost"), is_prod)?;
    let port = get_env("DB_PORT", Some("5432"), is_prod)?;
    let name = get_env("DB_NAME", Some("user_crud"), is_prod)?;

    Ok(format!(
        "{}://{}:{}@{}:{}/{}",
        scheme, username, password, host, port, name
    ))
}

pub fn parse_algorithm(value: &str) -> Result<Algorithm, AppError> {
    let algorithm = Algorithm::from_str(value.trim())
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid ALGORITHM: {}", e)))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "ALGORITHM must be an HMAC algorithm, got {:?}",
            other
        ))),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}
