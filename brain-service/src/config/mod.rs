use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct BrainConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub token: TokenConfig,
    pub bootstrap: BootstrapConfig,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Absent on instances that only validate tokens.
    pub private_key_path: Option<String>,
    pub public_key_path: String,
    pub login_expiry_minutes: i64,
    pub registration_expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// One-shot file holding the root user's initial password. Deleted
    /// once the root user is stored.
    pub root_password_file: Option<String>,
}

impl BrainConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let store: StoreBackend = get_env("STORE_BACKEND", Some("mongodb"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let needs_mongo = store == StoreBackend::Mongodb;

        let config = BrainConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("brain-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            store,
            mongodb: MongoConfig {
                uri: get_env(
                    "MONGODB_URI",
                    (!needs_mongo).then_some("mongodb://localhost:27017"),
                    is_prod && needs_mongo,
                )?,
                database: get_env("MONGODB_DATABASE", Some("brain"), is_prod && needs_mongo)?,
            },
            token: TokenConfig {
                private_key_path: env::var("TOKEN_PRIVATE_KEY_PATH")
                    .ok()
                    .filter(|s| !s.is_empty()),
                public_key_path: get_env("TOKEN_PUBLIC_KEY_PATH", None, is_prod)?,
                login_expiry_minutes: parse_minutes(get_env(
                    "LOGIN_TOKEN_EXPIRY_MINUTES",
                    Some("90"),
                    is_prod,
                )?)?,
                registration_expiry_minutes: parse_minutes(get_env(
                    "REGISTRATION_TOKEN_EXPIRY_MINUTES",
                    Some("90"),
                    is_prod,
                )?)?,
            },
            bootstrap: BootstrapConfig {
                root_password_file: env::var("ROOT_PASSWORD_FILE")
                    .ok()
                    .filter(|s| !s.is_empty()),
            },
            allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        check_expiry("LOGIN_TOKEN_EXPIRY_MINUTES", self.token.login_expiry_minutes)?;
        check_expiry(
            "REGISTRATION_TOKEN_EXPIRY_MINUTES",
            self.token.registration_expiry_minutes,
        )?;

        if self.environment == Environment::Prod {
            if self.store == StoreBackend::Memory {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "In-memory store not allowed in production"
                )));
            }

            if self.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

/// One year. Larger values overflow the token timestamp arithmetic.
const MAX_EXPIRY_MINUTES: i64 = 365 * 24 * 60;

fn check_expiry(key: &str, minutes: i64) -> Result<(), AppError> {
    if minutes <= 0 || minutes > MAX_EXPIRY_MINUTES {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be between 1 and {}",
            key,
            MAX_EXPIRY_MINUTES
        )));
    }
    Ok(())
}

fn parse_minutes(value: String) -> Result<i64, AppError> {
    value.parse().map_err(|e: std::num::ParseIntError| {
        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
    })
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

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" => Ok(StoreBackend::Mongodb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn store_backend_parses() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn minutes_must_be_numeric() {
        assert_eq!(parse_minutes("90".to_string()).unwrap(), 90);
        assert!(parse_minutes("ninety".to_string()).is_err());
    }

    #[test]
    fn expiry_must_be_positive_and_at_most_a_year() {
        assert!(check_expiry("LOGIN_TOKEN_EXPIRY_MINUTES", 90).is_ok());
        assert!(check_expiry("LOGIN_TOKEN_EXPIRY_MINUTES", MAX_EXPIRY_MINUTES).is_ok());
        for minutes in [0, -5, MAX_EXPIRY_MINUTES + 1, i64::MAX] {
            assert!(matches!(
                check_expiry("LOGIN_TOKEN_EXPIRY_MINUTES", minutes),
                Err(AppError::ConfigError(_))
            ));
        }
    }
}
