use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub transport: TransportConfig,
    pub evaluation: EvaluationConfig,
    pub seed_fixtures: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

/// Simulated network behaviour of the mocked transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_path: String,
    pub latency: Duration,
    pub jitter: Duration,
    /// Probability in `[0, 1]` that a request fails transiently.
    pub failure_rate: f64,
}

impl TransportConfig {
    /// No latency, no faults.
    pub fn instant() -> Self {
        Self {
            base_path: "/api".to_string(),
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
            failure_rate: 0.0,
        }
    }
}

/// How role-typed policy links are attached to a user during evaluation.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleResolution {
    /// Every role link applies to every user, whatever roles they hold.
    #[default]
    All,
    /// Only links for roles the user holds in the subject directory apply.
    Membership,
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationConfig {
    pub role_resolution: RoleResolution,
}

impl AccessConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AccessConfig {
            log_level: get_env("LOG_LEVEL", Some(&common_config.log_level), is_prod)?,
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("access-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            transport: TransportConfig {
                base_path: get_env("TRANSPORT_BASE_PATH", Some("/api"), is_prod)?,
                latency: Duration::from_millis(
                    get_env("TRANSPORT_LATENCY_MS", Some("300"), is_prod)?
                        .parse()
                        .map_err(|e: std::num::ParseIntError| {
                            AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                        })?,
                ),
                jitter: Duration::from_millis(
                    get_env("TRANSPORT_JITTER_MS", Some("200"), is_prod)?
                        .parse()
                        .map_err(|e: std::num::ParseIntError| {
                            AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                        })?,
                ),
                failure_rate: get_env("TRANSPORT_FAILURE_RATE", Some("0.01"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseFloatError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            evaluation: EvaluationConfig {
                role_resolution: get_env("ROLE_RESOLUTION", Some("all"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            seed_fixtures: get_env("SEED_FIXTURES", Some("true"), is_prod)?
                .parse()
                .map_err(|e: std::str::ParseBoolError| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid SEED_FIXTURES: {}", e))
                })?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Zero-latency, fault-free configuration with the reference role
    /// resolution. Fixtures are not seeded.
    pub fn for_tests() -> Self {
        Self {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "access-service-test".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "debug".to_string(),
            transport: TransportConfig::instant(),
            evaluation: EvaluationConfig::default(),
            seed_fixtures: false,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..=1.0).contains(&self.transport.failure_rate) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TRANSPORT_FAILURE_RATE must be between 0 and 1"
            )));
        }

        if self.service_name.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SERVICE_NAME must not be empty"
            )));
        }

        if self.environment == Environment::Prod && self.transport.failure_rate > 0.0 {
            tracing::warn!(
                failure_rate = self.transport.failure_rate,
                "Simulated transport failures are enabled in production"
            );
        }

        Ok(())
    }
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

impl std::str::FromStr for RoleResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(RoleResolution::All),
            "membership" => Ok(RoleResolution::Membership),
            _ => Err(format!("Invalid role resolution: {}", s)),
        }
    }
}
