use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_defaults() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe { std::env::remove_var("APP__LOG_LEVEL") };
        let config = Config::load().unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        // SAFETY: serialized with the other env-mutating tests.
        unsafe { std::env::set_var("APP__LOG_LEVEL", "debug") };
        let config = Config::load().unwrap();
        unsafe { std::env::remove_var("APP__LOG_LEVEL") };
        assert_eq!(config.log_level, "debug");
    }
}
