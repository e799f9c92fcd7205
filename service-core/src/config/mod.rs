use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

/// Settings shared by every service: where to listen.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Reads `configuration.*` (optional) and then the process environment,
    /// so `PORT=9000` overrides a file value.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .ignore_empty(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        if config.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }
        Ok(config)
    }
}
