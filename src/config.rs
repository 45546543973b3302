use crate::error::{Error, Result};
use crate::utils::time::LifecycleWindows;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub default_url_host: String,
    pub site_name: String,
    pub time_multiplier: f64,
    pub bitly_access_token: Option<String>,
    pub bitly_api_url: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

const DEFAULT_BITLY_API_URL: &str = "https://api-ssl.bitly.com/v4/shorten";

/// Upper bound keeps a 28 day expiry window well inside chrono's date range.
pub const MAX_TIME_MULTIPLIER: f64 = 1000.0;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let time_multiplier = parse_time_multiplier(env::var("TIME_MULTIPLIER").ok().as_deref())?;

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            default_url_host: get_env("DEFAULT_URL_HOST")?,
            site_name: get_env("SITE_NAME")?,
            time_multiplier,
            bitly_access_token: env::var("BITLY_ACCESS_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            bitly_api_url: env::var("BITLY_API_URL")
                .unwrap_or_else(|_| DEFAULT_BITLY_API_URL.to_string()),
        })
    }

    pub fn lifecycle_windows(&self) -> LifecycleWindows {
        LifecycleWindows::new(self.time_multiplier)
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn parse_time_multiplier(raw: Option<&str>) -> Result<f64> {
    let Some(raw) = raw else {
        return Ok(1.0);
    };
    let multiplier: f64 = raw
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for TIME_MULTIPLIER: {}", e)))?;
    if !multiplier.is_finite() || multiplier <= 0.0 || multiplier > MAX_TIME_MULTIPLIER {
        return Err(Error::Config(format!(
            "TIME_MULTIPLIER must be in (0, {}], got {}",
            MAX_TIME_MULTIPLIER, raw
        )));
    }
    Ok(multiplier)
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
