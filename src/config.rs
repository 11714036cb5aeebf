// src/config.rs
// Process configuration, read from the environment (optionally seeded by a .env file).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v1beta";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1586769852044-692d6e3703a0?w=800&h=1200&fit=crop";
/// Upper bound for CACHE_TTL_HOURS (one year).
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 365;

/// Model identifiers, API version and time budgets used by the gateway.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_version: String,
    pub idea_model: String,
    pub strategy_model: String,
    pub image_model: String,
    pub text_timeout: Duration,
    pub image_timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            idea_model: "gemini-3-flash-preview".to_string(),
            strategy_model: "gemini-3-pro-preview".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            text_timeout: Duration::from_secs(30),
            image_timeout: Duration::from_secs(90),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent keys are tolerated at startup; every generation call then fails fast.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub models: ModelSettings,
    pub cache_ttl_hours: i64,
    pub cache_dir: Option<PathBuf>,
    pub placeholder_image_url: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub generation_rate_limit_per_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any name -> value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let gemini_api_key = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY"));

        let defaults = ModelSettings::default();
        let models = ModelSettings {
            api_version: get("GEMINI_API_VERSION").unwrap_or(defaults.api_version),
            idea_model: get("IDEA_MODEL").unwrap_or(defaults.idea_model),
            strategy_model: get("STRATEGY_MODEL").unwrap_or(defaults.strategy_model),
            image_model: get("IMAGE_MODEL").unwrap_or(defaults.image_model),
            text_timeout: Duration::from_secs(parse_or(
                "TEXT_TIMEOUT_SECS",
                get("TEXT_TIMEOUT_SECS"),
                defaults.text_timeout.as_secs(),
            )?),
            image_timeout: Duration::from_secs(parse_or(
                "IMAGE_TIMEOUT_SECS",
                get("IMAGE_TIMEOUT_SECS"),
                defaults.image_timeout.as_secs(),
            )?),
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing {
            name: "DATABASE_URL",
        })?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set, using an insecure development secret");
                "vira_express_dev_secret".to_string()
            }
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            models,
            cache_ttl_hours: parse_cache_ttl(get("CACHE_TTL_HOURS"))?,
            cache_dir: get("CACHE_DIR").map(PathBuf::from),
            placeholder_image_url: get("PLACEHOLDER_IMAGE_URL")
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER_IMAGE.to_string()),
            database_url,
            jwt_secret,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            generation_rate_limit_per_minute: parse_or(
                "GENERATION_RATE_LIMIT_PER_MINUTE",
                get("GENERATION_RATE_LIMIT_PER_MINUTE"),
                20,
            )?,
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_cache_ttl(raw: Option<String>) -> Result<i64, ConfigError> {
    let hours = parse_or("CACHE_TTL_HOURS", raw.clone(), 24)?;
    if (1..=MAX_CACHE_TTL_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(ConfigError::Invalid {
            name: "CACHE_TTL_HOURS",
            value: raw.unwrap_or_default(),
        })
    }
}
