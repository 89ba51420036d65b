//! Runtime configuration from environment variables.
//!
//! Provider credentials are only ever read from the environment; a missing
//! key disables the feature that needs it instead of failing startup.

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_SEGMENTS: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub user_agent: String,
    pub provider_timeout: Duration,
    pub max_segments: usize,
    pub store_dir: PathBuf,
    pub store_scope: String,

    pub geocoder_url: String,
    pub ors_url: String,
    pub ors_api_key: Option<String>,
    pub osrm_url: String,

    pub weather_url: String,
    pub weather_api_key: Option<String>,
    pub traffic_url: String,
    pub traffic_api_key: Option<String>,

    pub news_url: String,
    pub news_api_key: Option<String>,

    pub search_url: String,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub chat_url: String,
    pub chat_api_key: Option<String>,
    pub chat_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            user_agent: format!("awas/{}", env!("CARGO_PKG_VERSION")),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            max_segments: DEFAULT_MAX_SEGMENTS,
            store_dir: PathBuf::from("data/store"),
            store_scope: "protestCopilot".to_string(),
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            ors_url: "https://api.openrouteservice.org".to_string(),
            ors_api_key: None,
            osrm_url: "https://router.project-osrm.org".to_string(),
            weather_url: "https://api.openweathermap.org".to_string(),
            weather_api_key: None,
            traffic_url: "https://api.tomtom.com".to_string(),
            traffic_api_key: None,
            news_url: "https://newsapi.org".to_string(),
            news_api_key: None,
            search_url: "https://www.googleapis.com".to_string(),
            search_api_key: None,
            search_engine_id: None,
            chat_url: "https://api.openai.com".to_string(),
            chat_api_key: None,
            chat_model: "gpt-3.5-turbo".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: parse_var("AWAS_BIND", DEFAULT_BIND)?,
            user_agent: env_or("AWAS_USER_AGENT", defaults.user_agent),
            provider_timeout: Duration::from_secs(parse_var(
                "AWAS_PROVIDER_TIMEOUT_SECS",
                &DEFAULT_PROVIDER_TIMEOUT_SECS.to_string(),
            )?),
            max_segments: parse_var("AWAS_MAX_SEGMENTS", &DEFAULT_MAX_SEGMENTS.to_string())?,
            store_dir: env_opt("AWAS_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            store_scope: env_or("AWAS_STORE_SCOPE", defaults.store_scope),
            geocoder_url: env_or("GEOCODER_URL", defaults.geocoder_url),
            ors_url: env_or("ORS_URL", defaults.ors_url),
            ors_api_key: env_opt("ORS_API_KEY"),
            osrm_url: env_or("OSRM_URL", defaults.osrm_url),
            weather_url: env_or("WEATHER_URL", defaults.weather_url),
            weather_api_key: env_opt("OPENWEATHER_API_KEY"),
            traffic_url: env_or("TRAFFIC_URL", defaults.traffic_url),
            traffic_api_key: env_opt("TOMTOM_API_KEY"),
            news_url: env_or("NEWS_URL", defaults.news_url),
            news_api_key: env_opt("NEWS_API_KEY"),
            search_url: env_or("SEARCH_URL", defaults.search_url),
            search_api_key: env_opt("SEARCH_API_KEY"),
            search_engine_id: env_opt("SEARCH_ENGINE_ID"),
            chat_url: env_or("CHAT_URL", defaults.chat_url),
            chat_api_key: env_opt("CHAT_API_KEY"),
            chat_model: env_or("CHAT_MODEL", defaults.chat_model),
        })
    }
}

/// Unset and blank variables are both treated as absent.
fn env_opt(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(var: &str, default: String) -> String {
    env_opt(var).unwrap_or(default)
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env_opt(var).unwrap_or_else(|| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}
