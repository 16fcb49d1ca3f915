use std::{fmt, time::Duration};

const GOOGLE_BASE_URL: &str = "https://maps.googleapis.com";
const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_GEOCODE_CACHE_SIZE: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Provider secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub google_maps_api_key: ApiKey,
    pub weather_api_key: ApiKey,
    pub directions_base_url: String,
    pub geocode_base_url: String,
    pub weather_base_url: String,
    pub upstream_timeout: Duration,
    pub geocode_cache_size: usize,
}

impl GatewayConfig {
    /// Reads the gateway configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a provider key is missing or a numeric
    /// setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .map(ApiKey::new)
                .ok_or(ConfigError::Missing(name))
        };
        let base_url = |name: &str, default: &str| {
            lookup(name)
                .unwrap_or_else(|| default.to_string())
                .trim_end_matches('/')
                .to_string()
        };

        let upstream_timeout = parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let geocode_cache_size =
            parse_or(&lookup, "GEOCODE_CACHE_SIZE", DEFAULT_GEOCODE_CACHE_SIZE)?;

        Ok(Self {
            google_maps_api_key: required("GOOGLE_MAPS_API_KEY")?,
            weather_api_key: required("OPENWEATHER_API_KEY")?,
            directions_base_url: base_url("DIRECTIONS_BASE_URL", GOOGLE_BASE_URL),
            geocode_base_url: base_url("GEOCODE_BASE_URL", GOOGLE_BASE_URL),
            weather_base_url: base_url("WEATHER_BASE_URL", OPENWEATHER_BASE_URL),
            upstream_timeout: Duration::from_secs(upstream_timeout),
            geocode_cache_size,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
