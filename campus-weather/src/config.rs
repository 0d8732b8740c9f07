use std::env;

pub const DEFAULT_USER_AGENT: &str = concat!("campus-weather/", env!("CARGO_PKG_VERSION"));

pub struct Config {
    pub port: u16,
    pub weather_api_url: String,
    pub user_agent: String,
    pub icon_storage_url: String,
    pub cache_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
    pub http_max_retries: u32,
    pub dedupe_in_flight: bool,
    pub max_in_flight: usize,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parsed("PORT").unwrap_or(3002),
            weather_api_url: env::var("WEATHER_API_URL").unwrap_or_else(|_| {
                "https://api.met.no/weatherapi/locationforecast/2.0/compact".to_string()
            }),
            // MET Norway rejects requests without an identifying User-Agent
            user_agent: env::var("WEATHER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            icon_storage_url: env::var("ICON_STORAGE_URL")
                .unwrap_or_else(|_| "http://localhost:9000/weather-icons".to_string()),
            cache_ttl_seconds: parsed("CACHE_TTL_SECONDS").unwrap_or(900), // 15 minutes
            http_timeout_seconds: parsed("HTTP_TIMEOUT_SECONDS").unwrap_or(10),
            http_max_retries: parsed("HTTP_MAX_RETRIES").unwrap_or(0),
            dedupe_in_flight: parsed("DEDUPE_IN_FLIGHT").unwrap_or(true),
            max_in_flight: parsed("MAX_IN_FLIGHT").unwrap_or(4),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
