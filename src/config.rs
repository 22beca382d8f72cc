use anyhow::Result;
use chrono::{FixedOffset, Offset, Utc};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub inmet_feed_url: String,
    pub backend_base_url: String,
    pub backend_token: Option<String>,
    pub ibge_municipios_url: String,
    pub nominatim_url: String,
    pub geocoding_enabled: bool,
    pub geocode_cache_capacity: usize,
    pub geocode_cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    pub feed_utc_offset_hours: i32,
    pub bind_addr: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let inmet_feed_url = env::var("INMET_FEED_URL")
            .unwrap_or_else(|_| "https://apiprevmet3.inmet.gov.br/avisos/ativos".to_string());
        let backend_base_url = env::var("BACKEND_BASE_URL")
            .unwrap_or_else(|_| "https://safeflood-api-java.onrender.com".to_string());
        let backend_token = env::var("BACKEND_TOKEN").ok().filter(|t| !t.trim().is_empty());
        let ibge_municipios_url = env::var("IBGE_MUNICIPIOS_URL").unwrap_or_else(|_| {
            "https://servicodados.ibge.gov.br/api/v1/localidades/municipios".to_string()
        });
        let nominatim_url = env::var("NOMINATIM_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org/search".to_string());

        let geocoding_enabled = parse_or("GEOCODING_ENABLED", false);
        let geocode_cache_capacity = parse_or("GEOCODE_CACHE_CAPACITY", 1024);
        let geocode_cache_ttl_secs = parse_or("GEOCODE_CACHE_TTL_SECS", 86_400);
        let http_timeout_secs = parse_or("HTTP_TIMEOUT_SECS", 30);
        let refresh_interval_secs = parse_or("REFRESH_INTERVAL_SECS", 300);
        let feed_utc_offset_hours = parse_or("FEED_UTC_OFFSET_HOURS", -3);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            inmet_feed_url,
            backend_base_url,
            backend_token,
            ibge_municipios_url,
            nominatim_url,
            geocoding_enabled,
            geocode_cache_capacity,
            geocode_cache_ttl_secs,
            http_timeout_secs,
            refresh_interval_secs,
            feed_utc_offset_hours,
            bind_addr,
            log_level,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        // A zero interval would make tokio's interval panic.
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn geocode_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.geocode_cache_ttl_secs)
    }

    /// Offset used for feed timestamps that carry no zone designator.
    pub fn feed_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.feed_utc_offset_hours.saturating_mul(3600))
            .or_else(|| FixedOffset::west_opt(3 * 3600))
            .unwrap_or(Utc.fix())
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            inmet_feed_url: String::new(),
            backend_base_url: String::new(),
            backend_token: None,
            ibge_municipios_url: String::new(),
            nominatim_url: String::new(),
            geocoding_enabled: false,
            geocode_cache_capacity: 8,
            geocode_cache_ttl_secs: 60,
            http_timeout_secs: 30,
            refresh_interval_secs: 0,
            feed_utc_offset_hours: -3,
            bind_addr: String::new(),
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn zero_refresh_interval_is_clamped() {
        assert_eq!(sample().refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn out_of_range_offset_falls_back_to_brasilia() {
        let mut config = sample();
        config.feed_utc_offset_hours = 99;
        assert_eq!(config.feed_offset().local_minus_utc(), -3 * 3600);

        config.feed_utc_offset_hours = 0;
        assert_eq!(config.feed_offset().local_minus_utc(), 0);
    }

    #[test]
    fn unparsable_values_use_default() {
        assert_eq!(parse_or("SAFEFLOOD_TEST_UNSET_KEY", 42u64), 42);
    }
}
