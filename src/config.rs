//! Environment configuration

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("AUTH_JWT_SECRET must be set when DATABASE_URL is configured")]
    MissingJwtSecret,
}

/// Signing secret used in development mode when none is configured.
pub const DEV_JWT_SECRET: &str = "shoppak-dev-secret";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub nats_url: Option<String>,
    pub jwt_secret: String,
    pub media_dir: String,
    pub media_base_url: String,
    pub payment_step_delay: Duration,
    pub payment_success_rate: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        fn parse<T: std::str::FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
            match raw.filter(|v| !v.trim().is_empty()) {
                Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { name, value: v }),
                None => Ok(default),
            }
        }

        let database_url = get("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let jwt_secret = match (get("AUTH_JWT_SECRET").filter(|v| !v.is_empty()), &database_url) {
            (Some(secret), _) => secret,
            (None, None) => DEV_JWT_SECRET.to_string(),
            (None, Some(_)) => return Err(ConfigError::MissingJwtSecret),
        };
        let rate: f64 = parse("PAYMENT_SUCCESS_RATE", get("PAYMENT_SUCCESS_RATE"), 0.9)?;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::Invalid { name: "PAYMENT_SUCCESS_RATE", value: rate.to_string() });
        }

        Ok(Self {
            port: parse("PORT", get("PORT"), 8083)?,
            database_url,
            db_max_connections: parse("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 10)?,
            nats_url: get("NATS_URL").filter(|v| !v.trim().is_empty()),
            jwt_secret,
            media_dir: get("MEDIA_DIR").unwrap_or_else(|| "./media".into()),
            media_base_url: get("MEDIA_BASE_URL").unwrap_or_else(|| "/media".into()).trim_end_matches('/').to_string(),
            payment_step_delay: Duration::from_millis(parse("PAYMENT_STEP_DELAY_MS", get("PAYMENT_STEP_DELAY_MS"), 1000)?),
            payment_success_rate: rate,
        })
    }

    pub fn is_development(&self) -> bool { self.database_url.is_none() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.port, 8083);
        assert!(c.is_development());
        assert_eq!(c.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(c.payment_step_delay, Duration::from_secs(1));
        assert_eq!(c.payment_success_rate, 0.9);
        assert_eq!(c.media_base_url, "/media");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(ConfigError::Invalid { name: "PORT", .. })));
        assert!(matches!(config(&[("PAYMENT_SUCCESS_RATE", "1.5")]), Err(ConfigError::Invalid { .. })));
        assert!(matches!(config(&[("DATABASE_URL", "postgres://x")]), Err(ConfigError::MissingJwtSecret)));
    }

    #[test]
    fn test_hosted_mode() {
        let c = config(&[("DATABASE_URL", "postgres://x"), ("AUTH_JWT_SECRET", "s3cret"), ("PAYMENT_STEP_DELAY_MS", "0")]).unwrap();
        assert!(!c.is_development());
        assert_eq!(c.payment_step_delay, Duration::ZERO);
    }
}
