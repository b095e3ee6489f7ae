use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub request_timeout: Duration,
    pub transaction_timeout: Duration,
    /// Seeded on start-up when both are set
    pub admin_credentials: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = get("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let admin_credentials = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://natec.db?mode=rwc".to_string()),
            port: parse_or(&get, "PORT", 5000)?,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(Vec::new),
            jwt_secret,
            jwt_ttl_hours: parse_or(&get, "JWT_TTL_HOURS", 24)?,
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?),
            transaction_timeout: Duration::from_secs(parse_or(
                &get,
                "TRANSACTION_TIMEOUT_SECS",
                10,
            )?),
            admin_credentials,
        })
    }

    /// Defaults with the given signing secret, for tests and tooling
    pub fn with_secret(secret: &str) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 5000,
            cors_allowed_origins: Vec::new(),
            jwt_secret: secret.to_string(),
            jwt_ttl_hours: 24,
            request_timeout: Duration::from_secs(30),
            transaction_timeout: Duration::from_secs(10),
            admin_credentials: None,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn missing_secret_fails() {
        let err = Config::from_lookup(lookup(&[])).err();
        assert_eq!(err, Some(ConfigError::Missing("JWT_SECRET")));

        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "  ")])).err();
        assert_eq!(err, Some(ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.database_url, "sqlite://natec.db?mode=rwc");
        assert_eq!(config.transaction_timeout, Duration::from_secs(10));
        assert!(config.admin_credentials.is_none());
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("PORT", "eighty")])).err();
        assert!(matches!(err, Some(ConfigError::Invalid { name: "PORT", .. })));
    }

    #[test]
    fn origins_and_admin_seed_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD", "pw"),
        ]))
        .unwrap();
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert_eq!(
            config.admin_credentials,
            Some(("root".to_string(), "pw".to_string()))
        );
    }
}
