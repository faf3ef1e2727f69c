use chrono::Duration;
use std::{env, num::NonZeroU32, path::PathBuf, str::FromStr};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` through `dotenvy`).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Upper bound for `?limit=` on paginated lists.
    pub page_size_max: usize,
    pub bcrypt_cost: u32,
    /// Allowed calls per minute to the token endpoint, across all clients.
    pub token_rate_per_minute: NonZeroU32,
    pub max_body_bytes: usize,
    pub groups_file: Option<PathBuf>,
}

impl Config {
    /// Defaults for everything except the signing secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::minutes(1440),
            refresh_token_ttl: Duration::days(7),
            page_size_max: 100,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            token_rate_per_minute: NonZeroU32::new(30).unwrap_or(NonZeroU32::MIN),
            max_body_bytes: 5 * 1024 * 1024,
            groups_file: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        let defaults = Self::with_secret(jwt_secret);

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            access_token_ttl: Duration::minutes(parse_or("ACCESS_TOKEN_TTL_MINUTES", 1440)?),
            refresh_token_ttl: Duration::days(parse_or("REFRESH_TOKEN_TTL_DAYS", 7)?),
            page_size_max: parse_or("PAGE_SIZE_MAX", defaults.page_size_max)?,
            bcrypt_cost: parse_or("BCRYPT_COST", defaults.bcrypt_cost)?,
            token_rate_per_minute: parse_or("TOKEN_RATE_PER_MINUTE", defaults.token_rate_per_minute)?,
            max_body_bytes: parse_or("MAX_BODY_BYTES", defaults.max_body_bytes)?,
            groups_file: env::var_os("GROUPS_FILE").map(PathBuf::from),
            jwt_secret: defaults.jwt_secret,
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let value: usize = parse_or("YATUBE_TEST_SURELY_UNSET", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn defaults_are_sane() {
        let config = Config::with_secret("secret");
        assert_eq!(config.page_size_max, 100);
        assert!(config.refresh_token_ttl > config.access_token_ttl);
        assert!(config.groups_file.is_none());
    }
}
