use rocket::Config as RocketConfig;
use rocket::figment::providers::{Env, Format, Serialized, Toml};
use rocket::figment::{Figment, Profile};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Plain environment variables understood in addition to `ROCKET_*`.
const ENV_KEYS: [&str; 9] = [
    "PORT",
    "MONGO_URI",
    "MONGO_DB",
    "JWT_SECRET",
    "JWT_EXPIRES_IN",
    "SEED_ADMIN_EMAIL",
    "SEED_ADMIN_PASSWORD",
    "SEED_ADMIN_NAME",
    "ADDRESS",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be read: {0}")]
    Extract(#[from] rocket::figment::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("JWT_EXPIRES_IN is not a duration: {0:?}")]
    Expiry(String),
}

#[derive(Debug, Serialize)]
struct Defaults {
    port: u16,
    mongo_db: &'static str,
    jwt_expires_in: &'static str,
    seed_admin_email: &'static str,
    seed_admin_password: &'static str,
    seed_admin_name: &'static str,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            port: 4000,
            mongo_db: "evently",
            jwt_expires_in: "7d",
            seed_admin_email: "admin@evently.local",
            seed_admin_password: "Admin@123456",
            seed_admin_name: "Evently Admin",
        }
    }
}

/// Application settings extracted from the same figment Rocket launches with.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[validate(length(min = 1))]
    pub mongo_uri: String,
    #[validate(length(min = 1))]
    pub mongo_db: String,
    #[validate(length(min = 10))]
    pub jwt_secret: String,
    pub jwt_expires_in: String,
    #[validate(email)]
    pub seed_admin_email: String,
    #[validate(length(min = 6))]
    pub seed_admin_password: String,
    #[validate(length(min = 2))]
    pub seed_admin_name: String,
    #[serde(skip)]
    jwt_ttl_secs: i64,
}

impl Config {
    pub fn figment() -> Figment {
        let profile = Profile::from_env_or("ROCKET_PROFILE", RocketConfig::DEFAULT_PROFILE);

        Figment::from(RocketConfig::default())
            .merge(Serialized::defaults(Defaults::default()))
            .merge(Toml::file(Env::var_or("ROCKET_CONFIG", "Rocket.toml")).nested())
            .merge(Env::prefixed("ROCKET_").ignore(&["PROFILE"]).global())
            .merge(Env::raw().only(&ENV_KEYS).global())
            .select(profile)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let mut config: Config = figment.extract()?;
        config.validate()?;
        config.jwt_ttl_secs = parse_duration(&config.jwt_expires_in)
            .ok_or_else(|| ConfigError::Expiry(config.jwt_expires_in.clone()))?;
        config.seed_admin_email = config.seed_admin_email.to_lowercase();
        Ok(config)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Lifetime of issued access tokens, in seconds.
    pub fn jwt_ttl_secs(&self) -> i64 {
        self.jwt_ttl_secs
    }
}

/// Parses `JWT_EXPIRES_IN` style durations: `"3600"`, `"45s"`, `"15m"`, `"12h"`, `"7d"`.
pub fn parse_duration(input: &str) -> Option<i64> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);
    let value: i64 = digits.parse().ok()?;

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };

    if value <= 0 {
        return None;
    }
    value.checked_mul(multiplier)
}
