use anyhow::{anyhow, Result};
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub notifications_collection: String,
    pub vehicles_collection: String,
    pub visitors_collection: String,
    pub requests_collection: String,
    pub residents_collection: String,
    pub avatar_key_prefix: String,
    pub upload_max_bytes: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            notifications_collection: env_or("NOTIFICATIONS_COLLECTION", "notifications"),
            vehicles_collection: env_or("VEHICLES_COLLECTION", "vehicles"),
            visitors_collection: env_or("VISITORS_COLLECTION", "visitors"),
            requests_collection: env_or("REQUESTS_COLLECTION", "requests"),
            residents_collection: env_or("RESIDENTS_COLLECTION", "residents"),
            avatar_key_prefix: env_or("AVATAR_KEY_PREFIX", "avatars"),
            upload_max_bytes: env_or_parse("UPLOAD_MAX_BYTES", "10485760")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
