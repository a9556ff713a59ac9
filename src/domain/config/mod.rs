pub mod global;
pub mod local;
pub mod secrets;

use std::str::FromStr;

use thiserror::Error;

use crate::application::services::normalize_folder;
use global::GlobalConfig;
use local::{LocalConfig, Provider};
use secrets::{Secrets, SupabaseSecrets};

pub const DEFAULT_FOLDER: &str = "uploads";
pub const DEFAULT_BUCKET: &str = "media";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub local: LocalConfig,
    pub global: GlobalConfig,
    pub secrets: Secrets,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = GlobalConfig::default();

        let provider = match get("STORAGE_PROVIDER") {
            Some(value) => value.parse::<Provider>()?,
            None => Provider::Supabase,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let default_folder = match get("UPLOAD_FOLDER") {
            Some(folder) => normalize_folder(&folder).map_err(|_| ConfigError::Invalid {
                key: "UPLOAD_FOLDER",
                value: folder.clone(),
            })?,
            None => DEFAULT_FOLDER.to_string(),
        };

        let local = LocalConfig {
            provider,
            port: parse_or(&get, "PORT", 8080)?,
            cors_allowed_origins,
            bucket_name: get("SUPABASE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            default_folder,
        };

        let mime_types = match get("UPLOAD_MIME_TYPES") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.mime_types.clone(),
        };

        let upload_concurrency = match get("UPLOAD_CONCURRENCY") {
            Some(value) => Some(positive(&value, "UPLOAD_CONCURRENCY")?),
            None => None,
        };

        let global = GlobalConfig {
            mime_types,
            max_size: parse_or(&get, "UPLOAD_MAX_SIZE", defaults.max_size)?,
            max_attempts: match get("UPLOAD_MAX_ATTEMPTS") {
                Some(value) => positive(&value, "UPLOAD_MAX_ATTEMPTS")?,
                None => defaults.max_attempts,
            },
            retry_delay_ms: parse_or(&get, "UPLOAD_RETRY_DELAY_MS", defaults.retry_delay_ms)?,
            upload_concurrency,
            unique_suffix: parse_or(&get, "UPLOAD_UNIQUE_SUFFIX", defaults.unique_suffix)?,
            page_size: match get("LIST_PAGE_SIZE") {
                Some(value) => positive(&value, "LIST_PAGE_SIZE")?,
                None => defaults.page_size,
            },
            max_batch_files: match get("MAX_BATCH_FILES") {
                Some(value) => positive(&value, "MAX_BATCH_FILES")?,
                None => defaults.max_batch_files,
            },
        };

        let supabase_secrets = match provider {
            Provider::Supabase => Some(SupabaseSecrets {
                storage_url: get("SUPABASE_STORAGE_URL")
                    .ok_or(ConfigError::Missing("SUPABASE_STORAGE_URL"))?,
                api_key: get("SUPABASE_API_KEY").ok_or(ConfigError::Missing("SUPABASE_API_KEY"))?,
            }),
            Provider::Memory => None,
        };

        Ok(Self {
            local,
            global,
            secrets: Secrets { supabase_secrets },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: value.clone(),
        }),
        None => Ok(default),
    }
}

fn positive<T>(value: &str, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed != T::default() => Ok(parsed),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
