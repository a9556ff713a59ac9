use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::config::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum Provider {
    #[serde(rename = "supabase")]
    Supabase,
    #[serde(rename = "memory")]
    Memory,
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(Provider::Supabase),
            "memory" => Ok(Provider::Memory),
            other => Err(ConfigError::Invalid {
                key: "STORAGE_PROVIDER",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalConfig {
    pub provider: Provider,
    pub port: u16,
    #[serde(rename = "corsAllowedOrigins")]
    pub cors_allowed_origins: Option<Vec<String>>,
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
    #[serde(rename = "defaultFolder")]
    pub default_folder: String,
}
