use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::models::{file::FileData, upload::RejectionReason};

pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub const DEFAULT_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/jpg",
    "application/json",
    "text/csv",
];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GlobalConfig {
    #[serde(rename = "mimeTypes")]
    pub mime_types: Vec<String>,
    #[serde(rename = "maxSize")]
    pub max_size: u64,
    #[serde(rename = "maxAttempts")]
    pub max_attempts: u32,
    #[serde(rename = "retryDelayMs")]
    pub retry_delay_ms: u64,
    /// `None` dispatches every candidate at once.
    #[serde(rename = "uploadConcurrency")]
    pub upload_concurrency: Option<usize>,
    #[serde(rename = "uniqueSuffix")]
    pub unique_suffix: bool,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    #[serde(rename = "maxBatchFiles")]
    pub max_batch_files: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            mime_types: DEFAULT_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_size: DEFAULT_MAX_SIZE,
            max_attempts: 3,
            retry_delay_ms: 1000,
            upload_concurrency: None,
            unique_suffix: false,
            page_size: 100,
            max_batch_files: 50,
        }
    }
}

impl GlobalConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Largest request body the upload route accepts, with headroom for
    /// multipart framing.
    pub fn body_limit(&self) -> usize {
        let per_file = usize::try_from(self.max_size).unwrap_or(usize::MAX);
        per_file
            .saturating_mul(self.max_batch_files.max(1))
            .saturating_add(MULTIPART_OVERHEAD)
    }

    /// Checks a candidate against the type list and size ceiling.
    pub fn admit(&self, file: &FileData) -> Result<(), RejectionReason> {
        if !self
            .mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&file.mime_type))
        {
            return Err(RejectionReason::UnsupportedType {
                allowed: self.mime_types.join(", "),
            });
        }

        if !file.validate_size(self.max_size) {
            return Err(RejectionReason::TooLarge { max: self.max_size });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: usize) -> FileData {
        FileData::new(vec![0; size], name.to_string(), mime.to_string())
    }

    #[test]
    fn admits_listed_types_up_to_the_ceiling() {
        let config = GlobalConfig::default();
        assert!(config.admit(&file("a.jpg", "image/jpg", 10)).is_ok());
        assert!(config.admit(&file("a.csv", "text/csv", DEFAULT_MAX_SIZE as usize)).is_ok());
    }

    #[test]
    fn rejects_oversize_and_unlisted_types() {
        let config = GlobalConfig::default();
        assert_eq!(
            config.admit(&file("big.png", "image/png", DEFAULT_MAX_SIZE as usize + 1)),
            Err(RejectionReason::TooLarge {
                max: DEFAULT_MAX_SIZE
            })
        );
        assert!(matches!(
            config.admit(&file("anim.gif", "image/gif", 10)),
            Err(RejectionReason::UnsupportedType { .. })
        ));
    }

    #[test]
    fn body_limit_covers_a_full_batch() {
        let config = GlobalConfig {
            max_batch_files: 4,
            ..Default::default()
        };
        assert_eq!(
            config.body_limit(),
            4 * DEFAULT_MAX_SIZE as usize + MULTIPART_OVERHEAD
        );
    }
}
