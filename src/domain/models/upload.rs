use thiserror::Error;

use crate::domain::models::gallery::format_bytes;

/// Why a candidate was refused before any upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("File is larger than {max} bytes")]
    TooLarge { max: u64 },
    #[error("File type must be one of {allowed}")]
    UnsupportedType { allowed: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded {
        name: String,
        path: String,
        url: String,
        attempts: u32,
    },
    Failed {
        name: String,
        error: String,
        attempts: u32,
    },
    Rejected {
        name: String,
        reason: RejectionReason,
    },
}

impl UploadOutcome {
    pub fn name(&self) -> &str {
        match self {
            UploadOutcome::Uploaded { name, .. }
            | UploadOutcome::Failed { name, .. }
            | UploadOutcome::Rejected { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// One outcome per submitted file, in submission order.
    pub outcomes: Vec<UploadOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub rejected: usize,
    pub message: String,
}

impl BatchReport {
    pub fn new(outcomes: Vec<UploadOutcome>, max_size: u64) -> Self {
        let mut succeeded = 0;
        let mut failed = 0;
        let mut rejected = 0;
        let mut failures = Vec::new();

        for outcome in &outcomes {
            match outcome {
                UploadOutcome::Uploaded { .. } => succeeded += 1,
                UploadOutcome::Failed { error, .. } => {
                    failed += 1;
                    failures.push(format!("Failed to upload {}: {}", outcome.name(), error));
                }
                UploadOutcome::Rejected { .. } => rejected += 1,
            }
        }

        let message = if failed == 0 && rejected == 0 {
            "All files uploaded successfully!".to_string()
        } else {
            let mut lines = Vec::with_capacity(failures.len() + 1);
            if rejected > 0 {
                lines.push(format!(
                    "Some files were rejected due to unsupported type or exceeding {}.",
                    format_bytes(max_size)
                ));
            }
            lines.extend(failures);
            lines.join("\n")
        };

        Self {
            outcomes,
            succeeded,
            failed,
            rejected,
            message,
        }
    }
}
