use serde::{Deserialize, Serialize};

use crate::{
    application::services::{FileListing, UploadProgress},
    domain::models::{
        file::{ContentCategory, StoredFile},
        upload::{BatchReport, UploadOutcome},
    },
};

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub folder: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcomeResponse {
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
        error: String,
    },
}

impl From<UploadOutcome> for UploadOutcomeResponse {
    fn from(outcome: UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Uploaded {
                name,
                path,
                url,
                attempts,
            } => Self::Uploaded {
                name,
                path,
                url,
                attempts,
            },
            UploadOutcome::Failed {
                name,
                error,
                attempts,
            } => Self::Failed {
                name,
                error,
                attempts,
            },
            UploadOutcome::Rejected { name, reason } => Self::Rejected {
                name,
                error: reason.to_string(),
            },
        }
    }
}

/// Admitted files only; rejected ones never count toward `total`.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub uploaded: usize,
    pub total: usize,
}

impl From<&UploadProgress> for ProgressResponse {
    fn from(progress: &UploadProgress) -> Self {
        Self {
            uploaded: progress.succeeded(),
            total: progress.total(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadBatchResponse {
    pub folder: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rejected: usize,
    pub message: String,
    pub progress: ProgressResponse,
    pub files: Vec<UploadOutcomeResponse>,
}

impl UploadBatchResponse {
    pub fn new(folder: String, report: BatchReport, progress: &UploadProgress) -> Self {
        Self {
            folder,
            total: report.outcomes.len(),
            succeeded: report.succeeded,
            failed: report.failed,
            rejected: report.rejected,
            message: report.message,
            progress: progress.into(),
            files: report.outcomes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub name: String,
    pub url: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub category: ContentCategory,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl From<StoredFile> for FileResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            name: file.name,
            url: file.url,
            size: file.size,
            category: file.category,
            mime_type: file.mime_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub folder: String,
    #[serde(rename = "fileCount")]
    pub file_count: usize,
    #[serde(rename = "totalSize")]
    pub total_size: u64,
    #[serde(rename = "totalSizeDisplay")]
    pub total_size_display: String,
    pub files: Vec<FileResponse>,
}

impl From<FileListing> for FileListResponse {
    fn from(listing: FileListing) -> Self {
        Self {
            folder: listing.folder,
            file_count: listing.summary.file_count,
            total_size: listing.summary.total_size,
            total_size_display: listing.summary.total_size_display(),
            files: listing.files.into_iter().map(FileResponse::from).collect(),
        }
    }
}
