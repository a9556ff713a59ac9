use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use crate::{
    adapters::{
        dto::file_dto::{FileListResponse, FolderQuery, UploadBatchResponse},
        state::AppState,
    },
    application::{
        error::ApplicationError,
        services::{normalize_folder, UploadProgress},
    },
    domain::models::file::FileData,
};

const FILE_FIELDS: [&str; 2] = ["file", "files"];
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub struct FileController;

impl FileController {
    fn resolve_folder(
        app_state: &AppState,
        query: FolderQuery,
    ) -> Result<String, ApplicationError> {
        match query.folder {
            Some(folder) => normalize_folder(&folder),
            None => Ok(app_state.local_config.default_folder.clone()),
        }
    }

    /// POST /api/v1/files?folder=uploads
    /// Every `file` part of the multipart body is one upload candidate.
    pub async fn upload_files(
        State(app_state): State<AppState>,
        Query(query): Query<FolderQuery>,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<(StatusCode, Json<UploadBatchResponse>), ApplicationError> {
        let mut multipart = multipart.map_err(|rejection| {
            warn!("Upload request is not multipart: {}", rejection.body_text());
            ApplicationError::UnsupportedMediaType(rejection.body_text())
        })?;

        let folder = Self::resolve_folder(&app_state, query)?;
        let mut candidates = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            warn!("Invalid multipart data: {}", e);
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApplicationError::PayloadTooLarge
            } else {
                ApplicationError::BadRequest("Invalid request format".to_string())
            }
        })? {
            let name = field.name().unwrap_or("").to_string();
            if !FILE_FIELDS.contains(&name.as_str()) {
                continue;
            }

            let filename = field
                .file_name()
                .map(|f| f.to_string())
                .filter(|f| !f.trim().is_empty())
                .ok_or_else(|| {
                    warn!("File part without a filename");
                    ApplicationError::BadRequest("Every file needs a filename".to_string())
                })?;
            let mime_type = field
                .content_type()
                .unwrap_or(FALLBACK_MIME_TYPE)
                .to_ascii_lowercase();

            let content = field.bytes().await.map_err(|e| {
                warn!("Cannot read bytes of {}: {}", filename, e);
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApplicationError::PayloadTooLarge
                } else {
                    ApplicationError::BadRequest("Invalid file data".to_string())
                }
            })?;

            candidates.push(FileData::new(content.to_vec(), filename, mime_type));
        }

        info!(
            "Received {} file(s) for folder '{}'",
            candidates.len(),
            folder
        );

        let progress = UploadProgress::default();
        let report = app_state
            .upload_service
            .upload_batch(&folder, candidates, &progress)
            .await?;

        Ok((
            StatusCode::OK,
            Json(UploadBatchResponse::new(folder, report, &progress)),
        ))
    }

    /// GET /api/v1/files?folder=uploads
    pub async fn list_files(
        State(app_state): State<AppState>,
        Query(query): Query<FolderQuery>,
    ) -> Result<Json<FileListResponse>, ApplicationError> {
        let folder = Self::resolve_folder(&app_state, query)?;
        info!("Listing files under '{}'", folder);

        let listing = app_state.listing_service.listing(&folder).await?;
        Ok(Json(FileListResponse::from(listing)))
    }
}
