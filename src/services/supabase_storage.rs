use async_trait::async_trait;
use reqwest::{multipart, Client, Url};
use serde::Serialize;
use tracing::debug;

use crate::{
    application::{error::ApplicationError, services::StorageService},
    domain::{
        config::secrets::SupabaseSecrets,
        models::file::{FileData, StorageEntry},
    },
    services::error::StorageError,
};

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

pub struct SupabaseStorageService {
    client: Client,
    storage_url: String,
    api_key: String,
    bucket_name: String,
}

impl SupabaseStorageService {
    pub fn new(secrets: SupabaseSecrets, bucket_name: String) -> Self {
        Self {
            client: Client::new(),
            storage_url: secrets.storage_url.trim_end_matches('/').to_string(),
            api_key: secrets.api_key,
            bucket_name,
        }
    }

    /// `{storage_url}/{prefix...}/{bucket}/{path...}` with every segment
    /// percent-encoded.
    fn object_url(&self, prefix: &[&str], path: &str) -> String {
        let plain = format!(
            "{}/{}/{}/{}",
            self.storage_url,
            prefix.join("/"),
            self.bucket_name,
            path
        );

        let Ok(mut url) = Url::parse(&self.storage_url) else {
            return plain;
        };

        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments
                    .pop_if_empty()
                    .extend(prefix.iter().copied())
                    .push(&self.bucket_name)
                    .extend(path.split('/').filter(|s| !s.is_empty()));
            }
            Err(_) => return plain,
        }

        url.to_string()
    }
}

#[async_trait]
impl StorageService for SupabaseStorageService {
    fn provider(&self) -> &'static str {
        "supabase"
    }

    async fn upload(&self, path: &str, file_data: &FileData) -> Result<(), ApplicationError> {
        let file_part = multipart::Part::bytes(file_data.content.clone())
            .file_name(file_data.filename.clone())
            .mime_str(&file_data.mime_type)
            .map_err(|e| StorageError::InternalError(e.to_string()))?;

        let form = multipart::Form::new().part("file", file_part);

        let url = self.object_url(&["object"], path);
        debug!("Uploading {} bytes to {}", file_data.size(), url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(StorageError::from)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(
                StorageError::ProviderError(format!("Upload failed: {}", error_text)).into(),
            );
        }

        Ok(())
    }

    async fn list(
        &self,
        folder: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StorageEntry>, ApplicationError> {
        let url = self.object_url(&["object", "list"], "");

        let body = ListRequest {
            prefix: folder,
            limit,
            offset,
            sort_by: SortBy {
                column: "name",
                order: "asc",
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(StorageError::from)?;

        if response.status().as_u16() == 401 || response.status().as_u16() == 403 {
            return Err(StorageError::Unauthorized(format!(
                "List rejected with status: {}",
                response.status()
            ))
            .into());
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(
                StorageError::ProviderError(format!("List failed: {}", error_text)).into(),
            );
        }

        let entries: Vec<StorageEntry> = response
            .json()
            .await
            .map_err(|e| StorageError::ProviderError(e.to_string()))?;

        Ok(entries)
    }

    fn public_url(&self, path: &str) -> String {
        self.object_url(&["object", "public"], path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SupabaseStorageService {
        SupabaseStorageService::new(
            SupabaseSecrets {
                storage_url: "https://abc.supabase.co/storage/v1/".to_string(),
                api_key: "anon".to_string(),
            },
            "media".to_string(),
        )
    }

    #[test]
    fn public_url_points_at_the_public_bucket() {
        assert_eq!(
            service().public_url("uploads/1700000000000_cat.png"),
            "https://abc.supabase.co/storage/v1/object/public/media/uploads/1700000000000_cat.png"
        );
    }

    #[test]
    fn public_url_encodes_segments() {
        assert_eq!(
            service().public_url("uploads/old file#1.csv"),
            "https://abc.supabase.co/storage/v1/object/public/media/uploads/old%20file%231.csv"
        );
    }

    #[test]
    fn list_url_encodes_the_bucket() {
        let service = SupabaseStorageService::new(
            SupabaseSecrets {
                storage_url: "https://abc.supabase.co/storage/v1".to_string(),
                api_key: "anon".to_string(),
            },
            "team data".to_string(),
        );
        assert_eq!(
            service.object_url(&["object", "list"], ""),
            "https://abc.supabase.co/storage/v1/object/list/team%20data"
        );
    }

    #[test]
    fn list_request_serializes_like_the_storage_api() {
        let body = ListRequest {
            prefix: "uploads",
            limit: 100,
            offset: 200,
            sort_by: SortBy {
                column: "name",
                order: "asc",
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "prefix": "uploads",
                "limit": 100,
                "offset": 200,
                "sortBy": {"column": "name", "order": "asc"}
            })
        );
    }
}
