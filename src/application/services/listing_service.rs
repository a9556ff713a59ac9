use std::sync::Arc;

use tracing::{error, info};

use crate::{
    application::{error::ApplicationError, services::StorageService},
    domain::models::{file::StoredFile, gallery::GallerySummary},
};

#[derive(Debug, Clone, PartialEq)]
pub struct FileListing {
    pub folder: String,
    pub files: Vec<StoredFile>,
    pub summary: GallerySummary,
}

pub struct ListingService {
    storage: Arc<dyn StorageService>,
    page_size: usize,
}

impl ListingService {
    pub fn new(storage: Arc<dyn StorageService>, page_size: usize) -> Self {
        Self {
            storage,
            page_size: page_size.max(1),
        }
    }

    /// Every entry under `folder`, in backend order. Pages are fetched one
    /// after another; the first failing page fails the whole listing.
    pub async fn fetch_files(&self, folder: &str) -> Result<Vec<StoredFile>, ApplicationError> {
        let mut files = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .storage
                .list(folder, self.page_size, offset)
                .await
                .map_err(|e| {
                    error!("Listing '{}' failed at offset {}: {}", folder, offset, e);
                    e
                })?;

            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            files.extend(page.into_iter().map(|entry| {
                let url = self.storage.public_url(&format!("{}/{}", folder, entry.name));
                StoredFile::from_entry(entry, url)
            }));

            if page_len < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        info!("Listed {} file(s) under '{}'", files.len(), folder);
        Ok(files)
    }

    pub async fn listing(&self, folder: &str) -> Result<FileListing, ApplicationError> {
        let files = self.fetch_files(folder).await?;
        let summary = GallerySummary::of(&files);

        Ok(FileListing {
            folder: folder.to_string(),
            files,
            summary,
        })
    }
}
