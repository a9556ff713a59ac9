use async_trait::async_trait;

use crate::{
    application::error::ApplicationError,
    domain::models::file::{FileData, StorageEntry},
};

#[async_trait]
pub trait StorageService: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Writes `file_data` at `path` inside the bucket.
    async fn upload(&self, path: &str, file_data: &FileData) -> Result<(), ApplicationError>;

    /// One page of the entries directly under `folder`.
    async fn list(
        &self,
        folder: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StorageEntry>, ApplicationError>;

    fn public_url(&self, path: &str) -> String;
}

/// Trims surrounding slashes and refuses empty or relative segments.
pub fn normalize_folder(folder: &str) -> Result<String, ApplicationError> {
    let trimmed = folder.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(ApplicationError::BadRequest(
            "Folder must not be empty".to_string(),
        ));
    }

    if trimmed
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(ApplicationError::BadRequest(format!(
            "Invalid folder '{}'",
            folder
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_are_trimmed() {
        assert_eq!(normalize_folder("uploads").unwrap(), "uploads");
        assert_eq!(normalize_folder(" /team/raw/ ").unwrap(), "team/raw");
    }

    #[test]
    fn relative_or_empty_folders_are_refused() {
        for folder in ["", "/", "a//b", "../secrets", "a/./b"] {
            assert!(
                matches!(normalize_folder(folder), Err(ApplicationError::BadRequest(_))),
                "{folder:?} should be refused"
            );
        }
    }
}
