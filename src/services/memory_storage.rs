#[cfg(test)]
use std::collections::HashMap;
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    application::{error::ApplicationError, services::StorageService},
    domain::models::file::{FileData, ObjectMetadata, StorageEntry},
    services::error::StorageError,
};

#[derive(Debug, Clone)]
struct StoredObject {
    content: Vec<u8>,
    mime_type: String,
}

/// Injected failures, keyed by a suffix of the object path.
#[cfg(test)]
#[derive(Debug, Default)]
struct Faults {
    upload_failures: HashMap<String, usize>,
    failing_list_offset: Option<usize>,
}

#[cfg(test)]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CallLog {
    pub uploads: Vec<String>,
    pub lists: Vec<(String, usize, usize)>,
}

/// Bucket kept in process memory. Lists entries in name order.
pub struct MemoryStorageService {
    bucket_name: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    #[cfg(test)]
    faults: Mutex<Faults>,
    #[cfg(test)]
    calls: Mutex<CallLog>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|_| StorageError::InternalError("memory storage lock poisoned".to_string()))
}

impl MemoryStorageService {
    pub fn new(bucket_name: String) -> Self {
        Self {
            bucket_name,
            objects: Mutex::new(BTreeMap::new()),
            #[cfg(test)]
            faults: Mutex::new(Faults::default()),
            #[cfg(test)]
            calls: Mutex::new(CallLog::default()),
        }
    }
}

#[async_trait]
impl StorageService for MemoryStorageService {
    fn provider(&self) -> &'static str {
        "memory"
    }

    async fn upload(&self, path: &str, file_data: &FileData) -> Result<(), ApplicationError> {
        #[cfg(test)]
        self.before_upload(path)?;

        let mut objects = lock(&self.objects)?;
        if objects.contains_key(path) {
            return Err(StorageError::ProviderError(format!(
                "Upload failed: The resource already exists: {}",
                path
            ))
            .into());
        }

        debug!("Storing {} bytes at {}", file_data.size(), path);
        objects.insert(
            path.to_string(),
            StoredObject {
                content: file_data.content.clone(),
                mime_type: file_data.mime_type.clone(),
            },
        );
        Ok(())
    }

    async fn list(
        &self,
        folder: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StorageEntry>, ApplicationError> {
        #[cfg(test)]
        self.before_list(folder, limit, offset)?;

        let folder = folder.trim_matches('/');
        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{}/", folder)
        };

        let objects = lock(&self.objects)?;
        let mut entries: Vec<StorageEntry> = Vec::new();
        for (key, object) in objects.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(prefix.as_str()) else {
                break;
            };

            match rest.split_once('/') {
                Some((child_folder, _)) => {
                    if entries.last().map(|e| e.name.as_str()) != Some(child_folder) {
                        entries.push(StorageEntry {
                            name: child_folder.to_string(),
                            metadata: None,
                        });
                    }
                }
                None => entries.push(StorageEntry {
                    name: rest.to_string(),
                    metadata: Some(ObjectMetadata {
                        size: Some(object.content.len() as u64),
                        mime_type: Some(object.mime_type.clone()),
                    }),
                }),
            }
        }

        Ok(entries.into_iter().skip(offset).take(limit).collect())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{}", self.bucket_name, path)
    }
}

#[cfg(test)]
impl MemoryStorageService {
    /// Records the call, then fails it if a matching fault is armed.
    fn before_upload(&self, path: &str) -> Result<(), StorageError> {
        lock(&self.calls)?.uploads.push(path.to_string());

        let mut faults = lock(&self.faults)?;
        for (suffix, remaining) in faults.upload_failures.iter_mut() {
            if *remaining > 0 && path.ends_with(suffix.as_str()) {
                *remaining -= 1;
                return Err(StorageError::ProviderError(format!(
                    "Upload failed: injected failure for {}",
                    path
                )));
            }
        }
        Ok(())
    }

    fn before_list(&self, folder: &str, limit: usize, offset: usize) -> Result<(), StorageError> {
        lock(&self.calls)?
            .lists
            .push((folder.to_string(), limit, offset));

        if lock(&self.faults)?.failing_list_offset == Some(offset) {
            return Err(StorageError::NetworkError(format!(
                "List failed at offset {}",
                offset
            )));
        }
        Ok(())
    }

    pub fn seed(&self, path: &str, size: usize) {
        self.objects.lock().unwrap().insert(
            path.to_string(),
            StoredObject {
                content: vec![0; size],
                mime_type: "application/octet-stream".to_string(),
            },
        );
    }

    /// Fail the next `times` uploads whose path ends with `suffix`.
    pub fn fail_uploads(&self, suffix: &str, times: usize) {
        self.faults
            .lock()
            .unwrap()
            .upload_failures
            .insert(suffix.to_string(), times);
    }

    pub fn fail_list_at(&self, offset: usize) {
        self.faults.lock().unwrap().failing_list_offset = Some(offset);
    }

    pub fn calls(&self) -> CallLog {
        self.calls.lock().unwrap().clone()
    }

    pub fn object_paths(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}
