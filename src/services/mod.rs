mod error;
mod memory_storage;
mod supabase_storage;

pub use error::StorageError;
pub use memory_storage::MemoryStorageService;
pub use supabase_storage::SupabaseStorageService;

use std::sync::Arc;

use crate::{
    application::services::StorageService,
    domain::config::{
        local::{LocalConfig, Provider},
        secrets::Secrets,
    },
};

pub fn create_storage_service(
    local_config: &LocalConfig,
    secrets: &Secrets,
) -> Result<Arc<dyn StorageService>, StorageError> {
    match local_config.provider {
        Provider::Supabase => {
            let supabase_secrets = secrets.supabase_secrets.as_ref().ok_or_else(|| {
                StorageError::InvalidCredentials("Supabase secrets not found".to_string())
            })?;

            let service = SupabaseStorageService::new(
                supabase_secrets.clone(),
                local_config.bucket_name.clone(),
            );
            Ok(Arc::new(service))
        }
        Provider::Memory => Ok(Arc::new(MemoryStorageService::new(
            local_config.bucket_name.clone(),
        ))),
    }
}
