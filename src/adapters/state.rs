use axum::extract::FromRef;
use std::sync::Arc;

use crate::{
    application::services::{ListingService, StorageService, UploadService},
    domain::config::{global::GlobalConfig, local::LocalConfig, AppConfig},
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub local_config: Arc<LocalConfig>,
    pub global_config: Arc<GlobalConfig>,
    pub storage_service: Arc<dyn StorageService>,
    pub upload_service: Arc<UploadService>,
    pub listing_service: Arc<ListingService>,
}

impl AppState {
    pub fn new(config: AppConfig, storage_service: Arc<dyn StorageService>) -> Self {
        let upload_service = UploadService::new(storage_service.clone(), config.global.clone());
        let listing_service = ListingService::new(storage_service.clone(), config.global.page_size);

        Self {
            local_config: Arc::new(config.local),
            global_config: Arc::new(config.global),
            storage_service,
            upload_service: Arc::new(upload_service),
            listing_service: Arc::new(listing_service),
        }
    }
}
