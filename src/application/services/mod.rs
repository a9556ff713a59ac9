mod listing_service;
mod storage_service;
mod upload_service;

pub use listing_service::{FileListing, ListingService};
pub use storage_service::{normalize_folder, StorageService};
pub use upload_service::{UploadProgress, UploadService};
