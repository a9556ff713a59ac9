use axum::{extract::State, Json};
use serde::Serialize;
use sysinfo::System;
use tracing::info;

use crate::adapters::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub bucket: String,
    #[serde(rename = "defaultFolder")]
    pub default_folder: String,
    pub config: HealthConfigInfo,
    pub metrics: SystemMetrics,
}

#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    #[serde(rename = "cpuUsagePercent")]
    pub cpu_usage_percent: f32,
    #[serde(rename = "memoryUsedBytes")]
    pub memory_used_bytes: u64,
    #[serde(rename = "memoryTotalBytes")]
    pub memory_total_bytes: u64,
    #[serde(rename = "memoryUsagePercent")]
    pub memory_usage_percent: f32,
}

#[derive(Debug, Serialize)]
pub struct HealthConfigInfo {
    #[serde(rename = "maxSize")]
    pub max_size: u64,
    #[serde(rename = "allowedMimeTypes")]
    pub allowed_mime_types: Vec<String>,
    #[serde(rename = "maxAttempts")]
    pub max_attempts: u32,
    #[serde(rename = "retryDelayMs")]
    pub retry_delay_ms: u64,
    #[serde(rename = "uploadConcurrency")]
    pub upload_concurrency: Option<usize>,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
}

pub struct HealthController;

impl HealthController {
    /// GET /api/v1/health
    pub async fn health_check(State(app_state): State<AppState>) -> Json<HealthResponse> {
        info!("Health check requested");

        let global_config = &app_state.global_config;
        let config_info = HealthConfigInfo {
            max_size: global_config.max_size,
            allowed_mime_types: global_config.mime_types.clone(),
            max_attempts: global_config.max_attempts,
            retry_delay_ms: global_config.retry_delay_ms,
            upload_concurrency: global_config.upload_concurrency,
            page_size: global_config.page_size,
        };

        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let memory_used = sys.used_memory();
        let memory_total = sys.total_memory();
        let memory_usage_percent = if memory_total > 0 {
            (memory_used as f32 / memory_total as f32) * 100.0
        } else {
            0.0
        };

        let metrics = SystemMetrics {
            cpu_usage_percent: sys.global_cpu_usage(),
            memory_used_bytes: memory_used,
            memory_total_bytes: memory_total,
            memory_usage_percent,
        };

        Json(HealthResponse {
            status: "healthy".to_string(),
            provider: app_state.storage_service.provider().to_string(),
            bucket: app_state.local_config.bucket_name.clone(),
            default_folder: app_state.local_config.default_folder.clone(),
            config: config_info,
            metrics,
        })
    }
}
