use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::Utc;
use futures::{future::join_all, stream, StreamExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{error::ApplicationError, services::StorageService},
    domain::{
        config::global::GlobalConfig,
        models::{
            file::FileData,
            upload::{BatchReport, UploadOutcome},
        },
    },
};

/// Count of finished uploads for one batch. Only successes move it.
/// The final count goes back to the client with the batch report.
#[derive(Debug, Default)]
pub struct UploadProgress {
    succeeded: AtomicUsize,
    total: AtomicUsize,
}

impl UploadProgress {
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    fn start(&self, total: usize) {
        self.succeeded.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn record_success(&self) -> usize {
        self.succeeded.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Replaces every run of whitespace with a single underscore.
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
        } else {
            sanitized.push(c);
            in_whitespace = false;
        }
    }

    sanitized
}

pub struct UploadService {
    storage: Arc<dyn StorageService>,
    config: GlobalConfig,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageService>, config: GlobalConfig) -> Self {
        Self { storage, config }
    }

    /// `{folder}/{millis}_{name}`. Two identical names in the same
    /// millisecond map to the same key unless `unique_suffix` is set.
    fn storage_key(&self, folder: &str, filename: &str) -> String {
        let timestamp = Utc::now().timestamp_millis();
        let name = sanitize_file_name(filename);

        if self.config.unique_suffix {
            let token = Uuid::new_v4().simple().to_string();
            format!("{}/{}_{}_{}", folder, timestamp, &token[..8], name)
        } else {
            format!("{}/{}_{}", folder, timestamp, name)
        }
    }

    /// Validates every candidate, then uploads the admitted ones
    /// concurrently. A failing file never cancels its siblings.
    pub async fn upload_batch(
        &self,
        folder: &str,
        candidates: Vec<FileData>,
        progress: &UploadProgress,
    ) -> Result<BatchReport, ApplicationError> {
        if candidates.is_empty() {
            return Err(ApplicationError::BadRequest("No files provided".to_string()));
        }

        let mut slots: Vec<Option<UploadOutcome>> = (0..candidates.len()).map(|_| None).collect();
        let mut admitted = Vec::with_capacity(candidates.len());

        for (index, candidate) in candidates.into_iter().enumerate() {
            match self.config.admit(&candidate) {
                Ok(()) => admitted.push((index, candidate)),
                Err(reason) => {
                    warn!("Rejected {} before upload: {}", candidate.filename, reason);
                    slots[index] = Some(UploadOutcome::Rejected {
                        name: candidate.filename,
                        reason,
                    });
                }
            }
        }

        progress.start(admitted.len());
        info!(
            "Uploading {} file(s) to '{}' ({} rejected)",
            admitted.len(),
            folder,
            slots.iter().filter(|s| s.is_some()).count()
        );

        let uploads = admitted.into_iter().map(move |(index, candidate)| async move {
            let outcome = self.upload_with_retry(folder, &candidate, progress).await;
            (index, outcome)
        });

        let finished: Vec<(usize, UploadOutcome)> = match self.config.upload_concurrency {
            Some(limit) => stream::iter(uploads).buffer_unordered(limit).collect().await,
            None => join_all(uploads).await,
        };

        for (index, outcome) in finished {
            slots[index] = Some(outcome);
        }

        let outcomes: Vec<UploadOutcome> = slots.into_iter().flatten().collect();
        let report = BatchReport::new(outcomes, self.config.max_size);

        info!(
            "Batch to '{}' finished: {} uploaded, {} failed, {} rejected",
            folder, report.succeeded, report.failed, report.rejected
        );

        Ok(report)
    }

    async fn upload_with_retry(
        &self,
        folder: &str,
        candidate: &FileData,
        progress: &UploadProgress,
    ) -> UploadOutcome {
        let path = self.storage_key(folder, &candidate.filename);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.storage.upload(&path, candidate).await {
                Ok(()) => {
                    let done = progress.record_success();
                    info!(
                        "Uploaded {} as {} ({}/{})",
                        candidate.filename,
                        path,
                        done,
                        progress.total()
                    );
                    return UploadOutcome::Uploaded {
                        name: candidate.filename.clone(),
                        url: self.storage.public_url(&path),
                        path,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!(
                        "Upload attempt {} failed for {}: {}",
                        attempt, candidate.filename, e
                    );

                    if attempt >= max_attempts {
                        error!(
                            "Giving up on {} after {} attempts",
                            candidate.filename, max_attempts
                        );
                        return UploadOutcome::Failed {
                            name: candidate.filename.clone(),
                            error: format!(
                                "Failed to upload {} after {} attempts",
                                candidate.filename, max_attempts
                            ),
                            attempts: attempt,
                        };
                    }

                    tokio::time::sleep(self.config.retry_delay()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::{Duration, Instant};

    use super::*;
    use crate::{domain::models::upload::RejectionReason, services::MemoryStorageService};

    const MB: usize = 1000 * 1000;

    fn file(name: &str, mime: &str, size: usize) -> FileData {
        FileData::new(vec![7; size], name.to_string(), mime.to_string())
    }

    fn service_with(config: GlobalConfig) -> (Arc<MemoryStorageService>, UploadService) {
        let storage = Arc::new(MemoryStorageService::new("media".to_string()));
        let service = UploadService::new(storage.clone(), config);
        (storage, service)
    }

    fn service() -> (Arc<MemoryStorageService>, UploadService) {
        service_with(GlobalConfig::default())
    }

    #[test]
    fn sanitizes_whitespace_runs() {
        assert_eq!(sanitize_file_name("my  holiday\tphoto.png"), "my_holiday_photo.png");
        assert_eq!(sanitize_file_name(" lead.csv"), "_lead.csv");
        assert_eq!(sanitize_file_name("plain-name (1).json"), "plain-name_(1).json");
        assert_eq!(sanitize_file_name("no_spaces.csv"), "no_spaces.csv");
    }

    #[test]
    fn storage_key_has_folder_timestamp_and_name() {
        let (_, service) = service();
        let key = service.storage_key("uploads", "cat photo.png");

        let rest = key.strip_prefix("uploads/").unwrap();
        let (timestamp, name) = rest.split_once('_').unwrap();
        assert!(timestamp.parse::<i64>().is_ok());
        assert_eq!(name, "cat_photo.png");
    }

    #[test]
    fn unique_suffix_inserts_a_token() {
        let (_, service) = service_with(GlobalConfig {
            unique_suffix: true,
            ..Default::default()
        });
        let key = service.storage_key("uploads", "a.csv");
        let parts: Vec<_> = key.strip_prefix("uploads/").unwrap().splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2], "a.csv");
    }

    #[tokio::test]
    async fn empty_batch_is_a_bad_request() {
        let (_, service) = service();
        let result = service
            .upload_batch("uploads", Vec::new(), &UploadProgress::default())
            .await;
        assert!(matches!(result, Err(ApplicationError::BadRequest(_))));
    }

    #[tokio::test]
    async fn oversize_png_is_rejected_and_jpeg_uploaded() {
        let (storage, service) = service();
        let progress = UploadProgress::default();

        let report = service
            .upload_batch(
                "uploads",
                vec![
                    file("holiday.jpg", "image/jpeg", 2 * MB),
                    file("poster.png", "image/png", 15 * MB),
                ],
                &progress,
            )
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 2);
        match &report.outcomes[0] {
            UploadOutcome::Uploaded { name, path, url, attempts } => {
                assert_eq!(name, "holiday.jpg");
                assert!(path.starts_with("uploads/") && path.ends_with("_holiday.jpg"));
                assert_eq!(url, &format!("memory://media/{}", path));
                assert_eq!(*attempts, 1);
            }
            other => panic!("expected upload, got {:?}", other),
        }
        assert_eq!(
            report.outcomes[1],
            UploadOutcome::Rejected {
                name: "poster.png".to_string(),
                reason: RejectionReason::TooLarge { max: 10_485_760 },
            }
        );

        let attempted = storage.calls().uploads;
        assert_eq!(attempted.len(), 1);
        assert!(attempted.iter().all(|p| !p.ends_with("poster.png")));
        assert_eq!(progress.succeeded(), 1);
        assert_eq!(progress.total(), 1);
    }

    #[tokio::test]
    async fn unlisted_type_never_reaches_storage() {
        let (storage, service) = service();
        let report = service
            .upload_batch(
                "uploads",
                vec![file("notes.txt", "text/plain", 10)],
                &UploadProgress::default(),
            )
            .await
            .unwrap();

        assert!(matches!(
            report.outcomes[0],
            UploadOutcome::Rejected {
                reason: RejectionReason::UnsupportedType { .. },
                ..
            }
        ));
        assert!(storage.calls().uploads.is_empty());
        assert!(report.message.starts_with("Some files were rejected"));
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_file_is_attempted_exactly_the_ceiling() {
        let (storage, service) = service();
        storage.fail_uploads("broken.csv", usize::MAX);
        let started = Instant::now();

        let report = service
            .upload_batch(
                "uploads",
                vec![file("broken.csv", "text/csv", 10)],
                &UploadProgress::default(),
            )
            .await
            .unwrap();

        assert_eq!(storage.calls().uploads.len(), 3);
        assert_eq!(
            report.outcomes[0],
            UploadOutcome::Failed {
                name: "broken.csv".to_string(),
                error: "Failed to upload broken.csv after 3 attempts".to_string(),
                attempts: 3,
            }
        );
        // Two pauses between three attempts, none after the last.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_recovers_on_retry() {
        let (storage, service) = service();
        storage.fail_uploads("flaky.json", 1);
        let progress = UploadProgress::default();

        let report = service
            .upload_batch(
                "uploads",
                vec![file("flaky.json", "application/json", 10)],
                &progress,
            )
            .await
            .unwrap();

        assert!(matches!(
            report.outcomes[0],
            UploadOutcome::Uploaded { attempts: 2, .. }
        ));
        assert_eq!(storage.object_paths().len(), 1);
        assert_eq!(progress.succeeded(), 1);
        assert_eq!(report.message, "All files uploaded successfully!");
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_cancel_siblings() {
        let (storage, service) = service();
        storage.fail_uploads("bad.csv", usize::MAX);
        let progress = UploadProgress::default();

        let report = service
            .upload_batch(
                "uploads",
                vec![
                    file("a.png", "image/png", 10),
                    file("bad.csv", "text/csv", 10),
                    file("c.json", "application/json", 10),
                ],
                &progress,
            )
            .await
            .unwrap();

        let names: Vec<_> = report.outcomes.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["a.png", "bad.csv", "c.json"]);
        assert_eq!((report.succeeded, report.failed, report.rejected), (2, 1, 0));
        assert_eq!(progress.succeeded(), 2);
        // Successful siblings stay in storage.
        assert_eq!(storage.object_paths().len(), 2);
        assert_eq!(
            report.message,
            "Failed to upload bad.csv: Failed to upload bad.csv after 3 attempts"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_fan_out_retries_in_parallel() {
        let (storage, service) = service();
        for name in ["a.csv", "b.csv", "c.csv"] {
            storage.fail_uploads(name, usize::MAX);
        }
        let started = Instant::now();

        let files = ["a.csv", "b.csv", "c.csv"]
            .iter()
            .map(|n| file(n, "text/csv", 1))
            .collect();
        service
            .upload_batch("uploads", files, &UploadProgress::default())
            .await
            .unwrap();

        assert_eq!(storage.calls().uploads.len(), 9);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_cap_serializes_attempt_sequences() {
        let (storage, service) = service_with(GlobalConfig {
            upload_concurrency: Some(1),
            ..Default::default()
        });
        for name in ["a.csv", "b.csv", "c.csv"] {
            storage.fail_uploads(name, usize::MAX);
        }
        let started = Instant::now();

        let files = ["a.csv", "b.csv", "c.csv"]
            .iter()
            .map(|n| file(n, "text/csv", 1))
            .collect();
        let report = service
            .upload_batch("uploads", files, &UploadProgress::default())
            .await
            .unwrap();

        let names: Vec<_> = report.outcomes.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn outcome_count_matches_candidates() {
        let (_, service) = service();
        let files: Vec<_> = (0..12)
            .map(|i| match i % 3 {
                0 => file(&format!("{}.png", i), "image/png", 10),
                1 => file(&format!("{}.exe", i), "application/octet-stream", 10),
                _ => file(&format!("{}.csv", i), "text/csv", 11 * MB),
            })
            .collect();

        let report = service
            .upload_batch("uploads", files, &UploadProgress::default())
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 12);
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.rejected, 8);
    }
}
