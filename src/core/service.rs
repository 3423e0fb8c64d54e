use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::document_parser::{ResumeDocumentParser, TextDetector};
use super::errors::CoreError;
use super::events::{FileArrivalEvent, ObjectRef};
use super::field_extractor;
use super::models::{
    FailedObject, HandlerBody, HandlerResponse, Notification, ParsedResume, ResumeRecord,
    RuntimeSettings,
};
use super::notifier::{Notifier, OutboxNotifier, WebhookNotifier};
use super::ocr::TesseractCliOcrService;
use super::resume_store::{JsonResumeStore, ResumeStore};
use super::settings_store::{app_data_root, SettingsStore};

const SUCCESS_MESSAGE: &str = "Resume parsed and stored successfully!";
const PARTIAL_MESSAGE: &str = "Some resumes could not be processed";

/// Handles file-arrival events: detect lines, extract fields, store, notify.
pub struct CoreService {
    settings: RuntimeSettings,
    buckets_root: PathBuf,
    detector: Arc<dyn TextDetector>,
    store: Arc<dyn ResumeStore>,
    notifier: Arc<dyn Notifier>,
}

impl CoreService {
    pub async fn new() -> anyhow::Result<Self> {
        let settings = SettingsStore::new()
            .load_with_env()
            .await
            .context("failed to load settings")?;
        Self::from_settings(settings, &app_data_root())
    }

    pub fn from_settings(settings: RuntimeSettings, data_root: &Path) -> anyhow::Result<Self> {
        let settings = settings.sanitized();
        let buckets_root = settings
            .buckets_root
            .clone()
            .unwrap_or_else(|| data_root.join("buckets"));

        let ocr = TesseractCliOcrService::new(
            settings.tesseract_path.clone(),
            Duration::from_secs(settings.ocr_timeout_seconds),
        )
        .with_pdftoppm(settings.pdftoppm_path.clone());
        let detector: Arc<dyn TextDetector> = Arc::new(ResumeDocumentParser::new(ocr));
        let store: Arc<dyn ResumeStore> =
            Arc::new(JsonResumeStore::new(data_root, &settings.table_name));

        let notifier: Arc<dyn Notifier> = match settings.notification_webhook_url.clone() {
            Some(url) => {
                let client = reqwest::Client::builder()
                    .user_agent("ResumeParser/1.0")
                    .timeout(Duration::from_secs(30))
                    .build()
                    .context("failed to build HTTP client")?;
                Arc::new(WebhookNotifier::new(client, url))
            }
            None => Arc::new(OutboxNotifier::new(data_root)),
        };

        Ok(Self::with_collaborators(
            settings,
            buckets_root,
            detector,
            store,
            notifier,
        ))
    }

    pub fn with_collaborators(
        settings: RuntimeSettings,
        buckets_root: PathBuf,
        detector: Arc<dyn TextDetector>,
        store: Arc<dyn ResumeStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings: settings.sanitized(),
            buckets_root,
            detector,
            store,
            notifier,
        }
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub async fn handle_event_json(&self, json: &str) -> anyhow::Result<HandlerResponse> {
        let event = FileArrivalEvent::from_json(json)?;
        self.handle_event(&event).await
    }

    /// Every record is attempted. If all of them fail, the first error fails
    /// the event; otherwise the body lists stored ids next to failed keys so a
    /// retry can target only the failures.
    pub async fn handle_event(&self, event: &FileArrivalEvent) -> anyhow::Result<HandlerResponse> {
        let objects = event.object_refs()?;
        info!(records = objects.len(), "received file arrival event");

        let max_concurrency = self.settings.max_concurrent_records.max(1);
        let outcomes: Vec<(ObjectRef, anyhow::Result<ResumeRecord>)> = stream::iter(objects)
            .map(|object| async move {
                let outcome = self.process_object(&object).await;
                (object, outcome)
            })
            .buffered(max_concurrency)
            .collect()
            .await;

        let mut resume_ids = Vec::with_capacity(outcomes.len());
        let mut failed = Vec::new();
        let mut first_error = None;
        for (object, outcome) in outcomes {
            match outcome {
                Ok(record) => resume_ids.push(record.resume_id),
                Err(err) => {
                    warn!(bucket = %object.bucket, key = %object.key, "record failed: {err:#}");
                    failed.push(FailedObject {
                        bucket: object.bucket,
                        key: object.key,
                        error: format!("{err:#}"),
                    });
                    first_error.get_or_insert(err);
                }
            }
        }

        if resume_ids.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        let (status_code, message) = if failed.is_empty() {
            (200, SUCCESS_MESSAGE)
        } else {
            (207, PARTIAL_MESSAGE)
        };

        let body = serde_json::to_string(&HandlerBody {
            message: message.to_string(),
            resume_ids,
            failed,
        })?;

        Ok(HandlerResponse { status_code, body })
    }

    /// Runs one uploaded object end to end. Detection and storage failures are
    /// returned; a failed notification is only logged.
    pub async fn process_object(&self, object: &ObjectRef) -> anyhow::Result<ResumeRecord> {
        info!(bucket = %object.bucket, key = %object.key, "processing resume");

        let data = self.read_object(object).await?;
        let detected = self
            .detector
            .detect_lines(&object.key, &data)
            .await
            .with_context(|| format!("text detection failed for {}/{}", object.bucket, object.key))?;
        info!(
            key = %object.key,
            lines = detected.lines.len(),
            ocr_used = detected.ocr_used,
            "detected text lines"
        );

        let parsed = field_extractor::parse_resume_lines(&detected.lines);
        let record = ResumeRecord::new(object.key.clone(), parsed);

        self.store
            .put_resume(&record)
            .await
            .with_context(|| format!("failed to persist resume for {}", object.key))?;
        info!(resume_id = %record.resume_id, key = %object.key, "stored parsed resume");

        let notification = Notification::resume_parsed(&self.settings.topic_name, &record);
        if let Err(err) = self.notifier.publish(&notification).await {
            warn!(
                resume_id = %record.resume_id,
                topic = %self.settings.topic_name,
                "notification failed: {err:#}"
            );
        }

        Ok(record)
    }

    /// Detection plus extraction for a local file, with nothing stored.
    pub async fn parse_single(&self, file_name: &str, data: &[u8]) -> anyhow::Result<ParsedResume> {
        let detected = self.detector.detect_lines(file_name, data).await?;
        Ok(field_extractor::parse_resume_lines(&detected.lines))
    }

    async fn read_object(&self, object: &ObjectRef) -> anyhow::Result<Vec<u8>> {
        let path = self.object_path(object)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(CoreError::ObjectNotFound {
                bucket: object.bucket.clone(),
                key: object.key.clone(),
            }
            .into());
        }

        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))
    }

    fn object_path(&self, object: &ObjectRef) -> Result<PathBuf, CoreError> {
        let escapes = |value: &str| {
            Path::new(value)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        };

        if escapes(object.bucket.as_str()) || escapes(object.key.as_str()) {
            return Err(CoreError::InvalidEvent(format!(
                "object path escapes bucket root: {}/{}",
                object.bucket, object.key
            )));
        }

        Ok(self.buckets_root.join(&object.bucket).join(&object.key))
    }
}
