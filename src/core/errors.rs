use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },
    #[error("Unsupported document type: {0}")]
    UnsupportedDocument(String),
    #[error("Text detection failed: {0}")]
    Ocr(String),
    #[error("Failed to store resume {resume_id}: {reason}")]
    Storage { resume_id: String, reason: String },
    #[error("Notification failed: {0}")]
    Notification(String),
}
