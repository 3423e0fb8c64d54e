use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured fields pulled out of a resume's OCR lines. Every field is always
/// present; missing values are empty strings or empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParsedResume {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub education: Vec<String>,
    pub skills: Vec<String>,
    pub projects: Vec<String>,
    pub experience: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Education,
    Skills,
    Projects,
    Experience,
    Certifications,
}

impl Section {
    /// Maps a lowercased heading to its bucket. Order matters when a heading
    /// mentions more than one section.
    pub fn from_heading(heading: &str) -> Option<Self> {
        if heading.contains("education") {
            Some(Section::Education)
        } else if heading.contains("skill") {
            Some(Section::Skills)
        } else if heading.contains("project") {
            Some(Section::Projects)
        } else if heading.contains("experience") {
            Some(Section::Experience)
        } else if heading.contains("certificate")
            || heading.contains("certification")
            || heading.contains("achievement")
        {
            Some(Section::Certifications)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionBuckets {
    pub education: Vec<String>,
    pub skills: Vec<String>,
    pub projects: Vec<String>,
    pub experience: Vec<String>,
    pub certifications: Vec<String>,
}

impl SectionBuckets {
    pub fn bucket_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Education => &mut self.education,
            Section::Skills => &mut self.skills,
            Section::Projects => &mut self.projects,
            Section::Experience => &mut self.experience,
            Section::Certifications => &mut self.certifications,
        }
    }
}

/// A parsed resume as persisted in the resume table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResumeRecord {
    #[serde(rename = "ResumeID")]
    pub resume_id: String,
    pub source_file: String,
    pub parsed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub resume: ParsedResume,
}

impl ResumeRecord {
    pub fn new(source_file: impl Into<String>, resume: ParsedResume) -> Self {
        Self {
            resume_id: uuid::Uuid::new_v4().to_string(),
            source_file: source_file.into(),
            parsed_at: Utc::now(),
            resume,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub topic: String,
    pub subject: String,
    pub message: String,
    pub resume_id: String,
    pub sent_at: DateTime<Utc>,
}

impl Notification {
    pub const SUBJECT: &'static str = "New Resume Parsed";

    /// Only the source document is referenced; extracted personal fields stay out.
    pub fn resume_parsed(topic: &str, record: &ResumeRecord) -> Self {
        Self {
            topic: topic.to_string(),
            subject: Self::SUBJECT.to_string(),
            message: format!("New resume processed: {}", record.source_file),
            resume_id: record.resume_id.clone(),
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerBody {
    pub message: String,
    pub resume_ids: Vec<String>,
    #[serde(default)]
    pub failed: Vec<FailedObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedObject {
    pub bucket: String,
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSettings {
    pub table_name: String,
    pub topic_name: String,
    pub buckets_root: Option<PathBuf>,
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub ocr_timeout_seconds: u64,
    pub max_concurrent_records: usize,
    pub notification_webhook_url: Option<String>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            table_name: "Resumes".to_string(),
            topic_name: "ResumeUploadAlert".to_string(),
            buckets_root: None,
            tesseract_path: "tesseract".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            ocr_timeout_seconds: 120,
            max_concurrent_records: 4,
            notification_webhook_url: None,
        }
    }
}

impl RuntimeSettings {
    pub fn sanitized(mut self) -> Self {
        if self.table_name.trim().is_empty() {
            self.table_name = "Resumes".to_string();
        }
        if self.topic_name.trim().is_empty() {
            self.topic_name = "ResumeUploadAlert".to_string();
        }
        if self.tesseract_path.trim().is_empty() {
            self.tesseract_path = "tesseract".to_string();
        }
        if self.pdftoppm_path.trim().is_empty() {
            self.pdftoppm_path = "pdftoppm".to_string();
        }
        self.ocr_timeout_seconds = self.ocr_timeout_seconds.max(1);
        self.max_concurrent_records = self.max_concurrent_records.max(1);
        self.notification_webhook_url = self
            .notification_webhook_url
            .filter(|url| !url.trim().is_empty());
        self
    }
}
