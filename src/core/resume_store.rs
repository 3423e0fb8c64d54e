use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::errors::CoreError;
use super::models::ResumeRecord;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn put_resume(&self, record: &ResumeRecord) -> anyhow::Result<()>;
    async fn load_resume(&self, resume_id: &str) -> anyhow::Result<Option<ResumeRecord>>;
    async fn list_resume_ids(&self) -> anyhow::Result<Vec<String>>;
}

/// A resume table kept as one JSON document per record.
pub struct JsonResumeStore {
    table_root: PathBuf,
    mutex: Mutex<()>,
}

impl JsonResumeStore {
    pub fn new(data_root: &Path, table_name: &str) -> Self {
        Self::new_with_root(data_root.join("tables").join(table_name))
    }

    pub fn new_with_root(table_root: PathBuf) -> Self {
        Self {
            table_root,
            mutex: Mutex::new(()),
        }
    }

    pub fn table_root(&self) -> &Path {
        &self.table_root
    }

    async fn write_record(&self, record: &ResumeRecord) -> anyhow::Result<()> {
        let _lock = self.mutex.lock().await;
        tokio::fs::create_dir_all(&self.table_root)
            .await
            .with_context(|| format!("failed to create table dir {}", self.table_root.display()))?;

        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(self.record_path(&record.resume_id), json).await?;
        Ok(())
    }

    fn record_path(&self, resume_id: &str) -> PathBuf {
        self.table_root.join(format!("{resume_id}.json"))
    }
}

#[async_trait]
impl ResumeStore for JsonResumeStore {
    async fn put_resume(&self, record: &ResumeRecord) -> anyhow::Result<()> {
        if record.resume_id.trim().is_empty() {
            return Err(CoreError::Storage {
                resume_id: String::new(),
                reason: "missing resume id".to_string(),
            }
            .into());
        }

        self.write_record(record).await.map_err(|err| {
            CoreError::Storage {
                resume_id: record.resume_id.clone(),
                reason: format!("{err:#}"),
            }
            .into()
        })
    }

    async fn load_resume(&self, resume_id: &str) -> anyhow::Result<Option<ResumeRecord>> {
        let _lock = self.mutex.lock().await;
        let path = self.record_path(resume_id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed reading {}", path.display()))?;
        let record = serde_json::from_str::<ResumeRecord>(&json)
            .with_context(|| format!("invalid resume record {}", path.display()))?;
        Ok(Some(record))
    }

    async fn list_resume_ids(&self) -> anyhow::Result<Vec<String>> {
        if !tokio::fs::try_exists(&self.table_root)
            .await
            .unwrap_or(false)
        {
            return Ok(Vec::new());
        }

        let _lock = self.mutex.lock().await;
        let mut dir = tokio::fs::read_dir(&self.table_root).await?;
        let mut ids = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|v| v.to_str()) != Some("json") {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|v| v.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }
}
