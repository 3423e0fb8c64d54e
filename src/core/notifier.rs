use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::errors::CoreError;
use super::models::Notification;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Appends notifications as JSON lines to `<outbox_root>/<topic>.jsonl`.
pub struct OutboxNotifier {
    outbox_root: PathBuf,
    mutex: Mutex<()>,
}

impl OutboxNotifier {
    pub fn new(data_root: &Path) -> Self {
        Self::new_with_root(data_root.join("outbox"))
    }

    pub fn new_with_root(outbox_root: PathBuf) -> Self {
        Self {
            outbox_root,
            mutex: Mutex::new(()),
        }
    }

    pub fn topic_path(&self, topic: &str) -> PathBuf {
        self.outbox_root.join(format!("{topic}.jsonl"))
    }

    async fn append(&self, notification: &Notification) -> anyhow::Result<()> {
        let _lock = self.mutex.lock().await;
        tokio::fs::create_dir_all(&self.outbox_root).await?;

        let mut line = serde_json::to_string(notification)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.topic_path(&notification.topic))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn publish(&self, notification: &Notification) -> anyhow::Result<()> {
        self.append(notification)
            .await
            .map_err(|err| CoreError::Notification(format!("{err:#}")).into())
    }
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn publish(&self, notification: &Notification) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|err| CoreError::Notification(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Notification(format!(
                "webhook returned {}: {body}",
                status.as_u16()
            ))
            .into());
        }

        Ok(())
    }
}
