use std::path::PathBuf;

use anyhow::Context;

use super::models::RuntimeSettings;

pub const DATA_DIR_ENV: &str = "RESUME_PARSER_DATA_DIR";

pub struct SettingsStore {
    file_path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::new_with_path(app_data_root().join("settings.json"))
    }

    pub fn new_with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }

    /// Settings file merged with `RESUME_PARSER_*` environment overrides.
    pub async fn load_with_env(&self) -> anyhow::Result<RuntimeSettings> {
        let settings = self.load().await?;
        Ok(apply_overrides(settings, |key| std::env::var(key).ok()))
    }

    pub async fn load(&self) -> anyhow::Result<RuntimeSettings> {
        if !tokio::fs::try_exists(&self.file_path)
            .await
            .unwrap_or(false)
        {
            return Ok(RuntimeSettings::default());
        }

        let content = tokio::fs::read_to_string(&self.file_path)
            .await
            .with_context(|| {
                format!("failed to read settings file {}", self.file_path.display())
            })?;

        let parsed = serde_json::from_str::<RuntimeSettings>(&content).with_context(|| {
            format!("invalid JSON in settings file {}", self.file_path.display())
        })?;

        Ok(parsed.sanitized())
    }

    pub async fn save(&self, settings: &RuntimeSettings) -> anyhow::Result<()> {
        if let Some(parent) = self.file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.file_path, json).await?;
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

pub fn apply_overrides<F>(mut settings: RuntimeSettings, lookup: F) -> RuntimeSettings
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("RESUME_PARSER_TABLE") {
        settings.table_name = value;
    }
    if let Some(value) = lookup("RESUME_PARSER_TOPIC") {
        settings.topic_name = value;
    }
    if let Some(value) = lookup("RESUME_PARSER_BUCKETS_ROOT") {
        settings.buckets_root = Some(PathBuf::from(value));
    }
    if let Some(value) = lookup("RESUME_PARSER_TESSERACT_PATH") {
        settings.tesseract_path = value;
    }
    if let Some(value) = lookup("RESUME_PARSER_PDFTOPPM_PATH") {
        settings.pdftoppm_path = value;
    }
    if let Some(value) = lookup("RESUME_PARSER_WEBHOOK_URL") {
        settings.notification_webhook_url = Some(value);
    }

    settings.sanitized()
}

pub fn app_data_root() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(local_app_data) = std::env::var("LOCALAPPDATA") {
            return PathBuf::from(local_app_data).join("ResumeParser");
        }
    }

    if let Some(path) = dirs::data_local_dir() {
        return path.join("ResumeParser");
    }

    PathBuf::from(".").join("ResumeParser")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[tokio::test]
    async fn load_returns_defaults_when_file_is_missing() {
        let temp = tempfile::tempdir().unwrap();
        let store = SettingsStore::new_with_path(temp.path().join("settings.json"));
        assert_eq!(store.load().await.unwrap(), RuntimeSettings::default());
    }

    #[tokio::test]
    async fn save_then_load_keeps_custom_values() {
        let temp = tempfile::tempdir().unwrap();
        let store = SettingsStore::new_with_path(temp.path().join("nested").join("settings.json"));
        let settings = RuntimeSettings {
            table_name: "Candidates".to_string(),
            max_concurrent_records: 8,
            ..RuntimeSettings::default()
        };

        store.save(&settings).await.unwrap();
        assert_eq!(store.load().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn load_reports_invalid_json_with_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = SettingsStore::new_with_path(path).load().await.unwrap_err();
        assert!(err.to_string().contains("invalid JSON in settings file"));
    }

    #[tokio::test]
    async fn load_with_env_layers_process_env_over_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{"tableName":"FromFile","topicName":"FileTopic"}"#).unwrap();

        std::env::set_var("RESUME_PARSER_PDFTOPPM_PATH", "/opt/poppler/bin/pdftoppm");
        let loaded = SettingsStore::new_with_path(path).load_with_env().await;
        std::env::remove_var("RESUME_PARSER_PDFTOPPM_PATH");

        let settings = loaded.unwrap();
        assert_eq!(settings.table_name, "FromFile");
        assert_eq!(settings.topic_name, "FileTopic");
        assert_eq!(settings.pdftoppm_path, "/opt/poppler/bin/pdftoppm");
        assert_eq!(settings.max_concurrent_records, 4);
    }

    #[test]
    fn apply_overrides_prefers_environment_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RESUME_PARSER_TABLE", "Candidates"),
            ("RESUME_PARSER_BUCKETS_ROOT", "/srv/buckets"),
            ("RESUME_PARSER_TESSERACT_PATH", ""),
            ("RESUME_PARSER_WEBHOOK_URL", "https://hooks.example.com/resume"),
        ]);

        let settings = apply_overrides(RuntimeSettings::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert_eq!(settings.table_name, "Candidates");
        assert_eq!(settings.topic_name, "ResumeUploadAlert");
        assert_eq!(settings.buckets_root, Some(PathBuf::from("/srv/buckets")));
        assert_eq!(settings.tesseract_path, "tesseract");
        assert_eq!(
            settings.notification_webhook_url.as_deref(),
            Some("https://hooks.example.com/resume")
        );
    }
}
