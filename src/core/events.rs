use serde::Deserialize;

use super::errors::CoreError;

/// Storage notification delivered when a resume file lands in a bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct FileArrivalEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    pub s3: Option<StorageEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageEntity {
    pub bucket: Option<BucketEntity>,
    pub object: Option<ObjectEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketEntity {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntity {
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl FileArrivalEvent {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| CoreError::InvalidEvent(format!("malformed event JSON: {err}")).into())
    }

    /// Resolves every record to a bucket/key pair, decoding the object key.
    pub fn object_refs(&self) -> Result<Vec<ObjectRef>, CoreError> {
        if self.records.is_empty() {
            return Err(CoreError::InvalidEvent("event has no records".to_string()));
        }

        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| record.object_ref(index))
            .collect()
    }
}

impl EventRecord {
    fn object_ref(&self, index: usize) -> Result<ObjectRef, CoreError> {
        let entity = self
            .s3
            .as_ref()
            .ok_or_else(|| CoreError::InvalidEvent(format!("record {index} has no s3 entity")))?;

        let bucket = entity
            .bucket
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CoreError::InvalidEvent(format!("record {index} has no bucket name")))?;

        let raw_key = entity
            .object
            .as_ref()
            .and_then(|o| o.key.as_deref())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CoreError::InvalidEvent(format!("record {index} has no object key")))?;

        Ok(ObjectRef {
            bucket: bucket.to_string(),
            key: decode_object_key(raw_key)?,
        })
    }
}

fn decode_object_key(raw: &str) -> Result<String, CoreError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|v| v.into_owned())
        .map_err(|err| CoreError::InvalidEvent(format!("object key is not valid UTF-8: {err}")))
}
