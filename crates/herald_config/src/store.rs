//! Single-document configuration persistence.

use crate::{ConfigRecord, RuntimeConfig};
use async_trait::async_trait;
use herald_error::{StoreError, StoreErrorKind};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const LEGACY_KEYS: &[(&str, &str)] = &[("botToken", "token"), ("clientId", "applicationId")];

/// Load-one/save-one access to the configuration document.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// The stored document, if one exists.
    async fn find_one(&self) -> Result<Option<ConfigRecord>, StoreError>;

    /// Persist a new document and return it.
    async fn create(&self, record: ConfigRecord) -> Result<ConfigRecord, StoreError>;

    /// Overwrite the stored document.
    async fn save(&self, record: &ConfigRecord) -> Result<(), StoreError>;
}

/// Return the stored document, seeding it from the boot snapshot when empty.
#[instrument(skip_all)]
pub async fn ensure_config(
    store: &dyn ConfigStore,
    fallback: &RuntimeConfig,
) -> Result<ConfigRecord, StoreError> {
    if let Some(record) = store.find_one().await? {
        debug!("Using stored configuration");
        return Ok(record);
    }
    info!("No stored configuration found, seeding from boot settings");
    store.create(ConfigRecord::from_runtime(fallback)).await
}

/// In-process store, used when no persistence is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<ConfigRecord>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `record`.
    pub fn with_record(record: ConfigRecord) -> Self {
        Self {
            document: Mutex::new(Some(record)),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn find_one(&self) -> Result<Option<ConfigRecord>, StoreError> {
        Ok(self.document.lock().clone())
    }

    async fn create(&self, record: ConfigRecord) -> Result<ConfigRecord, StoreError> {
        *self.document.lock() = Some(record.clone());
        Ok(record)
    }

    async fn save(&self, record: &ConfigRecord) -> Result<(), StoreError> {
        *self.document.lock() = Some(record.clone());
        Ok(())
    }
}

/// JSON document on disk.
///
/// Keys this crate does not model (dashboard port, session secret, admin
/// ids...) are preserved when the document is rewritten.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the file at `path`; the file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_value(&self) -> Result<Option<serde_json::Value>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::new(StoreErrorKind::Io(e.to_string()))),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::new(StoreErrorKind::Serialization(e.to_string())))
    }

    async fn write_value(&self, value: &serde_json::Value) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::new(StoreErrorKind::Io(e.to_string())))?;
        }
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| StoreError::new(StoreErrorKind::Serialization(e.to_string())))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::new(StoreErrorKind::Io(e.to_string())))
    }
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn find_one(&self) -> Result<Option<ConfigRecord>, StoreError> {
        let Some(value) = self.read_value().await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::new(StoreErrorKind::Serialization(e.to_string())))
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn create(&self, record: ConfigRecord) -> Result<ConfigRecord, StoreError> {
        self.save(&record).await?;
        info!("Configuration document created");
        Ok(record)
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn save(&self, record: &ConfigRecord) -> Result<(), StoreError> {
        let mut document = match self.read_value().await? {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        let serde_json::Value::Object(fields) = serde_json::to_value(record)
            .map_err(|e| StoreError::new(StoreErrorKind::Serialization(e.to_string())))?
        else {
            return Err(StoreError::new(StoreErrorKind::Serialization(
                "configuration record is not a JSON object".to_string(),
            )));
        };
        // Legacy spellings would collide with the canonical keys on the next read.
        for (legacy, canonical) in LEGACY_KEYS {
            if fields.contains_key(*canonical) {
                document.remove(*legacy);
            }
        }
        for (key, value) in fields {
            document.insert(key, value);
        }
        self.write_value(&serde_json::Value::Object(document)).await?;
        debug!("Configuration document saved");
        Ok(())
    }
}
