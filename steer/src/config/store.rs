use crate::config::{Policy, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use steerapi::POLICY_KEY;

/// Key-value storage holding persisted records.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Load the persisted policy. A missing or empty record yields the default policy.
pub async fn load_policy(store: &dyn PolicyStore) -> Result<Policy, StoreError> {
    match store.get(POLICY_KEY).await? {
        Some(Value::Object(map)) if !map.is_empty() => {
            let policy = Policy::from_value(&Value::Object(map));
            tracing::debug!("Loaded policy: mode={}", policy.mode);
            Ok(policy)
        }
        _ => Ok(Policy::default()),
    }
}

pub async fn save_policy(store: &dyn PolicyStore, policy: &Policy) -> Result<(), StoreError> {
    store.set(POLICY_KEY, policy.to_value()?).await
}

/// A YAML document whose top-level keys are the store keys.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let name = self.path.to_string_lossy().to_string();
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(StoreError::Io(name, e)),
        };
        match serde_yaml::from_str::<Value>(&text).map_err(|e| StoreError::Serde(name, e))? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

#[async_trait]
impl PolicyStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_document().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let name = self.path.to_string_lossy().to_string();
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), value);
        let text = serde_yaml::to_string(&Value::Object(document))
            .map_err(|e| StoreError::Serde(name.clone(), e))?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| StoreError::Io(name, e))?;
        tracing::debug!("Saved {} to {}", key, self.path.display());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}
