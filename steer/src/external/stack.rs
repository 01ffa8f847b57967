use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use steerapi::ProxySettingsSchema;
use thiserror::Error;

/// Mode reported by a stack carrying no configuration of ours.
pub const STACK_DEFAULT_MODE: &str = "system";

#[derive(Error, Debug)]
pub enum StackError {
    #[error("{0} io error: {1}")]
    Io(String, std::io::Error),
    #[error("{0} serde error: {1}")]
    Serde(String, serde_json::Error),
    #[error("Stack rejected request: {0}")]
    Rejected(String),
}

/// The external proxy configuration surface being steered.
#[async_trait]
pub trait ProxyStack: Send + Sync {
    async fn set(&self, settings: ProxySettingsSchema) -> Result<(), StackError>;

    /// Remove our configuration from the regular scope.
    async fn clear(&self) -> Result<(), StackError>;

    async fn get(&self) -> Result<ProxySettingsSchema, StackError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackRequest {
    Set(ProxySettingsSchema),
    Clear,
}

type SettingsTransform = Box<dyn Fn(ProxySettingsSchema) -> ProxySettingsSchema + Send + Sync>;

/// In-process stack. Records every request it receives; `override_with`
/// simulates another party changing the settings.
pub struct MemoryStack {
    current: Mutex<ProxySettingsSchema>,
    requests: Mutex<Vec<StackRequest>>,
    failure: Mutex<Option<String>>,
    transform: Option<SettingsTransform>,
}

impl Default for MemoryStack {
    fn default() -> Self {
        Self {
            current: Mutex::new(ProxySettingsSchema::mode_only(STACK_DEFAULT_MODE)),
            requests: Mutex::new(vec![]),
            failure: Mutex::new(None),
            transform: None,
        }
    }
}

impl MemoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings accepted by `set` are passed through `transform` before they
    /// become observable, like a stack that normalizes what it is given.
    pub fn with_transform<F>(transform: F) -> Self
    where
        F: Fn(ProxySettingsSchema) -> ProxySettingsSchema + Send + Sync + 'static,
    {
        Self {
            transform: Some(Box::new(transform)),
            ..Default::default()
        }
    }

    pub fn override_with(&self, settings: ProxySettingsSchema) {
        *self.current.lock().unwrap() = settings;
    }

    /// The next request fails with `reason`.
    pub fn fail_next<S: Into<String>>(&self, reason: S) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    pub fn requests(&self) -> Vec<StackRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn current(&self) -> ProxySettingsSchema {
        self.current.lock().unwrap().clone()
    }

    fn take_failure(&self) -> Result<(), StackError> {
        match self.failure.lock().unwrap().take() {
            Some(reason) => Err(StackError::Rejected(reason)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProxyStack for MemoryStack {
    async fn set(&self, settings: ProxySettingsSchema) -> Result<(), StackError> {
        self.take_failure()?;
        self.requests
            .lock()
            .unwrap()
            .push(StackRequest::Set(settings.clone()));
        let settings = match &self.transform {
            Some(transform) => transform(settings),
            None => settings,
        };
        *self.current.lock().unwrap() = settings;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StackError> {
        self.take_failure()?;
        self.requests.lock().unwrap().push(StackRequest::Clear);
        *self.current.lock().unwrap() = ProxySettingsSchema::mode_only(STACK_DEFAULT_MODE);
        Ok(())
    }

    async fn get(&self) -> Result<ProxySettingsSchema, StackError> {
        self.take_failure()?;
        Ok(self.current())
    }
}

/// Settings persisted as a JSON file that another process picks up.
/// A missing file means nothing is configured.
pub struct FileStack {
    path: PathBuf,
}

impl FileStack {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn name(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

#[async_trait]
impl ProxyStack for FileStack {
    async fn set(&self, settings: ProxySettingsSchema) -> Result<(), StackError> {
        let content =
            serde_json::to_string_pretty(&settings).map_err(|e| StackError::Serde(self.name(), e))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StackError::Io(self.name(), e))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StackError::Io(self.name(), e))?;
        tracing::debug!("Wrote {} settings to {}", settings.mode, self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StackError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StackError::Io(self.name(), e)),
        }
    }

    async fn get(&self) -> Result<ProxySettingsSchema, StackError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StackError::Serde(self.name(), e))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Ok(ProxySettingsSchema::mode_only(STACK_DEFAULT_MODE))
            }
            Err(e) => Err(StackError::Io(self.name(), e)),
        }
    }
}
