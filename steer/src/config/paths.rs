use crate::config::{save_policy, ConfigError, FileError, FileStore, Policy};
use std::path::{Path, PathBuf};

pub const POLICY_FILE: &str = "policy.yml";
pub const SETTINGS_FILE: &str = "proxy-settings.json";

/// Where the policy record and the proxy settings file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteerPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl SteerPaths {
    /// Explicit directories win; otherwise `$HOME/.config/steer` and
    /// `$HOME/.local/share/steer`.
    pub fn resolve(config: Option<PathBuf>, data: Option<PathBuf>) -> Result<Self, FileError> {
        let home = || std::env::var("HOME").map(PathBuf::from);
        let config_dir = match config {
            Some(dir) => dir,
            None => home()?.join(".config").join("steer"),
        };
        let data_dir = match data {
            Some(dir) => dir,
            None => home()?.join(".local").join("share").join("steer"),
        };
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn policy_file(&self) -> PathBuf {
        self.config_dir.join(POLICY_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Create missing directories and seed a default policy record.
    /// Returns what was created; an existing record is never touched.
    pub async fn init(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut created = Vec::new();
        for dir in [&self.config_dir, &self.data_dir] {
            if !exists(dir).await? {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| io_error(dir, e))?;
                created.push(dir.clone());
            }
        }
        let policy_file = self.policy_file();
        if !exists(&policy_file).await? {
            let store = FileStore::new(&policy_file);
            save_policy(&store, &Policy::default()).await?;
            tracing::debug!("Seeded default policy at {}", policy_file.display());
            created.push(policy_file);
        }
        Ok(created)
    }
}

async fn exists(path: &Path) -> Result<bool, FileError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> FileError {
    FileError::Io(path.to_string_lossy().to_string(), e)
}
