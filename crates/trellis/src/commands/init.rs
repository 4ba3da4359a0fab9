//! Implementation of the `init` command and the repository config file.
//!
//! `trellis init` creates `.trellis/config.yaml`. Every other command finds
//! that directory by walking up from the working directory.

use crate::error::{ConfigError, Result};
use crate::storage::remote::{ColumnMap, RemoteConfig};
use crate::storage::StoreBackend;
use crate::transition::{Field, TransitionRecorder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Name of the trellis directory
pub const TRELLIS_DIR_NAME: &str = ".trellis";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Environment variable consulted when the config has no API key
pub const API_KEY_ENV: &str = "TRELLIS_API_KEY";

/// Maximum directory depth to traverse when searching for the trellis root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Default remote request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which store backend a repository uses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local store
    #[default]
    Memory,
    /// Remote records API
    Remote,
}

/// Configuration file structure for trellis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrellisConfig {
    /// Storage configuration
    pub storage: StorageConfig,

    /// History configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: BackendKind,

    /// Seed the in-memory store with the built-in issues
    #[serde(default = "default_seed")]
    pub seed: bool,

    /// Remote connection settings, required for the remote backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteSettings>,
}

/// Remote backend section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSettings {
    /// API root URL
    pub base_url: String,

    /// Table holding the issues
    pub table: String,

    /// Bearer token; falls back to `TRELLIS_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Column name overrides
    #[serde(default)]
    pub columns: ColumnMap,
}

/// History configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Fields whose edits are recorded; `status` is always recorded
    #[serde(default = "default_tracked_fields")]
    pub tracked_fields: Vec<Field>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            tracked_fields: default_tracked_fields(),
        }
    }
}

fn default_seed() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_tracked_fields() -> Vec<Field> {
    vec![Field::Status]
}

impl RemoteSettings {
    /// Placeholder settings written by `trellis init --backend remote`.
    pub fn placeholder() -> Self {
        Self {
            base_url: "https://records.example.com/api".to_string(),
            table: "issues".to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            columns: ColumnMap::default(),
        }
    }
}

impl TrellisConfig {
    /// Create a new configuration for the given backend
    pub fn new(backend: BackendKind) -> Self {
        Self {
            storage: StorageConfig {
                backend,
                seed: true,
                remote: (backend == BackendKind::Remote).then(RemoteSettings::placeholder),
            },
            history: HistoryConfig::default(),
        }
    }

    /// Load and validate configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check values serde cannot check.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.storage.backend != BackendKind::Remote {
            return Ok(());
        }
        let remote = self
            .storage
            .remote
            .as_ref()
            .ok_or(ConfigError::MissingRemote)?;

        if !(remote.base_url.starts_with("http://") || remote.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "storage.remote.base_url",
                message: "must start with http:// or https://".to_string(),
            });
        }
        if remote.table.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.remote.table",
                message: "must not be empty".to_string(),
            });
        }
        if remote.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "storage.remote.timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Build the store backend.
    ///
    /// `api_key_fallback` is used when the file has no `api_key`; callers
    /// read it from the environment once at startup.
    pub fn to_backend(&self, api_key_fallback: Option<String>) -> Result<StoreBackend> {
        match self.storage.backend {
            BackendKind::Memory => Ok(StoreBackend::InMemory {
                seed: self.storage.seed,
            }),
            BackendKind::Remote => {
                self.validate()?;
                let remote = self
                    .storage
                    .remote
                    .as_ref()
                    .ok_or(ConfigError::MissingRemote)?;
                Ok(StoreBackend::Remote(RemoteConfig {
                    base_url: remote.base_url.clone(),
                    table: remote.table.clone(),
                    api_key: remote.api_key.clone().or(api_key_fallback),
                    timeout: Duration::from_secs(remote.timeout_secs),
                    columns: remote.columns.clone(),
                }))
            }
        }
    }

    /// Recorder tracking the configured fields.
    pub fn recorder(&self) -> TransitionRecorder {
        TransitionRecorder::new(self.history.tracked_fields.iter().copied())
    }
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self::new(BackendKind::Memory)
    }
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created trellis directory
    pub trellis_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Backend written to the config
    pub backend: BackendKind,
}

/// Initialize a new trellis repository in the given directory.
///
/// # Errors
///
/// Returns an error if `.trellis/` already exists or the files cannot be
/// written.
pub async fn init(base_dir: &Path, backend: BackendKind) -> Result<InitResult> {
    let trellis_dir = base_dir.join(TRELLIS_DIR_NAME);

    if trellis_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(trellis_dir).into());
    }

    fs::create_dir_all(&trellis_dir).await?;

    let config_file = trellis_dir.join(CONFIG_FILE_NAME);
    TrellisConfig::new(backend).save(&config_file).await?;

    tracing::info!(path = %trellis_dir.display(), backend = ?backend, "Initialized trellis");
    Ok(InitResult {
        trellis_dir,
        config_file,
        backend,
    })
}

/// Check if a directory has been initialized with trellis.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(TRELLIS_DIR_NAME).exists()
}

/// Find the trellis root directory by searching up the directory tree.
///
/// Returns the directory containing `.trellis/`, or `None` when the
/// filesystem root or [`MAX_TRAVERSAL_DEPTH`] is reached first.
pub fn find_trellis_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(TRELLIS_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
