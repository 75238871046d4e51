//! Deploy Fabric configuration
//!
//! Loaded from TOML; every field has a default so a partial file is valid.

use crate::error::ConfigError;
use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default root under which per-account archive directories live
pub const DEFAULT_ARCHIVE_DIR: &str = "/tmp/archive";

/// Default name of the persisted session record
pub const DEFAULT_SESSION_FILE: &str = "session.json";

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    /// Root of the per-account archive directories
    pub archive_dir: PathBuf,
    /// File name of the persisted session record inside an account directory
    pub session_file: String,
    /// Number of deploy workers
    pub deploy_workers: usize,
    /// Deploy jobs that may wait for a worker
    pub queue_capacity: usize,
    /// Upload chunk size used by the CLI, in bytes
    pub chunk_size: usize,
}

impl FabricConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With archive root directory
    #[inline]
    #[must_use]
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = dir.into();
        self
    }

    /// With number of deploy workers
    #[inline]
    #[must_use]
    pub fn with_deploy_workers(mut self, workers: usize) -> Self {
        self.deploy_workers = workers;
        self
    }

    /// With deploy queue capacity
    #[inline]
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// With CLI upload chunk size
    #[inline]
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] when a size is zero
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check sizes are usable
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deploy_workers == 0 {
            return Err(ConfigError::Invalid("deploy_workers must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be at least 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".into()));
        }
        if !is_plain_file_name(&self.session_file) {
            return Err(ConfigError::Invalid("session_file must be a plain file name".into()));
        }
        Ok(())
    }

    /// Directory owned by an account's session
    #[must_use]
    pub fn account_dir(&self, account: &AccountId) -> PathBuf {
        self.archive_dir.join(account.as_str())
    }

    /// Check if an upload file name collides with the session record or its
    /// temporary sibling
    #[must_use]
    pub fn is_reserved_file_name(&self, name: &str) -> bool {
        name == self.session_file || name.strip_suffix(".tmp") == Some(self.session_file.as_str())
    }
}

/// Non-empty single path component that is neither `.` nor `..`
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            archive_dir: PathBuf::from(DEFAULT_ARCHIVE_DIR),
            session_file: DEFAULT_SESSION_FILE.to_string(),
            deploy_workers: 4,
            queue_capacity: 100,
            chunk_size: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FabricConfig::default();
        assert_eq!(config.archive_dir, PathBuf::from("/tmp/archive"));
        assert_eq!(config.session_file, "session.json");
        assert_eq!(config.deploy_workers, 4);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.chunk_size, 65536);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FabricConfig::from_toml_str("archive_dir = \"/srv/fabric\"\ndeploy_workers = 2\n").unwrap();
        assert_eq!(config.archive_dir, PathBuf::from("/srv/fabric"));
        assert_eq!(config.deploy_workers, 2);
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(matches!(
            FabricConfig::from_toml_str("deploy_workers = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            FabricConfig::from_toml_str("deploy_workers = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fabric.toml");
        std::fs::write(&path, "queue_capacity = 7\n").unwrap();
        assert_eq!(FabricConfig::from_toml_file(&path).unwrap().queue_capacity, 7);
        assert!(matches!(
            FabricConfig::from_toml_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn account_paths() {
        let config = FabricConfig::new().with_archive_dir("/data");
        let account = AccountId::new("acme");
        assert_eq!(config.account_dir(&account), PathBuf::from("/data/acme"));
        assert!(config.is_reserved_file_name("session.json"));
        assert!(config.is_reserved_file_name("session.json.tmp"));
        assert!(!config.is_reserved_file_name("app.json"));
    }
}
