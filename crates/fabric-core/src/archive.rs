//! Artifact store adapter
//!
//! Reads the application descriptor out of an uploaded archive. The
//! filesystem reader decodes YAML for `.yaml`/`.yml` files and JSON for
//! everything else.

use crate::error::DeployError;
use async_trait::async_trait;
use fabric_spec::ApplicationSpecification;
use std::path::Path;

/// Reads application specifications from stored archives
#[async_trait]
pub trait ArchiveReader: Send + Sync {
    /// Decode the specification packaged at `location`
    async fn read_specification(&self, location: &Path) -> Result<ApplicationSpecification, DeployError>;
}

/// Descriptor encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    /// JSON descriptor, the default
    Json,
    /// YAML descriptor (`.yaml`, `.yml`)
    Yaml,
}

impl DescriptorFormat {
    /// Format implied by a file extension
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Filesystem archive reader
#[derive(Debug, Clone, Copy, Default)]
pub struct FileArchiveReader;

impl FileArchiveReader {
    /// Create new reader
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode descriptor bytes
    ///
    /// # Errors
    /// Returns [`DeployError::Archive`] for empty or undecodable input
    pub fn decode(location: &Path, bytes: &[u8]) -> Result<ApplicationSpecification, DeployError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(DeployError::archive(location, "archive is empty"));
        }
        match DescriptorFormat::for_path(location) {
            DescriptorFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| DeployError::archive(location, e.to_string()))
            }
            DescriptorFormat::Yaml => {
                serde_yaml::from_slice(bytes).map_err(|e| DeployError::archive(location, e.to_string()))
            }
        }
    }
}

#[async_trait]
impl ArchiveReader for FileArchiveReader {
    async fn read_specification(&self, location: &Path) -> Result<ApplicationSpecification, DeployError> {
        let bytes = tokio::fs::read(location)
            .await
            .map_err(|e| DeployError::archive(location, e.to_string()))?;
        tracing::debug!(archive = %location.display(), bytes = bytes.len(), "read archive");
        Self::decode(location, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_by_extension() {
        assert_eq!(DescriptorFormat::for_path(Path::new("a.yml")), DescriptorFormat::Yaml);
        assert_eq!(DescriptorFormat::for_path(Path::new("a.YAML")), DescriptorFormat::Yaml);
        assert_eq!(DescriptorFormat::for_path(Path::new("a.jar")), DescriptorFormat::Json);
    }

    #[test]
    fn empty_archive_rejected() {
        let err = FileArchiveReader::decode(Path::new("app.jar"), b"  \n").unwrap_err();
        assert!(err.to_string().contains("archive is empty"));
    }

    #[test]
    fn yaml_descriptor() {
        let yaml = b"name: purchases\nmapreduce:\n  agg:\n    name: agg\n    type: map_reduce\n";
        let spec = FileArchiveReader::decode(Path::new("app.yaml"), yaml).unwrap();
        assert_eq!(spec.name, "purchases");
        assert!(spec.mapreduce.contains_key("agg"));
    }

    #[tokio::test]
    async fn read_json_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.jar");
        tokio::fs::write(&path, br#"{"name":"purchases","version":"1.0"}"#)
            .await
            .unwrap();

        let spec = FileArchiveReader::new().read_specification(&path).await.unwrap();
        assert_eq!(spec.name, "purchases");
        assert_eq!(spec.version, "1.0");
    }

    #[tokio::test]
    async fn missing_archive_is_archive_error() {
        let err = FileArchiveReader::new()
            .read_specification(&PathBuf::from("/nonexistent/app.jar"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Archive { .. }));
    }
}
