//! Filesystem destination for downloaded contracts.

use async_trait::async_trait;
use lexa_core::error::{LexaError, Result};
use lexa_core::{Artifact, ArtifactSink};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Saves artifacts into a directory, named after the link the backend emitted.
///
/// Existing files with the same name are overwritten, matching the backend,
/// which reuses output filenames.
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolves the target path, refusing names that would leave `dir`.
    pub fn target_path(&self, filename: &str) -> Result<PathBuf> {
        let relative = Path::new(filename.trim());
        let mut components = relative.components().peekable();
        if components.peek().is_none() {
            return Err(LexaError::io("artifact filename is empty"));
        }
        for component in components {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(LexaError::io(format!(
                        "refusing to save artifact outside {}: {}",
                        self.dir.display(),
                        filename
                    )));
                }
            }
        }
        if relative.file_name().is_none() {
            return Err(LexaError::io(format!("artifact filename has no name: {}", filename)));
        }

        Ok(self.dir.join(relative))
    }
}

#[async_trait]
impl ArtifactSink for FsArtifactStore {
    async fn save(&self, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.target_path(&artifact.filename)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&artifact.bytes).await?;
        file.flush().await?;

        tracing::debug!(
            "[ArtifactStore] Wrote {} bytes to {}",
            artifact.len(),
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn artifact(filename: &str, content: &'static [u8]) -> Artifact {
        Artifact {
            filename: filename.to_string(),
            content_type: None,
            bytes: Bytes::from_static(content),
        }
    }

    #[tokio::test]
    async fn test_save_writes_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(temp_dir.path().join("out"));

        let path = store
            .save(&artifact("contract_123.docx", b"PK\x03\x04docx"))
            .await
            .unwrap();

        assert_eq!(path, temp_dir.path().join("out").join("contract_123.docx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04docx");
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(temp_dir.path());

        store.save(&artifact("contract.docx", b"first version")).await.unwrap();
        let path = store.save(&artifact("contract.docx", b"v2")).await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"v2");
    }

    #[test]
    fn test_rejects_escaping_names() {
        let store = FsArtifactStore::new("/srv/contracts");

        for name in ["../etc/passwd", "/etc/passwd", "a/../../b.docx", "", "  "] {
            assert!(store.target_path(name).is_err(), "accepted {:?}", name);
        }
        assert_eq!(
            store.target_path("./contract.docx").unwrap(),
            PathBuf::from("/srv/contracts/contract.docx")
        );
    }
}
