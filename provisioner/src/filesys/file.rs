//! JSON documents on disk

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::ProvisionError;

/// A file addressed by path. Nothing is touched until a read or write.
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the file as JSON. A missing file is `Ok(None)`, a malformed
    /// one is an error.
    pub async fn read_json_opt<T: DeserializeOwned>(&self) -> Result<Option<T>, ProvisionError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Encode `value` as pretty JSON and replace the file with it
    pub async fn write_json<T: Serialize>(&self, value: &T) -> Result<(), ProvisionError> {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        self.write_atomic(&bytes).await
    }

    /// Replace the file contents in one rename, creating parent directories
    /// as needed. Readers see either the old or the new contents.
    pub async fn write_atomic(&self, contents: &[u8]) -> Result<(), ProvisionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let staging = self.staging_path();
        let result = async {
            let mut out = fs::File::create(&staging).await?;
            out.write_all(contents).await?;
            out.sync_all().await?;
            fs::rename(&staging, &self.path).await
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&staging).await;
        }
        Ok(result?)
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!(".{}.{}.partial", name, uuid::Uuid::new_v4().simple()))
    }
}
