// src/core/fs_ops.rs
//! File system helpers for the output and template directories

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

use crate::app_log;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            app_log!(info, "Created directory: {}", path.display());
        }
        Ok(())
    }

    pub async fn read_file_safe(path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    /// Read a text file that may legitimately be absent
    pub async fn read_optional(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read file: {}", path.display())),
        }
    }

    /// Bytes of a file, `None` when it does not exist
    pub async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read file: {}", path.display())),
        }
    }

    pub async fn write_bytes(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        app_log!(info, "Written file: {} ({} bytes)", path.display(), content.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cv_abc.odt");

        FsOps::write_bytes(&path, b"PK\x03\x04").await.unwrap();
        assert_eq!(FsOps::read_bytes(&path).await.unwrap(), Some(b"PK\x03\x04".to_vec()));
    }

    #[tokio::test]
    async fn missing_files_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(FsOps::read_bytes(&dir.path().join("nope.odt")).await.unwrap(), None);
        assert_eq!(FsOps::read_optional(&dir.path().join("nope.html")).await.unwrap(), None);
    }
}
