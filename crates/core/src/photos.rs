//! Photo evidence attached to checklist items.
//!
//! The workflow only ever sees opaque [`PhotoRef`] values; bytes live behind
//! a [`PhotoStorage`] implementation.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default maximum size of a single uploaded photo (10 MiB).
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Accepted content types and the file extension stored for each.
pub const ACCEPTED_PHOTO_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Opaque reference to a stored photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw photo bytes received from a client.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("Unsupported photo type '{0}'. Must be one of: image/jpeg, image/png, image/webp")]
    UnsupportedType(String),

    #[error("Photo is empty")]
    Empty,

    #[error("Photo is {size} bytes; the maximum is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Photo reference '{0}' is invalid")]
    InvalidReference(String),

    #[error("Photo storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File extension for an accepted content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ACCEPTED_PHOTO_TYPES
        .iter()
        .find(|(ct, _)| ct.eq_ignore_ascii_case(content_type))
        .map(|(_, ext)| *ext)
}

/// Check an upload's content type and size before it is stored.
pub fn validate_upload(upload: &PhotoUpload, max_bytes: usize) -> Result<&'static str, PhotoError> {
    let ext = extension_for(&upload.content_type)
        .ok_or_else(|| PhotoError::UnsupportedType(upload.content_type.clone()))?;
    if upload.data.is_empty() {
        return Err(PhotoError::Empty);
    }
    if upload.data.len() > max_bytes {
        return Err(PhotoError::TooLarge {
            size: upload.data.len(),
            max: max_bytes,
        });
    }
    Ok(ext)
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Persists photo bytes and hands back opaque references.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn store(&self, upload: PhotoUpload) -> Result<PhotoRef, PhotoError>;

    /// Delete a stored photo. Deleting an unknown reference is not an error.
    async fn delete(&self, photo: &PhotoRef) -> Result<(), PhotoError>;
}

/// Stores photos as files under a base directory with generated names.
#[derive(Debug, Clone)]
pub struct LocalPhotoStorage {
    base_dir: PathBuf,
    max_bytes: usize,
}

impl LocalPhotoStorage {
    pub fn new(base_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_bytes,
        }
    }

    fn path_for(&self, photo: &PhotoRef) -> Result<PathBuf, PhotoError> {
        let name = photo.as_str();
        let well_formed = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !name.starts_with('.');
        if !well_formed {
            return Err(PhotoError::InvalidReference(name.to_string()));
        }
        Ok(self.base_dir.join(name))
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn store(&self, upload: PhotoUpload) -> Result<PhotoRef, PhotoError> {
        let ext = validate_upload(&upload, self.max_bytes)?;
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let photo = PhotoRef::new(format!("{}.{ext}", uuid::Uuid::new_v4()));
        tokio::fs::write(self.base_dir.join(photo.as_str()), &upload.data).await?;
        Ok(photo)
    }

    async fn delete(&self, photo: &PhotoRef) -> Result<(), PhotoError> {
        let path = self.path_for(photo)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn jpeg(len: usize) -> PhotoUpload {
        PhotoUpload {
            content_type: "image/jpeg".into(),
            data: vec![0xFF; len],
        }
    }

    #[test]
    fn accepts_known_types_case_insensitively() {
        assert_eq!(extension_for("IMAGE/PNG"), Some("png"));
        assert_eq!(extension_for("image/gif"), None);
    }

    #[test]
    fn rejects_unsupported_empty_and_oversized() {
        let gif = PhotoUpload {
            content_type: "image/gif".into(),
            data: vec![1],
        };
        assert_matches!(validate_upload(&gif, 10), Err(PhotoError::UnsupportedType(_)));
        assert_matches!(validate_upload(&jpeg(0), 10), Err(PhotoError::Empty));
        assert_matches!(
            validate_upload(&jpeg(11), 10),
            Err(PhotoError::TooLarge { size: 11, max: 10 })
        );
        assert_eq!(validate_upload(&jpeg(10), 10).unwrap(), "jpg");
    }

    #[tokio::test]
    async fn local_storage_writes_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalPhotoStorage::new(dir.path().join("photos"), 1024);

        let photo = storage.store(jpeg(16)).await.unwrap();
        assert!(photo.as_str().ends_with(".jpg"));
        let path = dir.path().join("photos").join(photo.as_str());
        assert_eq!(tokio::fs::read(&path).await.unwrap().len(), 16);

        storage.delete(&photo).await.unwrap();
        assert!(!path.exists());
        // Second delete is a no-op.
        storage.delete(&photo).await.unwrap();
    }

    #[tokio::test]
    async fn local_storage_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalPhotoStorage::new(dir.path(), 1024);
        assert_matches!(
            storage.delete(&PhotoRef::new("../secret")).await,
            Err(PhotoError::InvalidReference(_))
        );
    }
}
