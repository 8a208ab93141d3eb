//! File storage for listing images.
//!
//! [`FileStorage`] hides where bytes end up so handlers can be tested
//! against a temporary directory and production can swap in object
//! storage. [`UploadLimits`] holds the per-request checks applied before
//! anything is written.
//!
//! # Example
//!
//! ```ignore
//! use aqar_core::file_storage::{FileStorage, LocalFileStorage};
//! use std::path::PathBuf;
//!
//! let storage = LocalFileStorage::new(
//!     PathBuf::from("./uploads"),
//!     "http://localhost:5000/uploads".to_string(),
//! );
//!
//! let key = storage.save("properties/abc/photo.jpg", &bytes).await?;
//! let url = storage.get_url(&key)?;
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::fs;

use crate::errors::ApiError;

/// Boxed future returned by [`FileStorage`] methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Abstract trait for file storage backends.
pub trait FileStorage: Send + Sync {
    /// Saves `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Deletes the file at `key`; a missing file is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Public URL for the file at `key`.
    fn get_url(&self, key: &str) -> Result<String, StorageError>;
}

/// Error type for file storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File exceeds maximum size of {max_bytes} bytes")]
    InvalidFileSize { max_bytes: usize },

    #[error("At most {max_files} files may be uploaded at once")]
    TooManyFiles { max_files: usize },

    #[error("MIME type '{received}' not allowed. Allowed types: {}", allowed.join(", "))]
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("File not found")]
    NotFound,

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidFileSize { .. } => Self::UploadSizeExceeded,
            StorageError::TooManyFiles { .. } => Self::UploadCountExceeded,
            StorageError::InvalidMimeType { .. } => Self::validation(err.to_string()),
            StorageError::NotFound => Self::ResourceNotFound,
            StorageError::IoError(_) | StorageError::InvalidKey(_) => Self::internal(err),
        }
    }
}

/// Limits applied to a multipart image upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_size: usize,
    pub max_files: usize,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::new(5 * 1024 * 1024, 10)
    }
}

impl UploadLimits {
    /// Image limits accepting PNG, JPEG and WebP.
    pub fn new(max_file_size: usize, max_files: usize) -> Self {
        Self {
            max_file_size,
            max_files,
            allowed_mime_types: vec![
                "image/png".to_string(),
                "image/jpeg".to_string(),
                "image/webp".to_string(),
            ],
        }
    }

    /// Checks that accepting one more file keeps the count within limits.
    pub fn check_count(&self, files_so_far: usize) -> Result<(), StorageError> {
        if files_so_far >= self.max_files {
            return Err(StorageError::TooManyFiles {
                max_files: self.max_files,
            });
        }
        Ok(())
    }

    pub fn check_size(&self, bytes: usize) -> Result<(), StorageError> {
        if bytes > self.max_file_size {
            return Err(StorageError::InvalidFileSize {
                max_bytes: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn check_mime(&self, mime: Option<&str>) -> Result<(), StorageError> {
        let received = mime.unwrap_or("application/octet-stream");
        if !self.allowed_mime_types.iter().any(|m| m == received) {
            return Err(StorageError::InvalidMimeType {
                received: received.to_string(),
                allowed: self.allowed_mime_types.clone(),
            });
        }
        Ok(())
    }

    /// File extension used when storing a file of the given MIME type.
    pub fn extension_for(mime: &str) -> &'static str {
        match mime {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// Local filesystem-based file storage implementation.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    /// Base directory where files are stored
    base_dir: PathBuf,

    /// Base URL for public file access (e.g., "http://localhost:5000/uploads")
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self { base_dir, base_url }
    }

    /// Rejects keys that could escape the base directory.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with '/'".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }
}
