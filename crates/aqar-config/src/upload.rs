//! Listing image upload limits.
//!
//! - `UPLOAD_DIR`: directory files are written to (default: `uploads`)
//! - `UPLOAD_BASE_URL`: public URL prefix for stored files
//!   (default: `http://localhost:5000/uploads`)
//! - `UPLOAD_MAX_FILE_SIZE`: per-file limit in bytes (default: 5 MiB)
//! - `UPLOAD_MAX_FILES`: files accepted per request (default: 10)

use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub base_url: String,
    pub max_file_size: usize,
    pub max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            base_url: "http://localhost:5000/uploads".to_string(),
            max_file_size: 5 * 1024 * 1024,
            max_files: 10,
        }
    }
}

impl UploadConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(crate::env_lookup)
    }

    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            dir: lookup("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.dir),
            base_url: lookup("UPLOAD_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            max_file_size: lookup("UPLOAD_MAX_FILE_SIZE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_file_size),
            max_files: lookup("UPLOAD_MAX_FILES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_files),
        }
    }
}
