//! Media directory scanning

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MediaError;

/// Supported image MIME types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get the MIME type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

impl fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which image types a platform accepts from the media directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    types: Vec<ImageMimeType>,
}

impl MediaFilter {
    pub fn new(types: Vec<ImageMimeType>) -> Self {
        Self { types }
    }

    /// JPEG, PNG and GIF
    pub fn bluesky() -> Self {
        Self::new(vec![
            ImageMimeType::Jpeg,
            ImageMimeType::Png,
            ImageMimeType::Gif,
        ])
    }

    /// JPEG, PNG, GIF and WebP
    pub fn all_images() -> Self {
        Self::new(vec![
            ImageMimeType::Png,
            ImageMimeType::Jpeg,
            ImageMimeType::Gif,
            ImageMimeType::WebP,
        ])
    }

    pub fn matches(&self, path: &Path) -> bool {
        ImageMimeType::from_path(path).is_some_and(|mime| self.types.contains(&mime))
    }
}

/// List image files in `dir` accepted by `filter`, sorted by file name.
///
/// A missing directory is logged and yields an empty list so callers can
/// report "no images found" uniformly. Subdirectories are not descended.
pub fn list_media_files(dir: &Path, filter: &MediaFilter) -> Result<Vec<PathBuf>, MediaError> {
    if !dir.exists() {
        warn!("Directory '{}' does not exist.", dir.display());
        return Ok(Vec::new());
    }

    let read_error = |source| MediaError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        if filter.matches(&path) {
            files.push(path);
        } else {
            debug!("Ignoring non-image file: {}", path.display());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
