//! Asset References
//!
//! Media files referenced by release events. The core only records where a
//! file lives and what it is; it never opens or probes the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{new_id, AssetId};

/// Asset type enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Video,
    Audio,
    Image,
    Other,
}

impl AssetKind {
    /// Detect asset kind from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "mp4" | "mov" | "avi" | "mkv" | "webm" | "m4v" | "wmv" | "flv" => AssetKind::Video,
            "mp3" | "wav" | "aac" | "ogg" | "flac" | "m4a" | "wma" => AssetKind::Audio,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "tiff" | "svg" => AssetKind::Image,
            _ => AssetKind::Other,
        }
    }

    /// Detect asset kind from file path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(AssetKind::Other)
    }
}

/// Reference to an asset file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub id: AssetId,
    pub name: String,
    pub file_path: String,
    pub file_type: AssetKind,
    /// Duration in seconds (video/audio)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    /// `[width, height]` in pixels (image/video)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Import timestamp (ISO 8601)
    #[serde(default)]
    pub imported_at: String,
}

impl AssetRef {
    /// Creates a reference named after the file, with the kind taken from
    /// its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: new_id(),
            name,
            file_path: path.to_string_lossy().to_string(),
            file_type: AssetKind::from_path(path),
            duration_sec: None,
            dimensions: None,
            file_size: None,
            imported_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_id(mut self, id: impl Into<AssetId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_sec = Some(seconds);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some([width, height]);
        self
    }

    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size = Some(bytes);
        self
    }
}
