use std::path::PathBuf;

use crate::date::ResolvedTimestamp;
use crate::gps::Coordinates;

/// Extensions mime_guess does not reliably map to an image type.
const EXTRA_PHOTO_EXTS: &[&str] = &["heic", "heif", "tif"];
const EXTRA_VIDEO_EXTS: &[&str] = &["m4v", "3gp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// Classify a file by its extension. Returns None for non-media files,
/// which are skipped during discovery.
pub fn detect_kind(path: &std::path::Path) -> Option<MediaKind> {
    if let Some(mime) = mime_guess::from_path(path).first() {
        if mime.type_() == mime_guess::mime::IMAGE {
            return Some(MediaKind::Photo);
        }
        if mime.type_() == mime_guess::mime::VIDEO {
            return Some(MediaKind::Video);
        }
    }

    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if EXTRA_PHOTO_EXTS.contains(&ext.as_str()) {
        Some(MediaKind::Photo)
    } else if EXTRA_VIDEO_EXTS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// One media file under the source root. Resolution fields start empty and
/// are written exactly once while the item moves through the engine.
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Absolute or root-relative source path (item identity)
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    pub kind: MediaKind,
    /// Timestamp from the metadata fallback chain
    pub timestamp: Option<ResolvedTimestamp>,
    /// Capture coordinates, if embedded metadata had valid GPS fields
    pub coordinates: Option<Coordinates>,
    /// SHA-256 hex of file content (hashed once, reused across conflict retries)
    pub fingerprint: Option<String>,
}

impl MediaItem {
    pub fn new(path: PathBuf, size: u64, kind: MediaKind) -> Self {
        Self {
            path,
            size,
            kind,
            timestamp: None,
            coordinates: None,
            fingerprint: None,
        }
    }

    pub fn filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
    }
}
