use std::path::Path;

use walkdir::WalkDir;

use crate::media::{detect_kind, MediaItem};
use crate::ThrottledProgress;

/// Walk the source root and collect every supported media file. Unreadable
/// directory entries are logged and skipped, never fatal.
pub fn discover(source_root: &Path, progress: &ThrottledProgress) -> Vec<MediaItem> {
    let mut items = Vec::new();

    for entry in WalkDir::new(source_root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = detect_kind(entry.path()) else {
            continue;
        };
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        items.push(MediaItem::new(entry.path().to_path_buf(), size, kind));
        // Total is unknown while walking; report against an unreachable
        // total so the completion check never bypasses the throttle.
        let n = items.len() as u64;
        progress.report("scan", n, u64::MAX, &entry.path().display().to_string());
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn quiet(_stage: &str, _current: u64, _total: u64, _message: &str) {}

    #[test]
    fn test_discovers_media_recursively_and_skips_others() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        File::create(dir.path().join("a.jpg")).unwrap().write_all(b"x").unwrap();
        File::create(dir.path().join("sub/b.mp4")).unwrap().write_all(b"y").unwrap();
        File::create(dir.path().join("sub/deeper/c.heic")).unwrap().write_all(b"z").unwrap();
        File::create(dir.path().join("notes.txt")).unwrap().write_all(b"n").unwrap();

        let progress = ThrottledProgress::new(&quiet);
        let mut items = discover(dir.path(), &progress);
        items.sort_by(|a, b| a.path.cmp(&b.path));

        let names: Vec<&str> = items.iter().map(|i| i.filename()).collect();
        assert_eq!(names, vec!["a.jpg", "b.mp4", "c.heic"]);
        assert!(items.iter().all(|i| i.size > 0));
    }

    #[test]
    fn test_empty_root() {
        let dir = tempdir().unwrap();
        let progress = ThrottledProgress::new(&quiet);
        assert!(discover(dir.path(), &progress).is_empty());
    }
}
