use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;

/// Copy (or move) one file to its reserved destination. The source is
/// removed only after the copy succeeded. An Err means "not placed": the
/// destination is cleaned up on any failure, so the caller can release the
/// reserved path without a later item silently overwriting a leftover file.
pub fn place(
    source: &Path,
    dest: &Path,
    timestamp: Option<NaiveDateTime>,
    move_file: bool,
) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    if let Err(e) = fs::copy(source, dest) {
        let _ = fs::remove_file(dest);
        return Err(e).with_context(|| format!("copying to {}", dest.display()));
    }

    // Stamp the destination mtime with the resolved capture time.
    if let Some(dt) = timestamp {
        if let Some(local) = dt.and_local_timezone(chrono::Local).single() {
            let ft = filetime::FileTime::from_unix_time(local.timestamp(), 0);
            filetime::set_file_mtime(dest, ft).ok();
        }
    }

    if move_file {
        if let Err(e) = fs::remove_file(source) {
            let _ = fs::remove_file(dest);
            return Err(e).with_context(|| format!("removing source {}", source.display()));
        }
    }

    Ok(())
}

/// Snapshot of paths already present under the destination root, so a run
/// never silently overwrites files from an earlier run.
pub fn scan_existing_files(root: &Path) -> HashSet<PathBuf> {
    let mut files = HashSet::new();
    scan_recursive(root, &mut files);
    files
}

fn scan_recursive(dir: &Path, files: &mut HashSet<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_recursive(&path, files);
        } else {
            files.insert(path);
        }
    }
}
