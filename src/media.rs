//! Finds the crawler's downloaded media for a post.
//!
//! weibo-crawler names every file `<YYYYMMDD>T_<weibo id>...`, so matching is a
//! plain filename-prefix scan over the three category folders.
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MediaDirs;

/// Filename prefix shared by every media file of one post.
pub fn media_prefix(posted_at: &NaiveDateTime, weibo_id: &str) -> String {
    format!("{}T_{}", posted_at.format("%Y%m%d"), weibo_id)
}

/// Collect media files for a post: images, then videos, then live photos,
/// each folder's matches sorted by path. Missing folders are skipped.
pub fn collect_media(
    media_root: &Path,
    dirs: &MediaDirs,
    posted_at: &NaiveDateTime,
    weibo_id: &str,
) -> Result<Vec<PathBuf>> {
    let prefix = media_prefix(posted_at, weibo_id);
    let mut out = Vec::new();
    for sub in dirs.in_scan_order() {
        let dir = media_root.join(sub);
        if !dir.exists() {
            continue;
        }
        let mut matches = Vec::new();
        let entries =
            fs::read_dir(&dir).with_context(|| format!("failed to list {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) {
                matches.push(entry.path());
            }
        }
        matches.sort();
        out.extend(matches.into_iter().filter(|p| p.is_file()));
    }
    Ok(out)
}

/// Guess a MIME type from the file extension.
pub fn guess_mime(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Lower-cased extension including its dot, or empty.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}
