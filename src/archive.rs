//! Packs the bundle folder into a `.bko` (zip) archive next to it.
use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// The folder's own name, used for the archive file and as the entry root.
fn bundle_name(output_dir: &Path) -> Result<&str> {
    output_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("output dir has no usable name: {}", output_dir.display()))
}

/// Where the archive for `output_dir` goes: a sibling named `<dir name>.<extension>`.
pub fn archive_path(output_dir: &Path, extension: &str) -> Result<PathBuf> {
    let name = bundle_name(output_dir)?;
    let parent = output_dir.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{name}.{extension}")))
}

/// Zip every entry under `output_dir`, rooted at the folder's own name.
/// Any previous archive at the same path is replaced.
#[instrument(skip_all, fields(dir = %output_dir.display()))]
pub fn pack(output_dir: &Path, extension: &str) -> Result<PathBuf> {
    let root_name = bundle_name(output_dir)?;
    let dest = archive_path(output_dir, extension)?;

    if dest.exists() {
        fs::remove_file(&dest).with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    let file = File::create(&dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut files = 0usize;
    for entry in WalkDir::new(output_dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", output_dir.display()))?;
        let path = entry.path();
        let relative = path
            .strip_prefix(output_dir)
            .with_context(|| format!("{} is outside {}", path.display(), output_dir.display()))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let entry_name = zip_entry_name(root_name, relative);

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{entry_name}/"), options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(entry_name, options)?;
            let mut src =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            io::copy(&mut src, &mut zip)
                .with_context(|| format!("failed to compress {}", path.display()))?;
            files += 1;
        }
    }
    zip.finish().context("failed to finish archive")?;

    info!(archive = %dest.display(), files, "archive written");
    Ok(dest)
}

/// Forward-slash entry name under `root`, whatever the host separator.
fn zip_entry_name(root: &str, relative: &Path) -> String {
    let mut name = root.to_string();
    for part in relative.components() {
        name.push('/');
        name.push_str(&part.as_os_str().to_string_lossy());
    }
    name
}
