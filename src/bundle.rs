//! Builds the Blinko `.bko` folder: copied media, staged Markdown and `pgdump/bak.json`.
use anyhow::{Context, Result};
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::config::MediaDirs;
use crate::media;
use crate::model::{iso_utc_micros, iso_utc_millis, Account, Attachment, Backup, Note, SequencedRecord};
use crate::render;

/// Directory layout Blinko's importer expects.
#[derive(Debug, Clone)]
pub struct BundleLayout {
    pub root: PathBuf,
    pub files: PathBuf,
    pub pgdump: PathBuf,
    pub plugins: PathBuf,
    pub vector: PathBuf,
}

impl BundleLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            files: root.join("files"),
            pgdump: root.join("pgdump"),
            plugins: root.join("plugins"),
            vector: root.join("vector"),
        }
    }

    /// Delete `root` if present and create the empty layout.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn recreate(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .with_context(|| format!("failed to clear {}", self.root.display()))?;
        }
        for dir in [&self.files, &self.pgdump, &self.plugins, &self.vector] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn index_path(&self) -> PathBuf {
        self.pgdump.join("bak.json")
    }

    pub fn staging_dir(&self, run_ms: i64) -> PathBuf {
        self.files.join(format!("markdown_extract_{run_ms}"))
    }
}

/// Epoch milliseconds of a crawler timestamp, read as local time.
pub fn local_epoch_millis(ts: &NaiveDateTime) -> i64 {
    match Local.from_local_datetime(ts) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.timestamp_millis(),
        LocalResult::None => ts.and_utc().timestamp_millis(),
    }
}

/// Output name of a copied media file. `attach_ms` keeps names unique per post.
pub fn attachment_name(posted_at: &NaiveDateTime, attach_ms: i64, ext: &str) -> String {
    format!("{}_{}{}", posted_at.format("%Y%m%d_%H%M%S"), attach_ms, ext)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    pub notes: usize,
    pub attachments: usize,
    pub index_path: PathBuf,
    pub staging_dir: PathBuf,
}

/// Turns sequenced records into notes, copying media as it goes.
///
/// Holds the attachment id counter and the file names handed out so far for
/// the whole run, so ids are unique and increasing across all notes and no two
/// attachments share a file.
pub struct Assembler<'a> {
    layout: &'a BundleLayout,
    media_root: &'a Path,
    media_dirs: &'a MediaDirs,
    account: Account,
    staging_dir: PathBuf,
    next_attachment_id: i64,
    claimed: HashSet<String>,
}

impl<'a> Assembler<'a> {
    /// Creates the per-run staging folder under `files/`.
    pub fn new(
        layout: &'a BundleLayout,
        media_root: &'a Path,
        media_dirs: &'a MediaDirs,
        account: Account,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let staging_dir = layout.staging_dir(now.timestamp_millis());
        fs::create_dir_all(&staging_dir)
            .with_context(|| format!("failed to create {}", staging_dir.display()))?;
        Ok(Self {
            layout,
            media_root,
            media_dirs,
            account,
            staging_dir,
            next_attachment_id: 1,
            claimed: HashSet::new(),
        })
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Build one note: copy its media, stage its Markdown, return the note object.
    pub fn add_note(&mut self, item: &SequencedRecord) -> Result<Note> {
        let record = &item.record;
        let base_ms = local_epoch_millis(&record.posted_at);

        let sources =
            media::collect_media(self.media_root, self.media_dirs, &record.posted_at, &record.id)?;
        let mut attachments = Vec::with_capacity(sources.len());
        for (idx, src) in sources.iter().enumerate() {
            let ext = media::dotted_extension(src);
            let mut attach_ms = base_ms + idx as i64 * 1000;
            let mut name = attachment_name(&record.posted_at, attach_ms, &ext);
            // Posts sharing a timestamp would otherwise reuse each other's slots.
            while self.claimed.contains(&name) {
                attach_ms += 1000;
                name = attachment_name(&record.posted_at, attach_ms, &ext);
            }
            self.claimed.insert(name.clone());
            let dest = self.layout.files.join(&name);
            if !dest.exists() {
                copy_preserving_mtime(src, &dest)?;
            }
            let size = fs::metadata(&dest)
                .with_context(|| format!("failed to stat {}", dest.display()))?
                .len();

            let created = iso_utc_millis(attach_ms);
            attachments.push(Attachment {
                id: self.next_attachment_id,
                is_share: false,
                share_password: String::new(),
                path: format!("/api/file/{name}"),
                mime: media::guess_mime(&name).to_string(),
                name,
                size: size.to_string(),
                note_id: item.seq,
                account_id: self.account.id(),
                sort_order: idx,
                created_at: created.clone(),
                updated_at: created,
                prefix_path: String::new(),
                depth: 0,
                metadata: None,
            });
            self.next_attachment_id += 1;
        }

        let content = render::note_content(record, &attachments);
        let md_path = self.staging_dir.join(format!("note-{}-{}.md", item.seq, base_ms));
        fs::write(&md_path, &content)
            .with_context(|| format!("failed to write {}", md_path.display()))?;
        debug!(seq = item.seq, weibo_id = %record.id, attachments = attachments.len(), "note staged");

        let created = iso_utc_millis(base_ms);
        Ok(Note {
            id: item.seq,
            account: self.account.clone(),
            content,
            is_archived: false,
            is_share: false,
            is_top: false,
            created_at: created.clone(),
            updated_at: created,
            kind: 0,
            attachments,
            tags: Vec::new(),
            references: Vec::new(),
            referenced_by: Vec::new(),
        })
    }
}

fn copy_preserving_mtime(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dest.display()))?;
    let modified = fs::metadata(src).and_then(|m| m.modified());
    if let Ok(modified) = modified {
        fs::File::options()
            .write(true)
            .open(dest)
            .and_then(|f| f.set_modified(modified))
            .with_context(|| format!("failed to set mtime on {}", dest.display()))?;
    }
    Ok(())
}

/// Assemble every note into an already-created layout and write `bak.json`.
#[instrument(skip_all, fields(root = %layout.root.display(), records = records.len()))]
pub fn assemble(
    layout: &BundleLayout,
    media_root: &Path,
    media_dirs: &MediaDirs,
    account: Account,
    version: Value,
    records: &[SequencedRecord],
    now: DateTime<Utc>,
) -> Result<BundleReport> {
    let mut assembler = Assembler::new(layout, media_root, media_dirs, account, now)?;
    let mut notes = Vec::with_capacity(records.len());
    for item in records {
        notes.push(assembler.add_note(item)?);
    }
    let attachments = notes.iter().map(|n| n.attachments.len()).sum();
    let staging_dir = assembler.staging_dir().to_path_buf();

    let backup = Backup {
        notes,
        export_time: iso_utc_micros(now),
        version,
    };
    let index_path = layout.index_path();
    let json = serde_json::to_string_pretty(&backup).context("failed to serialize bak.json")?;
    fs::write(&index_path, json)
        .with_context(|| format!("failed to write {}", index_path.display()))?;

    info!(notes = backup.notes.len(), attachments, "bundle written");
    Ok(BundleReport {
        notes: backup.notes.len(),
        attachments,
        index_path,
        staging_dir,
    })
}
