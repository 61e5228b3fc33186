//! One conversion run: load → sequence → assemble → pack.
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::archive;
use crate::bundle::{self, BundleLayout};
use crate::config::Config;
use crate::model::{Account, SortOrder};
use crate::records;
use crate::sequence;
use crate::template::{self, Template};

/// Inputs of a run, as given on the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub csv: PathBuf,
    pub media_root: PathBuf,
    pub output_dir: PathBuf,
    pub export_template: Option<PathBuf>,
    pub seq_start: i64,
    pub seq_order: SortOrder,
    pub no_zip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub index_path: PathBuf,
    pub notes: usize,
    pub attachments: usize,
    pub archive: Option<PathBuf>,
}

/// Convert a weibo-crawler export into a Blinko bundle. `now` stamps the run.
#[instrument(skip_all, fields(output = %opts.output_dir.display(), order = opts.seq_order.as_str()))]
pub fn run(cfg: &Config, opts: &RunOptions, now: DateTime<Utc>) -> Result<RunReport> {
    let layout = BundleLayout::new(&opts.output_dir);
    layout.recreate()?;

    let template = match &opts.export_template {
        Some(dir) => template::load(dir)?,
        None => Template::default(),
    };
    let version = template
        .version
        .unwrap_or_else(|| Value::String(cfg.bundle.default_version.clone()));
    let account = template
        .account
        .unwrap_or_else(|| Account::synthesized(now));

    let loaded = records::load_records(&opts.csv, &cfg.columns)?;
    let sequenced = sequence::assign(loaded, opts.seq_start, opts.seq_order)?;

    let report = bundle::assemble(
        &layout,
        &opts.media_root,
        &cfg.media,
        account,
        version,
        &sequenced,
        now,
    )?;

    let archive = if opts.no_zip {
        None
    } else {
        Some(archive::pack(&opts.output_dir, &cfg.bundle.archive_extension)?)
    };

    info!(notes = report.notes, attachments = report.attachments, "conversion finished");
    Ok(RunReport {
        output_dir: opts.output_dir.clone(),
        index_path: report.index_path,
        notes: report.notes,
        attachments: report.attachments,
        archive,
    })
}
