use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use weibo_blinko::config;
use weibo_blinko::model::SortOrder;
use weibo_blinko::pipeline::{self, RunOptions};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Convert weibo-crawler CSV + media into a Blinko .bko folder structure."
)]
struct Args {
    /// Path to weibo CSV, e.g. weibo/昵称/3046....csv
    #[arg(long)]
    csv: PathBuf,

    /// Weibo user root folder, e.g. weibo/昵称
    #[arg(long)]
    media_root: PathBuf,

    /// Output folder to build the .bko structure in, e.g. weibo/昵称/blinko_bko
    #[arg(long)]
    output_dir: PathBuf,

    /// Blinko export folder containing pgdump/bak.json to take the account and version from
    #[arg(long)]
    export_template: Option<PathBuf>,

    /// Starting sequence number for note IDs
    #[arg(long, default_value_t = 1)]
    seq_start: i64,

    /// Sort order for assigning note IDs
    #[arg(long, value_enum, default_value_t = SortOrder::Newest)]
    seq_order: SortOrder,

    /// Do not package output_dir into a .bko archive
    #[arg(long)]
    no_zip: bool,

    /// Optional YAML config overriding column names, media folders and bundle constants
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;

    let opts = RunOptions {
        csv: args.csv,
        media_root: args.media_root,
        output_dir: args.output_dir,
        export_template: args.export_template,
        seq_start: args.seq_start,
        seq_order: args.seq_order,
        no_zip: args.no_zip,
    };
    info!(csv = %opts.csv.display(), "starting conversion");
    let report = pipeline::run(&cfg, &opts, Utc::now())?;

    println!("Wrote {} notes, {} attachments", report.notes, report.attachments);
    println!("Bundle: {}", report.output_dir.display());
    println!("Index:  {}", report.index_path.display());
    if let Some(archive) = &report.archive {
        println!("Archive: {}", archive.display());
    }
    Ok(())
}
