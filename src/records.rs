//! Loads weibo-crawler CSV exports into [`Record`]s.
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::config::Columns;
use crate::model::Record;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Column positions resolved from the header row. Absent columns read as empty.
#[derive(Debug, Default)]
struct ColumnMap {
    date: Vec<usize>,
    id: Option<usize>,
    text: Option<usize>,
    topic: Option<usize>,
    mentions: Option<usize>,
    location: Option<usize>,
    tool: Option<usize>,
    likes: Option<usize>,
    comments: Option<usize>,
    reposts: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord, columns: &Columns) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Self {
            date: columns.date.iter().filter_map(|d| find(d.as_str())).collect(),
            id: find(columns.id.as_str()),
            text: find(columns.text.as_str()),
            topic: find(columns.topic.as_str()),
            mentions: find(columns.mentions.as_str()),
            location: find(columns.location.as_str()),
            tool: find(columns.tool.as_str()),
            likes: find(columns.likes.as_str()),
            comments: find(columns.comments.as_str()),
            reposts: find(columns.reposts.as_str()),
        }
    }

    fn to_record(&self, row: &csv::StringRecord) -> Option<Record> {
        let get = |idx: Option<usize>| -> String {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        // The first cell that is not empty is taken as is; a whitespace-only
        // value is chosen and then fails to parse.
        let raw_date = self
            .date
            .iter()
            .filter_map(|&i| row.get(i))
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        let posted_at = parse_date(raw_date)?;

        Some(Record {
            posted_at,
            id: get(self.id),
            text: get(self.text),
            topic: get(self.topic),
            mentions: get(self.mentions),
            location: get(self.location),
            tool: get(self.tool),
            likes: get(self.likes),
            comments: get(self.comments),
            reposts: get(self.reposts),
        })
    }
}

/// Parse a crawler timestamp, accepting either a space or `T` separator.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Read a CSV file into records, in file order. Rows without a parseable date are dropped.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_records(path: &Path, columns: &Columns) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse_records(&content, columns)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    info!(count = records.len(), "loaded records");
    Ok(records)
}

/// Parse CSV text (header row first). A leading byte-order mark is ignored.
pub fn parse_records(content: &str, columns: &Columns) -> Result<Vec<Record>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers().context("failed to read CSV header")?.clone();
    let map = ColumnMap::from_headers(&headers, columns);

    let mut out = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.context("failed to read CSV record")?;
        match map.to_record(&row) {
            Some(record) => out.push(record),
            None => debug!(row = line + 1, "skipping row without a parseable date"),
        }
    }
    Ok(out)
}
