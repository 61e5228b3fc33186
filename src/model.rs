use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One weibo post as read from the crawler's CSV. String fields are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub posted_at: NaiveDateTime,
    pub id: String,
    pub text: String,
    pub topic: String,
    pub mentions: String,
    pub location: String,
    pub tool: String,
    pub likes: String,
    pub comments: String,
    pub reposts: String,
}

/// A record with the note id assigned by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedRecord {
    pub seq: i64,
    pub record: Record,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    /// Latest post gets the first id.
    #[default]
    Newest,
    /// Earliest post gets the first id.
    Oldest,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }
}

/// Blinko account object embedded in every note.
///
/// Kept as the raw JSON object so a template account round-trips with its
/// field order and value types untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Account(pub Map<String, Value>);

impl Account {
    /// Account used when no export template is available.
    pub fn synthesized(now: DateTime<Utc>) -> Self {
        let ts = iso_utc_micros(now);
        let mut fields = Map::new();
        fields.insert("id".into(), 1.into());
        fields.insert("name".into(), "user".into());
        fields.insert("nickname".into(), "user".into());
        fields.insert("password".into(), "".into());
        fields.insert("image".into(), "".into());
        fields.insert("apiToken".into(), "".into());
        fields.insert("description".into(), "".into());
        fields.insert("note".into(), 0.into());
        fields.insert("role".into(), "user".into());
        fields.insert("loginType".into(), "".into());
        fields.insert("linkAccountId".into(), Value::Null);
        fields.insert("createdAt".into(), ts.clone().into());
        fields.insert("updatedAt".into(), ts.into());
        Self(fields)
    }

    /// The account's `id` as stored, or `1` when absent.
    pub fn id(&self) -> Value {
        self.0.get("id").cloned().unwrap_or_else(|| 1.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: i64,
    pub is_share: bool,
    pub share_password: String,
    pub name: String,
    pub path: String,
    /// Byte size as a decimal string, as Blinko stores it.
    pub size: String,
    #[serde(rename = "type")]
    pub mime: String,
    pub note_id: i64,
    /// Copied from the account as-is.
    pub account_id: Value,
    pub sort_order: usize,
    pub created_at: String,
    pub updated_at: String,
    // Blinko's own spelling.
    #[serde(rename = "perfixPath")]
    pub prefix_path: String,
    pub depth: i64,
    pub metadata: Option<Value>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub account: Account,
    pub content: String,
    pub is_archived: bool,
    pub is_share: bool,
    pub is_top: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(rename = "type")]
    pub kind: i64,
    pub attachments: Vec<Attachment>,
    pub tags: Vec<Value>,
    pub references: Vec<Value>,
    pub referenced_by: Vec<Value>,
}

/// Contents of `pgdump/bak.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub notes: Vec<Note>,
    pub export_time: String,
    /// Usually a string; a template's value is carried over whatever its type.
    pub version: Value,
}

/// ISO-8601 in UTC with a `Z` suffix; fractional seconds only when present.
pub fn iso_utc(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// ISO-8601 in UTC with a `Z` suffix and microsecond precision, omitting the
/// fraction when it is zero. Used for wall-clock stamps such as `exportTime`.
pub fn iso_utc_micros(ts: DateTime<Utc>) -> String {
    if ts.timestamp_subsec_micros() == 0 {
        ts.to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Same as [`iso_utc`] for an epoch-millisecond value. Out-of-range values clamp to the epoch.
pub fn iso_utc_millis(ms: i64) -> String {
    iso_utc(DateTime::from_timestamp_millis(ms).unwrap_or_default())
}
