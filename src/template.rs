//! Reuse the account and format version of an existing Blinko export.
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::model::Account;

/// What an export template contributes. Both parts are optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub account: Option<Account>,
    /// Taken as found, whatever its JSON type.
    pub version: Option<Value>,
}

/// Read `<export_dir>/pgdump/bak.json`. A missing file is not an error;
/// an unreadable or malformed one is.
#[instrument(skip_all, fields(dir = %export_dir.display()))]
pub fn load(export_dir: &Path) -> Result<Template> {
    let bak_path = export_dir.join("pgdump").join("bak.json");
    if !bak_path.exists() {
        info!(path = %bak_path.display(), "export template has no bak.json; using defaults");
        return Ok(Template::default());
    }
    let content = fs::read_to_string(&bak_path)
        .with_context(|| format!("failed to read {}", bak_path.display()))?;
    let data: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", bak_path.display()))?;
    Ok(from_backup(&data))
}

/// Pick the first note's account and the top-level version out of a parsed backup.
pub fn from_backup(data: &Value) -> Template {
    let version = data.get("version").cloned();

    let account = match data
        .get("notes")
        .and_then(Value::as_array)
        .and_then(|notes| notes.first())
        .and_then(|note| note.get("account"))
    {
        Some(Value::Object(map)) if !map.is_empty() => Some(Account(map.clone())),
        _ => None,
    };

    Template { account, version }
}
