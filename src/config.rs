//! Configuration loader and validator for the Weibo→Blinko converter.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub columns: Columns,
    pub media: MediaDirs,
    pub bundle: BundleSettings,
}

/// CSV column names produced by weibo-crawler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Columns {
    /// Accepted date columns, in lookup order. The first non-empty one wins.
    pub date: Vec<String>,
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

impl Default for Columns {
    fn default() -> Self {
        Self {
            date: vec!["完整日期".into(), "日期".into()],
            id: "id".into(),
            text: "正文".into(),
            topic: "话题".into(),
            mentions: "@用户".into(),
            location: "位置".into(),
            tool: "工具".into(),
            likes: "点赞数".into(),
            comments: "评论数".into(),
            reposts: "转发数".into(),
        }
    }
}

/// Media category folders, relative to the media root. Scanned in this order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MediaDirs {
    pub images: String,
    pub videos: String,
    pub live_photos: String,
}

impl Default for MediaDirs {
    fn default() -> Self {
        Self {
            images: "img/原创微博图片".into(),
            videos: "video/原创微博视频".into(),
            live_photos: "live_photo/原创微博Live Photo视频".into(),
        }
    }
}

impl MediaDirs {
    pub fn in_scan_order(&self) -> [&str; 3] {
        [self.images.as_str(), self.videos.as_str(), self.live_photos.as_str()]
    }
}

/// Constants of the Blinko backup format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BundleSettings {
    /// Version written to `bak.json` when no export template supplies one.
    pub default_version: String,
    pub archive_extension: String,
}

impl Default for BundleSettings {
    fn default() -> Self {
        Self {
            default_version: "1.7.0".into(),
            archive_extension: "bko".into(),
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let c = &cfg.columns;
    if c.date.is_empty() {
        return Err(ConfigError::Invalid("columns.date must list at least one column"));
    }
    if c.date.iter().any(|d| d.trim().is_empty()) {
        return Err(ConfigError::Invalid("columns.date entries must be non-empty"));
    }
    let named = [
        (&c.id, "columns.id must be non-empty"),
        (&c.text, "columns.text must be non-empty"),
        (&c.topic, "columns.topic must be non-empty"),
        (&c.mentions, "columns.mentions must be non-empty"),
        (&c.location, "columns.location must be non-empty"),
        (&c.tool, "columns.tool must be non-empty"),
        (&c.likes, "columns.likes must be non-empty"),
        (&c.comments, "columns.comments must be non-empty"),
        (&c.reposts, "columns.reposts must be non-empty"),
    ];
    for (value, msg) in named {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid(msg));
        }
    }

    if cfg.media.images.trim().is_empty() {
        return Err(ConfigError::Invalid("media.images must be non-empty"));
    }
    if cfg.media.videos.trim().is_empty() {
        return Err(ConfigError::Invalid("media.videos must be non-empty"));
    }
    if cfg.media.live_photos.trim().is_empty() {
        return Err(ConfigError::Invalid("media.live_photos must be non-empty"));
    }

    if cfg.bundle.default_version.trim().is_empty() {
        return Err(ConfigError::Invalid("bundle.default_version must be non-empty"));
    }
    let ext = cfg.bundle.archive_extension.trim();
    if ext.is_empty() || ext.contains(['/', '\\', '.']) {
        return Err(ConfigError::Invalid(
            "bundle.archive_extension must be a bare, non-empty extension",
        ));
    }

    Ok(())
}

/// Returns a YAML document equal to the built-in defaults.
pub fn example() -> &'static str {
    r#"columns:
  date:
    - "完整日期"
    - "日期"
  id: "id"
  text: "正文"
  topic: "话题"
  mentions: "@用户"
  location: "位置"
  tool: "工具"
  likes: "点赞数"
  comments: "评论数"
  reposts: "转发数"

media:
  images: "img/原创微博图片"
  videos: "video/原创微博视频"
  live_photos: "live_photo/原创微博Live Photo视频"

bundle:
  default_version: "1.7.0"
  archive_extension: "bko"
"#
}
