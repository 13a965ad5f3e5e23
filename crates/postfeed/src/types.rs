use crate::error::{FeedError, IoContext, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub author: String,
    pub publication_date: DateTime<FixedOffset>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub canonical_url: String,
    pub content_html: String,
    pub source_path: PathBuf,
}

impl Post {
    /// Tags followed by categories, verbatim and with duplicates kept.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .chain(self.categories.iter())
            .map(String::as_str)
    }
}

pub fn canonical_url(base_url: &str, stem: &str) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), stem)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(flatten)]
    pub raw: HashMap<String, Value>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key).filter(|value| !value.is_null())
    }

    /// Strings as-is, numbers and booleans stringified.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Feeds and pages land in the build output directory.
    #[default]
    Build,
    /// Feeds go under the docs source tree and are linked as downloads.
    Source,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Build => formatter.write_str("build"),
            OutputMode::Source => formatter.write_str("source"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "build" => Ok(OutputMode::Build),
            "source" => Ok(OutputMode::Source),
            other => Err(format!(
                "unknown output mode '{other}' (expected 'build' or 'source')"
            )),
        }
    }
}

pub const CONFIG_FILE: &str = "postfeed.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub title: String,
    pub description: String,
    pub base_url: String,
    pub author: String,
    pub language: String,
    pub posts_dir: PathBuf,
    pub output_dir: PathBuf,
    pub source_root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feeds_url: Option<String>,
    pub mode: OutputMode,
    pub markup_extension: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: "Cool Docs Blog".to_string(),
            description: "Updates from pfd's doc lab".to_string(),
            base_url: "https://cooldocs.dev/blog".to_string(),
            author: "pfd".to_string(),
            language: "en".to_string(),
            posts_dir: PathBuf::from("docs/posts"),
            output_dir: PathBuf::from("docs/_generated_feeds"),
            source_root: PathBuf::from("docs"),
            feeds_url: None,
            mode: OutputMode::Build,
            markup_extension: "md".to_string(),
        }
    }
}

impl FeedConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).read_context(path)?;
        let mut config: FeedConfig =
            toml::from_str(&content).map_err(|error| FeedError::Config {
                path: path.to_path_buf(),
                message: error.to_string(),
            })?;

        config.base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn feeds_url(&self) -> String {
        match &self.feeds_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/feeds", self.base_url()),
        }
    }

    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
