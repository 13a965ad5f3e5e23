use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Malformed front matter in {path}: {message}")]
    MalformedFrontMatter { path: PathBuf, message: String },

    #[error("Unparseable date '{value}' in file: {path}")]
    DateParse { path: PathBuf, value: String },

    #[error("Invalid '{field}' field in {path}: {message}")]
    InvalidField {
        path: PathBuf,
        field: String,
        message: String,
    },

    #[error("Category '{category}' does not produce a usable slug: {reason}")]
    InvalidSlug { category: String, reason: String },

    #[error("Categories '{category}' and '{existing}' share the slug '{slug}'")]
    DuplicateSlug {
        slug: String,
        category: String,
        existing: String,
    },

    #[error("Cannot read {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;

/// Attaches the offending path to an I/O failure.
pub trait IoContext<T> {
    fn read_context(self, path: &Path) -> Result<T>;
    fn write_context(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn read_context(self, path: &Path) -> Result<T> {
        self.map_err(|source| FeedError::Filesystem {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_context(self, path: &Path) -> Result<T> {
        self.map_err(|source| FeedError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}
