use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("failed to read configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    ConfigValue(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TranslatorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TranslatorError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslatorError>;
