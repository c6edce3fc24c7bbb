use thiserror::Error;

use crate::app::ports::ExtractionError;

#[derive(Error, Debug)]
pub enum TrafficError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Extraction failed for {file}: {source}")]
    Extraction {
        file: String,
        #[source]
        source: ExtractionError,
    },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),
}

impl From<rusqlite::Error> for TrafficError {
    fn from(err: rusqlite::Error) -> Self {
        TrafficError::Store { message: err.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, TrafficError>;
