//! Settings store errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {0} does not contain a JSON object")]
    NotAnObject(String),
}
