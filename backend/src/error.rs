use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to one of the remote providers (storage, spreadsheet, mail)
/// or to the local PDF engine.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{service} request failed ({status}): {message}")]
    Http {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} request could not be sent: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unexpected response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("Refusing to send message: {0}")]
    InvalidMessage(String),
}

/// Why a submission stopped.
///
/// Only `ClassNotConfigured` and `InvalidInput` are the caller's fault; every
/// other variant is an external failure after which completed stages remain.
#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("No sheet tab configured for class \"{0}\"")]
    ClassNotConfigured(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Upload of {field} failed: {source}")]
    Upload {
        field: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("{0}")]
    Render(#[source] ProviderError),

    #[error("Spreadsheet write to '{tab}' failed: {source}")]
    Sheet {
        tab: String,
        #[source]
        source: ProviderError,
    },

    #[error("Storing the PDF failed: {0}")]
    Storage(#[source] ProviderError),

    #[error(transparent)]
    Roster(#[from] RosterError),
}

impl AdmissionError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AdmissionError::ClassNotConfigured(_) | AdmissionError::InvalidInput(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("class column not found for \"{0}\"")]
    ColumnNotFound(String),

    #[error("Master list update failed: {0}")]
    MasterList(#[source] ProviderError),

    #[error("Class list update failed: {0}")]
    ClassList(#[source] ProviderError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Journal database error: {0}")]
    Database(#[from] rusqlite::Error),
}
