//! Crate-wide error type. Network lookups degrade to `None` instead of
//! surfacing here; everything that can stop an operation goes through
//! [`Error`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("an export is already in progress")]
    ExportInProgress,

    #[error("pdf composition failed: {0}")]
    Pdf(String),

    #[error("font unavailable: {0}")]
    Font(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("email draft could not be built: {0}")]
    Email(String),

    #[error("an account already exists for {0}")]
    AccountExists(String),

    #[error("no account with that user id")]
    UnknownUser,

    #[error("wrong pin code")]
    WrongPin,
}

impl From<printpdf::Error> for Error {
    fn from(e: printpdf::Error) -> Self {
        Error::Pdf(e.to_string())
    }
}
