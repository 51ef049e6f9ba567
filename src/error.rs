use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// Whether a retry at a later time could plausibly succeed.
    pub fn is_temporary(&self) -> bool {
        matches!(
            self,
            Error::Connectivity(_) | Error::Timeout(_) | Error::Io(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Connectivity(_) => "CONNECTIVITY",
            Error::InvalidData(_) => "INVALID_DATA",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Timeout(_) => "TIMEOUT",
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Database(_) => "DATABASE",
            Error::Storage(_) => "STORAGE",
            Error::Config(_) => "CONFIG",
            Error::Cancelled => "CANCELLED",
        }
    }
}
