use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Errors raised while validating configuration, before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ScanError::MissingConfig(_) | ScanError::InvalidDate(_) | ScanError::InvalidDuration(_)
        )
    }
}
