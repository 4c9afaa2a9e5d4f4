#[derive(Debug, thiserror::Error)]
pub enum RivalsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("{0} has not been loaded from storage yet")]
    NotHydrated(&'static str),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, RivalsError>;
