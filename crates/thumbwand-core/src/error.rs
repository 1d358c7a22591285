use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid relay url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Failed to fetch image: {status}")]
    Status { status: StatusCode },
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("no API key selected")]
    MissingApiKey,
    #[error("Gemini API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    /// The model answered, but only with text.
    #[error("No image generated. The model might have returned only text.")]
    NoImage,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
