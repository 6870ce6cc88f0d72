use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedmineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Redmine API Error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Status '{provided}' is not valid. Available statuses: {}", valid.join(", "))]
    UnknownStatus { provided: String, valid: Vec<String> },

    #[error("MCP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RedmineError>;
