use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid root margin: {0}")]
    InvalidRootMargin(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
