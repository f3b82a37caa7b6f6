use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no data provided")]
    MissingData,

    #[error("invalid record shape: expected a field map, found {0}")]
    InvalidShape(&'static str),

    #[error("unknown record format: no category key present")]
    UnknownCategory,

    #[error("unknown output type: record carries no category tag")]
    UnknownOutputType,

    #[error("not a known stage kind: {0}")]
    NotAStage(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
