use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocModelError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
