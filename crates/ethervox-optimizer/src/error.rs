use thiserror::Error;

pub type Result<T> = std::result::Result<T, OptimizerError>;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("governor error: {0}")]
    Governor(#[from] ethervox_governor::GovernorError),

    #[error("internal optimizer error: {0}")]
    Internal(String),
}
