use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// An input item breaks a contract the pipeline cannot default around.
    #[error("Invalid item at position {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
