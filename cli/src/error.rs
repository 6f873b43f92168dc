use tcr_registry::RegistryError;
use tcr_token::TokenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log line {line}: {message}")]
    Log { line: usize, message: String },

    #[error("registry setup failed: {0}")]
    Setup(#[from] RegistryError),

    #[error("genesis allocation failed: {0}")]
    Genesis(#[from] TokenError),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}
