use pivc_smt::encoder::EncodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),
    #[error("Solver error: {0}")]
    Solver(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
