use thiserror::Error;
use tide_types::ErrorKind;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("merkle proof too long: {0} levels")]
    ProofTooLong(usize),
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::Serialization(_) => ErrorKind::ConsistencyViolation,
            CryptoError::ProofTooLong(_) => ErrorKind::PreconditionViolation,
        }
    }
}
