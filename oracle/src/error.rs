//! Oracle errors.

use thiserror::Error;
use tide_crypto::CryptoError;
use tide_types::{Address, BlockNumber, ErrorKind};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("{0} is not a committee member")]
    NotMember(Address),

    #[error("{0} is not the guardian")]
    NotGuardian(Address),

    #[error("bootstrap mode is disabled")]
    BootstrapDisabled,

    #[error("{0} is already a committee member")]
    AlreadyMember(Address),

    #[error("{voter} already submitted for period {period}")]
    DuplicateSubmission { period: String, voter: Address },

    #[error("period {period} has already been executed")]
    AlreadyExecuted { period: String },

    #[error("no consensus for period {period}")]
    ConsensusNotReached { period: String },

    #[error("block {block} is not newer than the last applied block {last}")]
    StaleBlock { block: BlockNumber, last: BlockNumber },

    #[error("block {block} is not in the past (current {current})")]
    FutureBlock { block: BlockNumber, current: BlockNumber },

    #[error("staking value {staking} exceeds total value {total}")]
    InvalidBalances { staking: u128, total: u128 },

    #[error("price must be non-zero")]
    ZeroPrice,

    #[error("reward index {index} is behind the current index {current}")]
    StaleRewardIndex { index: u64, current: u64 },

    #[error("per-network reward arrays have different lengths")]
    RewardArraysMismatch,

    #[error("reward submission must cover at least one interval")]
    ZeroIntervals,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl OracleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OracleError::NotMember(_)
            | OracleError::NotGuardian(_)
            | OracleError::BootstrapDisabled => ErrorKind::AuthorizationViolation,
            OracleError::DuplicateSubmission { .. } => ErrorKind::DuplicateSubmission,
            OracleError::AlreadyExecuted { .. } => ErrorKind::AlreadyExecuted,
            OracleError::Crypto(e) => e.kind(),
            _ => ErrorKind::PreconditionViolation,
        }
    }
}
