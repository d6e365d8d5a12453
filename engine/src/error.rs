//! Engine errors.
//!
//! Subsystem errors pass through unchanged; [`EngineError::kind`] reports
//! the same category the subsystem would.

use thiserror::Error;
use tide_collateral::CollateralError;
use tide_crypto::CryptoError;
use tide_deposit::DepositError;
use tide_oracle::OracleError;
use tide_rewards::RewardsError;
use tide_types::{Address, Amount, DepositType, ErrorKind, Ratio, Timestamp, TypesError};
use tide_unit::UnitError;

use crate::fault::FaultPoint;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Collateral(#[from] CollateralError),

    #[error(transparent)]
    Deposit(#[from] DepositError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Rewards(#[from] RewardsError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("{0} is not a registered operator")]
    NotOperator(Address),

    #[error("{0} is already a registered operator")]
    OperatorExists(Address),

    #[error("{caller} does not operate unit {unit}")]
    NotUnitOperator { caller: Address, unit: Address },

    #[error("{caller} may not change the withdrawal address of {operator}")]
    NotWithdrawalAuthority { caller: Address, operator: Address },

    #[error("{0} is not the guardian")]
    NotGuardian(Address),

    #[error("{0} is not a committee member")]
    NotMember(Address),

    #[error("no unit at {0}")]
    UnknownUnit(Address),

    #[error("a unit already exists at {0}")]
    DuplicateUnitAddress(Address),

    #[error("unit would be created at {derived}, not the predicted {predicted}")]
    PredictedAddressMismatch { predicted: Address, derived: Address },

    #[error("validator key is already in use")]
    DuplicatePubkey,

    #[error("bond {bond} does not equal value {value} plus credit {credit}")]
    BondValueMismatch {
        bond: Amount,
        value: Amount,
        credit: Amount,
    },

    #[error("deposit credit {available} is less than {requested}")]
    InsufficientCredit { requested: Amount, available: Amount },

    #[error("deposit type {0:?} is not accepted for new units")]
    DepositTypeNotAllowed(DepositType),

    #[error("current node fee {fee} is below the requested minimum {minimum}")]
    NodeFeeBelowMinimum { fee: Ratio, minimum: Ratio },

    #[error("migrated validator balance {balance} is below {minimum}")]
    MigrationBalanceTooLow { balance: Amount, minimum: Amount },

    #[error("deposit data root does not match the request")]
    DepositDataMismatch,

    #[error("operation does not accept value, got {0}")]
    UnexpectedValue(Amount),

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("smoothing pool registration is already {0}")]
    SmoothingPoolStateUnchanged(bool),

    #[error("smoothing pool registration may change again at {allowed_at:?}")]
    SmoothingPoolChangeTooSoon { allowed_at: Timestamp },

    #[error("no reward snapshot has reached consensus for index {0}")]
    RewardsNotReached(u64),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("injected fault at {0:?}")]
    InjectedFault(FaultPoint),

    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Collateral(e) => e.kind(),
            EngineError::Deposit(e) => e.kind(),
            EngineError::Unit(e) => e.kind(),
            EngineError::Oracle(e) => e.kind(),
            EngineError::Rewards(e) => e.kind(),
            EngineError::Crypto(e) => e.kind(),
            EngineError::Types(e) => e.kind(),
            EngineError::NotOperator(_)
            | EngineError::NotUnitOperator { .. }
            | EngineError::NotWithdrawalAuthority { .. }
            | EngineError::NotGuardian(_)
            | EngineError::NotMember(_) => ErrorKind::AuthorizationViolation,
            EngineError::InsufficientCredit { .. } | EngineError::Overflow => {
                ErrorKind::ArithmeticBound
            }
            EngineError::InjectedFault(_) => ErrorKind::ConsistencyViolation,
            _ => ErrorKind::PreconditionViolation,
        }
    }
}
