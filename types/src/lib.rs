//! Fundamental types for the Tide staking core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, handles, digests, amounts and ratios, ledger time, protocol
//! parameters, unit state enums, and the error taxonomy.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod keys;
pub mod params;
pub mod state;
pub mod time;

pub use address::{Address, OperatorId, UnitId};
pub use amount::{ether, mul_div, Amount, Ratio, ETHER};
pub use error::{ErrorKind, TypesError};
pub use hash::Digest32;
pub use keys::{ValidatorPubkey, ValidatorSignature};
pub use params::{ProtocolParams, QuorumRule};
pub use state::{DepositType, UnitStatus};
pub use time::{BlockNumber, Timestamp};
