//! Collateral Ledger: per-operator bonded stake and matched-capital bounds.
//!
//! Every operator posts collateral before it may match pooled capital. The
//! ledger tracks two numbers per operator and derives everything else:
//!
//! - `effective_stake = min(total_stake, eth_matched × max_ratio / price)`
//! - `minimum_stake   = eth_matched × min_ratio / price`
//! - `eth_matched_limit = total_stake × price / min_ratio`
//!
//! `eth_matched` moves only on unit creation, dissolution, exit, and bond
//! reduction. Matching pooled capital into a queued unit never touches it.

pub mod error;
pub mod ledger;
pub mod record;

pub use error::CollateralError;
pub use ledger::CollateralLedger;
pub use record::CollateralRecord;
