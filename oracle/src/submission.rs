//! Payloads committee members submit.
//!
//! Votes are tallied by the digest of the whole payload, so members agree only
//! when every field matches.

use serde::{Deserialize, Serialize};
use tide_types::{Address, Amount, BlockNumber, Digest32};

use crate::error::OracleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancesSubmission {
    pub block: BlockNumber,
    pub total_value: Amount,
    pub staking_value: Amount,
    pub receipt_supply: Amount,
}

impl BalancesSubmission {
    pub fn validate(&self) -> Result<(), OracleError> {
        if self.staking_value > self.total_value {
            return Err(OracleError::InvalidBalances {
                staking: self.staking_value,
                total: self.total_value,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSubmission {
    pub block: BlockNumber,
    /// Pooled-currency value of one whole unit of collateral, `ETHER`-scaled.
    pub price: Amount,
}

impl PriceSubmission {
    pub fn validate(&self) -> Result<(), OracleError> {
        if self.price == 0 {
            return Err(OracleError::ZeroPrice);
        }
        Ok(())
    }
}

/// A reported offense by the unit at `unit`, observed at `block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltySubmission {
    pub unit: Address,
    pub block: BlockNumber,
}

/// Aggregate totals of one reward interval.
///
/// The per-network vectors are parallel: entry `i` of each describes network `i`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSubmission {
    pub index: u64,
    pub execution_block: BlockNumber,
    pub consensus_block: BlockNumber,
    /// Root of the published reward tree.
    pub digest: Digest32,
    /// Where the tree is published.
    pub pointer: String,
    pub intervals_passed: u64,
    /// Collateral-asset share sent to the treasury.
    pub treasury_share: Amount,
    pub trusted_operator_shares: Vec<Amount>,
    pub operator_shares: Vec<Amount>,
    /// Pooled-currency share per network, claimable from the smoothing pool.
    pub user_shares: Vec<Amount>,
    /// Pooled-currency share returned to pooled users.
    pub user_eth_share: Amount,
    /// Pooled-currency share sent to the fee recipient.
    pub fee_recipient_share: Amount,
}

impl RewardSubmission {
    pub fn validate(&self) -> Result<(), OracleError> {
        let n = self.trusted_operator_shares.len();
        if self.operator_shares.len() != n || self.user_shares.len() != n {
            return Err(OracleError::RewardArraysMismatch);
        }
        if self.intervals_passed == 0 {
            return Err(OracleError::ZeroIntervals);
        }
        Ok(())
    }

    /// Collateral-asset total owed to operators across networks.
    pub fn collateral_total(&self) -> Option<Amount> {
        self.trusted_operator_shares
            .iter()
            .chain(self.operator_shares.iter())
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
    }

    /// Pooled-currency total claimable across networks.
    pub fn operator_eth_total(&self) -> Option<Amount> {
        self.user_shares
            .iter()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
    }
}
