//! Network totals applied after consensus.

use serde::{Deserialize, Serialize};
use tide_types::{Amount, BlockNumber};

use crate::error::OracleError;
use crate::submission::{BalancesSubmission, PriceSubmission};

/// Reported must be strictly newer than `last` and strictly before `current`.
fn check_block(block: BlockNumber, last: BlockNumber, current: BlockNumber) -> Result<(), OracleError> {
    if block >= current {
        return Err(OracleError::FutureBlock { block, current });
    }
    if block <= last {
        return Err(OracleError::StaleBlock { block, last });
    }
    Ok(())
}

/// Latest consensus view of the pool's total value and receipt supply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkBalances {
    pub block: BlockNumber,
    pub total_value: Amount,
    pub staking_value: Amount,
    pub receipt_supply: Amount,
}

impl NetworkBalances {
    pub fn check(&self, sub: &BalancesSubmission, current: BlockNumber) -> Result<(), OracleError> {
        check_block(sub.block, self.block, current)?;
        sub.validate()
    }

    pub fn apply(&mut self, sub: &BalancesSubmission) {
        *self = NetworkBalances {
            block: sub.block,
            total_value: sub.total_value,
            staking_value: sub.staking_value,
            receipt_supply: sub.receipt_supply,
        };
        tracing::info!(
            block = sub.block,
            total = sub.total_value,
            staking = sub.staking_value,
            supply = sub.receipt_supply,
            "network balances updated"
        );
    }
}

/// Latest consensus collateral price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPrices {
    pub block: BlockNumber,
    pub price: Amount,
}

impl NetworkPrices {
    pub fn check(&self, sub: &PriceSubmission, current: BlockNumber) -> Result<(), OracleError> {
        check_block(sub.block, self.block, current)?;
        sub.validate()
    }

    pub fn apply(&mut self, sub: &PriceSubmission) {
        self.block = sub.block;
        self.price = sub.price;
        tracing::info!(block = sub.block, price = sub.price, "collateral price updated");
    }
}
