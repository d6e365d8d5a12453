//! The collateral ledger: stake, withdraw, match, release, slash.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tide_types::{Amount, OperatorId, ProtocolParams, Ratio, Timestamp};

use crate::error::CollateralError;
use crate::record::CollateralRecord;

/// Collateral records for every operator, plus the ratios and price they are
/// judged against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralLedger {
    records: BTreeMap<OperatorId, CollateralRecord>,
    min_ratio: Ratio,
    max_ratio: Ratio,
    withdrawal_delay_secs: u64,
    /// Pooled-currency value of one whole unit of collateral, `ETHER`-scaled.
    price: Amount,
}

impl CollateralLedger {
    pub fn new(params: &ProtocolParams, initial_price: Amount) -> Self {
        Self {
            records: BTreeMap::new(),
            min_ratio: params.minimum_per_unit_stake,
            max_ratio: params.maximum_per_unit_stake,
            withdrawal_delay_secs: params.collateral_withdrawal_delay_secs,
            price: initial_price,
        }
    }

    pub fn price(&self) -> Amount {
        self.price
    }

    /// Apply a consensus-approved price.
    pub fn set_price(&mut self, price: Amount) -> Result<(), CollateralError> {
        if price == 0 {
            return Err(CollateralError::ZeroPrice);
        }
        self.price = price;
        Ok(())
    }

    /// The record for `operator` (all zero if it has never staked).
    pub fn record(&self, operator: OperatorId) -> CollateralRecord {
        self.records.get(&operator).cloned().unwrap_or_default()
    }

    pub fn effective_stake(&self, operator: OperatorId) -> Result<Amount, CollateralError> {
        self.record(operator).effective_stake(self.max_ratio, self.price)
    }

    pub fn minimum_stake(&self, operator: OperatorId) -> Result<Amount, CollateralError> {
        self.record(operator).minimum_stake(self.min_ratio, self.price)
    }

    pub fn eth_matched_limit(&self, operator: OperatorId) -> Result<Amount, CollateralError> {
        self.record(operator).eth_matched_limit(self.min_ratio, self.price)
    }

    /// Sum of stake held for every operator.
    pub fn total_staked(&self) -> Result<Amount, CollateralError> {
        self.records
            .values()
            .try_fold(0u128, |acc, r| acc.checked_add(r.total_stake))
            .ok_or(CollateralError::Overflow)
    }

    /// Add collateral.
    pub fn stake(
        &mut self,
        operator: OperatorId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), CollateralError> {
        if amount == 0 {
            return Err(CollateralError::ZeroAmount);
        }
        let record = self.records.entry(operator).or_default();
        record.total_stake = record
            .total_stake
            .checked_add(amount)
            .ok_or(CollateralError::Overflow)?;
        record.last_stake_time = Some(now);
        tracing::debug!(%operator, amount, total = record.total_stake, "collateral staked");
        Ok(())
    }

    /// Remove collateral.
    ///
    /// Rejected before the withdrawal delay has passed, and when the remaining
    /// stake would fall below the sum of minimums across the operator's units.
    pub fn withdraw(
        &mut self,
        operator: OperatorId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), CollateralError> {
        if amount == 0 {
            return Err(CollateralError::ZeroAmount);
        }
        let record = self.record(operator);
        if let Some(last) = record.last_stake_time {
            if !last.has_expired(self.withdrawal_delay_secs, now) {
                return Err(CollateralError::WithdrawalLocked {
                    unlocks_at: last.saturating_add(self.withdrawal_delay_secs),
                });
            }
        }
        let remaining = record
            .total_stake
            .checked_sub(amount)
            .ok_or(CollateralError::InsufficientStake {
                needed: amount,
                available: record.total_stake,
            })?;
        let minimum = record.minimum_stake(self.min_ratio, self.price)?;
        if remaining < minimum {
            return Err(CollateralError::BelowMinimum { remaining, minimum });
        }
        if let Some(r) = self.records.get_mut(&operator) {
            r.total_stake = remaining;
        }
        tracing::debug!(%operator, amount, remaining, "collateral withdrawn");
        Ok(())
    }

    /// Match `amount` of pooled capital against the operator's collateral.
    ///
    /// Fails with `ExceedsMatchedLimit` when the new total would exceed
    /// `eth_matched_limit`.
    pub fn match_capital(&mut self, operator: OperatorId, amount: Amount) -> Result<(), CollateralError> {
        let record = self.record(operator);
        let requested = record
            .eth_matched
            .checked_add(amount)
            .ok_or(CollateralError::Overflow)?;
        let limit = record.eth_matched_limit(self.min_ratio, self.price)?;
        if requested > limit {
            return Err(CollateralError::ExceedsMatchedLimit { requested, limit });
        }
        self.records.entry(operator).or_default().eth_matched = requested;
        Ok(())
    }

    /// Release previously matched capital (dissolution, exit, refund paths).
    pub fn release_capital(&mut self, operator: OperatorId, amount: Amount) -> Result<(), CollateralError> {
        let matched = self.record(operator).eth_matched;
        let remaining = matched
            .checked_sub(amount)
            .ok_or(CollateralError::MatchedUnderflow { amount, matched })?;
        if let Some(r) = self.records.get_mut(&operator) {
            r.eth_matched = remaining;
        }
        Ok(())
    }

    /// Slash up to `amount` of stake. Returns what was actually taken.
    pub fn slash(&mut self, operator: OperatorId, amount: Amount) -> Amount {
        let Some(record) = self.records.get_mut(&operator) else {
            return 0;
        };
        let taken = amount.min(record.total_stake);
        record.total_stake -= taken;
        if taken > 0 {
            tracing::info!(%operator, taken, requested = amount, "collateral slashed");
        }
        taken
    }
}
