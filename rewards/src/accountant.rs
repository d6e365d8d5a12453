//! Reward index, interval clock, funding pools, and executed snapshots.
//!
//! The collateral reward pool is topped up by the guardian; the smoothing
//! pool collects pooled-currency rewards (priority fees and the like) routed
//! to it. Executing a snapshot draws both pools down by the snapshot totals
//! and leaves the operator portions claimable under the snapshot's root.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tide_oracle::RewardSubmission;
use tide_types::{Address, Amount, Digest32, Timestamp};

use crate::error::RewardsError;

/// What a snapshot execution pays out immediately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotPayout {
    pub index: u64,
    /// Collateral asset for the treasury.
    pub treasury: Amount,
    /// Pooled currency returned to pooled users.
    pub user_eth: Amount,
    /// Pooled currency for the fee recipient.
    pub fee_recipient: Amount,
}

/// A snapshot that has been applied and is open for claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedSnapshot {
    pub root: Digest32,
    pub pointer: String,
    pub networks: u32,
    pub executed_at: Timestamp,
    pub collateral_remaining: Amount,
    pub eth_remaining: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAccountant {
    reward_index: u64,
    interval_start: Timestamp,
    interval_secs: u64,
    reward_pool: Amount,
    smoothing_pool: Amount,
    pub(crate) snapshots: BTreeMap<u64, ExecutedSnapshot>,
    pub(crate) claimed: BTreeSet<(u64, Address)>,
}

impl RewardAccountant {
    pub fn new(interval_start: Timestamp, interval_secs: u64) -> Self {
        Self {
            reward_index: 0,
            interval_start,
            interval_secs,
            reward_pool: 0,
            smoothing_pool: 0,
            snapshots: BTreeMap::new(),
            claimed: BTreeSet::new(),
        }
    }

    pub fn reward_index(&self) -> u64 {
        self.reward_index
    }

    pub fn interval_start(&self) -> Timestamp {
        self.interval_start
    }

    pub fn reward_pool(&self) -> Amount {
        self.reward_pool
    }

    pub fn smoothing_pool(&self) -> Amount {
        self.smoothing_pool
    }

    pub fn snapshot(&self, index: u64) -> Option<&ExecutedSnapshot> {
        self.snapshots.get(&index)
    }

    /// Collateral and pooled currency still owed to claimants.
    pub fn unclaimed(&self) -> (Amount, Amount) {
        self.snapshots.values().fold((0, 0), |(c, e), s| {
            (
                c.saturating_add(s.collateral_remaining),
                e.saturating_add(s.eth_remaining),
            )
        })
    }

    /// End of the interval a snapshot covering `intervals` intervals closes.
    pub fn interval_boundary(&self, intervals: u64) -> Timestamp {
        self.interval_start
            .saturating_add(intervals.saturating_mul(self.interval_secs))
    }

    pub fn fund_reward_pool(&mut self, amount: Amount) -> Result<(), RewardsError> {
        self.reward_pool = self
            .reward_pool
            .checked_add(amount)
            .ok_or(RewardsError::Overflow)?;
        tracing::info!(amount, pool = self.reward_pool, "reward pool funded");
        Ok(())
    }

    pub fn credit_smoothing_pool(&mut self, amount: Amount) -> Result<(), RewardsError> {
        self.smoothing_pool = self
            .smoothing_pool
            .checked_add(amount)
            .ok_or(RewardsError::Overflow)?;
        tracing::info!(amount, pool = self.smoothing_pool, "smoothing pool credited");
        Ok(())
    }

    /// Check everything [`execute`](Self::execute) checks without changing state.
    pub fn check(&self, sub: &RewardSubmission, now: Timestamp) -> Result<(), RewardsError> {
        self.totals(sub, now).map(|_| ())
    }

    fn totals(&self, sub: &RewardSubmission, now: Timestamp) -> Result<(Amount, Amount), RewardsError> {
        if sub.index != self.reward_index {
            return Err(RewardsError::NotCurrentIndex {
                index: sub.index,
                current: self.reward_index,
            });
        }
        let boundary = self.interval_boundary(sub.intervals_passed);
        if now < boundary {
            return Err(RewardsError::IntervalNotElapsed { boundary, now });
        }
        let collateral = sub
            .collateral_total()
            .and_then(|t| t.checked_add(sub.treasury_share))
            .ok_or(RewardsError::Overflow)?;
        if collateral > self.reward_pool {
            return Err(RewardsError::InsufficientRewardPool {
                needed: collateral,
                available: self.reward_pool,
            });
        }
        let eth = sub
            .operator_eth_total()
            .and_then(|t| t.checked_add(sub.user_eth_share))
            .and_then(|t| t.checked_add(sub.fee_recipient_share))
            .ok_or(RewardsError::Overflow)?;
        if eth > self.smoothing_pool {
            return Err(RewardsError::InsufficientSmoothingPool {
                needed: eth,
                available: self.smoothing_pool,
            });
        }
        Ok((collateral, eth))
    }

    /// Apply the snapshot for the current index.
    pub fn execute(&mut self, sub: &RewardSubmission, now: Timestamp) -> Result<SnapshotPayout, RewardsError> {
        let (collateral, eth) = self.totals(sub, now)?;
        let claimable_collateral = collateral - sub.treasury_share;
        let claimable_eth = eth - sub.user_eth_share - sub.fee_recipient_share;

        self.reward_pool -= collateral;
        self.smoothing_pool -= eth;
        self.snapshots.insert(
            sub.index,
            ExecutedSnapshot {
                root: sub.digest,
                pointer: sub.pointer.clone(),
                networks: u32::try_from(sub.operator_shares.len()).unwrap_or(u32::MAX),
                executed_at: now,
                collateral_remaining: claimable_collateral,
                eth_remaining: claimable_eth,
            },
        );
        self.interval_start = self.interval_boundary(sub.intervals_passed);
        self.reward_index += 1;

        tracing::info!(
            index = sub.index,
            root = %sub.digest,
            intervals = sub.intervals_passed,
            collateral = claimable_collateral,
            eth = claimable_eth,
            "reward snapshot executed"
        );
        Ok(SnapshotPayout {
            index: sub.index,
            treasury: sub.treasury_share,
            user_eth: sub.user_eth_share,
            fee_recipient: sub.fee_recipient_share,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_types::ether;

    const DAY: u64 = 86_400;

    fn submission(index: u64) -> RewardSubmission {
        RewardSubmission {
            index,
            execution_block: 100,
            consensus_block: 99,
            digest: Digest32::new([1; 32]),
            pointer: "cid".into(),
            intervals_passed: 1,
            treasury_share: ether(10),
            trusted_operator_shares: vec![ether(5)],
            operator_shares: vec![ether(85)],
            user_shares: vec![ether(2)],
            user_eth_share: ether(3),
            fee_recipient_share: ether(1),
        }
    }

    fn funded() -> RewardAccountant {
        let mut acc = RewardAccountant::new(Timestamp::EPOCH, 28 * DAY);
        acc.fund_reward_pool(ether(100)).unwrap();
        acc.credit_smoothing_pool(ether(6)).unwrap();
        acc
    }

    #[test]
    fn execution_advances_index_and_interval() {
        let mut acc = funded();
        let payout = acc.execute(&submission(0), Timestamp::new(28 * DAY)).unwrap();
        assert_eq!(payout.treasury, ether(10));
        assert_eq!(payout.user_eth, ether(3));
        assert_eq!(acc.reward_index(), 1);
        assert_eq!(acc.interval_start(), Timestamp::new(28 * DAY));
        assert_eq!(acc.reward_pool(), 0);
        assert_eq!(acc.smoothing_pool(), 0);
        assert_eq!(acc.unclaimed(), (ether(90), ether(2)));
    }

    #[test]
    fn interval_must_have_elapsed() {
        let mut acc = funded();
        let err = acc.execute(&submission(0), Timestamp::new(28 * DAY - 1)).unwrap_err();
        assert!(matches!(err, RewardsError::IntervalNotElapsed { .. }));
    }

    #[test]
    fn only_current_index_executes() {
        let mut acc = funded();
        assert!(matches!(
            acc.execute(&submission(1), Timestamp::new(60 * DAY)),
            Err(RewardsError::NotCurrentIndex { .. })
        ));
    }

    #[test]
    fn short_funding_rejected_without_effect() {
        let mut acc = RewardAccountant::new(Timestamp::EPOCH, DAY);
        acc.fund_reward_pool(ether(99)).unwrap();
        acc.credit_smoothing_pool(ether(6)).unwrap();
        let before = acc.clone();
        let err = acc.execute(&submission(0), Timestamp::new(DAY)).unwrap_err();
        assert_eq!(err.kind(), tide_types::ErrorKind::ArithmeticBound);
        assert_eq!(acc, before);
    }
}
