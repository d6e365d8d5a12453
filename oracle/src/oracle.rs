//! Oracle facade: one committee, one vote per topic, and the network view
//! those votes maintain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tide_crypto::payload_digest;
use tide_types::{Address, Amount, BlockNumber, Digest32, ProtocolParams, QuorumRule};

use crate::committee::Committee;
use crate::error::OracleError;
use crate::network::{NetworkBalances, NetworkPrices};
use crate::submission::{BalancesSubmission, PenaltySubmission, PriceSubmission, RewardSubmission};
use crate::vote::{ThresholdVote, VoteOutcome};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    committee: Committee,
    balances: NetworkBalances,
    prices: NetworkPrices,
    balances_vote: ThresholdVote<BlockNumber>,
    prices_vote: ThresholdVote<BlockNumber>,
    penalty_vote: ThresholdVote<(Address, BlockNumber)>,
    rewards_vote: ThresholdVote<u64>,
    /// Reward payloads by index and digest, kept until executed.
    reward_payloads: BTreeMap<(u64, Digest32), RewardSubmission>,
}

impl Oracle {
    pub fn new(params: &ProtocolParams, committee: Committee) -> Self {
        Self {
            committee,
            balances: NetworkBalances::default(),
            prices: NetworkPrices::default(),
            balances_vote: ThresholdVote::new(QuorumRule::Fraction(params.consensus_threshold)),
            prices_vote: ThresholdVote::new(QuorumRule::Fraction(params.consensus_threshold)),
            penalty_vote: ThresholdVote::new(QuorumRule::Fraction(params.penalty_threshold)),
            rewards_vote: ThresholdVote::new(params.reward_quorum),
            reward_payloads: BTreeMap::new(),
        }
    }

    pub fn committee(&self) -> &Committee {
        &self.committee
    }

    pub fn balances(&self) -> &NetworkBalances {
        &self.balances
    }

    pub fn prices(&self) -> &NetworkPrices {
        &self.prices
    }

    pub fn rewards_vote(&self) -> &ThresholdVote<u64> {
        &self.rewards_vote
    }

    pub fn penalty_vote(&self) -> &ThresholdVote<(Address, BlockNumber)> {
        &self.penalty_vote
    }

    // ── Balances ─────────────────────────────────────────────────────────

    /// Vote on network balances. Returns the new totals when this vote
    /// completes consensus.
    pub fn submit_balances(
        &mut self,
        caller: Address,
        sub: &BalancesSubmission,
        current_block: BlockNumber,
    ) -> Result<Option<NetworkBalances>, OracleError> {
        self.committee.require_member(&caller)?;
        self.balances_vote.require_open(&sub.block)?;
        self.balances.check(sub, current_block)?;
        let digest = payload_digest(sub)?;
        let outcome =
            self.balances_vote
                .submit(sub.block, caller, digest, self.committee.size())?;
        tracing::debug!(%caller, block = sub.block, ?outcome, "balances vote");
        if !outcome.is_reached() {
            return Ok(None);
        }
        self.balances_vote.mark_executed(sub.block, digest)?;
        self.balances.apply(sub);
        Ok(Some(self.balances))
    }

    pub fn bootstrap_balances(
        &mut self,
        caller: Address,
        sub: &BalancesSubmission,
        current_block: BlockNumber,
    ) -> Result<NetworkBalances, OracleError> {
        self.committee.require_bootstrap(&caller)?;
        self.balances_vote.require_open(&sub.block)?;
        self.balances.check(sub, current_block)?;
        self.balances_vote
            .mark_executed(sub.block, payload_digest(sub)?)?;
        self.balances.apply(sub);
        Ok(self.balances)
    }

    // ── Prices ───────────────────────────────────────────────────────────

    /// Vote on the collateral price. Returns the price when this vote
    /// completes consensus.
    pub fn submit_prices(
        &mut self,
        caller: Address,
        sub: &PriceSubmission,
        current_block: BlockNumber,
    ) -> Result<Option<Amount>, OracleError> {
        self.committee.require_member(&caller)?;
        self.prices_vote.require_open(&sub.block)?;
        self.prices.check(sub, current_block)?;
        let digest = payload_digest(sub)?;
        let outcome = self
            .prices_vote
            .submit(sub.block, caller, digest, self.committee.size())?;
        tracing::debug!(%caller, block = sub.block, ?outcome, "prices vote");
        if !outcome.is_reached() {
            return Ok(None);
        }
        self.prices_vote.mark_executed(sub.block, digest)?;
        self.prices.apply(sub);
        Ok(Some(sub.price))
    }

    pub fn bootstrap_prices(
        &mut self,
        caller: Address,
        sub: &PriceSubmission,
        current_block: BlockNumber,
    ) -> Result<Amount, OracleError> {
        self.committee.require_bootstrap(&caller)?;
        self.prices_vote.require_open(&sub.block)?;
        self.prices.check(sub, current_block)?;
        self.prices_vote.mark_executed(sub.block, payload_digest(sub)?)?;
        self.prices.apply(sub);
        Ok(sub.price)
    }

    // ── Penalties ────────────────────────────────────────────────────────

    /// Vote that a unit misbehaved at a block. Returns `true` when this vote
    /// completes consensus and the offense should be recorded.
    pub fn submit_penalty(
        &mut self,
        caller: Address,
        sub: &PenaltySubmission,
        current_block: BlockNumber,
    ) -> Result<bool, OracleError> {
        self.committee.require_member(&caller)?;
        if sub.block >= current_block {
            return Err(OracleError::FutureBlock {
                block: sub.block,
                current: current_block,
            });
        }
        let key = (sub.unit, sub.block);
        let digest = payload_digest(sub)?;
        let outcome = self
            .penalty_vote
            .submit(key, caller, digest, self.committee.size())?;
        if !outcome.is_reached() {
            return Ok(false);
        }
        self.penalty_vote.mark_executed(key, digest)?;
        tracing::info!(unit = %sub.unit, block = sub.block, "penalty consensus reached");
        Ok(true)
    }

    pub fn bootstrap_penalty(
        &mut self,
        caller: Address,
        sub: &PenaltySubmission,
    ) -> Result<(), OracleError> {
        self.committee.require_bootstrap(&caller)?;
        self.penalty_vote
            .mark_executed((sub.unit, sub.block), payload_digest(sub)?)
    }

    // ── Rewards ──────────────────────────────────────────────────────────

    /// Vote on a reward snapshot. Snapshots for future indices are accepted
    /// and held; the caller executes whichever reaches quorum once its index
    /// becomes current.
    pub fn submit_rewards(
        &mut self,
        caller: Address,
        sub: &RewardSubmission,
        current_index: u64,
    ) -> Result<(Digest32, VoteOutcome), OracleError> {
        self.committee.require_member(&caller)?;
        self.check_rewards(sub, current_index)?;
        let digest = payload_digest(sub)?;
        let outcome =
            self.rewards_vote
                .submit(sub.index, caller, digest, self.committee.size())?;
        self.reward_payloads
            .entry((sub.index, digest))
            .or_insert_with(|| sub.clone());
        tracing::info!(%caller, index = sub.index, %digest, ?outcome, "rewards vote");
        Ok((digest, outcome))
    }

    /// Record a guardian-supplied snapshot for execution without votes.
    pub fn bootstrap_rewards(
        &mut self,
        caller: Address,
        sub: &RewardSubmission,
        current_index: u64,
    ) -> Result<Digest32, OracleError> {
        self.committee.require_bootstrap(&caller)?;
        self.check_rewards(sub, current_index)?;
        let digest = payload_digest(sub)?;
        self.reward_payloads
            .entry((sub.index, digest))
            .or_insert_with(|| sub.clone());
        Ok(digest)
    }

    fn check_rewards(&self, sub: &RewardSubmission, current_index: u64) -> Result<(), OracleError> {
        sub.validate()?;
        self.rewards_vote.require_open(&sub.index)?;
        if sub.index < current_index {
            return Err(OracleError::StaleRewardIndex {
                index: sub.index,
                current: current_index,
            });
        }
        Ok(())
    }

    pub fn reward_payload(&self, index: u64, digest: &Digest32) -> Option<&RewardSubmission> {
        self.reward_payloads.get(&(index, *digest))
    }

    /// The snapshot for `index` that currently meets quorum, if any.
    pub fn reached_rewards(&self, index: u64) -> Option<(Digest32, &RewardSubmission)> {
        if self.rewards_vote.is_executed(&index) {
            return None;
        }
        let digest = self.rewards_vote.winner(&index, self.committee.size())?;
        self.reward_payloads.get(&(index, digest)).map(|sub| (digest, sub))
    }

    /// Freeze `index` after the snapshot under `digest` has been applied.
    /// Payloads for the index are dropped.
    pub fn mark_rewards_executed(&mut self, index: u64, digest: Digest32) -> Result<(), OracleError> {
        self.rewards_vote.mark_executed(index, digest)?;
        self.reward_payloads.retain(|(i, _), _| *i != index);
        Ok(())
    }

    // ── Committee administration ─────────────────────────────────────────

    pub fn bootstrap_member(&mut self, caller: Address, member: Address) -> Result<(), OracleError> {
        self.committee.bootstrap_add(&caller, member)
    }

    pub fn bootstrap_remove_member(
        &mut self,
        caller: Address,
        member: &Address,
    ) -> Result<(), OracleError> {
        self.committee.bootstrap_remove(&caller, member)
    }

    pub fn bootstrap_disable(&mut self, caller: Address) -> Result<(), OracleError> {
        self.committee.disable_bootstrap(&caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    const GUARDIAN: u64 = 100;

    fn oracle(n: u64) -> Oracle {
        let committee = Committee::new(member(GUARDIAN), (1..=n).map(member));
        Oracle::new(&ProtocolParams::mainnet_defaults(), committee)
    }

    fn balances(block: u64, total: u128) -> BalancesSubmission {
        BalancesSubmission {
            block,
            total_value: total,
            staking_value: total / 2,
            receipt_supply: total,
        }
    }

    fn rewards(index: u64) -> RewardSubmission {
        RewardSubmission {
            index,
            execution_block: 10,
            consensus_block: 9,
            digest: Digest32::new([7; 32]),
            pointer: "ipfs://tree".into(),
            intervals_passed: 1,
            treasury_share: 5,
            trusted_operator_shares: vec![1],
            operator_shares: vec![2],
            user_shares: vec![3],
            user_eth_share: 4,
            fee_recipient_share: 1,
        }
    }

    #[test]
    fn balances_apply_on_threshold() {
        // 51% of 3 needs 2 votes.
        let mut o = oracle(3);
        assert_eq!(o.submit_balances(member(1), &balances(5, 100), 10).unwrap(), None);
        let applied = o.submit_balances(member(2), &balances(5, 100), 10).unwrap();
        assert_eq!(applied.map(|b| b.total_value), Some(100));
        assert_eq!(o.balances().block, 5);
        // Third member is too late for this block.
        let err = o.submit_balances(member(3), &balances(5, 100), 10).unwrap_err();
        assert_eq!(err.kind(), tide_types::ErrorKind::AlreadyExecuted);
        // An older block that never executed is stale.
        let err = o.submit_balances(member(3), &balances(4, 100), 10).unwrap_err();
        assert!(matches!(err, OracleError::StaleBlock { .. }));
    }

    #[test]
    fn non_member_rejected() {
        let mut o = oracle(3);
        let err = o.submit_prices(member(9), &PriceSubmission { block: 1, price: 5 }, 10).unwrap_err();
        assert_eq!(err.kind(), tide_types::ErrorKind::AuthorizationViolation);
    }

    #[test]
    fn future_reward_index_is_held() {
        let mut o = oracle(3);
        let sub = rewards(2);
        o.submit_rewards(member(1), &sub, 0).unwrap();
        let (digest, outcome) = o.submit_rewards(member(2), &sub, 0).unwrap();
        assert!(outcome.is_reached());
        assert_eq!(o.reached_rewards(2).map(|(d, _)| d), Some(digest));
        assert!(o.reached_rewards(1).is_none());
        o.mark_rewards_executed(2, digest).unwrap();
        assert!(o.reached_rewards(2).is_none());
        let err = o.submit_rewards(member(3), &sub, 0).unwrap_err();
        assert_eq!(err.kind(), tide_types::ErrorKind::AlreadyExecuted);
    }

    #[test]
    fn reached_rewards_follows_arrival_order_not_digest_order() {
        let mut o = oracle(5);
        let a = rewards(1);
        let b = RewardSubmission { fee_recipient_share: 2, ..rewards(1) };
        // Let the digest that sorts last arrive first.
        let (first, second) = if payload_digest(&a).unwrap() > payload_digest(&b).unwrap() {
            (a, b)
        } else {
            (b, a)
        };
        o.submit_rewards(member(1), &first, 1).unwrap();
        o.submit_rewards(member(2), &second, 1).unwrap();
        o.submit_rewards(member(3), &first, 1).unwrap();
        o.submit_rewards(member(4), &second, 1).unwrap();
        assert!(o.reached_rewards(1).is_none());

        // Down to three members, both payloads hold a majority.
        o.bootstrap_remove_member(member(GUARDIAN), &member(5)).unwrap();
        o.bootstrap_remove_member(member(GUARDIAN), &member(4)).unwrap();
        let (digest, sub) = o.reached_rewards(1).unwrap();
        assert_eq!(digest, payload_digest(&first).unwrap());
        assert_eq!(sub, &first);
    }

    #[test]
    fn stale_reward_index_rejected() {
        let mut o = oracle(3);
        assert!(matches!(
            o.submit_rewards(member(1), &rewards(1), 2),
            Err(OracleError::StaleRewardIndex { .. })
        ));
    }

    #[test]
    fn penalty_consensus_once_per_unit_and_block() {
        let mut o = oracle(2);
        let sub = PenaltySubmission { unit: member(50), block: 3 };
        assert!(!o.submit_penalty(member(1), &sub, 10).unwrap());
        assert!(o.submit_penalty(member(2), &sub, 10).unwrap());
        assert!(o.penalty_vote().is_executed(&(member(50), 3)));
    }

    #[test]
    fn bootstrap_pushes_prices() {
        let mut o = oracle(3);
        let sub = PriceSubmission { block: 4, price: 42 };
        assert_eq!(o.bootstrap_prices(member(GUARDIAN), &sub, 10).unwrap(), 42);
        assert_eq!(o.prices().price, 42);
        o.bootstrap_disable(member(GUARDIAN)).unwrap();
        let later = PriceSubmission { block: 5, price: 43 };
        assert!(o.bootstrap_prices(member(GUARDIAN), &later, 10).is_err());
    }
}
