//! Protocol parameters: unit sizing, collateral ratios, deposit limits, node-fee
//! curve, lifecycle windows, penalty schedule, and oracle thresholds.
//!
//! Settings governance is external; the core only reads these values. Every
//! field has a serde default so that a configuration file may override any
//! subset of them.

use crate::amount::{ether, serde_str, Amount, Ratio, ETHER};
use serde::{Deserialize, Serialize};

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;

/// How many matching votes finalize an oracle period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// `count * 2 > members` (more than half).
    StrictMajority,
    /// `count / members >= ratio` (at least the fraction).
    Fraction(Ratio),
    /// `count >= n` (at least `n` members, regardless of committee size).
    MinimumCount(u32),
}

impl QuorumRule {
    /// Whether `count` matching votes out of `members` satisfy the rule.
    pub fn is_met(&self, count: u32, members: u32) -> bool {
        if members == 0 || count == 0 {
            return false;
        }
        match self {
            QuorumRule::StrictMajority => u64::from(count) * 2 > u64::from(members),
            QuorumRule::Fraction(r) => {
                u128::from(count) * ETHER / u128::from(members) >= r.as_u128()
            }
            QuorumRule::MinimumCount(n) => count >= *n,
        }
    }
}

/// All protocol parameters read by the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    // ── Unit sizing ──────────────────────────────────────────────────────
    /// Total capital behind one validator. Default: 32.
    #[serde(with = "serde_str")]
    pub launch_balance: Amount,

    /// Capital sent to the validator at funding time, before staking. Default: 1.
    #[serde(with = "serde_str")]
    pub prelaunch_value: Amount,

    /// Bond sizes an operator may choose. Default: {8, 16}.
    #[serde(with = "serde_str::vec")]
    pub allowed_bonds: Vec<Amount>,

    // ── Collateral ───────────────────────────────────────────────────────
    /// Minimum collateral per unit of matched capital. Default: 10%.
    pub minimum_per_unit_stake: Ratio,

    /// Collateral beyond this ratio does not count as effective. Default: 150%.
    pub maximum_per_unit_stake: Ratio,

    /// Seconds after the last stake before collateral may be withdrawn.
    pub collateral_withdrawal_delay_secs: u64,

    // ── Deposit pool ─────────────────────────────────────────────────────
    pub deposit_enabled: bool,
    pub assign_deposits_enabled: bool,

    #[serde(with = "serde_str")]
    pub minimum_deposit: Amount,

    /// Cap on unmatched user capital (excluding what the queue already needs).
    #[serde(with = "serde_str")]
    pub maximum_deposit_pool_size: Amount,

    /// Fee withheld from the receipt quote of every deposit.
    pub deposit_fee: Ratio,

    /// Per-call budget of unit assignments.
    pub maximum_deposit_assignments: u32,

    /// Base per-call budget of socialised assignments.
    pub maximum_socialised_assignments: u32,

    // ── Node fee curve ───────────────────────────────────────────────────
    pub node_fee_minimum: Ratio,
    pub node_fee_target: Ratio,
    pub node_fee_maximum: Ratio,

    /// Demand (either sign) at which the fee reaches its extreme.
    #[serde(with = "serde_str")]
    pub node_demand_range: Amount,

    // ── Unit lifecycle ───────────────────────────────────────────────────
    /// Time a funded unit must wait before it may stake.
    pub scrub_period_secs: u64,

    /// Time a vacant unit must wait before it may be promoted.
    pub promotion_scrub_period_secs: u64,

    /// After this long in Prelaunch anyone may dissolve the unit.
    pub launch_timeout_secs: u64,

    /// Whether a committee scrub slashes operator collateral.
    pub scrub_penalty_enabled: bool,

    /// Delay between `begin_reduce_bond` and the earliest reduction.
    pub bond_reduction_window_start_secs: u64,
    pub bond_reduction_window_length_secs: u64,

    // ── Exit distribution ────────────────────────────────────────────────
    /// Balances at or above this are treated as a full validator exit.
    #[serde(with = "serde_str")]
    pub minimum_exit_balance: Amount,

    pub user_distribute_window_start_secs: u64,
    pub user_distribute_window_length_secs: u64,

    // ── Penalties ────────────────────────────────────────────────────────
    pub penalty_threshold: Ratio,
    pub penalty_rate_increment: Ratio,
    pub maximum_penalty_rate: Ratio,

    /// Offenses before the penalty rate starts rising.
    pub penalty_free_offenses: u32,

    // ── Oracle ───────────────────────────────────────────────────────────
    /// Fraction of the committee that must agree on balances and prices.
    pub consensus_threshold: Ratio,

    /// Rule for reward snapshots.
    pub reward_quorum: QuorumRule,

    /// Length of one reward interval.
    pub reward_interval_secs: u64,
}

impl ProtocolParams {
    /// Capital the pool contributes per unit beyond the prelaunch deposit.
    pub fn variable_deposit_amount(&self) -> Amount {
        self.launch_balance.saturating_sub(self.prelaunch_value)
    }

    pub fn is_allowed_bond(&self, bond: Amount) -> bool {
        self.allowed_bonds.contains(&bond)
    }

    /// Mainnet-style defaults.
    pub fn mainnet_defaults() -> Self {
        Self {
            launch_balance: ether(32),
            prelaunch_value: ether(1),
            allowed_bonds: vec![ether(8), ether(16)],

            minimum_per_unit_stake: Ratio::from_percent(10),
            maximum_per_unit_stake: Ratio::from_percent(150),
            collateral_withdrawal_delay_secs: 28 * DAY,

            deposit_enabled: true,
            assign_deposits_enabled: true,
            minimum_deposit: ETHER / 100,
            maximum_deposit_pool_size: ether(1_000_000_000),
            deposit_fee: Ratio::from_bps(5), // 0.05%
            maximum_deposit_assignments: 90,
            maximum_socialised_assignments: 2,

            node_fee_minimum: Ratio::from_percent(5),
            node_fee_target: Ratio::from_percent(10),
            node_fee_maximum: Ratio::from_percent(20),
            node_demand_range: ether(1000),

            scrub_period_secs: 12 * HOUR,
            promotion_scrub_period_secs: 3 * DAY,
            launch_timeout_secs: 72 * HOUR,
            scrub_penalty_enabled: true,
            bond_reduction_window_start_secs: 12 * HOUR,
            bond_reduction_window_length_secs: 2 * DAY,

            minimum_exit_balance: ether(8),
            user_distribute_window_start_secs: 90 * DAY,
            user_distribute_window_length_secs: 2 * DAY,

            penalty_threshold: Ratio::from_percent(51),
            penalty_rate_increment: Ratio::from_percent(10),
            maximum_penalty_rate: Ratio::ONE,
            penalty_free_offenses: 2,

            consensus_threshold: Ratio::from_percent(51),
            reward_quorum: QuorumRule::StrictMajority,
            reward_interval_secs: 28 * DAY,
        }
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::mainnet_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_majority_is_more_than_half() {
        let rule = QuorumRule::StrictMajority;
        assert!(!rule.is_met(2, 4));
        assert!(rule.is_met(3, 4));
        assert!(rule.is_met(2, 3));
        assert!(!rule.is_met(1, 2));
    }

    #[test]
    fn fraction_is_at_least() {
        let rule = QuorumRule::Fraction(Ratio::from_percent(50));
        assert!(rule.is_met(2, 4));
        assert!(!rule.is_met(1, 4));
    }

    #[test]
    fn minimum_count_ignores_committee_size() {
        let rule = QuorumRule::MinimumCount(2);
        assert!(rule.is_met(2, 10));
        assert!(!rule.is_met(1, 1));
    }

    #[test]
    fn empty_committee_never_reaches_quorum() {
        assert!(!QuorumRule::StrictMajority.is_met(0, 0));
    }

    #[test]
    fn variable_deposit_amount_is_launch_minus_prelaunch() {
        let p = ProtocolParams::default();
        assert_eq!(p.variable_deposit_amount(), ether(31));
        assert!(p.is_allowed_bond(ether(8)));
        assert!(!p.is_allowed_bond(ether(4)));
    }

    #[test]
    fn params_toml_roundtrip_keeps_large_amounts() {
        let p = ProtocolParams::default();
        let s = toml::to_string(&p).unwrap();
        let back: ProtocolParams = toml::from_str(&s).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn params_partial_toml_uses_defaults() {
        let p: ProtocolParams = toml::from_str("launch_balance = \"64000000000000000000\"\nmaximum_deposit_assignments = 4\n").unwrap();
        assert_eq!(p.launch_balance, ether(64));
        assert_eq!(p.maximum_deposit_assignments, 4);
        assert_eq!(p.prelaunch_value, ether(1));
    }
}
