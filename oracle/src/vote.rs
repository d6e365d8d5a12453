//! Generic threshold vote with one vote per member per period and at-most-once execution.
//!
//! A period is created lazily on its first vote and never deleted. Each vote
//! records the voter and increments the count of the payload digest it
//! carries. The first digest whose count satisfies the [`QuorumRule`] wins
//! the period and is remembered as its winner; once the caller applies it and calls
//! [`ThresholdVote::mark_executed`], every further submission for that
//! period is rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tide_types::{Address, Digest32, QuorumRule};

use crate::error::OracleError;

/// Result of recording a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Counted; the digest is still short of quorum.
    Recorded { count: u32 },
    /// Counted, and the digest now meets quorum.
    Reached { count: u32 },
}

impl VoteOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, VoteOutcome::Reached { .. })
    }
}

/// Votes for one period.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTally {
    pub voters: BTreeSet<Address>,
    pub counts: BTreeMap<Digest32, u32>,
    /// Digests in the order their first vote arrived.
    #[serde(default)]
    pub arrivals: Vec<Digest32>,
    /// First digest whose vote met quorum.
    #[serde(default)]
    pub reached: Option<Digest32>,
    /// Digest applied for this period, once executed.
    pub executed: Option<Digest32>,
}

/// Threshold vote over periods keyed by `K`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdVote<K: Ord> {
    rule: QuorumRule,
    periods: BTreeMap<K, PeriodTally>,
}

impl<K: Ord + Clone + Debug> ThresholdVote<K> {
    pub fn new(rule: QuorumRule) -> Self {
        Self {
            rule,
            periods: BTreeMap::new(),
        }
    }

    pub fn rule(&self) -> QuorumRule {
        self.rule
    }

    pub fn tally(&self, period: &K) -> Option<&PeriodTally> {
        self.periods.get(period)
    }

    pub fn is_executed(&self, period: &K) -> bool {
        self.periods
            .get(period)
            .is_some_and(|t| t.executed.is_some())
    }

    pub fn has_voted(&self, period: &K, voter: &Address) -> bool {
        self.periods
            .get(period)
            .is_some_and(|t| t.voters.contains(voter))
    }

    pub fn count(&self, period: &K, digest: &Digest32) -> u32 {
        self.periods
            .get(period)
            .and_then(|t| t.counts.get(digest).copied())
            .unwrap_or(0)
    }

    /// Whether `digest` meets quorum for `period` against the current committee size.
    pub fn is_reached(&self, period: &K, digest: &Digest32, members: u32) -> bool {
        self.rule.is_met(self.count(period, digest), members)
    }

    /// The digest that wins `period` against a committee of `members`.
    ///
    /// A digest that crossed quorum on a vote keeps the period even if a
    /// later one also qualifies. Without one, the earliest-arriving digest
    /// that meets quorum now (after the committee shrank) wins.
    pub fn winner(&self, period: &K, members: u32) -> Option<Digest32> {
        let tally = self.periods.get(period)?;
        if tally.reached.is_some() {
            return tally.reached;
        }
        tally
            .arrivals
            .iter()
            .find(|d| self.rule.is_met(tally.counts.get(*d).copied().unwrap_or(0), members))
            .copied()
    }

    /// Rejects a period that has already been executed.
    pub fn require_open(&self, period: &K) -> Result<(), OracleError> {
        if self.is_executed(period) {
            return Err(OracleError::AlreadyExecuted {
                period: format!("{:?}", period),
            });
        }
        Ok(())
    }

    /// Record `voter`'s vote for `digest`.
    ///
    /// Rejected with `AlreadyExecuted` once the period is finalized and with
    /// `DuplicateSubmission` when the voter has already voted in the period.
    /// A rejected vote changes nothing.
    pub fn submit(
        &mut self,
        period: K,
        voter: Address,
        digest: Digest32,
        members: u32,
    ) -> Result<VoteOutcome, OracleError> {
        self.require_open(&period)?;
        if self.has_voted(&period, &voter) {
            return Err(OracleError::DuplicateSubmission {
                period: format!("{:?}", period),
                voter,
            });
        }
        let tally = self.periods.entry(period).or_default();
        tally.voters.insert(voter);
        if !tally.counts.contains_key(&digest) {
            tally.arrivals.push(digest);
        }
        let count = tally.counts.entry(digest).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;
        if self.rule.is_met(count, members) {
            tally.reached.get_or_insert(digest);
            Ok(VoteOutcome::Reached { count })
        } else {
            Ok(VoteOutcome::Recorded { count })
        }
    }

    /// Freeze `period` with `digest` applied.
    ///
    /// Also the privileged bootstrap path: it does not look at vote counts,
    /// but it still refuses a period that has already been executed.
    pub fn mark_executed(&mut self, period: K, digest: Digest32) -> Result<(), OracleError> {
        self.require_open(&period)?;
        self.periods.entry(period).or_default().executed = Some(digest);
        Ok(())
    }
}
