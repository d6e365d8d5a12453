//! The staking-unit record and its lifecycle transitions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tide_types::{
    Address, Amount, DepositType, OperatorId, ProtocolParams, QuorumRule, Ratio, Timestamp,
    UnitId, UnitStatus, ValidatorPubkey,
};

use crate::bond::BondReduction;
use crate::error::UnitError;

/// Fields fixed when a unit is created.
#[derive(Clone, Debug)]
pub struct NewUnit {
    pub id: UnitId,
    pub address: Address,
    pub operator: OperatorId,
    pub bond: Amount,
    pub top_up: Amount,
    pub deposit_type: DepositType,
    pub node_fee: Ratio,
    pub pubkey: ValidatorPubkey,
}

/// One validator's accounting record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingUnit {
    pub id: UnitId,
    pub address: Address,
    pub operator: OperatorId,
    pub status: UnitStatus,
    pub status_time: Timestamp,
    pub deposit_type: DepositType,
    /// Operator capital behind the validator (the bond).
    pub node_deposit_balance: Amount,
    /// Pooled user capital behind the validator.
    pub user_deposit_balance: Amount,
    /// Part of the bond parked as node credit until the unit is funded.
    pub node_top_up_value: Amount,
    /// Owed to the operator, claimable through `refund`.
    pub node_refund_balance: Amount,
    /// Capital held at the unit address, excluding the refund balance.
    pub ledger_balance: Amount,
    pub node_fee: Ratio,
    pub pubkey: ValidatorPubkey,
    pub vacant: bool,
    /// Beacon balance of a migrated validator, recorded at vacant creation.
    pub pre_migration_balance: Amount,
    pub finalised: bool,
    pub closed: bool,
    pub scrub_voters: BTreeSet<Address>,
    pub bond_reduction: Option<BondReduction>,
    pub bond_reduction_cancelled: bool,
    pub user_distribute_time: Option<Timestamp>,
}

impl StakingUnit {
    /// A queued unit awaiting pooled capital.
    pub fn new_queued(new: NewUnit, now: Timestamp) -> Self {
        Self::build(new, UnitStatus::Initialized, false, 0, now)
    }

    /// A pre-funded unit wrapping an existing validator. It skips the queue and
    /// waits in `Prelaunch` for promotion.
    pub fn new_vacant(new: NewUnit, pre_migration_balance: Amount, now: Timestamp) -> Self {
        Self::build(new, UnitStatus::Prelaunch, true, pre_migration_balance, now)
    }

    fn build(
        new: NewUnit,
        status: UnitStatus,
        vacant: bool,
        pre_migration_balance: Amount,
        now: Timestamp,
    ) -> Self {
        Self {
            id: new.id,
            address: new.address,
            operator: new.operator,
            status,
            status_time: now,
            deposit_type: new.deposit_type,
            node_deposit_balance: new.bond,
            user_deposit_balance: 0,
            node_top_up_value: new.top_up,
            node_refund_balance: 0,
            ledger_balance: 0,
            node_fee: new.node_fee,
            pubkey: new.pubkey,
            vacant,
            pre_migration_balance,
            finalised: false,
            closed: false,
            scrub_voters: BTreeSet::new(),
            bond_reduction: None,
            bond_reduction_cancelled: false,
            user_distribute_time: None,
        }
    }

    /// Pooled capital matched against the operator's collateral for this unit.
    pub fn matched_capital(&self, launch_balance: Amount) -> Amount {
        launch_balance.saturating_sub(self.node_deposit_balance)
    }

    fn require(&self, status: UnitStatus, expected: &'static str) -> Result<(), UnitError> {
        if self.status != status {
            return Err(UnitError::WrongStatus {
                unit: self.id,
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    fn set_status(&mut self, status: UnitStatus, now: Timestamp) {
        tracing::info!(unit = %self.address, from = %self.status, to = %status, "unit status changed");
        self.status = status;
        self.status_time = now;
    }

    fn credit(&mut self, amount: Amount) -> Result<(), UnitError> {
        self.ledger_balance = self
            .ledger_balance
            .checked_add(amount)
            .ok_or(UnitError::Overflow)?;
        Ok(())
    }

    /// Take `amount` out of the unit's held balance.
    pub fn release(&mut self, amount: Amount) -> Result<(), UnitError> {
        self.ledger_balance =
            self.ledger_balance
                .checked_sub(amount)
                .ok_or(UnitError::InsufficientBalance {
                    requested: amount,
                    held: self.ledger_balance,
                })?;
        Ok(())
    }

    /// Capital arriving at the unit address from outside (validator withdrawals).
    pub fn receive(&mut self, amount: Amount) -> Result<(), UnitError> {
        self.credit(amount)
    }

    // ── Funding and launch ───────────────────────────────────────────────

    /// `Initialized → Prelaunch`: the matching engine has assigned capital.
    pub fn fund(&mut self, user_capital: Amount, node_credit: Amount, now: Timestamp) -> Result<(), UnitError> {
        self.require(UnitStatus::Initialized, "initialized")?;
        self.user_deposit_balance = user_capital;
        self.credit(
            user_capital
                .checked_add(node_credit)
                .ok_or(UnitError::Overflow)?,
        )?;
        self.set_status(UnitStatus::Prelaunch, now);
        Ok(())
    }

    /// `Prelaunch → Staking` for a funded unit. Returns the capital that leaves
    /// the unit for the validator deposit.
    pub fn stake(&mut self, now: Timestamp, params: &ProtocolParams) -> Result<Amount, UnitError> {
        self.require(UnitStatus::Prelaunch, "prelaunch")?;
        if self.vacant {
            return Err(UnitError::VacantUnit);
        }
        self.check_scrub_window(now, params.scrub_period_secs)?;
        let deposit = self.ledger_balance;
        self.ledger_balance = 0;
        self.set_status(UnitStatus::Staking, now);
        Ok(deposit)
    }

    /// `Prelaunch → Staking` for a vacant unit, backfilling `user_capital`.
    pub fn promote(&mut self, user_capital: Amount, now: Timestamp, params: &ProtocolParams) -> Result<(), UnitError> {
        self.require(UnitStatus::Prelaunch, "prelaunch")?;
        if !self.vacant {
            return Err(UnitError::NotVacant { unit: self.id });
        }
        self.check_scrub_window(now, params.promotion_scrub_period_secs)?;
        self.user_deposit_balance = user_capital;
        self.vacant = false;
        self.set_status(UnitStatus::Staking, now);
        Ok(())
    }

    fn check_scrub_window(&self, now: Timestamp, period: u64) -> Result<(), UnitError> {
        if !self.status_time.has_expired(period, now) {
            return Err(UnitError::ScrubWindowOpen {
                until: self.status_time.saturating_add(period),
            });
        }
        Ok(())
    }

    // ── Dissolution ──────────────────────────────────────────────────────

    /// Whether anyone may dissolve this unit for missing its launch deadline.
    pub fn check_launch_timeout(&self, now: Timestamp, params: &ProtocolParams) -> Result<(), UnitError> {
        self.require(UnitStatus::Prelaunch, "prelaunch")?;
        if !self.status_time.has_expired(params.launch_timeout_secs, now) {
            return Err(UnitError::LaunchTimeoutPending {
                until: self.status_time.saturating_add(params.launch_timeout_secs),
            });
        }
        Ok(())
    }

    /// `Initialized | Prelaunch → Dissolved`.
    pub fn dissolve(&mut self, now: Timestamp) -> Result<(), UnitError> {
        match self.status {
            UnitStatus::Initialized | UnitStatus::Prelaunch => {
                self.bond_reduction = None;
                self.set_status(UnitStatus::Dissolved, now);
                Ok(())
            }
            UnitStatus::Dissolved => Err(UnitError::AlreadyDissolved { unit: self.id }),
            actual => Err(UnitError::WrongStatus {
                unit: self.id,
                expected: "initialized or prelaunch",
                actual,
            }),
        }
    }

    /// Record a committee scrub vote. Returns `true` once a strict majority of
    /// `members` has voted.
    pub fn vote_scrub(&mut self, voter: Address, members: u32) -> Result<bool, UnitError> {
        self.require(UnitStatus::Prelaunch, "prelaunch")?;
        if !self.scrub_voters.insert(voter) {
            return Err(UnitError::DuplicateVote {
                voter: voter.to_string(),
            });
        }
        let votes = u32::try_from(self.scrub_voters.len()).unwrap_or(u32::MAX);
        Ok(QuorumRule::StrictMajority.is_met(votes, members))
    }

    // ── Bond reduction ───────────────────────────────────────────────────

    /// Start a bond reduction to `new_bond`.
    pub fn begin_bond_reduction(
        &mut self,
        new_bond: Amount,
        now: Timestamp,
        params: &ProtocolParams,
    ) -> Result<(), UnitError> {
        self.require(UnitStatus::Staking, "staking")?;
        if self.bond_reduction_cancelled {
            return Err(UnitError::ReductionCancelled);
        }
        if self.bond_reduction.is_some() {
            return Err(UnitError::ReductionPending);
        }
        if !params.is_allowed_bond(new_bond) {
            return Err(UnitError::BondNotAllowed(new_bond));
        }
        if new_bond >= self.node_deposit_balance {
            return Err(UnitError::BondNotReduced {
                current: self.node_deposit_balance,
                new: new_bond,
            });
        }
        self.bond_reduction = Some(BondReduction::new(new_bond, now));
        Ok(())
    }

    /// Committee vote to cancel the pending reduction. Returns `true` when the
    /// vote cancelled it.
    pub fn vote_cancel_reduction(&mut self, voter: Address, members: u32) -> Result<bool, UnitError> {
        let request = self
            .bond_reduction
            .as_mut()
            .ok_or(UnitError::NoPendingReduction)?;
        if !request.cancel_voters.insert(voter) {
            return Err(UnitError::DuplicateVote {
                voter: voter.to_string(),
            });
        }
        let votes = u32::try_from(request.cancel_voters.len()).unwrap_or(u32::MAX);
        if QuorumRule::StrictMajority.is_met(votes, members) {
            self.bond_reduction = None;
            self.bond_reduction_cancelled = true;
            tracing::info!(unit = %self.address, "bond reduction cancelled by committee");
            return Ok(true);
        }
        Ok(false)
    }

    /// Validate the pending reduction against its window. Returns the delta.
    pub fn check_bond_reduction(&self, now: Timestamp, params: &ProtocolParams) -> Result<Amount, UnitError> {
        self.require(UnitStatus::Staking, "staking")?;
        let request = self
            .bond_reduction
            .as_ref()
            .ok_or(UnitError::NoPendingReduction)?;
        request.check_window(now, params)?;
        self.node_deposit_balance
            .checked_sub(request.new_bond)
            .ok_or(UnitError::BondNotReduced {
                current: self.node_deposit_balance,
                new: request.new_bond,
            })
    }

    /// Move `delta` from the bond to the user side and clear the request.
    pub fn apply_bond_reduction(&mut self, delta: Amount) -> Result<(), UnitError> {
        self.node_deposit_balance = self
            .node_deposit_balance
            .checked_sub(delta)
            .ok_or(UnitError::Overflow)?;
        self.user_deposit_balance = self
            .user_deposit_balance
            .checked_add(delta)
            .ok_or(UnitError::Overflow)?;
        self.bond_reduction = None;
        tracing::info!(
            unit = %self.address,
            bond = self.node_deposit_balance,
            user = self.user_deposit_balance,
            "bond reduced"
        );
        Ok(())
    }

    // ── Exit ─────────────────────────────────────────────────────────────

    /// Open the user-distribution window for a stalled exit.
    pub fn begin_user_distribute(&mut self, now: Timestamp, params: &ProtocolParams) -> Result<(), UnitError> {
        self.require(UnitStatus::Staking, "staking")?;
        if self.ledger_balance < params.minimum_exit_balance {
            return Err(UnitError::BelowExitBalance {
                balance: self.ledger_balance,
                minimum: params.minimum_exit_balance,
            });
        }
        if let Some(start) = self.user_distribute_time {
            let end = params
                .user_distribute_window_start_secs
                .saturating_add(params.user_distribute_window_length_secs);
            if !start.has_expired(end, now) {
                return Err(UnitError::UserDistributeInProgress {
                    expires: start.saturating_add(end),
                });
            }
        }
        self.user_distribute_time = Some(now);
        Ok(())
    }

    /// Whether a non-operator may run the exit distribution now.
    pub fn check_user_distribute(&self, now: Timestamp, params: &ProtocolParams) -> Result<(), UnitError> {
        let start = self
            .user_distribute_time
            .ok_or(UnitError::UserDistributeNotStarted)?;
        let opens = start.saturating_add(params.user_distribute_window_start_secs);
        if now < opens {
            return Err(UnitError::UserDistributeWindowNotOpen { opens });
        }
        let expired = opens.saturating_add(params.user_distribute_window_length_secs);
        if now >= expired {
            return Err(UnitError::UserDistributeWindowExpired { expired });
        }
        Ok(())
    }

    /// `Staking → Withdrawable`, marking the unit finalised after its exit
    /// balance has been split.
    pub fn finalise_exit(&mut self, now: Timestamp) -> Result<(), UnitError> {
        if self.finalised {
            return Err(UnitError::AlreadyFinalised { unit: self.id });
        }
        self.require(UnitStatus::Staking, "staking")?;
        self.finalised = true;
        self.user_deposit_balance = 0;
        self.user_distribute_time = None;
        self.set_status(UnitStatus::Withdrawable, now);
        Ok(())
    }

    /// Add to the operator's refund balance.
    pub fn credit_refund(&mut self, amount: Amount) -> Result<(), UnitError> {
        self.node_refund_balance = self
            .node_refund_balance
            .checked_add(amount)
            .ok_or(UnitError::Overflow)?;
        Ok(())
    }

    /// Empty the refund balance. Returns what was owed.
    pub fn take_refund(&mut self) -> Result<Amount, UnitError> {
        if self.node_refund_balance == 0 {
            return Err(UnitError::NothingToRefund);
        }
        Ok(std::mem::take(&mut self.node_refund_balance))
    }

    /// Mark the unit closed. Returns everything it still holds for the operator.
    pub fn close(&mut self) -> Result<Amount, UnitError> {
        if self.closed {
            return Err(UnitError::AlreadyClosed { unit: self.id });
        }
        let closable = self.status == UnitStatus::Dissolved
            || (self.status == UnitStatus::Withdrawable && self.finalised);
        if !closable {
            return Err(UnitError::NotClosable { unit: self.id });
        }
        let payout = self
            .ledger_balance
            .checked_add(self.node_refund_balance)
            .ok_or(UnitError::Overflow)?;
        self.ledger_balance = 0;
        self.node_refund_balance = 0;
        self.closed = true;
        tracing::info!(unit = %self.address, payout, "unit closed");
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_types::ether;

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn new_unit(bond: u128) -> NewUnit {
        NewUnit {
            id: UnitId::new(0),
            address: Address::from_low_u64(100),
            operator: OperatorId::new(0),
            bond: ether(bond),
            top_up: ether(bond) - ether(1),
            deposit_type: DepositType::Variable,
            node_fee: Ratio::from_percent(10),
            pubkey: ValidatorPubkey::new(vec![1; 48]).unwrap(),
        }
    }

    fn funded(bond: u128) -> StakingUnit {
        let mut u = StakingUnit::new_queued(new_unit(bond), ts(0));
        u.fund(ether(32 - bond), ether(bond - 1), ts(10)).unwrap();
        u
    }

    #[test]
    fn fund_then_stake_after_scrub_window() {
        let p = ProtocolParams::default();
        let mut u = funded(8);
        assert_eq!(u.status, UnitStatus::Prelaunch);
        assert_eq!(u.ledger_balance, ether(31));
        assert!(matches!(u.stake(ts(11), &p), Err(UnitError::ScrubWindowOpen { .. })));
        let sent = u.stake(ts(10 + p.scrub_period_secs), &p).unwrap();
        assert_eq!(sent, ether(31));
        assert_eq!(u.status, UnitStatus::Staking);
        assert_eq!(u.ledger_balance, 0);
    }

    #[test]
    fn staking_requires_prelaunch() {
        let p = ProtocolParams::default();
        let mut u = StakingUnit::new_queued(new_unit(8), ts(0));
        let err = u.stake(ts(1_000_000), &p).unwrap_err();
        assert!(matches!(err, UnitError::WrongStatus { .. }));
        assert_eq!(err.kind(), tide_types::ErrorKind::PreconditionViolation);
    }

    #[test]
    fn dissolve_twice_rejected() {
        let mut u = funded(8);
        u.dissolve(ts(20)).unwrap();
        assert!(matches!(u.dissolve(ts(21)), Err(UnitError::AlreadyDissolved { .. })));
    }

    #[test]
    fn launch_timeout() {
        let p = ProtocolParams::default();
        let u = funded(8);
        assert!(u.check_launch_timeout(ts(11), &p).is_err());
        assert!(u.check_launch_timeout(ts(10 + p.launch_timeout_secs), &p).is_ok());
    }

    #[test]
    fn scrub_votes_need_strict_majority() {
        let mut u = funded(8);
        assert!(!u.vote_scrub(Address::from_low_u64(1), 4).unwrap());
        assert!(!u.vote_scrub(Address::from_low_u64(2), 4).unwrap());
        let dup = u.vote_scrub(Address::from_low_u64(2), 4).unwrap_err();
        assert_eq!(dup.kind(), tide_types::ErrorKind::DuplicateSubmission);
        assert!(u.vote_scrub(Address::from_low_u64(3), 4).unwrap());
    }

    #[test]
    fn bond_reduction_window() {
        let p = ProtocolParams::default();
        let mut u = funded(16);
        u.stake(ts(10 + p.scrub_period_secs), &p).unwrap();
        assert!(u.begin_bond_reduction(ether(16), ts(100_000), &p).is_err());
        assert!(u.begin_bond_reduction(ether(4), ts(100_000), &p).is_err());
        u.begin_bond_reduction(ether(8), ts(100_000), &p).unwrap();
        assert!(matches!(
            u.check_bond_reduction(ts(100_001), &p),
            Err(UnitError::ReductionWindowNotOpen { .. })
        ));
        let open = 100_000 + p.bond_reduction_window_start_secs;
        let delta = u.check_bond_reduction(ts(open), &p).unwrap();
        assert_eq!(delta, ether(8));
        u.apply_bond_reduction(delta).unwrap();
        assert_eq!(u.node_deposit_balance, ether(8));
        assert_eq!(u.user_deposit_balance, ether(24));
        assert!(u.bond_reduction.is_none());
    }

    #[test]
    fn committee_can_cancel_reduction() {
        let p = ProtocolParams::default();
        let mut u = funded(16);
        u.stake(ts(10 + p.scrub_period_secs), &p).unwrap();
        u.begin_bond_reduction(ether(8), ts(100_000), &p).unwrap();
        assert!(!u.vote_cancel_reduction(Address::from_low_u64(1), 3).unwrap());
        assert!(u.vote_cancel_reduction(Address::from_low_u64(2), 3).unwrap());
        assert!(matches!(
            u.begin_bond_reduction(ether(8), ts(200_000), &p),
            Err(UnitError::ReductionCancelled)
        ));
    }

    #[test]
    fn close_requires_terminal_state() {
        let mut u = funded(8);
        assert!(matches!(u.close(), Err(UnitError::NotClosable { .. })));
        u.dissolve(ts(20)).unwrap();
        u.credit_refund(ether(7)).unwrap();
        u.release(ether(31)).unwrap();
        assert_eq!(u.close().unwrap(), ether(7));
        assert!(matches!(u.close(), Err(UnitError::AlreadyClosed { .. })));
    }

    #[test]
    fn vacant_unit_is_promoted_not_staked() {
        let p = ProtocolParams::default();
        let mut u = StakingUnit::new_vacant(new_unit(8), ether(32), ts(0));
        assert_eq!(u.status, UnitStatus::Prelaunch);
        assert!(matches!(u.stake(ts(1_000_000), &p), Err(UnitError::VacantUnit)));
        assert!(u.promote(ether(24), ts(1), &p).is_err());
        u.promote(ether(24), ts(p.promotion_scrub_period_secs), &p).unwrap();
        assert_eq!(u.status, UnitStatus::Staking);
        assert!(!u.vacant);
        assert_eq!(u.user_deposit_balance, ether(24));
    }

    #[test]
    fn user_distribute_window() {
        let p = ProtocolParams::default();
        let mut u = funded(8);
        u.stake(ts(10 + p.scrub_period_secs), &p).unwrap();
        assert!(u.begin_user_distribute(ts(100_000), &p).is_err());
        u.receive(ether(32)).unwrap();
        u.begin_user_distribute(ts(100_000), &p).unwrap();
        assert!(matches!(
            u.check_user_distribute(ts(100_001), &p),
            Err(UnitError::UserDistributeWindowNotOpen { .. })
        ));
        let opens = 100_000 + p.user_distribute_window_start_secs;
        assert!(u.check_user_distribute(ts(opens), &p).is_ok());
        assert!(matches!(
            u.check_user_distribute(ts(opens + p.user_distribute_window_length_secs), &p),
            Err(UnitError::UserDistributeWindowExpired { .. })
        ));
    }
}
