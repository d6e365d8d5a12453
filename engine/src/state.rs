//! The ledger state every operation reads and writes.
//!
//! `LedgerState` is plain data. The engine clones it before each operation
//! and swaps the clone in only when the operation succeeds, so a rejected
//! call leaves the original untouched.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tide_collateral::CollateralLedger;
use tide_deposit::{DepositPool, UnitQueue};
use tide_oracle::{Committee, Oracle};
use tide_rewards::RewardAccountant;
use tide_types::{Address, Amount, OperatorId, ProtocolParams, Timestamp, UnitId, ValidatorPubkey};
use tide_unit::{PenaltyTracker, StakingUnit};

use crate::error::EngineError;
use crate::operator::OperatorRegistry;
use crate::outbox::{Asset, Event, Staged, Transfer, TransferReason};

/// Running totals of value entering and leaving the core, per asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalFlows {
    pub eth_in: Amount,
    pub eth_out: Amount,
    pub collateral_in: Amount,
    pub collateral_out: Amount,
}

/// Inflows, outflows and holdings at one point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapitalAudit {
    pub flows: CapitalFlows,
    pub eth_held: Amount,
    pub collateral_held: Amount,
}

impl CapitalAudit {
    /// `inflows − outflows == held` for both assets.
    pub fn is_balanced(&self) -> bool {
        self.flows.eth_in.checked_sub(self.flows.eth_out) == Some(self.eth_held)
            && self.flows.collateral_in.checked_sub(self.flows.collateral_out)
                == Some(self.collateral_held)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerState {
    pub pool: DepositPool,
    pub queue: UnitQueue,
    pub units: Vec<StakingUnit>,
    pub unit_by_address: BTreeMap<Address, UnitId>,
    pub pubkeys: BTreeSet<ValidatorPubkey>,
    pub operators: OperatorRegistry,
    pub collateral: CollateralLedger,
    pub penalties: PenaltyTracker,
    pub oracle: Oracle,
    pub rewards: RewardAccountant,
    pub flows: CapitalFlows,
    pub(crate) staged: Staged,
}

impl LedgerState {
    pub fn new(
        params: &ProtocolParams,
        committee: Committee,
        initial_price: Amount,
        genesis: Timestamp,
    ) -> Self {
        Self {
            pool: DepositPool::new(),
            queue: UnitQueue::new(),
            units: Vec::new(),
            unit_by_address: BTreeMap::new(),
            pubkeys: BTreeSet::new(),
            operators: OperatorRegistry::default(),
            collateral: CollateralLedger::new(params, initial_price),
            penalties: PenaltyTracker::new(),
            oracle: Oracle::new(params, committee),
            rewards: RewardAccountant::new(genesis, params.reward_interval_secs),
            flows: CapitalFlows::default(),
            staged: Staged::default(),
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────────

    pub fn unit_id(&self, address: &Address) -> Result<UnitId, EngineError> {
        self.unit_by_address
            .get(address)
            .copied()
            .ok_or(EngineError::UnknownUnit(*address))
    }

    pub fn unit(&self, id: UnitId) -> Result<&StakingUnit, EngineError> {
        self.units
            .get(id.index())
            .ok_or(EngineError::UnknownUnit(Address::ZERO))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut StakingUnit, EngineError> {
        self.units
            .get_mut(id.index())
            .ok_or(EngineError::UnknownUnit(Address::ZERO))
    }

    /// The unit at `address`, checking that `caller` operates it.
    pub(crate) fn operated_unit(&self, caller: &Address, address: &Address) -> Result<UnitId, EngineError> {
        let id = self.unit_id(address)?;
        let operator = self.unit(id)?.operator;
        if self.operators.get(operator)?.address != *caller {
            return Err(EngineError::NotUnitOperator {
                caller: *caller,
                unit: *address,
            });
        }
        Ok(id)
    }

    pub(crate) fn withdrawal_address(&self, operator: OperatorId) -> Result<Address, EngineError> {
        Ok(self.operators.get(operator)?.withdrawal_address)
    }

    pub(crate) fn require_member(&self, caller: &Address) -> Result<u32, EngineError> {
        let committee = self.oracle.committee();
        if !committee.is_member(caller) {
            return Err(EngineError::NotMember(*caller));
        }
        Ok(committee.size())
    }

    // ── Value movement ───────────────────────────────────────────────────

    pub(crate) fn receive_eth(&mut self, amount: Amount) -> Result<(), EngineError> {
        self.flows.eth_in = self
            .flows
            .eth_in
            .checked_add(amount)
            .ok_or(EngineError::Overflow)?;
        Ok(())
    }

    pub(crate) fn receive_collateral(&mut self, amount: Amount) -> Result<(), EngineError> {
        self.flows.collateral_in = self
            .flows
            .collateral_in
            .checked_add(amount)
            .ok_or(EngineError::Overflow)?;
        Ok(())
    }

    /// Stage an outbound transfer. Zero amounts are dropped.
    pub(crate) fn pay(
        &mut self,
        to: Address,
        asset: Asset,
        amount: Amount,
        reason: TransferReason,
    ) -> Result<(), EngineError> {
        if amount == 0 {
            return Ok(());
        }
        let out = match asset {
            Asset::Eth => &mut self.flows.eth_out,
            Asset::Collateral => &mut self.flows.collateral_out,
        };
        *out = out.checked_add(amount).ok_or(EngineError::Overflow)?;
        self.staged.transfers.push(Transfer {
            to,
            asset,
            amount,
            reason,
        });
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.staged.events.push(event);
    }

    // ── Audit ────────────────────────────────────────────────────────────

    pub fn capital_audit(&self) -> Result<CapitalAudit, EngineError> {
        let (unclaimed_collateral, unclaimed_eth) = self.rewards.unclaimed();
        let units = self.units.iter().try_fold(0u128, |acc, u| {
            acc.checked_add(u.ledger_balance)?
                .checked_add(u.node_refund_balance)
        });
        let eth_held = units
            .and_then(|u| u.checked_add(self.pool.total().ok()?))
            .and_then(|t| t.checked_add(self.operators.distributor_total()?))
            .and_then(|t| t.checked_add(self.rewards.smoothing_pool()))
            .and_then(|t| t.checked_add(unclaimed_eth))
            .ok_or(EngineError::Overflow)?;
        let collateral_held = self
            .collateral
            .total_staked()?
            .checked_add(self.rewards.reward_pool())
            .and_then(|t| t.checked_add(unclaimed_collateral))
            .ok_or(EngineError::Overflow)?;
        Ok(CapitalAudit {
            flows: self.flows,
            eth_held,
            collateral_held,
        })
    }
}
