//! The `Protocol` value: ledger state plus the machinery around it.

use tide_collateral::CollateralRecord;
use tide_deposit::{DepositPool, UnitQueue};
use tide_oracle::{Committee, Oracle};
use tide_rewards::RewardAccountant;
use tide_types::{Address, ProtocolParams, Timestamp};
use tide_unit::{PenaltyRecord, StakingUnit};
use tide_utils::{format_duration, format_ether, OperationStats};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fault::FaultPlan;
use crate::operator::OperatorRecord;
use crate::outbox::{Event, Outbox, Transfer};
use crate::state::{CapitalAudit, LedgerState};

/// Fixed addresses the core pays into or checks against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roles {
    pub guardian: Address,
    pub treasury: Address,
    pub fee_recipient: Address,
    pub auction: Address,
    pub deposit_contract: Address,
}

/// Read-only inputs to every operation.
pub(crate) struct Env<'a> {
    pub params: &'a ProtocolParams,
    pub roles: &'a Roles,
    pub faults: &'a FaultPlan,
}

pub(crate) const OPERATIONS: &[&str] = &[
    "register_operator",
    "set_withdrawal_address",
    "set_smoothing_pool_registration",
    "credit_fee_distributor",
    "distribute_fee_distributor",
    "deposit",
    "assign_deposits",
    "withdraw_excess",
    "create_unit",
    "create_vacant_unit",
    "stake_unit",
    "promote_unit",
    "dissolve_unit",
    "close_unit",
    "vote_scrub",
    "refund",
    "begin_reduce_bond",
    "vote_cancel_reduction",
    "reduce_bond",
    "begin_user_distribute",
    "distribute_balance",
    "distribute_rewards",
    "report_validator_withdrawal",
    "stake_collateral",
    "withdraw_collateral",
    "submit_balances",
    "submit_prices",
    "submit_penalty",
    "submit_rewards",
    "execute_rewards",
    "claim_rewards",
    "bootstrap_member",
    "bootstrap_remove_member",
    "bootstrap_disable",
    "bootstrap_execute_balances",
    "bootstrap_execute_prices",
    "bootstrap_execute_penalty",
    "bootstrap_execute_rewards",
    "fund_reward_pool",
    "credit_smoothing_pool",
];

/// The staking core.
///
/// Every public operation runs against a working copy of the ledger state
/// and is committed only if it succeeds. Transfers and events staged by the
/// operation reach the outbox only after commit.
pub struct Protocol {
    params: ProtocolParams,
    roles: Roles,
    state: LedgerState,
    outbox: Outbox,
    faults: FaultPlan,
    stats: OperationStats,
}

impl Protocol {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let committee = Committee::new(config.guardian, config.committee.iter().copied());
        let state = LedgerState::new(
            &config.params,
            committee,
            config.initial_price,
            Timestamp::new(config.genesis_time),
        );
        tracing::info!(
            guardian = %config.guardian,
            committee = config.committee.len(),
            launch = %format_ether(config.params.launch_balance),
            scrub_period = %format_duration(config.params.scrub_period_secs),
            "protocol initialised"
        );
        Ok(Self {
            params: config.params.clone(),
            roles: Roles {
                guardian: config.guardian,
                treasury: config.treasury,
                fee_recipient: config.fee_recipient,
                auction: config.auction,
                deposit_contract: config.deposit_contract,
            },
            state,
            outbox: Outbox::default(),
            faults: FaultPlan::default(),
            stats: OperationStats::new(OPERATIONS),
        })
    }

    /// Run `f` against a working copy and commit it only on success.
    pub(crate) fn transact<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut LedgerState, &Env<'_>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut working = self.state.clone();
        let env = Env {
            params: &self.params,
            roles: &self.roles,
            faults: &self.faults,
        };
        match f(&mut working, &env) {
            Ok(value) => {
                let staged = std::mem::take(&mut working.staged);
                self.state = working;
                self.outbox.commit(staged);
                self.stats.record_commit(operation);
                Ok(value)
            }
            Err(e) => {
                self.stats.record_rejection(e.kind());
                tracing::debug!(operation, kind = %e.kind(), error = %e, "operation rejected");
                Err(e)
            }
        }
    }

    // ── State management ─────────────────────────────────────────────────

    /// Copy of the current ledger state.
    pub fn snapshot(&self) -> LedgerState {
        self.state.clone()
    }

    /// Replace the ledger state with an earlier snapshot. The outbox is kept.
    pub fn restore(&mut self, snapshot: LedgerState) {
        self.state = snapshot;
        tracing::info!("ledger state restored from snapshot");
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn faults_mut(&mut self) -> &mut FaultPlan {
        &mut self.faults
    }

    pub fn stats(&self) -> &OperationStats {
        &self.stats
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn pool(&self) -> &DepositPool {
        &self.state.pool
    }

    pub fn queue(&self) -> &UnitQueue {
        &self.state.queue
    }

    pub fn unit(&self, address: &Address) -> Option<&StakingUnit> {
        let id = self.state.unit_by_address.get(address)?;
        self.state.units.get(id.index())
    }

    pub fn units(&self) -> &[StakingUnit] {
        &self.state.units
    }

    pub fn operator(&self, address: &Address) -> Option<&OperatorRecord> {
        self.state.operators.by_address(address)
    }

    pub fn collateral(&self, operator: &Address) -> Option<CollateralRecord> {
        let id = self.state.operators.id_of(operator).ok()?;
        Some(self.state.collateral.record(id))
    }

    pub fn collateral_price(&self) -> u128 {
        self.state.collateral.price()
    }

    pub fn penalty(&self, unit: &Address) -> Option<PenaltyRecord> {
        let id = self.state.unit_by_address.get(unit)?;
        Some(self.state.penalties.record(*id))
    }

    pub fn oracle(&self) -> &Oracle {
        &self.state.oracle
    }

    pub fn rewards(&self) -> &RewardAccountant {
        &self.state.rewards
    }

    pub fn capital_audit(&self) -> Result<CapitalAudit, EngineError> {
        self.state.capital_audit()
    }

    pub fn pending_transfers(&self) -> &[Transfer] {
        self.outbox.pending_transfers()
    }

    pub fn drain_transfers(&mut self) -> Vec<Transfer> {
        self.outbox.drain_transfers()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.outbox.drain_events()
    }
}
