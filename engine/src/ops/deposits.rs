//! Pooled deposits, queue assignment and excess withdrawal.

use tide_deposit::{assign, quote_receipt, AssignmentLimits, DepositError, DepositReceipt};
use tide_types::{Amount, Timestamp};

use crate::context::CallContext;
use crate::error::EngineError;
use crate::outbox::{Asset, Event, TransferReason};
use crate::protocol::{Env, Protocol};
use crate::state::LedgerState;

impl LedgerState {
    /// Fund queued units from the pool. `deposit_value` is the deposit that
    /// triggered the call, or zero. Returns how many units were funded.
    pub(crate) fn assign_queued(
        &mut self,
        env: &Env<'_>,
        deposit_value: Amount,
        now: Timestamp,
    ) -> Result<usize, EngineError> {
        let limits = AssignmentLimits::from_params(env.params, deposit_value);
        let plan = assign(&mut self.pool, &mut self.queue, &limits)?;
        for a in &plan.assignments {
            let unit = self.unit_mut(a.unit)?;
            unit.fund(a.user_capital, a.node_credit, now)?;
            let address = unit.address;
            self.emit(Event::UnitFunded {
                unit: address,
                user_capital: a.user_capital,
            });
        }
        if !plan.assignments.is_empty() {
            tracing::info!(mode = ?plan.mode, count = plan.assignments.len(), "queued units funded");
        }
        Ok(plan.assignments.len())
    }
}

impl Protocol {
    /// Deposit the attached value into the pool and fund what the queue can.
    pub fn deposit(&mut self, ctx: CallContext) -> Result<DepositReceipt, EngineError> {
        self.transact("deposit", |s, env| {
            s.pool
                .check_deposit(ctx.value, env.params, s.queue.total_capacity())?;
            let network = s.oracle.balances();
            let receipt = quote_receipt(
                ctx.value,
                env.params.deposit_fee,
                network.total_value,
                network.receipt_supply,
            )?;
            s.receive_eth(ctx.value)?;
            s.pool.deposit(ctx.value)?;
            s.emit(Event::Deposited {
                from: ctx.caller,
                amount: ctx.value,
                tokens: receipt.tokens,
            });
            tracing::info!(from = %ctx.caller, amount = ctx.value, tokens = receipt.tokens, "deposit accepted");
            if env.params.assign_deposits_enabled {
                s.assign_queued(env, ctx.value, ctx.now)?;
            }
            Ok(receipt)
        })
    }

    /// Fund queued units without a deposit. Returns how many were funded.
    pub fn assign_deposits(&mut self, ctx: CallContext) -> Result<usize, EngineError> {
        self.transact("assign_deposits", |s, env| {
            ctx.no_value()?;
            if !env.params.assign_deposits_enabled {
                return Err(DepositError::AssignmentsDisabled.into());
            }
            s.assign_queued(env, 0, ctx.now)
        })
    }

    /// Withdraw pooled capital the queue does not need.
    pub fn withdraw_excess(&mut self, ctx: CallContext, amount: Amount) -> Result<(), EngineError> {
        self.transact("withdraw_excess", |s, _| {
            ctx.no_value()?;
            s.pool.withdraw_excess(amount, s.queue.total_capacity())?;
            s.pay(ctx.caller, Asset::Eth, amount, TransferReason::ExcessWithdrawal)?;
            tracing::info!(to = %ctx.caller, amount, "excess withdrawn");
            Ok(())
        })
    }
}
