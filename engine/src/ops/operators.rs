//! Operator registration, withdrawal addresses and fee distributors.

use tide_types::{Address, OperatorId, Ratio, UnitStatus};

use crate::context::CallContext;
use crate::error::EngineError;
use crate::operator::{split_distributor_balance, DistributorSplit};
use crate::outbox::{Asset, Event, TransferReason};
use crate::protocol::Protocol;
use crate::state::LedgerState;

impl LedgerState {
    /// Mean node fee across the operator's staking units, truncated. Zero
    /// while none are staking.
    pub fn average_node_fee(&self, operator: OperatorId) -> Result<Ratio, EngineError> {
        let mut total = 0u128;
        let mut staking = 0u128;
        for id in &self.operators.get(operator)?.units {
            let unit = self.unit(*id)?;
            if unit.status == UnitStatus::Staking {
                total = total
                    .checked_add(unit.node_fee.as_u128())
                    .ok_or(EngineError::Overflow)?;
                staking += 1;
            }
        }
        if staking == 0 {
            return Ok(Ratio::ZERO);
        }
        u64::try_from(total / staking)
            .map(Ratio::from_raw)
            .map_err(|_| EngineError::Overflow)
    }
}

impl Protocol {
    /// Register the caller as an operator.
    pub fn register_operator(&mut self, ctx: CallContext) -> Result<(), EngineError> {
        self.transact("register_operator", |s, _| {
            ctx.no_value()?;
            let id = s.operators.register(ctx.caller, ctx.now)?;
            s.emit(Event::OperatorRegistered { operator: ctx.caller });
            tracing::info!(operator = %ctx.caller, %id, "operator registered");
            Ok(())
        })
    }

    /// Point `operator`'s payouts at `new_address`. Either the operator or its
    /// current withdrawal address may do this.
    pub fn set_withdrawal_address(
        &mut self,
        ctx: CallContext,
        operator: Address,
        new_address: Address,
    ) -> Result<(), EngineError> {
        self.transact("set_withdrawal_address", |s, _| {
            ctx.no_value()?;
            let id = s.operators.id_of(&operator)?;
            let record = s.operators.get_mut(id)?;
            if ctx.caller != record.address && ctx.caller != record.withdrawal_address {
                return Err(EngineError::NotWithdrawalAuthority {
                    caller: ctx.caller,
                    operator,
                });
            }
            record.withdrawal_address = new_address;
            tracing::info!(%operator, withdrawal = %new_address, "withdrawal address changed");
            Ok(())
        })
    }

    /// Opt the calling operator in to or out of the smoothing pool. The
    /// state may change once per reward interval.
    pub fn set_smoothing_pool_registration(
        &mut self,
        ctx: CallContext,
        registered: bool,
    ) -> Result<(), EngineError> {
        self.transact("set_smoothing_pool_registration", |s, env| {
            ctx.no_value()?;
            let id = s.operators.id_of(&ctx.caller)?;
            let record = s.operators.get_mut(id)?;
            if record.smoothing_pool_registered == registered {
                return Err(EngineError::SmoothingPoolStateUnchanged(registered));
            }
            if let Some(changed) = record.smoothing_pool_changed_at {
                let interval = env.params.reward_interval_secs;
                if !changed.has_expired(interval, ctx.now) {
                    return Err(EngineError::SmoothingPoolChangeTooSoon {
                        allowed_at: changed.saturating_add(interval),
                    });
                }
            }
            record.smoothing_pool_registered = registered;
            record.smoothing_pool_changed_at = Some(ctx.now);
            s.emit(Event::SmoothingPoolRegistrationChanged {
                operator: ctx.caller,
                registered,
            });
            tracing::info!(operator = %ctx.caller, registered, "smoothing pool registration changed");
            Ok(())
        })
    }

    /// Pay execution-layer fees into `operator`'s distributor. The attached
    /// value is the amount paid.
    pub fn credit_fee_distributor(&mut self, ctx: CallContext, operator: Address) -> Result<(), EngineError> {
        self.transact("credit_fee_distributor", |s, _| {
            if ctx.value == 0 {
                return Err(EngineError::ZeroAmount);
            }
            let id = s.operators.id_of(&operator)?;
            let record = s.operators.get_mut(id)?;
            record.fee_distributor_balance = record
                .fee_distributor_balance
                .checked_add(ctx.value)
                .ok_or(EngineError::Overflow)?;
            s.receive_eth(ctx.value)?;
            tracing::debug!(%operator, amount = ctx.value, "fee distributor credited");
            Ok(())
        })
    }

    /// Share out `operator`'s distributor balance at its current average
    /// node fee. Anyone may call; the operator share goes to the withdrawal
    /// address and the user share back into the pool.
    pub fn distribute_fee_distributor(
        &mut self,
        ctx: CallContext,
        operator: Address,
    ) -> Result<DistributorSplit, EngineError> {
        self.transact("distribute_fee_distributor", |s, _| {
            ctx.no_value()?;
            let id = s.operators.id_of(&operator)?;
            let balance = s.operators.get(id)?.fee_distributor_balance;
            if balance == 0 {
                return Err(EngineError::ZeroAmount);
            }
            let fee = s.average_node_fee(id)?;
            let split = split_distributor_balance(balance, fee).ok_or(EngineError::Overflow)?;
            s.operators.get_mut(id)?.fee_distributor_balance = 0;
            let to = s.withdrawal_address(id)?;
            s.pay(to, Asset::Eth, split.operator, TransferReason::FeeDistribution)?;
            s.pool.recycle_user_capital(split.user)?;
            s.emit(Event::FeesDistributed {
                operator,
                node: split.operator,
                user: split.user,
            });
            tracing::info!(%operator, balance, %fee, node = split.operator, user = split.user, "fees distributed");
            Ok(split)
        })
    }

    /// Mean node fee across `operator`'s staking units.
    pub fn average_node_fee(&self, operator: &Address) -> Result<Ratio, EngineError> {
        let state = self.state();
        state.average_node_fee(state.operators.id_of(operator)?)
    }
}
