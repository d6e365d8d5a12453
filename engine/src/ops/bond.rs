//! Two-phase bond reduction.

use tide_types::{Address, Amount};

use crate::context::CallContext;
use crate::error::EngineError;
use crate::fault::FaultPoint;
use crate::outbox::Event;
use crate::protocol::Protocol;

impl Protocol {
    /// Request a smaller bond for a staking unit.
    pub fn begin_reduce_bond(
        &mut self,
        ctx: CallContext,
        unit: Address,
        new_bond: Amount,
    ) -> Result<(), EngineError> {
        self.transact("begin_reduce_bond", |s, env| {
            ctx.no_value()?;
            let id = s.operated_unit(&ctx.caller, &unit)?;
            s.unit_mut(id)?
                .begin_bond_reduction(new_bond, ctx.now, env.params)?;
            tracing::info!(%unit, new_bond, "bond reduction requested");
            Ok(())
        })
    }

    /// Committee vote against a pending reduction. Returns `true` when this
    /// vote cancelled it.
    pub fn vote_cancel_reduction(&mut self, ctx: CallContext, unit: Address) -> Result<bool, EngineError> {
        self.transact("vote_cancel_reduction", |s, _| {
            ctx.no_value()?;
            let members = s.require_member(&ctx.caller)?;
            let id = s.unit_id(&unit)?;
            Ok(s.unit_mut(id)?.vote_cancel_reduction(ctx.caller, members)?)
        })
    }

    /// Apply a pending reduction inside its window.
    ///
    /// Four records move together: the unit's balances, the operator's deposit
    /// credit, the pool's node credit, and the operator's matched capital.
    /// Any failure, including a limit breach in the last step, leaves all four
    /// as they were.
    pub fn reduce_bond(&mut self, ctx: CallContext, unit: Address) -> Result<Amount, EngineError> {
        self.transact("reduce_bond", |s, env| {
            ctx.no_value()?;
            let id = s.operated_unit(&ctx.caller, &unit)?;
            let record = s.unit(id)?;
            let operator = record.operator;
            let delta = record.check_bond_reduction(ctx.now, env.params)?;

            s.unit_mut(id)?.apply_bond_reduction(delta)?;
            env.faults.check(FaultPoint::ReduceBondAfterUnit)?;
            s.operators.add_credit(operator, delta)?;
            env.faults.check(FaultPoint::ReduceBondAfterCredit)?;
            s.pool.consume_node_credit(delta)?;
            env.faults.check(FaultPoint::ReduceBondAfterPool)?;
            s.collateral.match_capital(operator, delta)?;

            let new_bond = s.unit(id)?.node_deposit_balance;
            s.emit(Event::BondReduced { unit, new_bond });
            Ok(delta)
        })
    }
}
