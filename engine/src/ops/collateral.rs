//! Operator collateral staking and withdrawal.

use tide_types::Amount;

use crate::context::CallContext;
use crate::error::EngineError;
use crate::outbox::{Asset, TransferReason};
use crate::protocol::Protocol;

impl Protocol {
    /// Stake `amount` of collateral for the calling operator.
    pub fn stake_collateral(&mut self, ctx: CallContext, amount: Amount) -> Result<(), EngineError> {
        self.transact("stake_collateral", |s, _| {
            ctx.no_value()?;
            let id = s.operators.id_of(&ctx.caller)?;
            s.collateral.stake(id, amount, ctx.now)?;
            s.receive_collateral(amount)?;
            Ok(())
        })
    }

    /// Withdraw collateral to the operator's withdrawal address.
    pub fn withdraw_collateral(&mut self, ctx: CallContext, amount: Amount) -> Result<(), EngineError> {
        self.transact("withdraw_collateral", |s, _| {
            ctx.no_value()?;
            let id = s.operators.id_of(&ctx.caller)?;
            s.collateral.withdraw(id, amount, ctx.now)?;
            let to = s.withdrawal_address(id)?;
            s.pay(to, Asset::Collateral, amount, TransferReason::CollateralWithdrawal)?;
            tracing::info!(operator = %ctx.caller, %to, amount, "collateral withdrawn");
            Ok(())
        })
    }
}
