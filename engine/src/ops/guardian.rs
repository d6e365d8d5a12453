//! Guardian operations: committee bootstrap and reward funding.

use tide_oracle::{BalancesSubmission, NetworkBalances, PenaltySubmission, PriceSubmission, RewardSubmission};
use tide_types::{Address, Amount, Digest32, Ratio};

use crate::context::CallContext;
use crate::error::EngineError;
use crate::protocol::{Env, Protocol};

fn require_guardian(env: &Env<'_>, caller: &Address) -> Result<(), EngineError> {
    if *caller != env.roles.guardian {
        return Err(EngineError::NotGuardian(*caller));
    }
    Ok(())
}

impl Protocol {
    pub fn bootstrap_member(&mut self, ctx: CallContext, member: Address) -> Result<(), EngineError> {
        self.transact("bootstrap_member", |s, _| {
            ctx.no_value()?;
            Ok(s.oracle.bootstrap_member(ctx.caller, member)?)
        })
    }

    pub fn bootstrap_remove_member(&mut self, ctx: CallContext, member: Address) -> Result<(), EngineError> {
        self.transact("bootstrap_remove_member", |s, _| {
            ctx.no_value()?;
            Ok(s.oracle.bootstrap_remove_member(ctx.caller, &member)?)
        })
    }

    /// Permanently end bootstrap mode.
    pub fn bootstrap_disable(&mut self, ctx: CallContext) -> Result<(), EngineError> {
        self.transact("bootstrap_disable", |s, _| {
            ctx.no_value()?;
            Ok(s.oracle.bootstrap_disable(ctx.caller)?)
        })
    }

    pub fn bootstrap_execute_balances(
        &mut self,
        ctx: CallContext,
        sub: BalancesSubmission,
    ) -> Result<NetworkBalances, EngineError> {
        self.transact("bootstrap_execute_balances", |s, _| {
            ctx.no_value()?;
            let balances = s.oracle.bootstrap_balances(ctx.caller, &sub, ctx.block)?;
            s.apply_balances(balances);
            Ok(balances)
        })
    }

    pub fn bootstrap_execute_prices(&mut self, ctx: CallContext, sub: PriceSubmission) -> Result<Amount, EngineError> {
        self.transact("bootstrap_execute_prices", |s, _| {
            ctx.no_value()?;
            let price = s.oracle.bootstrap_prices(ctx.caller, &sub, ctx.block)?;
            s.apply_price(sub.block, price)?;
            Ok(price)
        })
    }

    pub fn bootstrap_execute_penalty(
        &mut self,
        ctx: CallContext,
        sub: PenaltySubmission,
    ) -> Result<Ratio, EngineError> {
        self.transact("bootstrap_execute_penalty", |s, env| {
            ctx.no_value()?;
            s.unit_id(&sub.unit)?;
            s.oracle.bootstrap_penalty(ctx.caller, &sub)?;
            s.apply_penalty(env, &sub)
        })
    }

    /// Apply a reward snapshot for the current index without votes.
    pub fn bootstrap_execute_rewards(
        &mut self,
        ctx: CallContext,
        sub: RewardSubmission,
    ) -> Result<Digest32, EngineError> {
        self.transact("bootstrap_execute_rewards", |s, env| {
            ctx.no_value()?;
            let digest = s
                .oracle
                .bootstrap_rewards(ctx.caller, &sub, s.rewards.reward_index())?;
            s.apply_rewards(env, digest, &sub, ctx.now)?;
            Ok(digest)
        })
    }

    /// Add collateral to the reward pool.
    pub fn fund_reward_pool(&mut self, ctx: CallContext, amount: Amount) -> Result<(), EngineError> {
        self.transact("fund_reward_pool", |s, env| {
            ctx.no_value()?;
            require_guardian(env, &ctx.caller)?;
            if amount == 0 {
                return Err(EngineError::ZeroAmount);
            }
            s.rewards.fund_reward_pool(amount)?;
            s.receive_collateral(amount)
        })
    }

    /// Credit the attached value to the smoothing pool.
    pub fn credit_smoothing_pool(&mut self, ctx: CallContext) -> Result<(), EngineError> {
        self.transact("credit_smoothing_pool", |s, env| {
            require_guardian(env, &ctx.caller)?;
            if ctx.value == 0 {
                return Err(EngineError::ZeroAmount);
            }
            s.rewards.credit_smoothing_pool(ctx.value)?;
            s.receive_eth(ctx.value)
        })
    }
}
