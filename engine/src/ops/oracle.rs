//! Committee submissions and what their consensus does to the ledger.

use tide_oracle::{
    BalancesSubmission, NetworkBalances, PenaltySubmission, PriceSubmission, RewardSubmission, VoteOutcome,
};
use tide_rewards::RewardsError;
use tide_types::{Amount, BlockNumber, Digest32, Ratio};

use crate::context::CallContext;
use crate::error::EngineError;
use crate::outbox::Event;
use crate::protocol::{Env, Protocol};
use crate::state::LedgerState;

/// Where a reward submission stands after it was counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardVote {
    /// Counted; the snapshot is short of quorum.
    Pending { count: u32 },
    /// Quorum reached but the snapshot cannot run yet. Call
    /// [`Protocol::execute_rewards`] once its index is current and funded.
    Deferred { digest: Digest32 },
    /// Quorum reached and the snapshot was applied.
    Executed { digest: Digest32 },
}

impl LedgerState {
    pub(crate) fn apply_balances(&mut self, balances: NetworkBalances) {
        self.emit(Event::BalancesUpdated {
            block: balances.block,
            total_value: balances.total_value,
        });
    }

    pub(crate) fn apply_price(&mut self, block: BlockNumber, price: Amount) -> Result<(), EngineError> {
        self.collateral.set_price(price)?;
        self.emit(Event::PriceUpdated { block, price });
        Ok(())
    }

    pub(crate) fn apply_penalty(&mut self, env: &Env<'_>, sub: &PenaltySubmission) -> Result<Ratio, EngineError> {
        let id = self.unit_id(&sub.unit)?;
        let rate = self.penalties.apply_offense(id, env.params)?;
        self.emit(Event::PenaltyApplied { unit: sub.unit, rate });
        Ok(rate)
    }
}

impl Protocol {
    /// Vote on network balances. Returns the new totals when this vote
    /// completes consensus.
    pub fn submit_balances(
        &mut self,
        ctx: CallContext,
        sub: BalancesSubmission,
    ) -> Result<Option<NetworkBalances>, EngineError> {
        self.transact("submit_balances", |s, _| {
            ctx.no_value()?;
            let applied = s.oracle.submit_balances(ctx.caller, &sub, ctx.block)?;
            if let Some(balances) = applied {
                s.apply_balances(balances);
            }
            Ok(applied)
        })
    }

    /// Vote on the collateral price. Returns the price when this vote
    /// completes consensus.
    pub fn submit_prices(&mut self, ctx: CallContext, sub: PriceSubmission) -> Result<Option<Amount>, EngineError> {
        self.transact("submit_prices", |s, _| {
            ctx.no_value()?;
            let price = s.oracle.submit_prices(ctx.caller, &sub, ctx.block)?;
            if let Some(price) = price {
                s.apply_price(sub.block, price)?;
            }
            Ok(price)
        })
    }

    /// Report a unit offense. Returns the unit's new penalty rate when this
    /// vote completes consensus.
    pub fn submit_penalty(&mut self, ctx: CallContext, sub: PenaltySubmission) -> Result<Option<Ratio>, EngineError> {
        self.transact("submit_penalty", |s, env| {
            ctx.no_value()?;
            s.unit_id(&sub.unit)?;
            if !s.oracle.submit_penalty(ctx.caller, &sub, ctx.block)? {
                return Ok(None);
            }
            s.apply_penalty(env, &sub).map(Some)
        })
    }

    /// Vote on a reward snapshot.
    ///
    /// A snapshot for the current index is rejected before its interval has
    /// elapsed. Snapshots for later indices are held until they become
    /// current. The vote that completes quorum also applies the snapshot when
    /// it can run right away.
    pub fn submit_rewards(&mut self, ctx: CallContext, sub: RewardSubmission) -> Result<RewardVote, EngineError> {
        self.transact("submit_rewards", |s, env| {
            ctx.no_value()?;
            let current = s.rewards.reward_index();
            if sub.index == current {
                let boundary = s.rewards.interval_boundary(sub.intervals_passed);
                if ctx.now < boundary {
                    return Err(RewardsError::IntervalNotElapsed { boundary, now: ctx.now }.into());
                }
            }
            let (digest, outcome) = s.oracle.submit_rewards(ctx.caller, &sub, current)?;
            let count = match outcome {
                VoteOutcome::Recorded { count } => return Ok(RewardVote::Pending { count }),
                VoteOutcome::Reached { count } => count,
            };
            if sub.index != current || s.rewards.check(&sub, ctx.now).is_err() {
                tracing::info!(index = sub.index, %digest, count, "reward snapshot reached quorum, deferred");
                return Ok(RewardVote::Deferred { digest });
            }
            s.apply_rewards(env, digest, &sub, ctx.now)?;
            Ok(RewardVote::Executed { digest })
        })
    }
}
