//! Reward snapshot execution and operator claims.

use tide_oracle::RewardSubmission;
use tide_rewards::{Claim, ClaimPayout};
use tide_types::{Address, Digest32, Timestamp};

use crate::context::CallContext;
use crate::error::EngineError;
use crate::fault::FaultPoint;
use crate::outbox::{Asset, Event, TransferReason};
use crate::protocol::{Env, Protocol};
use crate::state::LedgerState;

impl LedgerState {
    /// Apply an agreed reward snapshot: accountant first, then the payouts,
    /// then freeze the index in the vote.
    pub(crate) fn apply_rewards(
        &mut self,
        env: &Env<'_>,
        digest: Digest32,
        sub: &RewardSubmission,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let payout = self.rewards.execute(sub, now)?;
        env.faults.check(FaultPoint::RewardsAfterExecute)?;
        self.pay(env.roles.treasury, Asset::Collateral, payout.treasury, TransferReason::Treasury)?;
        self.pool.recycle_user_capital(payout.user_eth)?;
        self.pay(
            env.roles.fee_recipient,
            Asset::Eth,
            payout.fee_recipient,
            TransferReason::FeeRecipient,
        )?;
        self.oracle.mark_rewards_executed(payout.index, digest)?;
        self.emit(Event::RewardsExecuted {
            index: payout.index,
            root: sub.digest,
        });
        Ok(())
    }
}

impl Protocol {
    /// Apply the snapshot that reached quorum for the current index but
    /// could not run when its last vote arrived.
    pub fn execute_rewards(&mut self, ctx: CallContext) -> Result<Digest32, EngineError> {
        self.transact("execute_rewards", |s, env| {
            ctx.no_value()?;
            let index = s.rewards.reward_index();
            let (digest, sub) = s
                .oracle
                .reached_rewards(index)
                .map(|(d, sub)| (d, sub.clone()))
                .ok_or(EngineError::RewardsNotReached(index))?;
            s.apply_rewards(env, digest, &sub, ctx.now)?;
            Ok(digest)
        })
    }

    /// Claim `operator`'s entitlements from one or more executed snapshots.
    ///
    /// The operator or its withdrawal address may call; payouts always go to
    /// the withdrawal address. One bad claim rejects the whole batch.
    pub fn claim_rewards(
        &mut self,
        ctx: CallContext,
        operator: Address,
        claims: Vec<Claim>,
    ) -> Result<ClaimPayout, EngineError> {
        self.transact("claim_rewards", |s, _| {
            ctx.no_value()?;
            let id = s.operators.id_of(&operator)?;
            let to = s.withdrawal_address(id)?;
            if ctx.caller != operator && ctx.caller != to {
                return Err(EngineError::NotWithdrawalAuthority {
                    caller: ctx.caller,
                    operator,
                });
            }
            let mut total = ClaimPayout::default();
            for claim in &claims {
                let paid = s.rewards.claim(operator, claim)?;
                total.collateral = total
                    .collateral
                    .checked_add(paid.collateral)
                    .ok_or(EngineError::Overflow)?;
                total.eth = total.eth.checked_add(paid.eth).ok_or(EngineError::Overflow)?;
                s.emit(Event::RewardsClaimed {
                    claimer: operator,
                    index: claim.index,
                });
            }
            s.pay(to, Asset::Collateral, total.collateral, TransferReason::RewardClaim)?;
            s.pay(to, Asset::Eth, total.eth, TransferReason::RewardClaim)?;
            Ok(total)
        })
    }
}
