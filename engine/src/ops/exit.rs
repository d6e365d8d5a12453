//! Validator balances returning to a unit and their distribution.

use tide_types::{Address, Ratio, UnitStatus};
use tide_unit::{split_exit_balance, split_rewards, Split, SplitTerms, UnitError};
use tide_utils::format_ether;

use crate::context::CallContext;
use crate::error::EngineError;
use crate::fault::FaultPoint;
use crate::outbox::{Asset, Event, TransferReason};
use crate::protocol::Protocol;

impl Protocol {
    /// Credit validator withdrawals arriving at a unit address. The attached
    /// value is the amount received.
    pub fn report_validator_withdrawal(&mut self, ctx: CallContext, unit: Address) -> Result<(), EngineError> {
        self.transact("report_validator_withdrawal", |s, _| {
            if ctx.value == 0 {
                return Err(EngineError::ZeroAmount);
            }
            let id = s.unit_id(&unit)?;
            let record = s.unit_mut(id)?;
            if !matches!(record.status, UnitStatus::Staking | UnitStatus::Withdrawable) {
                return Err(UnitError::WrongStatus {
                    unit: id,
                    expected: "staking or withdrawable",
                    actual: record.status,
                }
                .into());
            }
            record.receive(ctx.value)?;
            s.receive_eth(ctx.value)?;
            tracing::debug!(%unit, amount = ctx.value, "validator withdrawal received");
            Ok(())
        })
    }

    /// Open the window in which anyone may distribute a stalled exit.
    pub fn begin_user_distribute(&mut self, ctx: CallContext, unit: Address) -> Result<(), EngineError> {
        self.transact("begin_user_distribute", |s, env| {
            ctx.no_value()?;
            let id = s.unit_id(&unit)?;
            s.unit_mut(id)?.begin_user_distribute(ctx.now, env.params)?;
            tracing::info!(%unit, by = %ctx.caller, "user distribution started");
            Ok(())
        })
    }

    /// Split a full exit balance and finalise the unit.
    ///
    /// The operator may call this at any time. Anyone else must first open
    /// the user-distribute window and wait for it; their call leaves the
    /// operator share in the unit's refund balance.
    pub fn distribute_balance(&mut self, ctx: CallContext, unit: Address) -> Result<Split, EngineError> {
        self.transact("distribute_balance", |s, env| {
            ctx.no_value()?;
            let p = env.params;
            let id = s.unit_id(&unit)?;
            let record = s.unit(id)?;
            let operator = record.operator;
            let is_operator = s.operators.get(operator)?.address == ctx.caller;
            if !is_operator {
                record.check_user_distribute(ctx.now, p)?;
            }
            let balance = record.ledger_balance;
            if balance < p.minimum_exit_balance {
                return Err(UnitError::BelowExitBalance {
                    balance,
                    minimum: p.minimum_exit_balance,
                }
                .into());
            }
            let terms = SplitTerms::for_unit(record, s.penalties.rate(id));
            let split = split_exit_balance(&terms, balance)?;

            s.unit_mut(id)?.release(balance)?;
            s.pool.recycle_user_capital(split.user)?;
            if is_operator {
                let to = s.withdrawal_address(operator)?;
                s.pay(to, Asset::Eth, split.operator, TransferReason::OperatorShare)?;
            } else {
                s.unit_mut(id)?.credit_refund(split.operator)?;
            }
            env.faults.check(FaultPoint::DistributeAfterPayout)?;

            s.release_matched(env, id)?;
            s.unit_mut(id)?.finalise_exit(ctx.now)?;
            s.emit(Event::BalanceDistributed {
                unit,
                operator: split.operator,
                user: split.user,
                penalty: split.penalty,
            });
            s.emit(Event::UnitStatusChanged {
                unit,
                status: UnitStatus::Withdrawable,
            });
            tracing::info!(
                %unit,
                balance = %format_ether(balance),
                operator = split.operator,
                user = split.user,
                penalty = split.penalty,
                "exit balance distributed"
            );
            Ok(split)
        })
    }

    /// Split a balance below the exit threshold as pure rewards. The unit
    /// keeps staking.
    pub fn distribute_rewards(&mut self, ctx: CallContext, unit: Address) -> Result<Split, EngineError> {
        self.transact("distribute_rewards", |s, env| {
            ctx.no_value()?;
            let p = env.params;
            let id = s.unit_id(&unit)?;
            let record = s.unit(id)?;
            if record.status != UnitStatus::Staking {
                return Err(UnitError::WrongStatus {
                    unit: id,
                    expected: "staking",
                    actual: record.status,
                }
                .into());
            }
            let balance = record.ledger_balance;
            if balance >= p.minimum_exit_balance {
                return Err(UnitError::AboveRewardsOnly {
                    balance,
                    minimum: p.minimum_exit_balance,
                }
                .into());
            }
            if balance == 0 {
                return Err(EngineError::ZeroAmount);
            }
            let operator = record.operator;
            let split = split_rewards(&SplitTerms::for_unit(record, Ratio::ZERO), balance)?;

            s.unit_mut(id)?.release(balance)?;
            s.pool.recycle_user_capital(split.user)?;
            let to = s.withdrawal_address(operator)?;
            s.pay(to, Asset::Eth, split.operator, TransferReason::OperatorShare)?;
            s.emit(Event::BalanceDistributed {
                unit,
                operator: split.operator,
                user: split.user,
                penalty: 0,
            });
            tracing::info!(%unit, balance, operator = split.operator, user = split.user, "rewards skimmed");
            Ok(split)
        })
    }
}
