//! Splitting a unit's balance between its operator and pooled users.
//!
//! Rewards are everything above principal. How rewards divide depends on the
//! deposit type:
//!
//! | type     | operator rewards                                   |
//! |----------|----------------------------------------------------|
//! | Variable | `r × node/(node+user)`, plus the fee on the rest   |
//! | Full/Half| `r − (r/2 − fee × r/2)`                            |
//! | Empty    | `fee × r/2`                                        |
//!
//! On exit, a balance below principal is a loss the operator absorbs first.
//! Any penalty then moves part of the operator share to users; the moved
//! amount never exceeds the operator share, whatever the configured rate.

use serde::{Deserialize, Serialize};
use tide_types::{mul_div, Amount, DepositType, Ratio};

use crate::error::UnitError;
use crate::unit::StakingUnit;

/// Inputs to a split, captured from the unit at distribution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitTerms {
    pub deposit_type: DepositType,
    pub node_capital: Amount,
    pub user_capital: Amount,
    pub node_fee: Ratio,
    pub penalty_rate: Ratio,
}

impl SplitTerms {
    pub fn for_unit(unit: &StakingUnit, penalty_rate: Ratio) -> Self {
        Self {
            deposit_type: unit.deposit_type,
            node_capital: unit.node_deposit_balance,
            user_capital: unit.user_deposit_balance,
            node_fee: unit.node_fee,
            penalty_rate,
        }
    }
}

/// `operator + user` always equals the amount split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub operator: Amount,
    pub user: Amount,
    /// Portion of `user` that was moved from the operator as a penalty.
    pub penalty: Amount,
}

fn fee_on(fee: Ratio, amount: Amount) -> Result<Amount, UnitError> {
    fee.apply(amount).ok_or(UnitError::Overflow)
}

/// Operator share of pure rewards.
fn operator_rewards(terms: &SplitTerms, rewards: Amount) -> Result<Amount, UnitError> {
    let operator = match terms.deposit_type {
        DepositType::Variable => {
            let capital = terms
                .node_capital
                .checked_add(terms.user_capital)
                .ok_or(UnitError::Overflow)?;
            if capital == 0 {
                return Ok(0);
            }
            let by_capital =
                mul_div(rewards, terms.node_capital, capital).ok_or(UnitError::Overflow)?;
            let fee = fee_on(terms.node_fee, rewards - by_capital)?;
            by_capital.checked_add(fee).ok_or(UnitError::Overflow)?
        }
        DepositType::Full | DepositType::Half => {
            let half = rewards / 2;
            let user = half - fee_on(terms.node_fee, half)?.min(half);
            rewards - user
        }
        DepositType::Empty => fee_on(terms.node_fee, rewards / 2)?.min(rewards),
    };
    Ok(operator.min(rewards))
}

/// Split a balance that is entirely rewards (a skim below the exit threshold).
/// No penalty applies.
pub fn split_rewards(terms: &SplitTerms, rewards: Amount) -> Result<Split, UnitError> {
    let operator = operator_rewards(terms, rewards)?;
    Ok(Split {
        operator,
        user: rewards - operator,
        penalty: 0,
    })
}

/// Split a full exit balance: principal back to each side, rewards by type,
/// operator absorbs losses first, then the penalty.
pub fn split_exit_balance(terms: &SplitTerms, balance: Amount) -> Result<Split, UnitError> {
    let principal = terms
        .node_capital
        .checked_add(terms.user_capital)
        .ok_or(UnitError::Overflow)?;
    let mut operator = if balance > principal {
        terms
            .node_capital
            .checked_add(operator_rewards(terms, balance - principal)?)
            .ok_or(UnitError::Overflow)?
    } else if balance > terms.user_capital {
        balance - terms.user_capital
    } else {
        0
    };
    let penalty = fee_on(terms.penalty_rate, operator)?.min(operator);
    operator -= penalty;
    Ok(Split {
        operator,
        user: balance - operator,
        penalty,
    })
}
