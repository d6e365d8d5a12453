//! The shared liquidity buffer.

use serde::{Deserialize, Serialize};
use tide_types::{Amount, ProtocolParams};

use crate::error::DepositError;

/// Unmatched capital: pooled user funds plus operator top-up credit.
///
/// `user_balance + node_credit_balance` is every unit of capital the pool
/// holds. Neither side can go negative; every mutator checks first and
/// returns an error without touching either balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPool {
    user_balance: Amount,
    node_credit_balance: Amount,
}

impl DepositPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_balance(&self) -> Amount {
        self.user_balance
    }

    pub fn node_credit_balance(&self) -> Amount {
        self.node_credit_balance
    }

    pub fn total(&self) -> Result<Amount, DepositError> {
        self.user_balance
            .checked_add(self.node_credit_balance)
            .ok_or(DepositError::Overflow)
    }

    /// Admission rules for a user deposit.
    ///
    /// `queue_capacity` is the user capital the queue still needs; the pool
    /// cap applies only to capital beyond that.
    pub fn check_deposit(
        &self,
        amount: Amount,
        params: &ProtocolParams,
        queue_capacity: Amount,
    ) -> Result<(), DepositError> {
        if !params.deposit_enabled {
            return Err(DepositError::DepositsDisabled);
        }
        if amount < params.minimum_deposit || amount == 0 {
            return Err(DepositError::BelowMinimumDeposit {
                amount,
                minimum: params.minimum_deposit,
            });
        }
        let would_be = self
            .user_balance
            .checked_add(amount)
            .ok_or(DepositError::Overflow)?;
        let cap = params
            .maximum_deposit_pool_size
            .saturating_add(queue_capacity);
        if would_be > cap {
            return Err(DepositError::PoolFull { would_be, cap });
        }
        Ok(())
    }

    /// Credit pooled user capital.
    pub fn deposit(&mut self, amount: Amount) -> Result<(), DepositError> {
        self.user_balance = self
            .user_balance
            .checked_add(amount)
            .ok_or(DepositError::Overflow)?;
        Ok(())
    }

    /// Credit an operator top-up.
    pub fn node_deposit(&mut self, amount: Amount) -> Result<(), DepositError> {
        self.node_credit_balance = self
            .node_credit_balance
            .checked_add(amount)
            .ok_or(DepositError::Overflow)?;
        Ok(())
    }

    /// Capital returning from a unit (dissolution, exit, reward share).
    pub fn recycle_user_capital(&mut self, amount: Amount) -> Result<(), DepositError> {
        self.deposit(amount)
    }

    /// Move node credit back to the user side.
    pub fn recycle_node_credit(&mut self, amount: Amount) -> Result<(), DepositError> {
        let node = self.take_node_credit(amount)?;
        self.user_balance = self
            .user_balance
            .checked_add(node)
            .ok_or(DepositError::Overflow)?;
        Ok(())
    }

    /// Earmark user capital as node credit (bond reduction backfill).
    pub fn consume_node_credit(&mut self, amount: Amount) -> Result<(), DepositError> {
        let user = self.take_user(amount)?;
        self.node_credit_balance = self
            .node_credit_balance
            .checked_add(user)
            .ok_or(DepositError::Overflow)?;
        Ok(())
    }

    /// Remove user capital. Fails without side effects when short.
    pub fn take_user(&mut self, amount: Amount) -> Result<Amount, DepositError> {
        self.user_balance = self.user_balance.checked_sub(amount).ok_or(
            DepositError::InsufficientUserBalance {
                needed: amount,
                available: self.user_balance,
            },
        )?;
        Ok(amount)
    }

    /// Remove node credit. Fails without side effects when short.
    pub fn take_node_credit(&mut self, amount: Amount) -> Result<Amount, DepositError> {
        self.node_credit_balance = self.node_credit_balance.checked_sub(amount).ok_or(
            DepositError::InsufficientNodeCredit {
                needed: amount,
                available: self.node_credit_balance,
            },
        )?;
        Ok(amount)
    }

    /// User capital not spoken for by the queue.
    pub fn excess_balance(&self, queue_capacity: Amount) -> Amount {
        self.user_balance.saturating_sub(queue_capacity)
    }

    /// Withdraw pooled user capital that the queue does not need.
    pub fn withdraw_excess(&mut self, amount: Amount, queue_capacity: Amount) -> Result<(), DepositError> {
        if amount == 0 {
            return Err(DepositError::ZeroAmount);
        }
        let available = self.excess_balance(queue_capacity);
        if amount > available {
            return Err(DepositError::ExcessUnavailable {
                requested: amount,
                available,
            });
        }
        self.take_user(amount)?;
        Ok(())
    }
}
