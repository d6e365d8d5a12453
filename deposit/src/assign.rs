//! Matching Engine: drain the pool into queued units.
//!
//! Two modes share one loop:
//!
//! - **FIFO**: pop the head while the pool covers it and the per-call budget
//!   lasts. The first unaffordable head stops the pass; nothing behind it is
//!   considered.
//! - **Socialised** (every queued unit needs the same capacity): the number
//!   of units is fixed up front from the whole pool balance, then funded in
//!   FIFO order.
//!
//! Each unit is funded completely or not at all.

use serde::{Deserialize, Serialize};
use tide_types::{Amount, ProtocolParams, UnitId};

use crate::error::DepositError;
use crate::pool::DepositPool;
use crate::queue::UnitQueue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentMode {
    Fifo,
    Socialised,
}

/// Per-call bounds on assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignmentLimits {
    pub max_assignments: u32,
    pub max_socialised: u32,
    /// Extra socialised assignments earned by the deposit that triggered this call.
    pub scaling: u32,
    pub launch_balance: Amount,
}

impl AssignmentLimits {
    /// Limits for a call triggered by a deposit of `deposit_value`
    /// (zero for an explicit `assign_deposits`).
    pub fn from_params(params: &ProtocolParams, deposit_value: Amount) -> Self {
        let per_unit = params.variable_deposit_amount();
        let scaling = if per_unit == 0 {
            0
        } else {
            u32::try_from(deposit_value / per_unit).unwrap_or(u32::MAX)
        };
        Self {
            max_assignments: params.maximum_deposit_assignments,
            max_socialised: params.maximum_socialised_assignments,
            scaling,
            launch_balance: params.launch_balance,
        }
    }
}

/// One funded unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub unit: UnitId,
    pub user_capital: Amount,
    pub node_credit: Amount,
}

impl Assignment {
    pub fn total(&self) -> Option<Amount> {
        self.user_capital.checked_add(self.node_credit)
    }
}

/// Result of one assignment pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentPlan {
    pub mode: AssignmentMode,
    pub assignments: Vec<Assignment>,
}

/// Fund as many queued units as the pool and limits allow.
///
/// Mutates the pool and queue; the caller transitions each assigned unit.
pub fn assign(
    pool: &mut DepositPool,
    queue: &mut UnitQueue,
    limits: &AssignmentLimits,
) -> Result<AssignmentPlan, DepositError> {
    let before = pool.total()?;
    let (mode, budget) = if queue.len() > 1 && queue.is_homogeneous() {
        let by_balance = if limits.launch_balance == 0 {
            0
        } else {
            before / limits.launch_balance
        };
        let count = u128::from(limits.max_socialised.saturating_add(limits.scaling))
            .min(by_balance)
            .min(u128::from(limits.max_assignments))
            .min(queue.len() as u128);
        (AssignmentMode::Socialised, count as usize)
    } else {
        (AssignmentMode::Fifo, limits.max_assignments as usize)
    };

    let mut assignments = Vec::new();
    while assignments.len() < budget {
        let Some(head) = queue.front().copied() else {
            break;
        };
        if pool.user_balance() < head.capacity || pool.node_credit_balance() < head.top_up {
            break;
        }
        queue.pop_front();
        let user_capital = pool.take_user(head.capacity)?;
        let node_credit = pool.take_node_credit(head.top_up)?;
        assignments.push(Assignment {
            unit: head.unit,
            user_capital,
            node_credit,
        });
    }

    let moved = before - pool.total()?;
    let funded = assignments
        .iter()
        .try_fold(0u128, |acc, a| a.total().and_then(|t| acc.checked_add(t)))
        .ok_or(DepositError::Overflow)?;
    if moved != funded {
        return Err(DepositError::AssignmentMismatch { moved, funded });
    }
    if !assignments.is_empty() {
        tracing::debug!(?mode, count = assignments.len(), moved, "deposits assigned");
    }
    Ok(AssignmentPlan { mode, assignments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueEntry;
    use tide_types::ether;

    fn limits(max: u32) -> AssignmentLimits {
        AssignmentLimits {
            max_assignments: max,
            max_socialised: 2,
            scaling: 0,
            launch_balance: ether(32),
        }
    }

    fn queue_of(caps: &[(u128, u128)]) -> UnitQueue {
        let mut q = UnitQueue::new();
        for (i, (capacity, top_up)) in caps.iter().enumerate() {
            q.enqueue(QueueEntry {
                unit: UnitId::new(i as u32),
                capacity: ether(*capacity),
                top_up: ether(*top_up),
            })
            .unwrap();
        }
        q
    }

    #[test]
    fn fifo_funds_heads_until_unaffordable() {
        let mut pool = DepositPool::new();
        pool.deposit(ether(48)).unwrap();
        let mut q = queue_of(&[(16, 0), (16, 0), (32, 0)]);
        let plan = assign(&mut pool, &mut q, &limits(90)).unwrap();
        assert_eq!(plan.mode, AssignmentMode::Fifo);
        let funded: Vec<_> = plan.assignments.iter().map(|a| a.unit).collect();
        assert_eq!(funded, vec![UnitId::new(0), UnitId::new(1)]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.front().unwrap().capacity, ether(32));
        assert_eq!(pool.user_balance(), ether(16));
    }

    #[test]
    fn fifo_never_skips_the_head() {
        let mut pool = DepositPool::new();
        pool.deposit(ether(20)).unwrap();
        let mut q = queue_of(&[(24, 0), (16, 0)]);
        let plan = assign(&mut pool, &mut q, &limits(90)).unwrap();
        assert!(plan.assignments.is_empty());
        assert_eq!(q.len(), 2);
        assert_eq!(pool.user_balance(), ether(20));
    }

    #[test]
    fn budget_caps_assignments() {
        let mut pool = DepositPool::new();
        pool.deposit(ether(100)).unwrap();
        let mut q = queue_of(&[(16, 0), (24, 0), (16, 0)]);
        let plan = assign(&mut pool, &mut q, &limits(1)).unwrap();
        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn top_up_comes_from_node_credit() {
        let mut pool = DepositPool::new();
        pool.deposit(ether(24)).unwrap();
        pool.node_deposit(ether(7)).unwrap();
        let mut q = queue_of(&[(24, 7)]);
        let plan = assign(&mut pool, &mut q, &limits(90)).unwrap();
        assert_eq!(plan.assignments[0].total(), Some(ether(31)));
        assert_eq!(pool.total().unwrap(), 0);
    }

    #[test]
    fn socialised_count_is_bounded_by_base_plus_scaling() {
        let mut pool = DepositPool::new();
        pool.deposit(ether(24 * 5 + 64)).unwrap();
        pool.node_deposit(ether(7 * 5)).unwrap();
        let mut q = queue_of(&[(24, 7); 5]);
        let plan = assign(&mut pool, &mut q, &limits(90)).unwrap();
        assert_eq!(plan.mode, AssignmentMode::Socialised);
        assert_eq!(plan.assignments.len(), 2);

        let mut l = limits(90);
        l.scaling = 1;
        let plan = assign(&mut pool, &mut q, &l).unwrap();
        assert_eq!(plan.assignments.len(), 3);
        assert!(q.is_empty());
    }

    #[test]
    fn socialised_count_is_bounded_by_pool_over_launch() {
        let mut pool = DepositPool::new();
        // 24 user + 7 credit = 31 < 32: zero whole launches.
        pool.deposit(ether(24)).unwrap();
        pool.node_deposit(ether(7)).unwrap();
        let mut q = queue_of(&[(24, 7), (24, 7)]);
        let plan = assign(&mut pool, &mut q, &limits(90)).unwrap();
        assert!(plan.assignments.is_empty());
    }

    #[test]
    fn limits_scaling_from_deposit() {
        let params = ProtocolParams::default();
        assert_eq!(AssignmentLimits::from_params(&params, ether(62)).scaling, 2);
        assert_eq!(AssignmentLimits::from_params(&params, ether(30)).scaling, 0);
    }
}
