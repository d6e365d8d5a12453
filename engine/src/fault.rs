//! Fault injection for multi-step transitions.
//!
//! Tests arm a point; the engine fails with [`EngineError::InjectedFault`]
//! when execution reaches it. Armed points live outside the ledger state and
//! survive rollback.

use std::collections::BTreeSet;

use crate::error::EngineError;

/// Places a multi-step transition can be interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FaultPoint {
    /// Bond reduction, after the unit balances moved.
    ReduceBondAfterUnit,
    /// Bond reduction, after the operator's deposit credit grew.
    ReduceBondAfterCredit,
    /// Bond reduction, after the pool earmarked node credit.
    ReduceBondAfterPool,
    /// Exit distribution, after the split was paid out.
    DistributeAfterPayout,
    /// Reward execution, after the accountant applied the snapshot.
    RewardsAfterExecute,
}

#[derive(Clone, Debug, Default)]
pub struct FaultPlan {
    armed: BTreeSet<FaultPoint>,
}

impl FaultPlan {
    pub fn arm(&mut self, point: FaultPoint) {
        self.armed.insert(point);
    }

    pub fn disarm(&mut self, point: FaultPoint) {
        self.armed.remove(&point);
    }

    pub fn clear(&mut self) {
        self.armed.clear();
    }

    pub(crate) fn check(&self, point: FaultPoint) -> Result<(), EngineError> {
        if self.armed.contains(&point) {
            tracing::warn!(?point, "injected fault triggered");
            return Err(EngineError::InjectedFault(point));
        }
        Ok(())
    }
}
