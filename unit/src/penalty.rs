//! Cumulative penalty rates.
//!
//! Every executed penalty submission counts one offense against a unit. The
//! first few offenses are free; each one after that raises the unit's rate by
//! a fixed increment, up to the configured maximum. The rate is applied to the
//! operator's share when the unit's exit balance is distributed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tide_types::{ProtocolParams, Ratio, UnitId};

use crate::error::UnitError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub offense_count: u32,
    pub rate: Ratio,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyTracker {
    records: BTreeMap<UnitId, PenaltyRecord>,
}

impl PenaltyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, unit: UnitId) -> PenaltyRecord {
        self.records.get(&unit).copied().unwrap_or_default()
    }

    pub fn rate(&self, unit: UnitId) -> Ratio {
        self.record(unit).rate
    }

    /// Count one offense and return the unit's new rate.
    pub fn apply_offense(&mut self, unit: UnitId, params: &ProtocolParams) -> Result<Ratio, UnitError> {
        let record = self.records.entry(unit).or_default();
        record.offense_count = record
            .offense_count
            .checked_add(1)
            .ok_or(UnitError::Overflow)?;
        if record.offense_count > params.penalty_free_offenses {
            record.rate = record
                .rate
                .checked_add(params.penalty_rate_increment)
                .ok_or(UnitError::Overflow)?
                .min(params.maximum_penalty_rate);
        }
        tracing::info!(%unit, offenses = record.offense_count, rate = %record.rate, "penalty applied");
        Ok(record.rate)
    }
}
