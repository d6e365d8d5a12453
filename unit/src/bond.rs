//! Pending bond-reduction requests.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tide_types::{Address, Amount, ProtocolParams, Timestamp};

use crate::error::UnitError;

/// An operator's request to lower its bond, awaiting its window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondReduction {
    pub new_bond: Amount,
    pub requested_at: Timestamp,
    pub cancel_voters: BTreeSet<Address>,
}

impl BondReduction {
    pub fn new(new_bond: Amount, requested_at: Timestamp) -> Self {
        Self {
            new_bond,
            requested_at,
            cancel_voters: BTreeSet::new(),
        }
    }

    /// Reduction is allowed in `[start, start + length)` after the request.
    pub fn check_window(&self, now: Timestamp, params: &ProtocolParams) -> Result<(), UnitError> {
        let opens = self
            .requested_at
            .saturating_add(params.bond_reduction_window_start_secs);
        if now < opens {
            return Err(UnitError::ReductionWindowNotOpen { opens });
        }
        let closed = opens.saturating_add(params.bond_reduction_window_length_secs);
        if now >= closed {
            return Err(UnitError::ReductionWindowClosed { closed });
        }
        Ok(())
    }
}
