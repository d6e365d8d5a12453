//! Staking-unit state enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a staking unit.
///
/// ```text
/// Initialized ──fund──> Prelaunch ──stake/promote──> Staking ──exit──> Withdrawable
///      │                    │
///      └──────dissolve──────┴──> Dissolved
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    Initialized,
    Prelaunch,
    Staking,
    Withdrawable,
    Dissolved,
}

impl UnitStatus {
    /// Whether the unit still backs collateral-matched capital.
    pub fn is_active(&self) -> bool {
        !matches!(self, UnitStatus::Dissolved)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitStatus::Initialized => "initialized",
            UnitStatus::Prelaunch => "prelaunch",
            UnitStatus::Staking => "staking",
            UnitStatus::Withdrawable => "withdrawable",
            UnitStatus::Dissolved => "dissolved",
        };
        f.write_str(s)
    }
}

/// How an exit balance is split between operator and pooled users.
///
/// `Full`, `Half` and `Empty` are the legacy fixed-fraction splits; `Variable`
/// splits rewards in proportion to the capital each side provided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositType {
    Full,
    Half,
    Empty,
    Variable,
}
