//! Transfers and events produced by committed operations.
//!
//! Operations stage outbound transfers and events while they run. Nothing
//! staged by a rejected operation is ever seen: the engine moves the staged
//! items into the [`Outbox`] only after the operation commits.

use serde::{Deserialize, Serialize};
use tide_types::{Address, Amount, BlockNumber, Digest32, Ratio, UnitStatus};

/// Which asset a transfer moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    /// The pooled currency.
    Eth,
    /// The collateral asset.
    Collateral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferReason {
    ExcessWithdrawal,
    ValidatorDeposit,
    Refund,
    UnitClosed,
    OperatorShare,
    CollateralWithdrawal,
    ScrubPenalty,
    Treasury,
    FeeRecipient,
    RewardClaim,
    FeeDistribution,
}

/// Value leaving the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: Address,
    pub asset: Asset,
    pub amount: Amount,
    pub reason: TransferReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    OperatorRegistered { operator: Address },
    Deposited { from: Address, amount: Amount, tokens: Amount },
    UnitCreated { unit: Address, operator: Address, bond: Amount, node_fee: Ratio },
    UnitFunded { unit: Address, user_capital: Amount },
    UnitStatusChanged { unit: Address, status: UnitStatus },
    BondReduced { unit: Address, new_bond: Amount },
    BalanceDistributed { unit: Address, operator: Amount, user: Amount, penalty: Amount },
    BalancesUpdated { block: BlockNumber, total_value: Amount },
    PriceUpdated { block: BlockNumber, price: Amount },
    PenaltyApplied { unit: Address, rate: Ratio },
    RewardsExecuted { index: u64, root: Digest32 },
    RewardsClaimed { claimer: Address, index: u64 },
    FeesDistributed { operator: Address, node: Amount, user: Amount },
    SmoothingPoolRegistrationChanged { operator: Address, registered: bool },
}

/// Items staged by the operation in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Staged {
    pub transfers: Vec<Transfer>,
    pub events: Vec<Event>,
}

impl Staged {
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty() && self.events.is_empty()
    }
}

/// Committed transfers and events, in commit order, until drained.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    transfers: Vec<Transfer>,
    events: Vec<Event>,
}

impl Outbox {
    pub(crate) fn commit(&mut self, staged: Staged) {
        self.transfers.extend(staged.transfers);
        self.events.extend(staged.events);
    }

    pub fn pending_transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn drain_transfers(&mut self) -> Vec<Transfer> {
        std::mem::take(&mut self.transfers)
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
