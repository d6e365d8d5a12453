//! Per-operator collateral record and its derived bounds.

use serde::{Deserialize, Serialize};
use tide_types::{mul_div, Amount, Ratio, Timestamp, ETHER};

use crate::error::CollateralError;

/// Collateral posted by one operator against the pooled capital it has matched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralRecord {
    /// Collateral currently staked.
    pub total_stake: Amount,
    /// Pooled capital matched against this operator's units (`Σ launch − bond`).
    pub eth_matched: Amount,
    /// Time of the most recent stake, for the withdrawal delay.
    pub last_stake_time: Option<Timestamp>,
}

impl CollateralRecord {
    /// `min(total_stake, eth_matched × max_ratio / price)`.
    pub fn effective_stake(&self, max_ratio: Ratio, price: Amount) -> Result<Amount, CollateralError> {
        Ok(self.total_stake.min(self.maximum_stake(max_ratio, price)?))
    }

    /// Collateral above which nothing more counts: `eth_matched × max_ratio / price`.
    pub fn maximum_stake(&self, max_ratio: Ratio, price: Amount) -> Result<Amount, CollateralError> {
        if price == 0 {
            return Err(CollateralError::ZeroPrice);
        }
        mul_div(self.eth_matched, max_ratio.as_u128(), price).ok_or(CollateralError::Overflow)
    }

    /// Sum of the per-unit minimums: `eth_matched × min_ratio / price`.
    pub fn minimum_stake(&self, min_ratio: Ratio, price: Amount) -> Result<Amount, CollateralError> {
        if price == 0 {
            return Err(CollateralError::ZeroPrice);
        }
        mul_div(self.eth_matched, min_ratio.as_u128(), price).ok_or(CollateralError::Overflow)
    }

    /// Most pooled capital this stake can back: `total_stake × price / min_ratio`.
    ///
    /// A zero minimum ratio means collateral imposes no limit.
    pub fn eth_matched_limit(&self, min_ratio: Ratio, price: Amount) -> Result<Amount, CollateralError> {
        if price == 0 {
            return Err(CollateralError::ZeroPrice);
        }
        if min_ratio.is_zero() {
            return Ok(Amount::MAX);
        }
        mul_div(self.total_stake, price, min_ratio.as_u128()).ok_or(CollateralError::Overflow)
    }

    /// Collateral-to-matched ratio, `ETHER`-scaled. `None` when nothing is matched.
    pub fn collateralisation(&self, price: Amount) -> Option<Ratio> {
        if self.eth_matched == 0 {
            return None;
        }
        let value = mul_div(self.total_stake, price, ETHER)?;
        let raw = mul_div(value, ETHER, self.eth_matched)?;
        u64::try_from(raw).ok().map(Ratio::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_types::ether;

    fn record(stake: u128, matched: u128) -> CollateralRecord {
        CollateralRecord {
            total_stake: ether(stake),
            eth_matched: ether(matched),
            last_stake_time: None,
        }
    }

    #[test]
    fn effective_stake_is_capped_by_max_ratio() {
        let r = record(100, 32);
        let eff = r.effective_stake(Ratio::from_percent(150), ETHER).unwrap();
        assert_eq!(eff, ether(48));
    }

    #[test]
    fn effective_stake_is_total_when_under_cap() {
        let r = record(10, 32);
        assert_eq!(r.effective_stake(Ratio::from_percent(150), ETHER).unwrap(), ether(10));
    }

    #[test]
    fn price_scales_bounds() {
        // Collateral worth half a unit each: twice as much is needed.
        let r = record(100, 32);
        let min = r.minimum_stake(Ratio::from_percent(10), ETHER / 2).unwrap();
        assert_eq!(min, ether(32) * 2 / 10);
        let limit = r.eth_matched_limit(Ratio::from_percent(10), ETHER / 2).unwrap();
        assert_eq!(limit, ether(500));
    }

    #[test]
    fn zero_price_is_rejected() {
        assert!(matches!(
            record(1, 1).minimum_stake(Ratio::from_percent(10), 0),
            Err(CollateralError::ZeroPrice)
        ));
    }

    #[test]
    fn collateralisation_ratio() {
        let r = record(16, 32);
        assert_eq!(r.collateralisation(ETHER), Some(Ratio::from_percent(50)));
        assert_eq!(record(1, 0).collateralisation(ETHER), None);
    }
}
