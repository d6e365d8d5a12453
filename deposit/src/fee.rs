//! Demand-driven node fee.
//!
//! Demand is pooled user capital minus what the queue already needs. Positive
//! demand (idle capital) pushes the fee toward the maximum, negative demand
//! (a long queue) toward the minimum. The curve is cubic around the target
//! and flat beyond `±node_demand_range`.

use tide_types::{mul_div, ProtocolParams, Ratio, ETHER};

use crate::error::DepositError;

/// Fee locked into a unit created when demand is `demand`.
pub fn node_fee(params: &ProtocolParams, demand: i128) -> Result<Ratio, DepositError> {
    let min = params.node_fee_minimum.as_u128();
    let target = params.node_fee_target.as_u128();
    let max = params.node_fee_maximum.as_u128();
    let range = params.node_demand_range;

    if demand == 0 || range == 0 {
        return Ok(params.node_fee_target);
    }
    let magnitude = demand.unsigned_abs();
    let fee = if demand < 0 {
        if magnitude >= range {
            min
        } else {
            let shift = mul_div(target.saturating_sub(min), cube(magnitude, range)?, ETHER)
                .ok_or(DepositError::Overflow)?;
            target - shift.min(target)
        }
    } else if magnitude >= range {
        max
    } else {
        let shift = mul_div(max.saturating_sub(target), cube(magnitude, range)?, ETHER)
            .ok_or(DepositError::Overflow)?;
        target.checked_add(shift).ok_or(DepositError::Overflow)?
    };
    u64::try_from(fee)
        .map(Ratio::from_raw)
        .map_err(|_| DepositError::Overflow)
}

/// `(x / range)^3`, `ETHER`-scaled, for `x < range`.
fn cube(x: u128, range: u128) -> Result<u128, DepositError> {
    let v = mul_div(x, ETHER, range).ok_or(DepositError::Overflow)?;
    let v2 = mul_div(v, v, ETHER).ok_or(DepositError::Overflow)?;
    mul_div(v2, v, ETHER).ok_or(DepositError::Overflow)
}
