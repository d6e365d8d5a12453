//! Receipt quotes for user deposits.
//!
//! Receipt-token balances are kept outside the core; the core only reports
//! how many tokens a deposit is worth at the last consensus exchange rate.

use serde::{Deserialize, Serialize};
use tide_types::{mul_div, Amount, Ratio};

use crate::error::DepositError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub amount: Amount,
    pub fee: Amount,
    /// Receipt tokens owed for `amount − fee`.
    pub tokens: Amount,
}

/// Quote `amount` against network totals. Minting is 1:1 until both totals
/// are non-zero.
pub fn quote_receipt(
    amount: Amount,
    fee_ratio: Ratio,
    total_value: Amount,
    receipt_supply: Amount,
) -> Result<DepositReceipt, DepositError> {
    let fee = fee_ratio.apply(amount).ok_or(DepositError::Overflow)?;
    let net = amount.checked_sub(fee).ok_or(DepositError::Overflow)?;
    let tokens = if total_value == 0 || receipt_supply == 0 {
        net
    } else {
        mul_div(net, receipt_supply, total_value).ok_or(DepositError::Overflow)?
    };
    Ok(DepositReceipt { amount, fee, tokens })
}
