#![no_main]

use libfuzzer_sys::fuzz_target;
use tide_oracle::{BalancesSubmission, PenaltySubmission, PriceSubmission, RewardSubmission};

// Decoding untrusted submission bytes must never panic, and validation of
// whatever decodes must not either.
fuzz_target!(|data: &[u8]| {
    if let Ok(sub) = bincode::deserialize::<BalancesSubmission>(data) {
        let _ = sub.validate();
    }
    if let Ok(sub) = bincode::deserialize::<PriceSubmission>(data) {
        let _ = sub.validate();
    }
    let _ = bincode::deserialize::<PenaltySubmission>(data);
    if let Ok(sub) = bincode::deserialize::<RewardSubmission>(data) {
        if sub.validate().is_ok() {
            let _ = sub.collateral_total();
            let _ = sub.operator_eth_total();
        }
    }
});
