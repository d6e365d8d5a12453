use proptest::prelude::*;

use tide_oracle::RewardSubmission;
use tide_rewards::RewardAccountant;
use tide_types::{Digest32, Timestamp};

fn submission(index: u64, treasury: u128, operators: u128, user_eth: u128) -> RewardSubmission {
    RewardSubmission {
        index,
        execution_block: 1,
        consensus_block: 1,
        digest: Digest32::new([3; 32]),
        pointer: String::new(),
        intervals_passed: 1,
        treasury_share: treasury,
        trusted_operator_shares: vec![0],
        operator_shares: vec![operators],
        user_shares: vec![0],
        user_eth_share: user_eth,
        fee_recipient_share: 0,
    }
}

proptest! {
    /// Funding in equals payouts plus what remains pooled or claimable, and
    /// each index executes at most once.
    #[test]
    fn funding_is_conserved(
        rounds in prop::collection::vec((0u128..1_000, 0u128..1_000, 0u128..1_000, 0u128..1_000), 1..10),
    ) {
        let mut acc = RewardAccountant::new(Timestamp::EPOCH, 100);
        let mut funded = (0u128, 0u128);
        let mut paid = (0u128, 0u128);
        for (i, (fund, treasury, operators, user_eth)) in rounds.into_iter().enumerate() {
            acc.fund_reward_pool(fund).unwrap();
            acc.credit_smoothing_pool(fund).unwrap();
            funded.0 += fund;
            funded.1 += fund;
            let index = acc.reward_index();
            let now = Timestamp::new(100 * (i as u64 + 1));
            let sub = submission(index, treasury, operators, user_eth);
            if let Ok(p) = acc.execute(&sub, now) {
                paid.0 += p.treasury;
                paid.1 += p.user_eth + p.fee_recipient;
                prop_assert!(acc.execute(&sub, now).is_err());
            }
        }
        let (c, e) = acc.unclaimed();
        prop_assert_eq!(funded.0, paid.0 + c + acc.reward_pool());
        prop_assert_eq!(funded.1, paid.1 + e + acc.smoothing_pool());
    }
}
