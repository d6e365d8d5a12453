use proptest::prelude::*;

use tide_oracle::{OracleError, ThresholdVote};
use tide_types::{Address, Digest32, QuorumRule};

proptest! {
    /// Whatever the arrival order, each voter counts at most once, and once a
    /// period is executed every later vote fails with `AlreadyExecuted`.
    #[test]
    fn votes_count_once_and_execute_once(
        votes in prop::collection::vec((1u64..8, 0u8..3), 1..40),
        members in 1u32..8,
    ) {
        let mut vote: ThresholdVote<u64> = ThresholdVote::new(QuorumRule::StrictMajority);
        let mut executed = None;
        for (voter, payload) in votes {
            let voter = Address::from_low_u64(voter);
            let digest = Digest32::new([payload; 32]);
            let had_voted = vote.has_voted(&0, &voter);
            match vote.submit(0, voter, digest, members) {
                Ok(outcome) => {
                    prop_assert!(executed.is_none());
                    prop_assert!(!had_voted);
                    if outcome.is_reached() {
                        vote.mark_executed(0, digest).unwrap();
                        executed = Some(digest);
                    }
                }
                Err(OracleError::AlreadyExecuted { .. }) => prop_assert!(executed.is_some()),
                Err(OracleError::DuplicateSubmission { .. }) => prop_assert!(had_voted),
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }
        let tally = vote.tally(&0).unwrap();
        let counted: u32 = tally.counts.values().sum();
        prop_assert_eq!(counted as usize, tally.voters.len());
    }
}
