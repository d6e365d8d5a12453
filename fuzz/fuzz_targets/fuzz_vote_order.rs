#![no_main]

use std::collections::{BTreeMap, BTreeSet};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tide_oracle::{ThresholdVote, VoteOutcome};
use tide_types::{Address, Digest32, QuorumRule};

#[derive(Arbitrary, Debug)]
enum Action {
    Vote { period: u8, voter: u8, digest: u8 },
    Execute { period: u8, digest: u8 },
}

#[derive(Arbitrary, Debug)]
struct Input {
    members: u8,
    min_count: Option<u8>,
    actions: Vec<Action>,
}

// Replays an arbitrary interleaving of votes and executions and checks the
// vote never counts a voter twice, never executes a period twice, and keeps
// the first digest to reach quorum as the period's winner.
fuzz_target!(|input: Input| {
    let members = u32::from(input.members % 16) + 1;
    let rule = match input.min_count {
        Some(n) => QuorumRule::MinimumCount(u32::from(n % 16) + 1),
        None => QuorumRule::StrictMajority,
    };
    let mut vote: ThresholdVote<u8> = ThresholdVote::new(rule);
    let mut seen: BTreeSet<(u8, u8)> = BTreeSet::new();
    let mut executed: BTreeMap<u8, Digest32> = BTreeMap::new();
    let mut first_reached: BTreeMap<u8, Digest32> = BTreeMap::new();

    for action in input.actions {
        match action {
            Action::Vote { period, voter, digest } => {
                let before = vote.clone();
                let d = Digest32::new([digest; 32]);
                match vote.submit(period, Address::from_low_u64(u64::from(voter)), d, members) {
                    Ok(outcome) => {
                        assert!(!executed.contains_key(&period));
                        assert!(seen.insert((period, voter)), "voter counted twice");
                        let count = match outcome {
                            VoteOutcome::Recorded { count } | VoteOutcome::Reached { count } => count,
                        };
                        assert_eq!(count, vote.count(&period, &d));
                        assert_eq!(outcome.is_reached(), rule.is_met(count, members));
                        if outcome.is_reached() {
                            let winner = *first_reached.entry(period).or_insert(d);
                            assert_eq!(vote.winner(&period, members), Some(winner));
                        }
                    }
                    Err(_) => assert_eq!(vote, before, "rejected vote mutated state"),
                }
            }
            Action::Execute { period, digest } => {
                let d = Digest32::new([digest; 32]);
                match vote.mark_executed(period, d) {
                    Ok(()) => assert!(executed.insert(period, d).is_none(), "executed twice"),
                    Err(_) => assert!(executed.contains_key(&period)),
                }
            }
        }
    }

    for (period, digest) in &executed {
        assert_eq!(vote.tally(period).and_then(|t| t.executed), Some(*digest));
    }
});
