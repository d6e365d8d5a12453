//! Operator claims against executed snapshots.

use tide_crypto::{reward_leaf, verify_proof, RewardLeaf};
use tide_types::{Address, Amount};

use crate::accountant::RewardAccountant;
use crate::error::RewardsError;

/// An operator's claim for one snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub index: u64,
    pub network: u32,
    pub collateral: Amount,
    pub eth: Amount,
    pub proof: Vec<[u8; 32]>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimPayout {
    pub collateral: Amount,
    pub eth: Amount,
}

impl RewardAccountant {
    pub fn is_claimed(&self, index: u64, claimer: &Address) -> bool {
        self.claimed.contains(&(index, *claimer))
    }

    /// Verify `claim` for `claimer` and mark it paid.
    pub fn claim(&mut self, claimer: Address, claim: &Claim) -> Result<ClaimPayout, RewardsError> {
        let snapshot = self
            .snapshots
            .get(&claim.index)
            .ok_or(RewardsError::UnknownSnapshot(claim.index))?;
        if claim.network >= snapshot.networks {
            return Err(RewardsError::NetworkOutOfRange {
                network: claim.network,
                networks: snapshot.networks,
            });
        }
        if self.is_claimed(claim.index, &claimer) {
            return Err(RewardsError::AlreadyClaimed {
                index: claim.index,
                claimer,
            });
        }
        let leaf = reward_leaf(&RewardLeaf {
            claimer,
            network: claim.network,
            collateral: claim.collateral,
            eth: claim.eth,
        });
        if !verify_proof(&snapshot.root, leaf, &claim.proof)? {
            return Err(RewardsError::InvalidProof);
        }
        if claim.collateral > snapshot.collateral_remaining || claim.eth > snapshot.eth_remaining {
            return Err(RewardsError::ClaimExceedsSnapshot { index: claim.index });
        }

        if let Some(s) = self.snapshots.get_mut(&claim.index) {
            s.collateral_remaining -= claim.collateral;
            s.eth_remaining -= claim.eth;
        }
        self.claimed.insert((claim.index, claimer));
        tracing::info!(
            %claimer,
            index = claim.index,
            collateral = claim.collateral,
            eth = claim.eth,
            "rewards claimed"
        );
        Ok(ClaimPayout {
            collateral: claim.collateral,
            eth: claim.eth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_crypto::{merkle_proof, merkle_root};
    use tide_oracle::RewardSubmission;
    use tide_types::{ether, Timestamp};

    fn leaf(n: u64, collateral: u128, eth: u128) -> RewardLeaf {
        RewardLeaf {
            claimer: Address::from_low_u64(n),
            network: 0,
            collateral,
            eth,
        }
    }

    fn setup() -> (RewardAccountant, Vec<[u8; 32]>) {
        let entitlements = [leaf(1, ether(60), ether(1)), leaf(2, ether(30), 0)];
        let leaves: Vec<_> = entitlements.iter().map(reward_leaf).collect();
        let sub = RewardSubmission {
            index: 0,
            execution_block: 1,
            consensus_block: 1,
            digest: merkle_root(&leaves),
            pointer: String::new(),
            intervals_passed: 1,
            treasury_share: 0,
            trusted_operator_shares: vec![0],
            operator_shares: vec![ether(90)],
            user_shares: vec![ether(1)],
            user_eth_share: 0,
            fee_recipient_share: 0,
        };
        let mut acc = RewardAccountant::new(Timestamp::EPOCH, 10);
        acc.fund_reward_pool(ether(90)).unwrap();
        acc.credit_smoothing_pool(ether(1)).unwrap();
        acc.execute(&sub, Timestamp::new(10)).unwrap();
        (acc, leaves)
    }

    #[test]
    fn valid_claim_pays_once() {
        let (mut acc, leaves) = setup();
        let claim = Claim {
            index: 0,
            network: 0,
            collateral: ether(60),
            eth: ether(1),
            proof: merkle_proof(&leaves, 0),
        };
        let paid = acc.claim(Address::from_low_u64(1), &claim).unwrap();
        assert_eq!(paid.collateral, ether(60));
        assert_eq!(acc.unclaimed(), (ether(30), 0));
        let err = acc.claim(Address::from_low_u64(1), &claim).unwrap_err();
        assert_eq!(err.kind(), tide_types::ErrorKind::AlreadyExecuted);
    }

    #[test]
    fn wrong_claimer_or_amount_fails_proof() {
        let (mut acc, leaves) = setup();
        let mut claim = Claim {
            index: 0,
            network: 0,
            collateral: ether(60),
            eth: ether(1),
            proof: merkle_proof(&leaves, 0),
        };
        assert!(matches!(
            acc.claim(Address::from_low_u64(2), &claim),
            Err(RewardsError::InvalidProof)
        ));
        claim.collateral = ether(61);
        assert!(matches!(
            acc.claim(Address::from_low_u64(1), &claim),
            Err(RewardsError::InvalidProof)
        ));
    }

    #[test]
    fn unknown_index_rejected() {
        let (mut acc, _) = setup();
        let claim = Claim {
            index: 5,
            network: 0,
            collateral: 0,
            eth: 0,
            proof: Vec::new(),
        };
        assert!(matches!(
            acc.claim(Address::from_low_u64(1), &claim),
            Err(RewardsError::UnknownSnapshot(5))
        ));
    }
}
