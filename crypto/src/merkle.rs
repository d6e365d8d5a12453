//! Sorted-pair Blake2b merkle trees for reward claims.
//!
//! The reward tree itself is built and published off-ledger; the core only
//! holds its root. Interior nodes hash the two children in ascending byte
//! order, so a proof is a plain list of siblings with no direction bits.

use serde::{Deserialize, Serialize};
use tide_types::{Address, Amount, Digest32};

use crate::error::CryptoError;
use crate::hash::blake2b_256_multi;

/// Deepest proof accepted (trees of up to 2^64 leaves).
pub const MAX_PROOF_DEPTH: usize = 64;

/// One operator's entitlement within a reward snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLeaf {
    pub claimer: Address,
    pub network: u32,
    pub collateral: Amount,
    pub eth: Amount,
}

/// Leaf hash of a reward entitlement.
pub fn reward_leaf(leaf: &RewardLeaf) -> [u8; 32] {
    blake2b_256_multi(&[
        b"tide/reward-leaf/v1",
        leaf.claimer.as_bytes(),
        &leaf.network.to_be_bytes(),
        &leaf.collateral.to_be_bytes(),
        &leaf.eth.to_be_bytes(),
    ])
}

fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    if a <= b {
        blake2b_256_multi(&[a, b])
    } else {
        blake2b_256_multi(&[b, a])
    }
}

/// Root over `leaves`. An odd node at any level is carried up unchanged.
/// The root of an empty tree is all zeroes.
pub fn merkle_root(leaves: &[[u8; 32]]) -> Digest32 {
    if leaves.is_empty() {
        return Digest32::ZERO;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair.get(1) {
                Some(b) => hash_pair(&pair[0], b),
                None => pair[0],
            })
            .collect();
    }
    Digest32::new(level[0])
}

/// Sibling path for the leaf at `index`, matching [`merkle_root`].
pub fn merkle_proof(leaves: &[[u8; 32]], mut index: usize) -> Vec<[u8; 32]> {
    let mut proof = Vec::new();
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let sibling = index ^ 1;
        if sibling < level.len() {
            proof.push(level[sibling]);
        }
        level = level
            .chunks(2)
            .map(|pair| match pair.get(1) {
                Some(b) => hash_pair(&pair[0], b),
                None => pair[0],
            })
            .collect();
        index /= 2;
    }
    proof
}

/// Whether `proof` connects `leaf` to `root`.
pub fn verify_proof(root: &Digest32, leaf: [u8; 32], proof: &[[u8; 32]]) -> Result<bool, CryptoError> {
    if proof.len() > MAX_PROOF_DEPTH {
        return Err(CryptoError::ProofTooLong(proof.len()));
    }
    let computed = proof.iter().fold(leaf, |acc, sibling| hash_pair(&acc, sibling));
    Ok(&computed == root.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: u64) -> Vec<[u8; 32]> {
        (0..n)
            .map(|i| {
                reward_leaf(&RewardLeaf {
                    claimer: Address::from_low_u64(i),
                    network: 0,
                    collateral: u128::from(i) * 10,
                    eth: u128::from(i),
                })
            })
            .collect()
    }

    #[test]
    fn every_leaf_proves_against_root() {
        for n in [1u64, 2, 3, 5, 8] {
            let ls = leaves(n);
            let root = merkle_root(&ls);
            for (i, leaf) in ls.iter().enumerate() {
                let proof = merkle_proof(&ls, i);
                assert!(verify_proof(&root, *leaf, &proof).unwrap(), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn foreign_leaf_fails() {
        let ls = leaves(4);
        let root = merkle_root(&ls);
        let proof = merkle_proof(&ls, 0);
        assert!(!verify_proof(&root, [7u8; 32], &proof).unwrap());
    }

    #[test]
    fn overlong_proof_rejected() {
        let proof = vec![[0u8; 32]; MAX_PROOF_DEPTH + 1];
        assert!(verify_proof(&Digest32::ZERO, [0u8; 32], &proof).is_err());
    }
}
