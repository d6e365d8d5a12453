//! Deposit-data roots.
//!
//! A creation request carries the root the operator computed for its validator
//! deposit. The core recomputes it from the key, the credentials of the unit
//! address, the amount, and the signature; a mismatch rejects the request.

use tide_types::{ValidatorPubkey, ValidatorSignature};

use crate::hash::blake2b_256_multi;

/// Root binding a validator deposit to its unit.
///
/// `amount_gwei` is the deposit amount in 10^-9 units, as the beacon deposit
/// contract records it.
pub fn deposit_data_root(
    pubkey: &ValidatorPubkey,
    withdrawal_credentials: &[u8; 32],
    amount_gwei: u64,
    signature: &ValidatorSignature,
) -> [u8; 32] {
    let key_node = blake2b_256_multi(&[pubkey.as_bytes(), &[0u8; 16]]);
    let sig_node = blake2b_256_multi(&[signature.as_bytes()]);
    let left = blake2b_256_multi(&[&key_node, withdrawal_credentials]);
    let mut amount = [0u8; 32];
    amount[..8].copy_from_slice(&amount_gwei.to_le_bytes());
    let right = blake2b_256_multi(&[&amount, &sig_node]);
    blake2b_256_multi(&[&left, &right])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ValidatorPubkey {
        ValidatorPubkey::new(vec![3; 48]).unwrap()
    }

    fn sig() -> ValidatorSignature {
        ValidatorSignature::new(vec![9; 96]).unwrap()
    }

    #[test]
    fn root_binds_every_field() {
        let creds = [1u8; 32];
        let base = deposit_data_root(&key(), &creds, 1_000_000_000, &sig());
        assert_ne!(base, deposit_data_root(&key(), &[2u8; 32], 1_000_000_000, &sig()));
        assert_ne!(base, deposit_data_root(&key(), &creds, 2_000_000_000, &sig()));
        let other_sig = ValidatorSignature::new(vec![8; 96]).unwrap();
        assert_ne!(base, deposit_data_root(&key(), &creds, 1_000_000_000, &other_sig));
    }
}
