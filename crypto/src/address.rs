//! Deterministic staking-unit addresses and withdrawal credentials.

use tide_types::Address;

use crate::hash::blake2b_256_multi;

const UNIT_ADDRESS_DOMAIN: &[u8] = b"tide/unit-address/v1";

/// Derive the address a staking unit will occupy.
///
/// The address depends only on the operator and the operator-chosen salt, so a
/// client can predict it before submitting the creation request. The low 20
/// bytes of the digest become the address.
pub fn derive_unit_address(operator: &Address, salt: u64) -> Address {
    let digest = blake2b_256_multi(&[
        UNIT_ADDRESS_DOMAIN,
        operator.as_bytes(),
        &salt.to_be_bytes(),
    ]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::new(bytes)
}

/// Validator withdrawal credentials pointing at `unit`: `0x01`, eleven zero
/// bytes, then the 20-byte address.
pub fn withdrawal_credentials(unit: &Address) -> [u8; 32] {
    let mut creds = [0u8; 32];
    creds[0] = 0x01;
    creds[12..].copy_from_slice(unit.as_bytes());
    creds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_address_is_deterministic() {
        let op = Address::from_low_u64(7);
        assert_eq!(derive_unit_address(&op, 1), derive_unit_address(&op, 1));
    }

    #[test]
    fn unit_address_depends_on_salt_and_operator() {
        let op = Address::from_low_u64(7);
        assert_ne!(derive_unit_address(&op, 1), derive_unit_address(&op, 2));
        assert_ne!(
            derive_unit_address(&op, 1),
            derive_unit_address(&Address::from_low_u64(8), 1)
        );
    }

    #[test]
    fn credentials_layout() {
        let unit = Address::from_low_u64(0xff);
        let creds = withdrawal_credentials(&unit);
        assert_eq!(creds[0], 0x01);
        assert!(creds[1..12].iter().all(|b| *b == 0));
        assert_eq!(&creds[12..], unit.as_bytes());
    }
}
