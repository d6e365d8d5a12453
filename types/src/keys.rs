//! Validator key material carried through unit creation.
//!
//! The core never verifies BLS signatures itself; it only binds the key and
//! signature into the deposit-data root and checks the root matches.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 48-byte validator public key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ValidatorPubkey(Vec<u8>);

impl ValidatorPubkey {
    pub const LEN: usize = 48;

    pub fn new(bytes: Vec<u8>) -> Result<Self, TypesError> {
        if bytes.len() != Self::LEN {
            return Err(TypesError::InvalidKeyLength {
                expected: Self::LEN,
                got: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for ValidatorPubkey {
    type Error = TypesError;
    fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<ValidatorPubkey> for Vec<u8> {
    fn from(k: ValidatorPubkey) -> Self {
        k.0
    }
}

impl fmt::Debug for ValidatorPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorPubkey({}..)", hex::encode(&self.0[..6]))
    }
}

/// A 96-byte validator deposit signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ValidatorSignature(Vec<u8>);

impl ValidatorSignature {
    pub const LEN: usize = 96;

    pub fn new(bytes: Vec<u8>) -> Result<Self, TypesError> {
        if bytes.len() != Self::LEN {
            return Err(TypesError::InvalidKeyLength {
                expected: Self::LEN,
                got: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for ValidatorSignature {
    type Error = TypesError;
    fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<ValidatorSignature> for Vec<u8> {
    fn from(s: ValidatorSignature) -> Self {
        s.0
    }
}

impl fmt::Debug for ValidatorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorSignature({}..)", hex::encode(&self.0[..6]))
    }
}
