//! Amounts and fixed-point ratios.
//!
//! Every balance is an integer count of the smallest currency unit (18 decimals).
//! Ratios are 18-decimal fixed point. All divisions truncate toward zero; no
//! rounding compensation is applied anywhere in the core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A balance in the smallest currency unit.
pub type Amount = u128;

/// One whole unit of currency (10^18 raw).
pub const ETHER: Amount = 1_000_000_000_000_000_000;

/// Whole units to raw.
pub const fn ether(whole: u128) -> Amount {
    whole * ETHER
}

/// Compute `a * b / d` with a 256-bit intermediate, truncating.
///
/// Returns `None` when `d == 0` or the quotient does not fit in a `u128`.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some(product / d);
    }
    let (hi, lo) = widening_mul(a, b);
    div_wide(hi, lo, d)
}

/// 128x128 -> 256-bit multiply, returned as (hi, lo).
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = 0xFFFF_FFFF_FFFF_FFFF;
    let (a_lo, a_hi) = (a & MASK, a >> 64);
    let (b_lo, b_hi) = (b & MASK, b >> 64);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let (mid, mid_carry) = lh.overflowing_add(hl);
    let (lo, lo_carry) = ll.overflowing_add(mid << 64);
    let hi = hh
        .wrapping_add(mid >> 64)
        .wrapping_add(if mid_carry { 1u128 << 64 } else { 0 })
        .wrapping_add(u128::from(lo_carry));
    (hi, lo)
}

/// Binary long division of a 256-bit value by a 128-bit divisor.
fn div_wide(hi: u128, lo: u128, divisor: u128) -> Option<u128> {
    if hi >= divisor {
        return None;
    }
    let mut rem = hi;
    let mut quot: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quot <<= 1;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quot |= 1;
        }
    }
    Some(quot)
}

/// An 18-decimal fixed-point ratio (`Ratio::ONE` is 100%).
///
/// Backed by `u64` so that configuration files can carry it as a plain integer;
/// that bounds a ratio at roughly 18.4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio(u64);

impl Ratio {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1_000_000_000_000_000_000);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// `pct / 100`, e.g. `from_percent(51)`.
    pub const fn from_percent(pct: u64) -> Self {
        Self(pct * 10_000_000_000_000_000)
    }

    /// `bps / 10_000`.
    pub const fn from_bps(bps: u64) -> Self {
        Self(bps * 100_000_000_000_000)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn as_u128(&self) -> u128 {
        u128::from(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `amount * self`, truncated.
    pub fn apply(&self, amount: Amount) -> Option<Amount> {
        mul_div(amount, self.as_u128(), ETHER)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 1_000_000_000_000_000_000;
        let frac = self.0 % 1_000_000_000_000_000_000;
        write!(f, "{}.{:018}", whole, frac)
    }
}

/// Serde helpers carrying `u128` amounts as decimal strings.
///
/// TOML integers are signed 64-bit, so configuration amounts travel as strings
/// (`"32000000000000000000"`). Small integers are accepted on input as well.
pub mod serde_str {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        d.deserialize_any(AmountVisitor)
    }

    pub(crate) struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.replace('_', "").parse().map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(u128::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(E::custom)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }
    }

    /// Same encoding for a list of amounts.
    pub mod vec {
        use serde::de::{SeqAccess, Visitor};
        use serde::ser::SerializeSeq;
        use serde::{Deserializer, Serializer};
        use std::fmt;

        pub fn serialize<S: Serializer>(values: &[u128], s: S) -> Result<S::Ok, S::Error> {
            let mut seq = s.serialize_seq(Some(values.len()))?;
            for v in values {
                seq.serialize_element(&v.to_string())?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u128>, D::Error> {
            d.deserialize_seq(SeqVisitor)
        }

        struct SeqVisitor;

        struct Element(u128);

        impl<'de> serde::Deserialize<'de> for Element {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                d.deserialize_any(super::AmountVisitor).map(Element)
            }
        }

        impl<'de> Visitor<'de> for SeqVisitor {
            type Value = Vec<u128>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of amounts")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<u128>, A::Error> {
                let mut out = Vec::new();
                while let Some(Element(v)) = seq.next_element()? {
                    out.push(v);
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_small_values() {
        assert_eq!(mul_div(10, 3, 4), Some(7));
        assert_eq!(mul_div(0, 3, 4), Some(0));
        assert_eq!(mul_div(1, 1, 0), None);
    }

    #[test]
    fn mul_div_survives_wide_intermediate() {
        let big = u128::MAX / 2;
        assert_eq!(mul_div(big, ETHER, ETHER), Some(big));
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
    }

    #[test]
    fn mul_div_rejects_oversized_quotient() {
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
    }

    #[test]
    fn ratio_apply_truncates() {
        let fee = Ratio::from_percent(10);
        assert_eq!(fee.apply(ether(1)), Some(ETHER / 10));
        assert_eq!(Ratio::from_percent(33).apply(10), Some(3));
    }

    #[test]
    fn ratio_display() {
        assert_eq!(Ratio::from_percent(150).to_string(), "1.500000000000000000");
    }
}
