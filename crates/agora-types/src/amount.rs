use crate::error::TypesError;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// Largest supported number of token decimals (10^38 is the largest power of ten in u128).
pub const MAX_DECIMALS: u8 = 38;

/// Unsigned token amount in the smallest unit.
///
/// Arithmetic through the `checked_*` methods never wraps. The operator impls
/// saturate and are meant for values already known to be in range.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);
    pub const MAX: Self = Self(u128::MAX);

    /// Wrap a raw base-unit value.
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Raw base-unit value.
    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// `units` whole tokens with `decimals` fractional digits.
    pub fn from_tokens(units: u128, decimals: u8) -> Result<Self, TypesError> {
        let scale = Self::scale(decimals)?;
        units
            .checked_mul(scale)
            .map(Self)
            .ok_or(TypesError::AmountOverflow)
    }

    /// `10^decimals`
    pub fn scale(decimals: u8) -> Result<u128, TypesError> {
        if decimals > MAX_DECIMALS {
            return Err(TypesError::UnsupportedDecimals(decimals));
        }
        Ok(10u128.pow(decimals as u32))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(&self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(&self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Self)
    }

    pub fn checked_div(&self, rhs: Self) -> Option<Self> {
        self.0.checked_div(rhs.0).map(Self)
    }

    pub fn saturating_add(&self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(&self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Integer square root, floor(sqrt(self)).
    ///
    /// Newton iteration; the result `r` satisfies `r*r <= self < (r+1)*(r+1)`.
    pub fn isqrt(&self) -> Self {
        Self(isqrt_u128(self.0))
    }

    /// Signed difference `self - other`, saturating at the i128 range.
    pub fn signed_delta(&self, other: Self) -> i128 {
        if self.0 >= other.0 {
            i128::try_from(self.0 - other.0).unwrap_or(i128::MAX)
        } else {
            i128::try_from(other.0 - self.0).map(|d| -d).unwrap_or(i128::MIN)
        }
    }

    /// Parse from decimal string
    pub fn from_decimal_str(s: &str) -> Result<Self, TypesError> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(TypesError::InvalidAmountString(s.to_string()));
        }
        s.parse::<u128>().map(Self).map_err(|_| TypesError::AmountOverflow)
    }

    /// Format as whole tokens with `decimals` fractional digits, trailing zeros trimmed.
    pub fn to_token_string(&self, decimals: u8) -> String {
        let scale = match Self::scale(decimals) {
            Ok(scale) => scale,
            Err(_) => return self.0.to_string(),
        };
        let whole = self.0 / scale;
        let frac = self.0 % scale;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

/// floor(sqrt(n)) by Newton/Babylonian iteration.
pub fn isqrt_u128(n: u128) -> u128 {
    if n <= 1 {
        return n;
    }

    // Initial guess from the bit length keeps the iteration short and never
    // undershoots the root.
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

impl From<u64> for Amount {
    fn from(val: u64) -> Self {
        Self(val as u128)
    }
}

impl From<u128> for Amount {
    fn from(val: u128) -> Self {
        Self(val)
    }
}

impl From<Amount> for u128 {
    fn from(val: Amount) -> Self {
        val.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl FromStr for Amount {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u128::from_str_radix(hex_part, 16)
                .map(Self)
                .map_err(|e| TypesError::InvalidHex(e.to_string()))
        } else {
            Self::from_decimal_str(s)
        }
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        // Saturating subtraction - returns 0 if underflow
        self.saturating_sub(rhs)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = self.saturating_sub(rhs);
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_tokens() {
        assert_eq!(
            Amount::from_tokens(1000, 18).unwrap(),
            Amount::new(1_000_000_000_000_000_000_000)
        );
        assert_eq!(Amount::from_tokens(5, 0).unwrap(), Amount::new(5));
        assert!(Amount::from_tokens(u128::MAX, 18).is_err());
        assert_eq!(
            Amount::from_tokens(1, 39),
            Err(TypesError::UnsupportedDecimals(39))
        );
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::new(300);
        let b = Amount::new(200);
        assert_eq!(a.checked_add(b), Some(Amount::new(500)));
        assert_eq!(a.checked_sub(b), Some(Amount::new(100)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(Amount::MAX.checked_add(Amount::ONE), None);
        assert_eq!(a.checked_div(Amount::ZERO), None);
    }

    #[test]
    fn test_isqrt_known_values() {
        assert_eq!(Amount::ZERO.isqrt(), Amount::ZERO);
        assert_eq!(Amount::ONE.isqrt(), Amount::ONE);
        assert_eq!(Amount::new(15).isqrt(), Amount::new(3));
        assert_eq!(Amount::new(16).isqrt(), Amount::new(4));
        assert_eq!(Amount::new(100).isqrt(), Amount::new(10));
        assert_eq!(isqrt_u128(u128::MAX), u64::MAX as u128);
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(Amount::new(600).signed_delta(Amount::new(500)), 100);
        assert_eq!(Amount::new(500).signed_delta(Amount::new(600)), -100);
        assert_eq!(Amount::ZERO.signed_delta(Amount::ZERO), 0);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("12345".parse::<Amount>().unwrap(), Amount::new(12345));
        assert_eq!("0xff".parse::<Amount>().unwrap(), Amount::new(255));
        assert!("".parse::<Amount>().is_err());
        assert!("-1".parse::<Amount>().is_err());
        assert!("1e18".parse::<Amount>().is_err());
        assert_eq!(Amount::new(42).to_string(), "42");
    }

    #[test]
    fn test_token_string() {
        let amount = Amount::new(1_500_000_000_000_000_000);
        assert_eq!(amount.to_token_string(18), "1.5");
        assert_eq!(Amount::from_tokens(7, 18).unwrap().to_token_string(18), "7");
    }

    proptest! {
        #[test]
        fn isqrt_brackets_input(n in any::<u128>()) {
            let r = isqrt_u128(n);
            prop_assert!(r.checked_mul(r).map_or(false, |sq| sq <= n));
            let next = r + 1;
            prop_assert!(next.checked_mul(next).map_or(true, |sq| sq > n));
        }
    }
}
