use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// 20-byte account address.
/// Display format: Bech32m with "agora" human-readable prefix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);
    pub const LEN: usize = 20;

    /// Bech32m human-readable prefix
    pub const BECH32_HRP: &'static str = "agora";

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Create from a byte slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        if slice.len() != Self::LEN {
            return Err(TypesError::InvalidAddressLength(slice.len()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Derive an address from a public key or any other seed material.
    /// `address = blake3(seed)[0..20]`
    pub fn derive(seed: &[u8]) -> Self {
        let hash = blake3::hash(seed);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash.as_bytes()[..20]);
        Self(addr)
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Convert to hex string without 0x prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hrp = bech32::Hrp::parse_unchecked(Self::BECH32_HRP);
        match bech32::encode::<bech32::Bech32m>(hrp, &self.0) {
            Ok(encoded) => write!(f, "{}", encoded),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accepts "agora1..." (Bech32m) and "0x..." (hex)
        if s.starts_with("agora1") {
            let (hrp, data) = bech32::decode(s)
                .map_err(|e| TypesError::Bech32Error(e.to_string()))?;

            let expected_hrp = bech32::Hrp::parse_unchecked(Self::BECH32_HRP);
            if hrp != expected_hrp {
                return Err(TypesError::InvalidAddressFormat(format!(
                    "Invalid HRP: expected '{}', got '{}'",
                    Self::BECH32_HRP,
                    hrp
                )));
            }

            Self::from_slice(&data)
        } else if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            let bytes = hex::decode(hex_part)?;
            Self::from_slice(&bytes)
        } else {
            Err(TypesError::InvalidAddressFormat(s.to_string()))
        }
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_zero() {
        assert_eq!(Address::ZERO.as_bytes(), &[0u8; 20]);
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_address_derive_is_deterministic() {
        let a = Address::derive(b"alice");
        assert!(!a.is_zero());
        assert_eq!(a, Address::derive(b"alice"));
        assert_ne!(a, Address::derive(b"bob"));
    }

    #[test]
    fn test_address_bech32m_roundtrip() {
        let addr = Address::from_bytes([7u8; 20]);
        let encoded = addr.to_string();
        assert!(encoded.starts_with("agora1"));

        let decoded: Address = encoded.parse().unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn test_address_hex_parse() {
        let addr = Address::from_bytes([0xabu8; 20]);
        let parsed: Address = format!("{:x}", addr).parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_address_from_str_invalid() {
        assert!(Address::from_str("invalid").is_err());
        assert!(Address::from_str("0x1234").is_err());
        assert!(Address::from_str("0xzz").is_err());
    }

    #[test]
    fn test_address_serde_uses_display() {
        let addr = Address::from_bytes([3u8; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert!(json.contains("agora1"));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
