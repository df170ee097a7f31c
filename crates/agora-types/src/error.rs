use thiserror::Error;

/// Errors that can occur while building or parsing value types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address length: expected 20, got {0}")]
    InvalidAddressLength(usize),

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Invalid amount string: {0}")]
    InvalidAmountString(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Bech32 error: {0}")]
    Bech32Error(String),

    #[error("Unsupported decimals: {0} (max {max})", max = crate::amount::MAX_DECIMALS)]
    UnsupportedDecimals(u8),
}

impl From<hex::FromHexError> for TypesError {
    fn from(e: hex::FromHexError) -> Self {
        TypesError::InvalidHex(e.to_string())
    }
}

impl From<std::num::ParseIntError> for TypesError {
    fn from(e: std::num::ParseIntError) -> Self {
        TypesError::InvalidAmountString(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TypesError::InvalidAddressLength(4);
        assert!(err.to_string().contains("expected 20, got 4"));
    }

    #[test]
    fn test_unsupported_decimals_display() {
        let err = TypesError::UnsupportedDecimals(40);
        assert!(err.to_string().contains("40"));
        assert!(err.to_string().contains("max"));
    }
}
