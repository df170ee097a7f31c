//! Agora Types - Core value types for the Agora governance engine.
//!
//! This crate provides:
//! - Addresses (20-byte, Bech32m encoded)
//! - Amounts (u128 token units with checked arithmetic)
//! - Block context (number + timestamp) for executing operations

pub mod address;
pub mod amount;
pub mod block;
pub mod error;

pub use address::Address;
pub use amount::{isqrt_u128, Amount, MAX_DECIMALS};
pub use block::BlockEnv;
pub use error::TypesError;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Address, Amount, BlockEnv, TypesError};
}
