//! Outbound calls made by proposal execution and treasury withdrawal.
//!
//! The engine never interprets payloads. It hands `(target, value, payload)`
//! to the host's dispatcher, together with a mutable handle on the
//! governance state so a target may call back in.

use std::collections::{HashMap, HashSet};

use agora_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::governance::Governance;

/// Marker used when a target reverts without a reason.
pub const NO_REVERT_REASON: &str = "reverted without reason";

/// A call leaving the governance system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCall {
    pub target: Address,
    pub value: Amount,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

/// Target-side failure of an outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRevert {
    pub reason: Option<String>,
}

impl CallRevert {
    /// Revert carrying the target's reason.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    /// Revert without a reason.
    pub fn silent() -> Self {
        Self { reason: None }
    }

    /// The target's reason verbatim, or [`NO_REVERT_REASON`].
    pub fn into_reason(self) -> String {
        self.reason.unwrap_or_else(|| NO_REVERT_REASON.to_string())
    }
}

/// Host-side executor for outbound calls.
pub trait ActionDispatcher {
    /// Whether `account` has code (payouts to it are refused by withdrawals).
    fn is_contract(&self, account: &Address) -> bool;

    /// Deliver `call`. `governance` is the caller's state, open for reentry.
    fn dispatch(
        &mut self,
        governance: &mut Governance,
        call: &OutboundCall,
    ) -> Result<Vec<u8>, CallRevert>;
}

/// Dispatcher that records delivered calls and reverts on configured targets.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    contracts: HashSet<Address>,
    reverts: HashMap<Address, Option<String>>,
    delivered: Vec<OutboundCall>,
    received: HashMap<Address, Amount>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `account` as having code.
    pub fn mark_contract(&mut self, account: Address) {
        self.contracts.insert(account);
    }

    /// Make every call to `target` revert with `reason`.
    pub fn revert_on(&mut self, target: Address, reason: Option<String>) {
        self.reverts.insert(target, reason);
    }

    /// Let calls to `target` succeed again.
    pub fn clear_revert(&mut self, target: &Address) {
        self.reverts.remove(target);
    }

    /// Calls that succeeded, in dispatch order.
    pub fn delivered(&self) -> &[OutboundCall] {
        &self.delivered
    }

    /// Total value delivered to `account`.
    pub fn received(&self, account: &Address) -> Amount {
        self.received.get(account).copied().unwrap_or(Amount::ZERO)
    }
}

impl ActionDispatcher for RecordingDispatcher {
    fn is_contract(&self, account: &Address) -> bool {
        self.contracts.contains(account)
    }

    fn dispatch(
        &mut self,
        _governance: &mut Governance,
        call: &OutboundCall,
    ) -> Result<Vec<u8>, CallRevert> {
        if let Some(reason) = self.reverts.get(&call.target) {
            return Err(CallRevert {
                reason: reason.clone(),
            });
        }
        *self.received.entry(call.target).or_insert(Amount::ZERO) += call.value;
        self.delivered.push(call.clone());
        Ok(Vec::new())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
