//! Agora Governance - Token-weighted governance with quadratic voting.
//!
//! This crate provides:
//! - A checkpointed, delegatable voting-power ledger
//! - Quadratic voting arithmetic and distribution analytics
//! - Proposal lifecycle with quorum, timelock and atomic multi-action execution
//! - Treasury tracking and reconciliation

pub mod access;
pub mod checkpoint;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod governance;
pub mod ledger;
pub mod proposal;
pub mod quadratic;
pub mod reentrancy;
pub mod telemetry;
pub mod treasury;

pub use access::{Authority, Role, RoleRegistry};
pub use checkpoint::{Checkpoint, MAX_CHECKPOINT_VOTES};
pub use config::{GovernanceSettings, LoggingConfig, TokenConfig, VotingConfig};
pub use dispatch::{ActionDispatcher, CallRevert, OutboundCall, RecordingDispatcher};
pub use engine::GovernanceEngine;
pub use error::{ConfigError, GovernanceError, LedgerError, MathError};
pub use events::{Emitted, EventLog, GovernanceEvent, LedgerEvent};
pub use governance::Governance;
pub use ledger::{VotesLedger, VotingPowerLedger};
pub use proposal::{ProposalAction, ProposalState, ProposalView};
pub use quadratic::{quadratic_cost, token_cost, DistributionStats, MAX_SAFE_VOTES};
pub use treasury::{TransactionKind, TreasuryInfo};
