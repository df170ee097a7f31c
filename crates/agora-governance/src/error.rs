use agora_types::{Address, Amount, TypesError};
use thiserror::Error;

use crate::access::Role;

/// Errors raised by the voting-power ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Zero address not allowed")]
    ZeroAddress,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Insufficient balance for {account:?}: have {available}, need {required}")]
    InsufficientBalance {
        account: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance { available: Amount, required: Amount },

    #[error("Caller is not a minter: {0:?}")]
    NotMinter(Address),

    #[error("Token transfers are paused")]
    TokenPaused,

    #[error("Mint of {requested} would exceed max supply {max_supply}")]
    MaxSupplyExceeded { requested: Amount, max_supply: Amount },

    #[error("Voting power of {account:?} would exceed checkpoint bound: {value}")]
    CheckpointOverflow { account: Address, value: u128 },

    #[error("Voting power underflow for {account:?}: have {available}, remove {required}")]
    VotingPowerUnderflow {
        account: Address,
        available: Amount,
        required: Amount,
    },

    #[error("Checkpoint height regression for {account:?}: latest {latest}, attempted {attempted}")]
    HeightRegression {
        account: Address,
        latest: u64,
        attempted: u64,
    },

    #[error("Block {requested} not yet finalized (current {current})")]
    BlockNotYetMined { requested: u64, current: u64 },
}

/// Errors raised by the quadratic voting math.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Votes must be greater than zero")]
    ZeroVotes,

    #[error("Votes {votes} exceed overflow safety bound {max}")]
    VotesExceedSafetyBound { votes: u64, max: u64 },

    #[error("Quadratic cost overflow")]
    CostOverflow,

    #[error("Distribution sample is empty")]
    EmptySample,

    #[error("Distribution sample too large: {len} > {max}")]
    SampleTooLarge { len: usize, max: usize },

    #[error(transparent)]
    Types(#[from] TypesError),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("Unknown log format '{0}' (expected pretty or json)")]
    UnknownLogFormat(String),

    #[error("{parameter} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: String,
        min: String,
        max: String,
    },

    #[error(transparent)]
    Types(#[from] TypesError),
}

/// Errors that can occur in governance operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Governance not initialized")]
    NotInitialized,

    #[error("Governance already initialized")]
    AlreadyInitialized,

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("Proposal title must not be empty")]
    EmptyTitle,

    #[error("Proposal title too long: {len} > {max}")]
    TitleTooLong { len: usize, max: usize },

    #[error("Content pointer must not be empty")]
    EmptyContentPointer,

    #[error("Content pointer too long: {len} > {max}")]
    ContentPointerTooLong { len: usize, max: usize },

    #[error(
        "Action arrays differ in length: targets {targets}, values {values}, \
         payloads {payloads}, descriptions {descriptions}"
    )]
    ActionArityMismatch {
        targets: usize,
        values: usize,
        payloads: usize,
        descriptions: usize,
    },

    #[error("Too many actions: {count} > {max}")]
    TooManyActions { count: usize, max: usize },

    #[error("Zero address not allowed")]
    ZeroAddress,

    #[error("Value must be greater than zero")]
    ZeroValue,

    #[error("Sum of action values overflows")]
    ActionValueOverflow,

    #[error("Insufficient treasury balance: have {available}, need {required}")]
    InsufficientTreasury { available: Amount, required: Amount },

    #[error("Proposal cooldown active until {next_allowed}")]
    ProposalCooldown { next_allowed: u64 },

    #[error("Insufficient tokens to propose: have {have}, need {need}")]
    InsufficientTokens { have: Amount, need: Amount },

    #[error("Voting period not started")]
    VotingNotStarted,

    #[error("Voting period ended")]
    VotingEnded,

    #[error("Voting period has not ended")]
    VotingNotEnded,

    #[error("Proposal already executed")]
    AlreadyExecuted,

    #[error("Proposal already cancelled")]
    AlreadyCancelled,

    #[error("Proposal already queued")]
    AlreadyQueued,

    #[error("Proposal not queued")]
    NotQueued,

    #[error("Timelock not elapsed: executable at {eta}")]
    TimelockNotElapsed { eta: u64 },

    #[error("Proposal expired: execution deadline was {deadline}")]
    ProposalExpired { deadline: u64 },

    #[error("Quorum not reached: {actual} < {required}")]
    QuorumNotReached { actual: u64, required: u64 },

    #[error("Votes {votes} exceed per-wallet maximum {max}")]
    ExceedsMaxVotes { votes: u64, max: u64 },

    #[error("Already voted")]
    AlreadyVoted,

    #[error("Insufficient voting power: have {have}, need {need}")]
    InsufficientVotingPower { have: Amount, need: Amount },

    #[error("Unauthorized: {caller:?} lacks role {role:?}")]
    Unauthorized { caller: Address, role: Role },

    #[error("Proposer can only cancel before the proposal is queued")]
    CannotCancel,

    #[error("Recipient is a contract: {0:?}")]
    RecipientIsContract(Address),

    #[error("Transfer to {to:?} failed: {reason}")]
    TransferFailed { to: Address, reason: String },

    #[error("Action {index} execution failed: {reason}")]
    ActionExecutionFailed { index: usize, reason: String },

    #[error("Reentrant call into guarded operation {0}")]
    Reentrancy(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GovernanceError::TitleTooLong { len: 300, max: 256 };
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn test_quorum_error() {
        let err = GovernanceError::QuorumNotReached { actual: 100, required: 200 };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("200"));
    }

    #[test]
    fn test_ledger_error_is_transparent() {
        let err: GovernanceError = LedgerError::TokenPaused.into();
        assert_eq!(err.to_string(), "Token transfers are paused");
    }

    #[test]
    fn test_action_failure_carries_reason() {
        let err = GovernanceError::ActionExecutionFailed {
            index: 2,
            reason: "target: not allowed".to_string(),
        };
        assert_eq!(err.to_string(), "Action 2 execution failed: target: not allowed");
    }
}
