//! Operation log.
//!
//! Every state transition appends an event tagged with the block it happened
//! in. The log carries enough fields (proposal id, voter, votes, cost, running
//! tallies) to rebuild proposal history and vote totals without the state.

use agora_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::treasury::TransactionKind;

/// An event together with the block that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emitted<E> {
    pub block: u64,
    pub event: E,
}

/// Append-only event sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog<E> {
    entries: Vec<Emitted<E>>,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<E> EventLog<E> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` as emitted in `block`.
    pub fn push(&mut self, block: u64, event: E) {
        self.entries.push(Emitted { block, event });
    }

    /// Emitted events with their blocks, oldest first.
    pub fn entries(&self) -> &[Emitted<E>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent event.
    pub fn last(&self) -> Option<&E> {
        self.entries.last().map(|e| &e.event)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter().map(|e| &e.event)
    }
}

impl<E: Serialize> EventLog<E> {
    /// One JSON object per line, oldest first.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}

/// Events emitted by the voting-power ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// Mints have `from == ZERO`, burns have `to == ZERO`.
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    DelegateChanged {
        delegator: Address,
        from_delegate: Address,
        to_delegate: Address,
    },
    DelegateVotesChanged {
        delegate: Address,
        previous: Amount,
        current: Amount,
    },
    MinterUpdated {
        account: Address,
        enabled: bool,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
}

/// Events emitted by the governance engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GovernanceEvent {
    Initialized {
        by: Address,
    },
    ProposalCreated {
        proposal_id: u64,
        proposer: Address,
        title: String,
        content_pointer: String,
        start_time: u64,
        end_time: u64,
        snapshot_block: u64,
        action_count: usize,
        total_value: Amount,
    },
    VoteCast {
        proposal_id: u64,
        voter: Address,
        votes: u64,
        cost: Amount,
        total_votes_cast: u64,
        total_voters: u64,
    },
    ProposalQueued {
        proposal_id: u64,
        queued_time: u64,
        /// Under the timelock in force when queued
        eta: u64,
    },
    ActionExecuted {
        proposal_id: u64,
        index: usize,
        target: Address,
        value: Amount,
        /// blake3 of the payload, hex encoded
        payload_digest: String,
        description: String,
    },
    ProposalExecuted {
        proposal_id: u64,
        executed_time: u64,
    },
    ProposalCancelled {
        proposal_id: u64,
        cancelled_by: Address,
    },
    /// Explicit deposit or plain receive, told apart by `kind`
    TreasuryDeposit {
        kind: TransactionKind,
        from: Address,
        amount: Amount,
        balance: Amount,
    },
    TreasuryWithdrawal {
        to: Address,
        amount: Amount,
        by: Address,
        balance: Amount,
    },
    TreasuryReconciled {
        previous: Amount,
        current: Amount,
        delta: i128,
    },
    ConfigUpdated {
        parameter: String,
        previous: String,
        current: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_iterate() {
        let mut log = EventLog::new();
        log.push(1, LedgerEvent::Paused { by: Address::ZERO });
        log.push(2, LedgerEvent::Unpaused { by: Address::ZERO });

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[1].block, 2);
        assert!(matches!(log.last(), Some(LedgerEvent::Unpaused { .. })));
    }

    #[test]
    fn test_json_lines() {
        let mut log = EventLog::new();
        log.push(
            7,
            GovernanceEvent::ProposalQueued {
                proposal_id: 1,
                queued_time: 100,
                eta: 200,
            },
        );
        log.push(
            8,
            GovernanceEvent::TreasuryReconciled {
                previous: Amount::new(500),
                current: Amount::new(600),
                delta: 100,
            },
        );

        log.push(
            9,
            GovernanceEvent::TreasuryDeposit {
                kind: TransactionKind::Receive,
                from: Address::ZERO,
                amount: Amount::new(5),
                balance: Amount::new(605),
            },
        );

        let out = log.to_json_lines().unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("\"kind\":\"Receive\""));
        assert!(lines[0].contains("\"type\":\"ProposalQueued\""));
        assert!(lines[0].contains("\"block\":7"));

        let back: Emitted<GovernanceEvent> = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back.block, 8);
    }
}
