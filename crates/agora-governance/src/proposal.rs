//! Proposal records and lifecycle.
//!
//! States: Pending -> Active -> Ended -> Queued -> Executable -> Executed,
//! with Cancelled reachable from any non-executed, non-expired state and
//! Expired once a queued proposal misses its execution window.
//!
//! The timelock is not stored on the proposal. Eligibility and expiry are
//! measured from `queued_time` with the timelock delay in force at the moment
//! of the query, so a delay change also applies to proposals already queued.

use std::collections::BTreeMap;

use agora_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::config::EXECUTION_GRACE_PERIOD;
use crate::error::GovernanceError;

/// Proposal state at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Created, voting not started
    Pending,
    /// Voting open
    Active,
    /// Voting closed, not queued
    Ended,
    /// Queued, timelock running
    Queued,
    /// Timelock elapsed, inside the execution window
    Executable,
    /// Execution window missed
    Expired,
    Executed,
    Cancelled,
}

impl ProposalState {
    /// No further transition (vote, queue, execute, cancel) is accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalState::Executed | ProposalState::Cancelled | ProposalState::Expired
        )
    }

    /// Votes are accepted only while voting is open.
    pub fn can_vote(&self) -> bool {
        matches!(self, ProposalState::Active)
    }
}

/// One call a proposal makes when executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalAction {
    pub target: Address,
    pub value: Amount,
    pub payload: Vec<u8>,
    pub description: String,
}

impl ProposalAction {
    /// Create an action.
    pub fn new(
        target: Address,
        value: Amount,
        payload: Vec<u8>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            target,
            value,
            payload,
            description: description.into(),
        }
    }

    /// Zip parallel arrays into actions. All four must have the same length.
    pub fn from_parts(
        targets: Vec<Address>,
        values: Vec<Amount>,
        payloads: Vec<Vec<u8>>,
        descriptions: Vec<String>,
    ) -> Result<Vec<Self>, GovernanceError> {
        let n = targets.len();
        if values.len() != n || payloads.len() != n || descriptions.len() != n {
            return Err(GovernanceError::ActionArityMismatch {
                targets: n,
                values: values.len(),
                payloads: payloads.len(),
                descriptions: descriptions.len(),
            });
        }
        Ok(targets
            .into_iter()
            .zip(values)
            .zip(payloads)
            .zip(descriptions)
            .map(|(((target, value), payload), description)| Self {
                target,
                value,
                payload,
                description,
            })
            .collect())
    }
}

/// Sum of declared action values, `None` on overflow.
pub fn total_action_value(actions: &[ProposalAction]) -> Option<Amount> {
    actions
        .iter()
        .try_fold(Amount::ZERO, |acc, action| acc.checked_add(action.value))
}

/// Stored proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: u64,
    pub proposer: Address,
    pub title: String,
    pub content_pointer: String,
    /// Block the proposal was created in
    pub created_block: u64,
    /// Block whose voting power is charged for votes
    pub snapshot_block: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub total_votes_cast: u64,
    pub total_voters: u64,
    pub executed: bool,
    pub cancelled: bool,
    pub queued: bool,
    pub queued_time: u64,
    pub actions: Vec<ProposalAction>,
    votes: BTreeMap<Address, u64>,
}

impl Proposal {
    /// Create an unqueued proposal. Votes are charged at `created_block - 1`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        proposer: Address,
        title: String,
        content_pointer: String,
        created_block: u64,
        start_time: u64,
        end_time: u64,
        actions: Vec<ProposalAction>,
    ) -> Self {
        Self {
            id,
            proposer,
            title,
            content_pointer,
            created_block,
            snapshot_block: created_block.saturating_sub(1),
            start_time,
            end_time,
            total_votes_cast: 0,
            total_voters: 0,
            executed: false,
            cancelled: false,
            queued: false,
            queued_time: 0,
            actions,
            votes: BTreeMap::new(),
        }
    }

    /// State at `now` under the current `timelock_delay`.
    pub fn state(&self, now: u64, timelock_delay: u64) -> ProposalState {
        if self.executed {
            ProposalState::Executed
        } else if self.cancelled {
            ProposalState::Cancelled
        } else if self.queued {
            if now < self.eta(timelock_delay) {
                ProposalState::Queued
            } else if now <= self.execution_deadline(timelock_delay) {
                ProposalState::Executable
            } else {
                ProposalState::Expired
            }
        } else if now < self.start_time {
            ProposalState::Pending
        } else if now <= self.end_time {
            ProposalState::Active
        } else {
            ProposalState::Ended
        }
    }

    /// Earliest execution time: `queued_time + timelock_delay`.
    pub fn eta(&self, timelock_delay: u64) -> u64 {
        self.queued_time.saturating_add(timelock_delay)
    }

    /// Last timestamp at which a queued proposal may execute.
    pub fn execution_deadline(&self, timelock_delay: u64) -> u64 {
        self.eta(timelock_delay).saturating_add(EXECUTION_GRACE_PERIOD)
    }

    /// Whether `voter` has already voted.
    pub fn has_voted(&self, voter: &Address) -> bool {
        self.votes.contains_key(voter)
    }

    /// Votes cast by `voter`, 0 if none.
    pub fn votes_of(&self, voter: &Address) -> u64 {
        self.votes.get(voter).copied().unwrap_or(0)
    }

    /// Record a vote. Callers check eligibility first.
    pub(crate) fn record_vote(&mut self, voter: Address, votes: u64) {
        self.votes.insert(voter, votes);
        self.total_votes_cast = self.total_votes_cast.saturating_add(votes);
        self.total_voters += 1;
    }

    /// Sum of action values, `None` on overflow.
    pub fn total_value(&self) -> Option<Amount> {
        total_action_value(&self.actions)
    }

    /// Read-only snapshot at `now`.
    pub fn view(&self, now: u64, timelock_delay: u64) -> ProposalView {
        let eta = if self.queued {
            self.eta(timelock_delay)
        } else {
            0
        };
        ProposalView {
            id: self.id,
            proposer: self.proposer,
            title: self.title.clone(),
            content_pointer: self.content_pointer.clone(),
            snapshot_block: self.snapshot_block,
            start_time: self.start_time,
            end_time: self.end_time,
            total_votes_cast: self.total_votes_cast,
            total_voters: self.total_voters,
            executed: self.executed,
            cancelled: self.cancelled,
            queued: self.queued,
            queued_time: self.queued_time,
            eta,
            action_count: self.actions.len(),
            state: self.state(now, timelock_delay),
        }
    }
}

/// Read-only proposal snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalView {
    pub id: u64,
    pub proposer: Address,
    pub title: String,
    pub content_pointer: String,
    pub snapshot_block: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub total_votes_cast: u64,
    pub total_voters: u64,
    pub executed: bool,
    pub cancelled: bool,
    pub queued: bool,
    pub queued_time: u64,
    /// Earliest execution time under the current timelock, 0 until queued
    pub eta: u64,
    pub action_count: usize,
    pub state: ProposalState,
}
