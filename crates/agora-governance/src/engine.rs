//! Proposal state machine and treasury ledger.
//!
//! The engine owns proposals, the voting configuration and the treasury. It
//! reads and burns voting power through [`VotesLedger`] and leaves role checks
//! and outbound calls to the [`Governance`](crate::Governance) facade.
//!
//! Operations here validate every precondition before their first write.
//! Execution is split into steps (`begin_execution`, `pay_action`,
//! `record_action`, `complete_execution`) so the facade can dispatch between
//! them and roll the whole sequence back on failure.

use std::collections::BTreeMap;
use std::fmt::Display;

use agora_types::{Address, Amount, BlockEnv};
use tracing::{debug, info};

use crate::access::Role;
use crate::config::{
    check_max_actions, check_max_votes_per_wallet, check_proposal_cooldown,
    check_proposal_threshold, check_quorum_votes, check_timelock_delay, check_voting_delay,
    check_voting_period, VotingConfig, MAX_CONTENT_POINTER_LEN, MAX_TITLE_LEN,
};
use crate::error::{ConfigError, GovernanceError, MathError};
use crate::events::{EventLog, GovernanceEvent};
use crate::ledger::VotesLedger;
use crate::proposal::{
    total_action_value, Proposal, ProposalAction, ProposalState, ProposalView,
};
use crate::quadratic::token_cost;
use crate::treasury::{TransactionKind, Treasury, TreasuryInfo};

/// Governance proposal engine.
#[derive(Debug, Clone)]
pub struct GovernanceEngine {
    /// `None` until initialized
    config: Option<VotingConfig>,
    decimals: u8,
    proposals: BTreeMap<u64, Proposal>,
    proposal_count: u64,
    last_proposal_time: BTreeMap<Address, u64>,
    treasury: Treasury,
    events: EventLog<GovernanceEvent>,
}

impl GovernanceEngine {
    /// Engine for a voting token with `decimals` fractional digits.
    pub fn new(decimals: u8) -> Self {
        Self {
            config: None,
            decimals,
            proposals: BTreeMap::new(),
            proposal_count: 0,
            last_proposal_time: BTreeMap::new(),
            treasury: Treasury::new(),
            events: EventLog::new(),
        }
    }

    /// Install the voting configuration. Fails if already initialized.
    pub fn initialize(
        &mut self,
        config: VotingConfig,
        by: Address,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        if self.is_initialized() {
            return Err(GovernanceError::AlreadyInitialized);
        }
        config.validate(self.decimals)?;
        self.config = Some(config);
        self.events.push(env.number, GovernanceEvent::Initialized { by });
        info!(by = %by, "Governance initialized");
        Ok(())
    }

    /// Whether a configuration is installed.
    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Current configuration, or `NotInitialized`.
    pub fn config(&self) -> Result<&VotingConfig, GovernanceError> {
        self.config.as_ref().ok_or(GovernanceError::NotInitialized)
    }

    /// Timelock delay in force now. Proposals only exist once initialized.
    fn timelock_delay(&self) -> u64 {
        self.config.as_ref().map_or(0, |c| c.timelock_delay)
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    /// Number of proposals created so far. Ids run from 1.
    pub fn proposal_count(&self) -> u64 {
        self.proposal_count
    }

    /// Get a proposal by id.
    pub fn proposal(&self, id: u64) -> Result<&Proposal, GovernanceError> {
        self.proposals.get(&id).ok_or(GovernanceError::ProposalNotFound(id))
    }

    /// Read-only snapshot of a proposal at `now`.
    pub fn proposal_view(&self, id: u64, now: u64) -> Result<ProposalView, GovernanceError> {
        Ok(self.proposal(id)?.view(now, self.timelock_delay()))
    }

    pub fn proposal_actions(&self, id: u64) -> Result<&[ProposalAction], GovernanceError> {
        Ok(&self.proposal(id)?.actions)
    }

    /// Derived state of a proposal at `now`.
    pub fn proposal_state(&self, id: u64, now: u64) -> Result<ProposalState, GovernanceError> {
        Ok(self.proposal(id)?.state(now, self.timelock_delay()))
    }

    pub fn votes_of(&self, id: u64, voter: &Address) -> Result<u64, GovernanceError> {
        Ok(self.proposal(id)?.votes_of(voter))
    }

    pub fn has_voted(&self, id: u64, voter: &Address) -> Result<bool, GovernanceError> {
        Ok(self.proposal(id)?.has_voted(voter))
    }

    /// Timestamp of `proposer`'s most recent proposal.
    pub fn last_proposal_time(&self, proposer: &Address) -> Option<u64> {
        self.last_proposal_time.get(proposer).copied()
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// Tracked and custodied balances plus the transaction count.
    pub fn treasury_info(&self) -> TreasuryInfo {
        self.treasury.info()
    }

    pub fn events(&self) -> &EventLog<GovernanceEvent> {
        &self.events
    }

    fn proposal_mut(&mut self, id: u64) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Create a proposal. Returns its id.
    pub fn propose<L: VotesLedger + ?Sized>(
        &mut self,
        ledger: &L,
        proposer: Address,
        title: String,
        content_pointer: String,
        actions: Vec<ProposalAction>,
        env: &BlockEnv,
    ) -> Result<u64, GovernanceError> {
        let config = self.config()?;

        if title.trim().is_empty() {
            return Err(GovernanceError::EmptyTitle);
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(GovernanceError::TitleTooLong {
                len: title.len(),
                max: MAX_TITLE_LEN,
            });
        }
        if content_pointer.trim().is_empty() {
            return Err(GovernanceError::EmptyContentPointer);
        }
        if content_pointer.len() > MAX_CONTENT_POINTER_LEN {
            return Err(GovernanceError::ContentPointerTooLong {
                len: content_pointer.len(),
                max: MAX_CONTENT_POINTER_LEN,
            });
        }
        if actions.len() > config.max_actions_per_proposal {
            return Err(GovernanceError::TooManyActions {
                count: actions.len(),
                max: config.max_actions_per_proposal,
            });
        }
        if actions.iter().any(|a| a.target.is_zero()) {
            return Err(GovernanceError::ZeroAddress);
        }
        let total_value =
            total_action_value(&actions).ok_or(GovernanceError::ActionValueOverflow)?;
        self.treasury.ensure_available(total_value)?;

        // cooldown before threshold
        if let Some(last) = self.last_proposal_time(&proposer) {
            let next_allowed = last.saturating_add(config.proposal_cooldown);
            if env.timestamp < next_allowed {
                return Err(GovernanceError::ProposalCooldown { next_allowed });
            }
        }
        let power = ledger.current_voting_power(&proposer);
        if power < config.proposal_threshold {
            return Err(GovernanceError::InsufficientTokens {
                have: power,
                need: config.proposal_threshold,
            });
        }

        let start_time = env.timestamp.saturating_add(config.voting_delay);
        let end_time = start_time.saturating_add(config.voting_period);
        let id = self.proposal_count + 1;
        let proposal = Proposal::new(
            id,
            proposer,
            title,
            content_pointer,
            env.number,
            start_time,
            end_time,
            actions,
        );

        self.events.push(
            env.number,
            GovernanceEvent::ProposalCreated {
                proposal_id: id,
                proposer,
                title: proposal.title.clone(),
                content_pointer: proposal.content_pointer.clone(),
                start_time,
                end_time,
                snapshot_block: proposal.snapshot_block,
                action_count: proposal.actions.len(),
                total_value,
            },
        );
        self.proposals.insert(id, proposal);
        self.proposal_count = id;
        self.last_proposal_time.insert(proposer, env.timestamp);

        info!(
            proposal_id = id,
            proposer = %proposer,
            start_time,
            end_time,
            "Proposal created"
        );
        Ok(id)
    }

    /// Cast `votes` quadratic votes. Returns the token cost burned.
    pub fn cast_vote<L: VotesLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        id: u64,
        voter: Address,
        votes: u64,
        env: &BlockEnv,
    ) -> Result<Amount, GovernanceError> {
        let max_votes = self.config()?.max_votes_per_wallet;
        let proposal = self.proposal(id)?;

        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted);
        }
        if proposal.cancelled {
            return Err(GovernanceError::AlreadyCancelled);
        }
        if env.timestamp < proposal.start_time {
            return Err(GovernanceError::VotingNotStarted);
        }
        if env.timestamp > proposal.end_time {
            return Err(GovernanceError::VotingEnded);
        }
        if votes == 0 {
            return Err(MathError::ZeroVotes.into());
        }
        if votes > max_votes {
            return Err(GovernanceError::ExceedsMaxVotes {
                votes,
                max: max_votes,
            });
        }
        if proposal.has_voted(&voter) {
            return Err(GovernanceError::AlreadyVoted);
        }

        let cost = token_cost(votes, self.decimals)?;
        let power = ledger.voting_power_at(&voter, proposal.snapshot_block, env.number)?;
        if power < cost {
            return Err(GovernanceError::InsufficientVotingPower {
                have: power,
                need: cost,
            });
        }

        // the burn validates before writing, so a failure leaves both sides untouched
        ledger.burn(voter, cost, env.number)?;

        let proposal = self.proposal_mut(id)?;
        proposal.record_vote(voter, votes);
        let (total_votes_cast, total_voters) =
            (proposal.total_votes_cast, proposal.total_voters);

        self.events.push(
            env.number,
            GovernanceEvent::VoteCast {
                proposal_id: id,
                voter,
                votes,
                cost,
                total_votes_cast,
                total_voters,
            },
        );
        debug!(
            proposal_id = id,
            voter = %voter,
            votes,
            cost = %cost,
            total_votes_cast,
            "Vote cast"
        );
        Ok(cost)
    }

    /// Queue an ended proposal that reached quorum.
    ///
    /// Returns the eta under the current timelock. Execution re-reads the
    /// delay, so a later change moves the window.
    pub fn queue(&mut self, id: u64, env: &BlockEnv) -> Result<u64, GovernanceError> {
        let config = self.config()?;
        let (quorum, timelock) = (config.quorum_votes, config.timelock_delay);
        let proposal = self.proposal(id)?;

        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted);
        }
        if proposal.cancelled {
            return Err(GovernanceError::AlreadyCancelled);
        }
        if proposal.queued {
            return Err(GovernanceError::AlreadyQueued);
        }
        if env.timestamp <= proposal.end_time {
            return Err(GovernanceError::VotingNotEnded);
        }
        if proposal.total_votes_cast < quorum {
            return Err(GovernanceError::QuorumNotReached {
                actual: proposal.total_votes_cast,
                required: quorum,
            });
        }

        let proposal = self.proposal_mut(id)?;
        proposal.queued = true;
        proposal.queued_time = env.timestamp;
        let eta = proposal.eta(timelock);

        self.events.push(
            env.number,
            GovernanceEvent::ProposalQueued {
                proposal_id: id,
                queued_time: env.timestamp,
                eta,
            },
        );
        info!(proposal_id = id, eta, "Proposal queued");
        Ok(eta)
    }

    /// Cancel a proposal. `is_owner` lifts the not-yet-queued restriction.
    ///
    /// Expired proposals are terminal and cannot be cancelled.
    pub fn cancel(
        &mut self,
        id: u64,
        caller: Address,
        is_owner: bool,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        let timelock = self.config()?.timelock_delay;
        let proposal = self.proposal(id)?;

        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted);
        }
        if proposal.cancelled {
            return Err(GovernanceError::AlreadyCancelled);
        }
        if proposal.state(env.timestamp, timelock) == ProposalState::Expired {
            return Err(GovernanceError::ProposalExpired {
                deadline: proposal.execution_deadline(timelock),
            });
        }
        if !is_owner {
            if caller != proposal.proposer {
                return Err(GovernanceError::Unauthorized {
                    caller,
                    role: Role::Owner,
                });
            }
            if proposal.queued {
                return Err(GovernanceError::CannotCancel);
            }
        }

        self.proposal_mut(id)?.cancelled = true;
        self.events.push(
            env.number,
            GovernanceEvent::ProposalCancelled {
                proposal_id: id,
                cancelled_by: caller,
            },
        );
        info!(proposal_id = id, by = %caller, "Proposal cancelled");
        Ok(())
    }

    /// Check execution eligibility and mark the proposal executed.
    ///
    /// Returns the actions to run. The flag is set before any action runs.
    /// The window is `queued_time + timelock_delay` through that plus the
    /// grace period, with the delay read from the current configuration.
    pub fn begin_execution(
        &mut self,
        id: u64,
        env: &BlockEnv,
    ) -> Result<Vec<ProposalAction>, GovernanceError> {
        let timelock = self.config()?.timelock_delay;
        let proposal = self.proposal(id)?;

        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted);
        }
        if proposal.cancelled {
            return Err(GovernanceError::AlreadyCancelled);
        }
        if !proposal.queued {
            return Err(GovernanceError::NotQueued);
        }
        let eta = proposal.eta(timelock);
        if env.timestamp < eta {
            return Err(GovernanceError::TimelockNotElapsed { eta });
        }
        let deadline = proposal.execution_deadline(timelock);
        if env.timestamp > deadline {
            return Err(GovernanceError::ProposalExpired { deadline });
        }

        let proposal = self.proposal_mut(id)?;
        proposal.executed = true;
        Ok(proposal.actions.clone())
    }

    /// Debit an action's value from the treasury ahead of its dispatch.
    pub fn pay_action(
        &mut self,
        action: &ProposalAction,
        env: &BlockEnv,
    ) -> Result<Amount, GovernanceError> {
        self.treasury.debit(
            TransactionKind::ActionPayout,
            action.target,
            action.value,
            env.number,
        )
    }

    /// Log a dispatched action. The payload is indexed by its blake3 digest.
    pub fn record_action(
        &mut self,
        id: u64,
        index: usize,
        action: &ProposalAction,
        env: &BlockEnv,
    ) {
        let payload_digest = hex::encode(blake3::hash(&action.payload).as_bytes());
        self.events.push(
            env.number,
            GovernanceEvent::ActionExecuted {
                proposal_id: id,
                index,
                target: action.target,
                value: action.value,
                payload_digest,
                description: action.description.clone(),
            },
        );
        debug!(
            proposal_id = id,
            index,
            target = %action.target,
            value = %action.value,
            "Action executed"
        );
    }

    /// Emit `ProposalExecuted` once every action has been dispatched.
    pub fn complete_execution(&mut self, id: u64, env: &BlockEnv) {
        self.events.push(
            env.number,
            GovernanceEvent::ProposalExecuted {
                proposal_id: id,
                executed_time: env.timestamp,
            },
        );
        info!(proposal_id = id, "Proposal executed");
    }

    // ---------------------------------------------------------------------
    // Treasury
    // ---------------------------------------------------------------------

    /// Credit the treasury through `kind` (deposit or plain receive).
    pub fn credit_treasury(
        &mut self,
        kind: TransactionKind,
        from: Address,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<Amount, GovernanceError> {
        self.config()?;
        let balance = self.treasury.credit(kind, from, amount, env.number)?;
        self.events.push(
            env.number,
            GovernanceEvent::TreasuryDeposit {
                kind,
                from,
                amount,
                balance,
            },
        );
        debug!(
            kind = ?kind,
            from = %from,
            amount = %amount,
            balance = %balance,
            "Treasury credited"
        );
        Ok(balance)
    }

    /// Value that reached custody without a credit path.
    pub fn credit_custody(&mut self, amount: Amount) -> Result<Amount, GovernanceError> {
        self.treasury.credit_custody(amount)
    }

    /// Debit a manager withdrawal before the payout is dispatched.
    pub fn debit_withdrawal(
        &mut self,
        to: Address,
        amount: Amount,
        by: Address,
        env: &BlockEnv,
    ) -> Result<Amount, GovernanceError> {
        self.config()?;
        if to.is_zero() {
            return Err(GovernanceError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(GovernanceError::ZeroValue);
        }
        let balance = self
            .treasury
            .debit(TransactionKind::Withdrawal, to, amount, env.number)?;
        self.events.push(
            env.number,
            GovernanceEvent::TreasuryWithdrawal {
                to,
                amount,
                by,
                balance,
            },
        );
        info!(to = %to, amount = %amount, by = %by, "Treasury withdrawal");
        Ok(balance)
    }

    /// Reset the tracked balance to custody. Returns the signed delta.
    pub fn reconcile_treasury(&mut self, env: &BlockEnv) -> Result<i128, GovernanceError> {
        self.config()?;
        let (previous, current, delta) = self.treasury.reconcile(env.number);
        self.events.push(
            env.number,
            GovernanceEvent::TreasuryReconciled {
                previous,
                current,
                delta,
            },
        );
        info!(previous = %previous, current = %current, delta, "Treasury reconciled");
        Ok(delta)
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    /// Whole-token multiple, from 1 up to the threshold cap.
    pub fn set_proposal_threshold(
        &mut self,
        value: Amount,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        let decimals = self.decimals;
        self.update_config(
            "proposal_threshold",
            value,
            |v| check_proposal_threshold(v, decimals),
            |c| &mut c.proposal_threshold,
            env,
        )
    }

    /// Delay before voting opens on new proposals. Existing windows are fixed.
    pub fn set_voting_delay(&mut self, value: u64, env: &BlockEnv) -> Result<(), GovernanceError> {
        self.update_config(
            "voting_delay",
            value,
            check_voting_delay,
            |c| &mut c.voting_delay,
            env,
        )
    }

    /// Length of the voting window on new proposals.
    pub fn set_voting_period(
        &mut self,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.update_config(
            "voting_period",
            value,
            check_voting_period,
            |c| &mut c.voting_period,
            env,
        )
    }

    /// Votes needed for a proposal to be queued.
    pub fn set_quorum_votes(&mut self, value: u64, env: &BlockEnv) -> Result<(), GovernanceError> {
        self.update_config(
            "quorum_votes",
            value,
            check_quorum_votes,
            |c| &mut c.quorum_votes,
            env,
        )
    }

    /// Per-voter cap on votes for one proposal.
    pub fn set_max_votes_per_wallet(
        &mut self,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.update_config(
            "max_votes_per_wallet",
            value,
            check_max_votes_per_wallet,
            |c| &mut c.max_votes_per_wallet,
            env,
        )
    }

    /// Minimum spacing between two proposals from the same proposer.
    pub fn set_proposal_cooldown(
        &mut self,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.update_config(
            "proposal_cooldown",
            value,
            check_proposal_cooldown,
            |c| &mut c.proposal_cooldown,
            env,
        )
    }

    /// Applies to proposals already queued as well as future ones.
    pub fn set_timelock_delay(
        &mut self,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.update_config(
            "timelock_delay",
            value,
            check_timelock_delay,
            |c| &mut c.timelock_delay,
            env,
        )
    }

    /// Upper bound on actions attached to one proposal.
    pub fn set_max_actions_per_proposal(
        &mut self,
        value: usize,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.update_config(
            "max_actions_per_proposal",
            value,
            check_max_actions,
            |c| &mut c.max_actions_per_proposal,
            env,
        )
    }

    fn update_config<T, C, F>(
        &mut self,
        parameter: &'static str,
        value: T,
        check: C,
        field: F,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError>
    where
        T: Copy + Display,
        C: FnOnce(T) -> Result<(), ConfigError>,
        F: FnOnce(&mut VotingConfig) -> &mut T,
    {
        let config = self.config.as_mut().ok_or(GovernanceError::NotInitialized)?;
        check(value)?;
        let previous = std::mem::replace(field(config), value);

        self.events.push(
            env.number,
            GovernanceEvent::ConfigUpdated {
                parameter: parameter.to_string(),
                previous: previous.to_string(),
                current: value.to_string(),
            },
        );
        info!(parameter, previous = %previous, current = %value, "Voting config updated");
        Ok(())
    }
}
