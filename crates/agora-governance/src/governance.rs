//! Unified governance surface.
//!
//! [`Governance`] composes the voting-power ledger and the proposal engine
//! behind one API, checks caller roles through the injected [`Authority`],
//! and runs the two operations that call out (proposal execution and
//! treasury withdrawal) under a reentrancy guard with full rollback.

use agora_types::{Address, Amount, BlockEnv};
use tracing::{info, warn};

use crate::access::{Authority, Role};
use crate::config::{TokenConfig, VotingConfig};
use crate::dispatch::{ActionDispatcher, OutboundCall};
use crate::engine::GovernanceEngine;
use crate::error::GovernanceError;
use crate::events::{EventLog, GovernanceEvent, LedgerEvent};
use crate::ledger::{VotesLedger, VotingPowerLedger};
use crate::proposal::{ProposalAction, ProposalState, ProposalView};
use crate::reentrancy::ReentrancyGuard;
use crate::treasury::{TransactionKind, TreasuryInfo};

/// State restored when a call-out operation fails.
struct Snapshot {
    ledger: VotingPowerLedger,
    engine: GovernanceEngine,
}

/// Ledger, engine and roles behind one address.
pub struct Governance {
    ledger: VotingPowerLedger,
    engine: GovernanceEngine,
    authority: Box<dyn Authority>,
    guard: ReentrancyGuard,
}

impl Governance {
    /// Build an uninitialized instance for `token`, checking roles with
    /// `authority`. Governance operations fail until [`Self::initialize`].
    pub fn new(
        token: TokenConfig,
        authority: impl Authority + 'static,
    ) -> Result<Self, GovernanceError> {
        token.validate()?;
        let engine = GovernanceEngine::new(token.decimals);
        Ok(Self {
            ledger: VotingPowerLedger::new(token),
            engine,
            authority: Box::new(authority),
            guard: ReentrancyGuard::new(),
        })
    }

    pub fn ledger(&self) -> &VotingPowerLedger {
        &self.ledger
    }

    pub fn engine(&self) -> &GovernanceEngine {
        &self.engine
    }

    pub fn authority(&self) -> &dyn Authority {
        self.authority.as_ref()
    }

    fn require_role(&self, role: Role, caller: Address) -> Result<(), GovernanceError> {
        if self.authority.has_role(role, &caller) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized { caller, role })
        }
    }

    /// Initialized, and `caller` holds `role`.
    fn require_configured(&self, role: Role, caller: Address) -> Result<(), GovernanceError> {
        self.engine.config()?;
        self.require_role(role, caller)
    }

    /// One-time setup of the voting parameters. Initializer only.
    pub fn initialize(
        &mut self,
        caller: Address,
        config: VotingConfig,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_role(Role::Initializer, caller)?;
        self.engine.initialize(config, caller, env)
    }

    // ---------------------------------------------------------------------
    // Token
    // ---------------------------------------------------------------------

    /// Grant or revoke minting rights. Owner only.
    pub fn set_minter(
        &mut self,
        caller: Address,
        account: Address,
        enabled: bool,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_role(Role::Owner, caller)?;
        Ok(self.ledger.set_minter(account, enabled, env.number)?)
    }

    /// Block `transfer` and `transfer_from`. Owner only.
    ///
    /// Minting, burning, approvals, delegation and voting stay live.
    pub fn pause(&mut self, caller: Address, env: &BlockEnv) -> Result<(), GovernanceError> {
        self.require_role(Role::Owner, caller)?;
        self.ledger.set_paused(true, caller, env.number);
        info!(by = %caller, "Token transfers paused");
        Ok(())
    }

    /// Lift a pause. Owner only.
    pub fn unpause(&mut self, caller: Address, env: &BlockEnv) -> Result<(), GovernanceError> {
        self.require_role(Role::Owner, caller)?;
        self.ledger.set_paused(false, caller, env.number);
        info!(by = %caller, "Token transfers unpaused");
        Ok(())
    }

    /// Mint to `to`. The caller must be a minter.
    pub fn mint(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        Ok(self.ledger.mint(caller, to, amount, env.number)?)
    }

    /// Burn from the caller's own balance.
    pub fn burn(
        &mut self,
        caller: Address,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        Ok(self.ledger.burn(caller, amount, env.number)?)
    }

    /// Move tokens and the voting power that follows them.
    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        Ok(self.ledger.transfer(caller, to, amount, env.number)?)
    }

    /// Set `spender`'s allowance over `caller`'s balance.
    pub fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        Ok(self.ledger.approve(caller, spender, amount, env.number)?)
    }

    /// Spend `caller`'s allowance over `from`'s balance.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        Ok(self.ledger.transfer_from(caller, from, to, amount, env.number)?)
    }

    /// Delegate the caller's voting power to `delegatee`.
    pub fn delegate_votes(
        &mut self,
        caller: Address,
        delegatee: Address,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        Ok(self.ledger.delegate(caller, delegatee, env.number)?)
    }

    /// Point the caller's voting power back at itself.
    pub fn revoke_delegation(
        &mut self,
        caller: Address,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        Ok(self.ledger.delegate(caller, caller, env.number)?)
    }

    // ---------------------------------------------------------------------
    // Proposals
    // ---------------------------------------------------------------------

    /// Create a proposal. Returns its id.
    pub fn propose(
        &mut self,
        caller: Address,
        title: impl Into<String>,
        content_pointer: impl Into<String>,
        actions: Vec<ProposalAction>,
        env: &BlockEnv,
    ) -> Result<u64, GovernanceError> {
        self.engine.propose(
            &self.ledger,
            caller,
            title.into(),
            content_pointer.into(),
            actions,
            env,
        )
    }

    /// Cast `votes` votes. Returns the token cost burned from the caller.
    pub fn vote(
        &mut self,
        caller: Address,
        proposal_id: u64,
        votes: u64,
        env: &BlockEnv,
    ) -> Result<Amount, GovernanceError> {
        self.engine
            .cast_vote(&mut self.ledger, proposal_id, caller, votes, env)
    }

    /// Queue a proposal for execution. Owner only. Returns the eta.
    pub fn queue_proposal(
        &mut self,
        caller: Address,
        proposal_id: u64,
        env: &BlockEnv,
    ) -> Result<u64, GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.queue(proposal_id, env)
    }

    /// Cancel a proposal. The proposer may do so until it is queued, the
    /// owner until it executes or expires.
    pub fn cancel_proposal(
        &mut self,
        caller: Address,
        proposal_id: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        let is_owner = self.authority.has_role(Role::Owner, &caller);
        self.engine.cancel(proposal_id, caller, is_owner, env)
    }

    /// Run every action of a queued proposal, all or nothing. Owner only.
    ///
    /// The proposal is marked executed and each action's value is debited
    /// before that action is dispatched. Any failure restores the ledger and
    /// engine to their state before the call.
    pub fn execute_proposal(
        &mut self,
        caller: Address,
        proposal_id: u64,
        env: &BlockEnv,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Result<(), GovernanceError> {
        self.guard.enter("execute_proposal", caller)?;
        if let Err(err) = self.require_configured(Role::Owner, caller) {
            self.guard.exit();
            return Err(err);
        }
        let snapshot = self.snapshot();

        let result = self.run_actions(proposal_id, env, dispatcher);
        if let Err(err) = &result {
            self.restore(snapshot);
            warn!(proposal_id, error = %err, "Proposal execution rolled back");
        }

        self.guard.exit();
        result
    }

    fn run_actions(
        &mut self,
        proposal_id: u64,
        env: &BlockEnv,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Result<(), GovernanceError> {
        let actions = self.engine.begin_execution(proposal_id, env)?;
        for (index, action) in actions.iter().enumerate() {
            self.engine.pay_action(action, env)?;

            let call = OutboundCall {
                target: action.target,
                value: action.value,
                payload: action.payload.clone(),
            };
            dispatcher
                .dispatch(self, &call)
                .map_err(|revert| GovernanceError::ActionExecutionFailed {
                    index,
                    reason: revert.into_reason(),
                })?;

            self.engine.record_action(proposal_id, index, action, env);
        }
        self.engine.complete_execution(proposal_id, env);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Treasury
    // ---------------------------------------------------------------------

    /// Explicit deposit from `caller`. Returns the new tracked balance.
    pub fn deposit_to_treasury(
        &mut self,
        caller: Address,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<Amount, GovernanceError> {
        self.engine
            .credit_treasury(TransactionKind::Deposit, caller, amount, env)
    }

    /// Plain value sent to the governance address.
    pub fn receive(
        &mut self,
        from: Address,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<Amount, GovernanceError> {
        self.engine
            .credit_treasury(TransactionKind::Receive, from, amount, env)
    }

    /// Value that reached custody bypassing both credit paths.
    pub fn credit_custody(&mut self, amount: Amount) -> Result<Amount, GovernanceError> {
        self.engine.credit_custody(amount)
    }

    /// Pay `amount` to an account without code. Treasury manager only.
    pub fn withdraw_from_treasury(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
        env: &BlockEnv,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Result<(), GovernanceError> {
        self.guard.enter("withdraw_from_treasury", caller)?;
        let allowed = self
            .require_configured(Role::TreasuryManager, caller)
            .and_then(|()| {
                if dispatcher.is_contract(&to) {
                    Err(GovernanceError::RecipientIsContract(to))
                } else {
                    Ok(())
                }
            });
        if let Err(err) = allowed {
            self.guard.exit();
            return Err(err);
        }
        let snapshot = self.snapshot();

        let result = self.run_withdrawal(caller, to, amount, env, dispatcher);
        if let Err(err) = &result {
            self.restore(snapshot);
            warn!(to = %to, amount = %amount, error = %err, "Treasury withdrawal rolled back");
        }

        self.guard.exit();
        result
    }

    fn run_withdrawal(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
        env: &BlockEnv,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Result<(), GovernanceError> {
        self.engine.debit_withdrawal(to, amount, caller, env)?;

        let call = OutboundCall {
            target: to,
            value: amount,
            payload: Vec::new(),
        };
        dispatcher
            .dispatch(self, &call)
            .map_err(|revert| GovernanceError::TransferFailed {
                to,
                reason: revert.into_reason(),
            })?;
        Ok(())
    }

    /// Reset the tracked treasury balance to custody. Owner only.
    ///
    /// Returns the signed change of the tracked balance.
    pub fn reconcile_treasury_balance(
        &mut self,
        caller: Address,
        env: &BlockEnv,
    ) -> Result<i128, GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.reconcile_treasury(env)
    }

    // ---------------------------------------------------------------------
    // Configuration (owner only)
    // ---------------------------------------------------------------------

    /// Voting power needed to create a proposal.
    pub fn set_proposal_threshold(
        &mut self,
        caller: Address,
        value: Amount,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.set_proposal_threshold(value, env)
    }

    /// Seconds between creation and the start of voting. Applies to proposals
    /// created afterwards.
    pub fn set_voting_delay(
        &mut self,
        caller: Address,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.set_voting_delay(value, env)
    }

    /// Length of the voting window in seconds.
    pub fn set_voting_period(
        &mut self,
        caller: Address,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.set_voting_period(value, env)
    }

    /// Raw vote count a proposal needs before it can be queued.
    pub fn set_quorum_votes(
        &mut self,
        caller: Address,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.set_quorum_votes(value, env)
    }

    /// Most votes one account may cast on one proposal.
    pub fn set_max_votes_per_wallet(
        &mut self,
        caller: Address,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.set_max_votes_per_wallet(value, env)
    }

    /// Seconds a proposer waits between proposals.
    pub fn set_proposal_cooldown(
        &mut self,
        caller: Address,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.set_proposal_cooldown(value, env)
    }

    /// Delay between queueing and execution. Also moves the window of
    /// proposals already queued.
    pub fn set_timelock_delay(
        &mut self,
        caller: Address,
        value: u64,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.set_timelock_delay(value, env)
    }

    /// Cap on actions per proposal.
    pub fn set_max_actions_per_proposal(
        &mut self,
        caller: Address,
        value: usize,
        env: &BlockEnv,
    ) -> Result<(), GovernanceError> {
        self.require_configured(Role::Owner, caller)?;
        self.engine.set_max_actions_per_proposal(value, env)
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    /// Proposal fields and state as of `now`.
    pub fn proposal(&self, proposal_id: u64, now: u64) -> Result<ProposalView, GovernanceError> {
        self.engine.proposal_view(proposal_id, now)
    }

    /// Actions in execution order.
    pub fn proposal_actions(&self, proposal_id: u64) -> Result<&[ProposalAction], GovernanceError> {
        self.engine.proposal_actions(proposal_id)
    }

    /// Derived state at `now` under the current timelock.
    pub fn proposal_state(
        &self,
        proposal_id: u64,
        now: u64,
    ) -> Result<ProposalState, GovernanceError> {
        self.engine.proposal_state(proposal_id, now)
    }

    /// Votes `voter` cast on the proposal, 0 if none.
    pub fn votes_of(&self, proposal_id: u64, voter: &Address) -> Result<u64, GovernanceError> {
        self.engine.votes_of(proposal_id, voter)
    }

    pub fn has_voted(&self, proposal_id: u64, voter: &Address) -> Result<bool, GovernanceError> {
        self.engine.has_voted(proposal_id, voter)
    }

    /// Number of proposals created. Also the latest id.
    pub fn proposal_count(&self) -> u64 {
        self.engine.proposal_count()
    }

    /// Timestamp of `proposer`'s latest proposal.
    pub fn last_proposal_time(&self, proposer: &Address) -> Option<u64> {
        self.engine.last_proposal_time(proposer)
    }

    /// Current voting configuration, or `NotInitialized`.
    pub fn voting_config(&self) -> Result<&VotingConfig, GovernanceError> {
        self.engine.config()
    }

    /// Tracked and custodied balances with lifetime totals.
    pub fn treasury_info(&self) -> TreasuryInfo {
        self.engine.treasury_info()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.ledger.balance_of(account)
    }

    /// Voting power delegated to `account` right now.
    pub fn current_voting_power(&self, account: &Address) -> Amount {
        self.ledger.current_voting_power(account)
    }

    /// Voting power of `account` at a past `block`. The current block and
    /// later are rejected.
    pub fn voting_power_at(
        &self,
        account: &Address,
        block: u64,
        env: &BlockEnv,
    ) -> Result<Amount, GovernanceError> {
        Ok(self.ledger.voting_power_at(account, block, env.number)?)
    }

    /// Who `account` delegates to. Itself unless changed.
    pub fn delegates(&self, account: &Address) -> Address {
        self.ledger.delegates(account)
    }

    /// Governance operation log.
    pub fn events(&self) -> &EventLog<GovernanceEvent> {
        self.engine.events()
    }

    /// Token ledger operation log.
    pub fn ledger_events(&self) -> &EventLog<LedgerEvent> {
        self.ledger.events()
    }

    /// True while an execution or withdrawal is dispatching.
    pub fn is_executing(&self) -> bool {
        self.guard.is_locked()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            ledger: self.ledger.clone(),
            engine: self.engine.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.ledger = snapshot.ledger;
        self.engine = snapshot.engine;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::RoleRegistry;
    use crate::config::{DAY, MAX_PROPOSAL_COOLDOWN, MAX_VOTING_DELAY};
    use crate::dispatch::RecordingDispatcher;
    use crate::error::ConfigError;

    fn addr(seed: &str) -> Address {
        Address::derive(seed.as_bytes())
    }

    fn setup() -> (Governance, BlockEnv) {
        let admin = addr("admin");
        let env = BlockEnv::new(1, 1_700_000_000);
        let mut gov =
            Governance::new(TokenConfig::default(), RoleRegistry::with_admin(admin)).unwrap();
        gov.initialize(admin, VotingConfig::default(), &env).unwrap();
        (gov, env)
    }

    #[test]
    fn test_roles_enforced() {
        let (mut gov, env) = setup();
        let mallory = addr("mallory");

        assert_eq!(
            gov.set_quorum_votes(mallory, 5, &env),
            Err(GovernanceError::Unauthorized {
                caller: mallory,
                role: Role::Owner
            })
        );
        assert_eq!(
            gov.initialize(mallory, VotingConfig::default(), &env),
            Err(GovernanceError::Unauthorized {
                caller: mallory,
                role: Role::Initializer
            })
        );
        assert_eq!(
            gov.initialize(addr("admin"), VotingConfig::default(), &env),
            Err(GovernanceError::AlreadyInitialized)
        );
        assert!(gov.pause(mallory, &env).is_err());
    }

    #[test]
    fn test_uninitialized_rejects_governance_ops() {
        let admin = addr("admin");
        let env = BlockEnv::new(1, 1_700_000_000);
        let mut gov =
            Governance::new(TokenConfig::default(), RoleRegistry::with_admin(admin)).unwrap();
        let mut dispatcher = RecordingDispatcher::new();

        assert_eq!(
            gov.deposit_to_treasury(admin, Amount::new(1), &env),
            Err(GovernanceError::NotInitialized)
        );
        assert_eq!(
            gov.execute_proposal(admin, 1, &env, &mut dispatcher),
            Err(GovernanceError::NotInitialized)
        );
        assert_eq!(
            gov.set_quorum_votes(admin, 5, &env),
            Err(GovernanceError::NotInitialized)
        );
        assert_eq!(gov.voting_config(), Err(GovernanceError::NotInitialized));
        assert!(!gov.is_executing());

        // ledger operations do not depend on governance setup
        gov.set_minter(admin, admin, true, &env).unwrap();
        gov.mint(admin, admin, Amount::new(10), &env).unwrap();
        gov.delegate_votes(admin, addr("bob"), &env).unwrap();
        assert_eq!(gov.current_voting_power(&addr("bob")), Amount::new(10));
    }

    #[test]
    fn test_withdraw_rules() {
        let (mut gov, env) = setup();
        let admin = addr("admin");
        let contract = addr("vault");
        let alice = addr("alice");
        let mut dispatcher = RecordingDispatcher::new();
        dispatcher.mark_contract(contract);

        gov.deposit_to_treasury(alice, Amount::new(1_000), &env).unwrap();

        assert_eq!(
            gov.withdraw_from_treasury(admin, contract, Amount::new(1), &env, &mut dispatcher),
            Err(GovernanceError::RecipientIsContract(contract))
        );
        assert!(matches!(
            gov.withdraw_from_treasury(alice, alice, Amount::new(1), &env, &mut dispatcher),
            Err(GovernanceError::Unauthorized { role: Role::TreasuryManager, .. })
        ));
        assert!(matches!(
            gov.withdraw_from_treasury(admin, alice, Amount::new(1_001), &env, &mut dispatcher),
            Err(GovernanceError::InsufficientTreasury { .. })
        ));

        gov.withdraw_from_treasury(admin, alice, Amount::new(400), &env, &mut dispatcher)
            .unwrap();
        assert_eq!(gov.treasury_info().tracked, Amount::new(600));
        assert_eq!(dispatcher.received(&alice), Amount::new(400));
    }

    #[test]
    fn test_failed_withdrawal_rolls_back() {
        let (mut gov, env) = setup();
        let admin = addr("admin");
        let alice = addr("alice");
        let mut dispatcher = RecordingDispatcher::new();
        dispatcher.revert_on(alice, None);

        gov.deposit_to_treasury(alice, Amount::new(1_000), &env).unwrap();
        let events_before = gov.events().len();

        let result =
            gov.withdraw_from_treasury(admin, alice, Amount::new(400), &env, &mut dispatcher);
        assert_eq!(
            result,
            Err(GovernanceError::TransferFailed {
                to: alice,
                reason: crate::dispatch::NO_REVERT_REASON.to_string()
            })
        );
        assert_eq!(gov.treasury_info().tracked, Amount::new(1_000));
        assert_eq!(gov.events().len(), events_before);
        assert!(!gov.is_executing());
    }

    #[test]
    fn test_receive_credits_tracked_and_custody() {
        let (mut gov, env) = setup();
        let sender = addr("sender");

        assert_eq!(
            gov.receive(sender, Amount::ZERO, &env),
            Err(GovernanceError::ZeroValue)
        );
        assert_eq!(gov.receive(sender, Amount::new(250), &env), Ok(Amount::new(250)));
        gov.deposit_to_treasury(sender, Amount::new(50), &env).unwrap();

        let info = gov.treasury_info();
        assert_eq!(info.tracked, Amount::new(300));
        assert_eq!(info.custodied, Amount::new(300));
        assert_eq!(gov.reconcile_treasury_balance(addr("admin"), &env), Ok(0));
    }

    #[test]
    fn test_delay_and_cooldown_setters() {
        let (mut gov, env) = setup();
        let admin = addr("admin");

        gov.set_voting_delay(admin, 0, &env).unwrap();
        gov.set_voting_delay(admin, MAX_VOTING_DELAY, &env).unwrap();
        assert!(matches!(
            gov.set_voting_delay(admin, MAX_VOTING_DELAY + 1, &env),
            Err(GovernanceError::Config(ConfigError::OutOfRange { .. }))
        ));
        assert_eq!(gov.voting_config().unwrap().voting_delay, MAX_VOTING_DELAY);

        gov.set_proposal_cooldown(admin, 2 * DAY, &env).unwrap();
        assert!(matches!(
            gov.set_proposal_cooldown(admin, MAX_PROPOSAL_COOLDOWN + 1, &env),
            Err(GovernanceError::Config(ConfigError::OutOfRange { .. }))
        ));
        assert_eq!(gov.voting_config().unwrap().proposal_cooldown, 2 * DAY);
        assert!(matches!(
            gov.events().last(),
            Some(GovernanceEvent::ConfigUpdated { parameter, previous, current })
                if parameter == "proposal_cooldown"
                    && *previous == DAY.to_string()
                    && *current == (2 * DAY).to_string()
        ));
    }

    #[test]
    fn test_rejected_callout_leaves_guard_released() {
        let (mut gov, env) = setup();
        let (admin, mallory) = (addr("admin"), addr("mallory"));
        let mut dispatcher = RecordingDispatcher::new();
        gov.deposit_to_treasury(admin, Amount::new(100), &env).unwrap();
        let events_before = gov.events().len();

        assert!(matches!(
            gov.execute_proposal(mallory, 1, &env, &mut dispatcher),
            Err(GovernanceError::Unauthorized { role: Role::Owner, .. })
        ));
        assert!(matches!(
            gov.withdraw_from_treasury(mallory, mallory, Amount::new(1), &env, &mut dispatcher),
            Err(GovernanceError::Unauthorized { role: Role::TreasuryManager, .. })
        ));
        assert!(!gov.is_executing());
        assert_eq!(gov.events().len(), events_before);

        // the guard was released, so an authorized call goes through
        gov.withdraw_from_treasury(admin, mallory, Amount::new(1), &env, &mut dispatcher)
            .unwrap();
        assert_eq!(dispatcher.received(&mallory), Amount::new(1));
    }
}
