//! Checkpointed, delegatable voting-power ledger.
//!
//! Balances carry voting power to the holder's delegatee (the holder itself
//! unless it delegated). Every balance change moves power between the
//! delegatees of the two parties and records a checkpoint at the current
//! block, so past voting power can be read back with a binary search.
//!
//! Each mutating operation validates everything before its first write; a
//! failed call leaves the ledger untouched.

use std::collections::{BTreeMap, BTreeSet};

use agora_types::{Address, Amount};
use tracing::debug;

use crate::checkpoint::{Checkpoint, CheckpointHistory};
use crate::config::TokenConfig;
use crate::error::LedgerError;
use crate::events::{EventLog, LedgerEvent};

/// Ledger surface used by the governance engine.
pub trait VotesLedger {
    /// Fractional digits of one token.
    fn decimals(&self) -> u8;

    /// Voting power as of the latest checkpoint.
    fn current_voting_power(&self, account: &Address) -> Amount;

    /// Voting power at a past `block`. Fails unless `block < current_block`.
    fn voting_power_at(
        &self,
        account: &Address,
        block: u64,
        current_block: u64,
    ) -> Result<Amount, LedgerError>;

    /// Destroy `amount` of `from`'s balance and the voting power it carries.
    fn burn(&mut self, from: Address, amount: Amount, block: u64) -> Result<(), LedgerError>;

    /// Re-point `delegator`'s voting power to `delegatee`.
    fn delegate(
        &mut self,
        delegator: Address,
        delegatee: Address,
        block: u64,
    ) -> Result<(), LedgerError>;

    /// Address receiving `account`'s voting power.
    fn delegates(&self, account: &Address) -> Address;
}

/// Pending checkpoint write computed during validation.
struct PowerUpdate {
    account: Address,
    previous: Amount,
    current: Amount,
}

/// Token balances with delegated, checkpointed voting power.
#[derive(Debug, Clone)]
pub struct VotingPowerLedger {
    token: TokenConfig,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
    /// Only explicit delegations; absent means self
    delegations: BTreeMap<Address, Address>,
    checkpoints: BTreeMap<Address, CheckpointHistory>,
    minters: BTreeSet<Address>,
    paused: bool,
    events: EventLog<LedgerEvent>,
}

impl VotingPowerLedger {
    /// Empty ledger for `token`, with no minters and nothing paused.
    pub fn new(token: TokenConfig) -> Self {
        Self {
            token,
            total_supply: Amount::ZERO,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            delegations: BTreeMap::new(),
            checkpoints: BTreeMap::new(),
            minters: BTreeSet::new(),
            paused: false,
            events: EventLog::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.token.name
    }

    pub fn symbol(&self) -> &str {
        &self.token.symbol
    }

    /// Tokens in circulation, never above `max_supply`.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Cap on `total_supply`; minting past it fails.
    pub fn max_supply(&self) -> Amount {
        self.token.max_supply
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Amount `spender` may still move out of `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn is_minter(&self, account: &Address) -> bool {
        self.minters.contains(account)
    }

    /// True while transfers are blocked.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of checkpoints recorded for `account` as a delegatee.
    pub fn num_checkpoints(&self, account: &Address) -> usize {
        self.checkpoints.get(account).map_or(0, CheckpointHistory::len)
    }

    /// The `index`-th checkpoint of `account`, oldest first.
    pub fn checkpoint(&self, account: &Address, index: usize) -> Option<Checkpoint> {
        self.checkpoints.get(account).and_then(|h| h.get(index)).copied()
    }

    /// Full checkpoint history of `account`, oldest first.
    pub fn checkpoints(&self, account: &Address) -> &[Checkpoint] {
        self.checkpoints
            .get(account)
            .map(CheckpointHistory::as_slice)
            .unwrap_or(&[])
    }

    /// Sum of all balances; equals `total_supply` at all times.
    pub fn sum_of_balances(&self) -> Amount {
        self.balances.values().copied().sum()
    }

    /// Ledger operation log.
    pub fn events(&self) -> &EventLog<LedgerEvent> {
        &self.events
    }

    // ---------------------------------------------------------------------
    // Administration (role checks happen in the facade)
    // ---------------------------------------------------------------------

    /// Add `account` to the minter set, or remove it.
    pub fn set_minter(
        &mut self,
        account: Address,
        enabled: bool,
        block: u64,
    ) -> Result<(), LedgerError> {
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if enabled {
            self.minters.insert(account);
        } else {
            self.minters.remove(&account);
        }
        self.events.push(block, LedgerEvent::MinterUpdated { account, enabled });
        debug!(account = %account, enabled, "Minter updated");
        Ok(())
    }

    /// Set the pause flag. Only `transfer` and `transfer_from` honour it.
    pub fn set_paused(&mut self, paused: bool, by: Address, block: u64) {
        self.paused = paused;
        let event = if paused {
            LedgerEvent::Paused { by }
        } else {
            LedgerEvent::Unpaused { by }
        };
        self.events.push(block, event);
        debug!(paused, by = %by, "Ledger pause flag changed");
    }

    // ---------------------------------------------------------------------
    // Supply
    // ---------------------------------------------------------------------

    /// Mint `amount` to `to`. `minter` must be in the minter set.
    pub fn mint(
        &mut self,
        minter: Address,
        to: Address,
        amount: Amount,
        block: u64,
    ) -> Result<(), LedgerError> {
        if !self.is_minter(&minter) {
            return Err(LedgerError::NotMinter(minter));
        }
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .filter(|supply| *supply <= self.token.max_supply)
            .ok_or(LedgerError::MaxSupplyExceeded {
                requested: amount,
                max_supply: self.token.max_supply,
            })?;

        let dst = self.delegates(&to);
        self.move_voting_power(None, Some(dst), amount, block)?;

        self.total_supply = new_supply;
        *self.balances.entry(to).or_insert(Amount::ZERO) += amount;
        self.events.push(
            block,
            LedgerEvent::Transfer {
                from: Address::ZERO,
                to,
                amount,
            },
        );
        debug!(to = %to, amount = %amount, supply = %new_supply, "Minted");
        Ok(())
    }

    fn burn_from(&mut self, from: Address, amount: Amount, block: u64) -> Result<(), LedgerError> {
        if from.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let balance = self.balance_of(&from);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: from,
                available: balance,
                required: amount,
            })?;

        let src = self.delegates(&from);
        self.move_voting_power(Some(src), None, amount, block)?;

        self.set_balance(from, remaining);
        self.total_supply -= amount;
        self.events.push(
            block,
            LedgerEvent::Transfer {
                from,
                to: Address::ZERO,
                amount,
            },
        );
        debug!(from = %from, amount = %amount, "Burned");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Transfers
    // ---------------------------------------------------------------------

    /// Move `amount` from `from` to `to`, carrying voting power between
    /// their delegatees. Fails while paused.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        block: u64,
    ) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::TokenPaused);
        }
        self.transfer_unchecked_pause(from, to, amount, block)
    }

    /// Set `spender`'s allowance over `owner`. Zero clears it.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
        block: u64,
    ) -> Result<(), LedgerError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
        self.events.push(
            block,
            LedgerEvent::Approval {
                owner,
                spender,
                amount,
            },
        );
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// An allowance of `Amount::MAX` is never decremented.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
        block: u64,
    ) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::TokenPaused);
        }
        let allowance = self.allowance(&from, &spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                available: allowance,
                required: amount,
            });
        }

        self.transfer_unchecked_pause(from, to, amount, block)?;

        if allowance != Amount::MAX {
            let remaining = allowance - amount;
            if remaining.is_zero() {
                self.allowances.remove(&(from, spender));
            } else {
                self.allowances.insert((from, spender), remaining);
            }
        }
        Ok(())
    }

    fn transfer_unchecked_pause(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        block: u64,
    ) -> Result<(), LedgerError> {
        if from.is_zero() || to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                available: balance,
                required: amount,
            });
        }

        let src = self.delegates(&from);
        let dst = self.delegates(&to);
        self.move_voting_power(Some(src), Some(dst), amount, block)?;

        self.set_balance(from, balance - amount);
        *self.balances.entry(to).or_insert(Amount::ZERO) += amount;
        self.events.push(block, LedgerEvent::Transfer { from, to, amount });
        debug!(from = %from, to = %to, amount = %amount, "Transferred");
        Ok(())
    }

    fn set_balance(&mut self, account: Address, balance: Amount) {
        if balance.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }

    // ---------------------------------------------------------------------
    // Delegation
    // ---------------------------------------------------------------------

    /// Re-point `delegator`'s voting power to `delegatee` in one step.
    pub fn delegate_votes(
        &mut self,
        delegator: Address,
        delegatee: Address,
        block: u64,
    ) -> Result<(), LedgerError> {
        if delegator.is_zero() || delegatee.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let previous = self.delegates(&delegator);
        let balance = self.balance_of(&delegator);

        self.move_voting_power(Some(previous), Some(delegatee), balance, block)?;

        if delegatee == delegator {
            self.delegations.remove(&delegator);
        } else {
            self.delegations.insert(delegator, delegatee);
        }
        self.events.push(
            block,
            LedgerEvent::DelegateChanged {
                delegator,
                from_delegate: previous,
                to_delegate: delegatee,
            },
        );
        debug!(
            delegator = %delegator,
            from = %previous,
            to = %delegatee,
            moved = %balance,
            "Delegation changed"
        );
        Ok(())
    }

    /// Move `amount` of voting power from `src` to `dst` at `block`.
    ///
    /// `None` stands for the mint/burn side. Both new checkpoint values are
    /// validated before either is written.
    fn move_voting_power(
        &mut self,
        src: Option<Address>,
        dst: Option<Address>,
        amount: Amount,
        block: u64,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() || src == dst {
            return Ok(());
        }

        let src_update = match src {
            Some(account) => {
                let previous = self.current_voting_power(&account);
                let current = previous
                    .checked_sub(amount)
                    .ok_or(LedgerError::VotingPowerUnderflow {
                        account,
                        available: previous,
                        required: amount,
                    })?;
                self.check_power_write(account, block, current)?;
                Some(PowerUpdate {
                    account,
                    previous,
                    current,
                })
            }
            None => None,
        };

        let dst_update = match dst {
            Some(account) => {
                let previous = self.current_voting_power(&account);
                let current = previous
                    .checked_add(amount)
                    .ok_or(LedgerError::CheckpointOverflow {
                        account,
                        value: u128::MAX,
                    })?;
                self.check_power_write(account, block, current)?;
                Some(PowerUpdate {
                    account,
                    previous,
                    current,
                })
            }
            None => None,
        };

        for update in src_update.into_iter().chain(dst_update) {
            self.checkpoints
                .entry(update.account)
                .or_default()
                .write(update.account, block, update.current)?;
            self.events.push(
                block,
                LedgerEvent::DelegateVotesChanged {
                    delegate: update.account,
                    previous: update.previous,
                    current: update.current,
                },
            );
        }
        Ok(())
    }

    fn check_power_write(
        &self,
        account: Address,
        block: u64,
        votes: Amount,
    ) -> Result<(), LedgerError> {
        match self.checkpoints.get(&account) {
            Some(history) => history.check_write(account, block, votes),
            None => CheckpointHistory::new().check_write(account, block, votes),
        }
    }
}

impl VotesLedger for VotingPowerLedger {
    fn decimals(&self) -> u8 {
        self.token.decimals
    }

    fn current_voting_power(&self, account: &Address) -> Amount {
        self.checkpoints
            .get(account)
            .map_or(Amount::ZERO, CheckpointHistory::latest)
    }

    fn voting_power_at(
        &self,
        account: &Address,
        block: u64,
        current_block: u64,
    ) -> Result<Amount, LedgerError> {
        if block >= current_block {
            return Err(LedgerError::BlockNotYetMined {
                requested: block,
                current: current_block,
            });
        }
        Ok(self
            .checkpoints
            .get(account)
            .map_or(Amount::ZERO, |h| h.value_at(block)))
    }

    fn burn(&mut self, from: Address, amount: Amount, block: u64) -> Result<(), LedgerError> {
        self.burn_from(from, amount, block)
    }

    fn delegate(
        &mut self,
        delegator: Address,
        delegatee: Address,
        block: u64,
    ) -> Result<(), LedgerError> {
        self.delegate_votes(delegator, delegatee, block)
    }

    fn delegates(&self, account: &Address) -> Address {
        self.delegations.get(account).copied().unwrap_or(*account)
    }
}
