//! Treasury ledger.
//!
//! `tracked` is the balance proposals and withdrawals may spend. `custodied`
//! is the value actually held; the two diverge only when funds arrive out of
//! band, and reconciliation resets `tracked` to `custodied`.

use agora_types::{Address, Amount, TypesError};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Kind of treasury movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Explicit deposit
    Deposit,
    /// Plain value received
    Receive,
    /// Manager withdrawal
    Withdrawal,
    /// Value sent by a proposal action
    ActionPayout,
    /// Tracked balance reset to custody
    Reconcile,
}

/// Treasury transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryTransaction {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub counterparty: Option<Address>,
    pub block: u64,
}

/// Treasury balances snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryInfo {
    pub tracked: Amount,
    pub custodied: Amount,
    pub total_deposited: Amount,
    pub total_withdrawn: Amount,
}

#[derive(Debug, Clone, Default)]
pub struct Treasury {
    tracked: Amount,
    custodied: Amount,
    total_deposited: Amount,
    total_withdrawn: Amount,
    transactions: Vec<TreasuryTransaction>,
}

impl Treasury {
    /// Create an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracked balance, moved only by credit and debit paths.
    pub fn balance(&self) -> Amount {
        self.tracked
    }

    /// Value actually held, including anything received untracked.
    pub fn custodied(&self) -> Amount {
        self.custodied
    }

    pub fn info(&self) -> TreasuryInfo {
        TreasuryInfo {
            tracked: self.tracked,
            custodied: self.custodied,
            total_deposited: self.total_deposited,
            total_withdrawn: self.total_withdrawn,
        }
    }

    /// Transaction history, oldest first.
    pub fn transactions(&self) -> &[TreasuryTransaction] {
        &self.transactions
    }

    /// Credit `amount` to both balances. Returns the new tracked balance.
    pub fn credit(
        &mut self,
        kind: TransactionKind,
        from: Address,
        amount: Amount,
        block: u64,
    ) -> Result<Amount, GovernanceError> {
        if amount.is_zero() {
            return Err(GovernanceError::ZeroValue);
        }
        let tracked = self.tracked.checked_add(amount).ok_or(TypesError::AmountOverflow)?;
        let custodied = self.custodied.checked_add(amount).ok_or(TypesError::AmountOverflow)?;
        let deposited = self.total_deposited.saturating_add(amount);

        self.tracked = tracked;
        self.custodied = custodied;
        self.total_deposited = deposited;
        self.transactions.push(TreasuryTransaction {
            kind,
            amount,
            counterparty: Some(from),
            block,
        });
        Ok(tracked)
    }

    /// Value arriving without passing through a credit path.
    pub fn credit_custody(&mut self, amount: Amount) -> Result<Amount, GovernanceError> {
        self.custodied = self.custodied.checked_add(amount).ok_or(TypesError::AmountOverflow)?;
        Ok(self.custodied)
    }

    /// Check that `amount` can be debited from the tracked balance.
    pub fn ensure_available(&self, amount: Amount) -> Result<(), GovernanceError> {
        if amount > self.tracked {
            return Err(GovernanceError::InsufficientTreasury {
                available: self.tracked,
                required: amount,
            });
        }
        Ok(())
    }

    /// Debit `amount` ahead of paying it out. Returns the new tracked balance.
    pub fn debit(
        &mut self,
        kind: TransactionKind,
        to: Address,
        amount: Amount,
        block: u64,
    ) -> Result<Amount, GovernanceError> {
        self.ensure_available(amount)?;
        if amount.is_zero() {
            return Ok(self.tracked);
        }
        self.tracked -= amount;
        self.custodied = self.custodied.saturating_sub(amount);
        self.total_withdrawn = self.total_withdrawn.saturating_add(amount);
        self.transactions.push(TreasuryTransaction {
            kind,
            amount,
            counterparty: Some(to),
            block,
        });
        Ok(self.tracked)
    }

    /// Set the tracked balance to the custodied one.
    ///
    /// Returns `(previous, current, delta)` with `delta = current - previous`.
    pub fn reconcile(&mut self, block: u64) -> (Amount, Amount, i128) {
        let previous = self.tracked;
        let current = self.custodied;
        let delta = current.signed_delta(previous);
        self.tracked = current;
        if delta != 0 {
            self.transactions.push(TreasuryTransaction {
                kind: TransactionKind::Reconcile,
                amount: Amount::new(delta.unsigned_abs()),
                counterparty: None,
                block,
            });
        }
        (previous, current, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depositor() -> Address {
        Address::derive(b"depositor")
    }

    #[test]
    fn test_credit_and_debit() {
        let mut treasury = Treasury::new();
        treasury
            .credit(TransactionKind::Deposit, depositor(), Amount::new(500), 1)
            .unwrap();
        assert_eq!(treasury.balance(), Amount::new(500));
        assert_eq!(treasury.custodied(), Amount::new(500));

        let left = treasury
            .debit(TransactionKind::Withdrawal, depositor(), Amount::new(200), 2)
            .unwrap();
        assert_eq!(left, Amount::new(300));

        let info = treasury.info();
        assert_eq!(info.total_deposited, Amount::new(500));
        assert_eq!(info.total_withdrawn, Amount::new(200));
        assert_eq!(treasury.transactions().len(), 2);
    }

    #[test]
    fn test_zero_credit_rejected() {
        let mut treasury = Treasury::new();
        assert_eq!(
            treasury.credit(TransactionKind::Deposit, depositor(), Amount::ZERO, 1),
            Err(GovernanceError::ZeroValue)
        );
    }

    #[test]
    fn test_overdraw_rejected() {
        let mut treasury = Treasury::new();
        treasury
            .credit(TransactionKind::Receive, depositor(), Amount::new(10), 1)
            .unwrap();

        let result = treasury.debit(TransactionKind::Withdrawal, depositor(), Amount::new(11), 2);
        assert_eq!(
            result,
            Err(GovernanceError::InsufficientTreasury {
                available: Amount::new(10),
                required: Amount::new(11),
            })
        );
        assert_eq!(treasury.balance(), Amount::new(10));
    }

    #[test]
    fn test_reconcile_signed_delta() {
        let mut treasury = Treasury::new();
        treasury
            .credit(TransactionKind::Deposit, depositor(), Amount::new(500), 1)
            .unwrap();
        treasury.credit_custody(Amount::new(100)).unwrap();

        assert_eq!(
            treasury.reconcile(2),
            (Amount::new(500), Amount::new(600), 100)
        );
        assert_eq!(treasury.balance(), Amount::new(600));

        // nothing to correct the second time
        assert_eq!(treasury.reconcile(3).2, 0);
    }
}
