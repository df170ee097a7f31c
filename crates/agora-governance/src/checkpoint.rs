//! Per-account voting-power history.
//!
//! Each account owns an append-only series of `(from_block, votes)` pairs with
//! non-decreasing heights. Writing twice at one height overwrites the last
//! entry, so there is at most one checkpoint per block.

use agora_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Largest voting power a single checkpoint can hold (96-bit values).
pub const MAX_CHECKPOINT_VOTES: u128 = (1u128 << 96) - 1;

/// A recorded change of voting power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Block at which this value became effective
    pub from_block: u64,
    /// Voting power from `from_block` onward
    pub votes: Amount,
}

/// Ordered checkpoint series for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointHistory {
    entries: Vec<Checkpoint>,
}

impl CheckpointHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Voting power as of the latest checkpoint.
    pub fn latest(&self) -> Amount {
        self.entries.last().map(|c| c.votes).unwrap_or(Amount::ZERO)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Checkpoint> {
        self.entries.get(index)
    }

    pub fn as_slice(&self) -> &[Checkpoint] {
        &self.entries
    }

    /// Value of the last checkpoint with `from_block <= block`, zero if none.
    pub fn value_at(&self, block: u64) -> Amount {
        // index of the first checkpoint strictly after `block`
        let upper = self.entries.partition_point(|c| c.from_block <= block);
        if upper == 0 {
            Amount::ZERO
        } else {
            self.entries[upper - 1].votes
        }
    }

    /// Check that `votes` could be written at `block` without mutating.
    pub fn check_write(
        &self,
        owner: Address,
        block: u64,
        votes: Amount,
    ) -> Result<(), LedgerError> {
        if votes.raw() > MAX_CHECKPOINT_VOTES {
            return Err(LedgerError::CheckpointOverflow {
                account: owner,
                value: votes.raw(),
            });
        }
        if let Some(last) = self.entries.last() {
            if last.from_block > block {
                return Err(LedgerError::HeightRegression {
                    account: owner,
                    latest: last.from_block,
                    attempted: block,
                });
            }
        }
        Ok(())
    }

    /// Record `votes` at `block`, overwriting a checkpoint already at that block.
    pub fn write(&mut self, owner: Address, block: u64, votes: Amount) -> Result<(), LedgerError> {
        self.check_write(owner, block, votes)?;
        match self.entries.last_mut() {
            Some(last) if last.from_block == block => last.votes = votes,
            _ => self.entries.push(Checkpoint {
                from_block: block,
                votes,
            }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_bytes([1u8; 20])
    }

    #[test]
    fn test_empty_history_is_zero() {
        let history = CheckpointHistory::new();
        assert_eq!(history.latest(), Amount::ZERO);
        assert_eq!(history.value_at(100), Amount::ZERO);
        assert!(history.is_empty());
    }

    #[test]
    fn test_value_at_uses_last_checkpoint_at_or_before() {
        let mut history = CheckpointHistory::new();
        history.write(owner(), 10, Amount::new(100)).unwrap();
        history.write(owner(), 20, Amount::new(250)).unwrap();
        history.write(owner(), 35, Amount::new(50)).unwrap();

        assert_eq!(history.value_at(9), Amount::ZERO);
        assert_eq!(history.value_at(10), Amount::new(100));
        assert_eq!(history.value_at(19), Amount::new(100));
        assert_eq!(history.value_at(20), Amount::new(250));
        assert_eq!(history.value_at(34), Amount::new(250));
        assert_eq!(history.value_at(1_000), Amount::new(50));
    }

    #[test]
    fn test_same_block_overwrites() {
        let mut history = CheckpointHistory::new();
        history.write(owner(), 5, Amount::new(1)).unwrap();
        history.write(owner(), 5, Amount::new(2)).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.get(0).unwrap().votes, Amount::new(2));
    }

    #[test]
    fn test_height_regression_rejected() {
        let mut history = CheckpointHistory::new();
        history.write(owner(), 5, Amount::new(1)).unwrap();

        let result = history.write(owner(), 4, Amount::new(2));
        assert!(matches!(
            result,
            Err(LedgerError::HeightRegression {
                latest: 5,
                attempted: 4,
                ..
            })
        ));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_overflow_bound() {
        let mut history = CheckpointHistory::new();
        assert!(history.write(owner(), 1, Amount::new(MAX_CHECKPOINT_VOTES)).is_ok());
        assert!(matches!(
            history.write(owner(), 2, Amount::new(MAX_CHECKPOINT_VOTES + 1)),
            Err(LedgerError::CheckpointOverflow { .. })
        ));
    }
}
