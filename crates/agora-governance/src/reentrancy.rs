//! Reentrancy protection for operations that call out.
//!
//! Proposal execution and treasury withdrawal hand control to an external
//! target. While one of them is in flight, entering any guarded operation is
//! rejected. Unguarded operations stay callable and see the debits and flags
//! already applied by the outer call.

use agora_types::Address;

use crate::error::GovernanceError;

/// A guarded operation currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardFrame {
    /// Name of the guarded operation
    pub operation: &'static str,
    /// Account that entered it
    pub caller: Address,
    /// Depth at entry (0 for top-level)
    pub depth: usize,
}

/// Tracks the guarded call stack.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    stack: Vec<GuardFrame>,
}

impl ReentrancyGuard {
    /// Create an unlocked guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a guarded operation.
    ///
    /// # Errors
    /// Returns `Reentrancy` if any guarded operation is already in flight.
    pub fn enter(
        &mut self,
        operation: &'static str,
        caller: Address,
    ) -> Result<usize, GovernanceError> {
        if let Some(active) = self.stack.last() {
            tracing::warn!(
                operation,
                active = active.operation,
                caller = %caller,
                "Reentrant call rejected"
            );
            return Err(GovernanceError::Reentrancy(operation));
        }

        let depth = self.stack.len();
        self.stack.push(GuardFrame {
            operation,
            caller,
            depth,
        });
        Ok(depth)
    }

    /// Leave the innermost guarded operation.
    pub fn exit(&mut self) -> Option<GuardFrame> {
        self.stack.pop()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether a guarded operation is in flight.
    pub fn is_locked(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn current_frame(&self) -> Option<&GuardFrame> {
        self.stack.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_exit() {
        let mut guard = ReentrancyGuard::new();
        let caller = Address::derive(b"owner");

        assert_eq!(guard.enter("execute_proposal", caller).unwrap(), 0);
        assert!(guard.is_locked());
        assert_eq!(guard.current_frame().unwrap().operation, "execute_proposal");

        let frame = guard.exit().unwrap();
        assert_eq!(frame.caller, caller);
        assert!(!guard.is_locked());
        assert!(guard.exit().is_none());
    }

    #[test]
    fn test_reentry_blocked() {
        let mut guard = ReentrancyGuard::new();
        let caller = Address::derive(b"owner");

        guard.enter("execute_proposal", caller).unwrap();
        assert_eq!(
            guard.enter("execute_proposal", caller),
            Err(GovernanceError::Reentrancy("execute_proposal"))
        );
        assert_eq!(
            guard.enter("withdraw_from_treasury", caller),
            Err(GovernanceError::Reentrancy("withdraw_from_treasury"))
        );
        assert_eq!(guard.depth(), 1);
    }

    #[test]
    fn test_reusable_after_exit() {
        let mut guard = ReentrancyGuard::new();
        let caller = Address::derive(b"owner");

        guard.enter("withdraw_from_treasury", caller).unwrap();
        guard.exit();
        assert!(guard.enter("execute_proposal", caller).is_ok());
    }
}
