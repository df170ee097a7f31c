//! Caller authorization.
//!
//! Role storage lives outside the governance core. The engine only asks one
//! question: does this account hold this role.

use std::collections::{HashMap, HashSet};

use agora_types::Address;
use serde::{Deserialize, Serialize};

/// Privileged roles checked by governance operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Queues, executes and cancels proposals, updates configuration
    Owner,
    /// Allowed to run one-time initialization
    Initializer,
    /// Allowed to withdraw from the treasury directly
    TreasuryManager,
}

/// Role predicate supplied by the host.
pub trait Authority {
    fn has_role(&self, role: Role, account: &Address) -> bool;
}

/// In-memory role sets.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    members: HashMap<Role, HashSet<Address>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry where `admin` holds every role.
    pub fn with_admin(admin: Address) -> Self {
        let mut registry = Self::new();
        registry.grant(Role::Owner, admin);
        registry.grant(Role::Initializer, admin);
        registry.grant(Role::TreasuryManager, admin);
        registry
    }

    /// Returns false if the account already held the role.
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Returns false if the account did not hold the role.
    pub fn revoke(&mut self, role: Role, account: &Address) -> bool {
        self.members
            .get_mut(&role)
            .map(|set| set.remove(account))
            .unwrap_or(false)
    }

    /// Holders of `role`, sorted.
    pub fn members(&self, role: Role) -> Vec<Address> {
        let mut out: Vec<Address> = self
            .members
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}

impl Authority for RoleRegistry {
    fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .get(&role)
            .map_or(false, |set| set.contains(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_revoke() {
        let alice = Address::derive(b"alice");
        let mut registry = RoleRegistry::new();

        assert!(!registry.has_role(Role::Owner, &alice));
        assert!(registry.grant(Role::Owner, alice));
        assert!(!registry.grant(Role::Owner, alice));
        assert!(registry.has_role(Role::Owner, &alice));
        assert!(!registry.has_role(Role::TreasuryManager, &alice));

        assert!(registry.revoke(Role::Owner, &alice));
        assert!(!registry.revoke(Role::Owner, &alice));
        assert!(!registry.has_role(Role::Owner, &alice));
    }

    #[test]
    fn test_with_admin() {
        let admin = Address::derive(b"admin");
        let registry = RoleRegistry::with_admin(admin);

        for role in [Role::Owner, Role::Initializer, Role::TreasuryManager] {
            assert!(registry.has_role(role, &admin));
            assert_eq!(registry.members(role), vec![admin]);
        }
    }
}
