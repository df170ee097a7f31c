//! Shared harness for the governance integration tests.

#![allow(dead_code)]

use agora_governance::config::DAY;
use agora_governance::{Governance, ProposalAction, RoleRegistry, TokenConfig, VotingConfig};
use agora_types::{Address, Amount, BlockEnv};

pub const T0: u64 = 1_700_000_000;
pub const BLOCK_TIME: u64 = 12;

pub fn addr(seed: &str) -> Address {
    Address::derive(seed.as_bytes())
}

pub fn tokens(n: u128) -> Amount {
    Amount::from_tokens(n, 18).unwrap()
}

pub fn test_config() -> VotingConfig {
    VotingConfig {
        quorum_votes: 10,
        ..VotingConfig::default()
    }
}

pub struct Harness {
    pub gov: Governance,
    pub admin: Address,
    pub env: BlockEnv,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// `admin` holds every role, is a minter and owns 5000 tokens.
    pub fn with_config(config: VotingConfig) -> Self {
        let admin = addr("admin");
        let env = BlockEnv::new(1, T0);
        let mut gov =
            Governance::new(TokenConfig::default(), RoleRegistry::with_admin(admin)).unwrap();
        gov.initialize(admin, config, &env).unwrap();
        gov.set_minter(admin, admin, true, &env).unwrap();
        gov.mint(admin, admin, tokens(5_000), &env).unwrap();

        let mut harness = Self { gov, admin, env };
        harness.advance(BLOCK_TIME);
        harness
    }

    /// Move to the next block, `seconds` later.
    pub fn advance(&mut self, seconds: u64) {
        self.env = self.env.advance(1, seconds);
    }

    pub fn mint(&mut self, to: Address, amount: Amount) {
        let env = self.env;
        self.gov.mint(self.admin, to, amount, &env).unwrap();
    }

    pub fn propose(&mut self, actions: Vec<ProposalAction>) -> u64 {
        let env = self.env;
        self.gov
            .propose(self.admin, "Treasury allocation", "bafybeigdyrzt", actions, &env)
            .unwrap()
    }

    /// Create, vote to quorum, queue and wait out the timelock.
    pub fn pass_proposal(&mut self, actions: Vec<ProposalAction>) -> u64 {
        let id = self.propose(actions);
        self.advance(DAY);
        let env = self.env;
        self.gov.vote(self.admin, id, 10, &env).unwrap();
        self.advance(7 * DAY + 1);
        let env = self.env;
        self.gov.queue_proposal(self.admin, id, &env).unwrap();
        self.advance(2 * DAY);
        id
    }

    pub fn fund_treasury(&mut self, amount: Amount) {
        let env = self.env;
        self.gov
            .deposit_to_treasury(addr("donor"), amount, &env)
            .unwrap();
    }
}
