//! Property tests over the public governance surface.

mod common;

use agora_governance::config::{DAY, EXECUTION_GRACE_PERIOD};
use agora_governance::quadratic::{max_votes_from_budget, quadratic_cost, MAX_SAFE_VOTES};
use agora_governance::{GovernanceError, ProposalAction, RecordingDispatcher};
use agora_types::{Amount, BlockEnv};
use common::{addr, tokens, Harness};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn votes_only_land_inside_the_window(offset in 0u64..(10 * DAY)) {
        let mut h = Harness::new();
        let voter = addr("voter");
        h.mint(voter, tokens(100));
        h.advance(12);
        let id = h.propose(vec![]);
        let view = h.gov.proposal(id, h.env.timestamp).unwrap();

        let env = BlockEnv::new(h.env.number + 1, h.env.timestamp + offset);
        let result = h.gov.vote(voter, id, 1, &env);

        if env.timestamp < view.start_time {
            prop_assert_eq!(result, Err(GovernanceError::VotingNotStarted));
        } else if env.timestamp > view.end_time {
            prop_assert_eq!(result, Err(GovernanceError::VotingEnded));
        } else {
            prop_assert_eq!(result, Ok(tokens(1)));
        }
    }

    #[test]
    fn execution_outside_timelock_window_leaves_treasury(offset in 0u64..(20 * DAY)) {
        let mut h = Harness::new();
        h.fund_treasury(Amount::new(1_000));
        let target = addr("target");
        let action = ProposalAction::new(target, Amount::new(100), vec![], "pay");
        let id = h.pass_proposal(vec![action]);
        let eta = h.gov.proposal(id, h.env.timestamp).unwrap().eta;

        // start from one timelock before eta
        let now = eta - 2 * DAY + offset;
        let env = BlockEnv::new(h.env.number + 1, now);
        let mut dispatcher = RecordingDispatcher::new();
        let result = h.gov.execute_proposal(h.admin, id, &env, &mut dispatcher);

        let deadline = eta + EXECUTION_GRACE_PERIOD;
        if now < eta || now > deadline {
            prop_assert!(result.is_err());
            prop_assert_eq!(h.gov.treasury_info().tracked, Amount::new(1_000));
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(h.gov.treasury_info().tracked, Amount::new(900));
        }
    }

    #[test]
    fn quadratic_inverse_holds(v in 1u64..=MAX_SAFE_VOTES) {
        let cost = quadratic_cost(v).unwrap();
        prop_assert_eq!(max_votes_from_budget(cost), v);
        prop_assert_eq!(max_votes_from_budget(cost - 1), v - 1);
    }
}
