//! Quadratic voting arithmetic.
//!
//! Casting `v` votes costs `v^2` tokens. All functions here are pure; the
//! engine scales costs to token decimals through [`token_cost`].

use agora_types::{isqrt_u128, Amount};
use serde::{Deserialize, Serialize};

use crate::error::MathError;

/// Largest vote count accepted for squaring. `MAX_SAFE_VOTES^2 * 10^18` still
/// fits in a u128.
pub const MAX_SAFE_VOTES: u64 = 10_000_000_000;

/// Upper bound on samples for [`analyze_distribution`] (the Gini pass is O(n^2)).
pub const MAX_DISTRIBUTION_SAMPLES: usize = 1_000;

/// Basis points denominator.
pub const BPS: u32 = 10_000;

/// Cost in whole tokens of casting `votes` votes: `votes^2`.
pub fn quadratic_cost(votes: u64) -> Result<u128, MathError> {
    if votes == 0 {
        return Err(MathError::ZeroVotes);
    }
    if votes > MAX_SAFE_VOTES {
        return Err(MathError::VotesExceedSafetyBound {
            votes,
            max: MAX_SAFE_VOTES,
        });
    }
    let v = votes as u128;
    v.checked_mul(v).ok_or(MathError::CostOverflow)
}

/// Cost of `votes` votes in raw token units for a token with `decimals`.
pub fn token_cost(votes: u64, decimals: u8) -> Result<Amount, MathError> {
    let cost = quadratic_cost(votes)?;
    let scale = Amount::scale(decimals)?;
    cost.checked_mul(scale)
        .map(Amount::new)
        .ok_or(MathError::CostOverflow)
}

/// Maximum votes affordable with a budget of `budget` whole tokens.
///
/// Returns floor(sqrt(budget)); zero for an empty budget.
pub fn max_votes_from_budget(budget: u128) -> u64 {
    // floor(sqrt(u128::MAX)) == u64::MAX, so the cast is lossless
    isqrt_u128(budget) as u64
}

/// Maximum votes affordable with `balance` raw token units.
pub fn max_votes_for_balance(balance: Amount, decimals: u8) -> Result<u64, MathError> {
    let scale = Amount::scale(decimals)?;
    Ok(max_votes_from_budget(balance.raw() / scale))
}

/// Effective weight of spending `tokens_spent`: sqrt(tokens_spent).
pub fn vote_weight(tokens_spent: Amount) -> Amount {
    tokens_spent.isqrt()
}

/// Votes obtained per whole token spent, in basis points.
///
/// With cost `v^2`, each token buys `1/v` votes, so efficiency falls as the
/// vote count grows.
pub fn vote_efficiency_bps(votes: u64) -> Result<u32, MathError> {
    let cost = quadratic_cost(votes)?;
    Ok(((votes as u128 * BPS as u128) / cost) as u32)
}

/// Share of the vote total contributed by distinct voters, in basis points.
///
/// 10_000 means every vote came from a different account; a single account
/// casting everything scores `10_000 / total_votes`.
pub fn sybil_resistance_bps(unique_voters: u64, total_votes: u64) -> u32 {
    bounded_ratio_bps(unique_voters, total_votes)
}

/// Votes cast relative to the eligible total, in basis points, capped at 10_000.
pub fn participation_rate_bps(votes_cast: u64, eligible: u64) -> u32 {
    bounded_ratio_bps(votes_cast, eligible)
}

/// Whether participation reaches `quorum_bps`.
pub fn meets_quorum(votes_cast: u64, eligible: u64, quorum_bps: u32) -> bool {
    eligible > 0 && participation_rate_bps(votes_cast, eligible) >= quorum_bps.min(BPS)
}

fn bounded_ratio_bps(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let ratio = (numerator as u128 * BPS as u128) / denominator as u128;
    ratio.min(BPS as u128) as u32
}

/// Summary statistics over a batch of vote counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub total: u128,
    /// floor(total / count)
    pub mean: u64,
    /// Average of the two middle values for even counts (floored).
    pub median: u64,
    pub min: u64,
    pub max: u64,
    /// Gini coefficient in basis points; 0 = perfectly equal.
    pub gini_bps: u32,
}

/// Mean, median, extremes and Gini coefficient of `samples`.
pub fn analyze_distribution(samples: &[u64]) -> Result<DistributionStats, MathError> {
    if samples.is_empty() {
        return Err(MathError::EmptySample);
    }
    if samples.len() > MAX_DISTRIBUTION_SAMPLES {
        return Err(MathError::SampleTooLarge {
            len: samples.len(),
            max: MAX_DISTRIBUTION_SAMPLES,
        });
    }

    let count = samples.len();
    let total: u128 = samples.iter().map(|&v| v as u128).sum();

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let median = if count % 2 == 1 {
        sorted[count / 2]
    } else {
        ((sorted[count / 2 - 1] as u128 + sorted[count / 2] as u128) / 2) as u64
    };

    Ok(DistributionStats {
        count,
        total,
        mean: (total / count as u128) as u64,
        median,
        min: sorted[0],
        max: sorted[count - 1],
        gini_bps: gini_bps(samples, total),
    })
}

/// G = sum_i sum_j |x_i - x_j| / (2 * n * sum_i x_i)
fn gini_bps(samples: &[u64], total: u128) -> u32 {
    if total == 0 {
        return 0;
    }
    let mut abs_diff_sum: u128 = 0;
    for &a in samples {
        for &b in samples {
            abs_diff_sum += a.abs_diff(b) as u128;
        }
    }
    let denominator = 2 * samples.len() as u128 * total;
    ((abs_diff_sum * BPS as u128) / denominator) as u32
}
