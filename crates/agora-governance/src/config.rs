//! Governance configuration.
//!
//! Settings are loaded from TOML. Every voting parameter has a fixed
//! `[min, max]` range; the same checks guard file loading and the owner's
//! runtime setters.

use std::fmt::Display;
use std::path::Path;

use agora_types::Amount;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::quadratic::MAX_SAFE_VOTES;

pub const HOUR: u64 = 3_600;
pub const DAY: u64 = 24 * HOUR;

/// Proposal threshold bounds, in whole tokens.
pub const MIN_PROPOSAL_THRESHOLD_TOKENS: u128 = 1;
pub const MAX_PROPOSAL_THRESHOLD_TOKENS: u128 = 1_000_000;

pub const MAX_VOTING_DELAY: u64 = 30 * DAY;
pub const MIN_VOTING_PERIOD: u64 = HOUR;
pub const MAX_VOTING_PERIOD: u64 = 30 * DAY;
pub const MIN_QUORUM_VOTES: u64 = 1;
pub const MAX_QUORUM_VOTES: u64 = 1_000_000_000_000;
pub const MIN_MAX_VOTES_PER_WALLET: u64 = 1;
pub const MAX_PROPOSAL_COOLDOWN: u64 = 30 * DAY;
pub const MIN_TIMELOCK_DELAY: u64 = HOUR;
pub const MAX_TIMELOCK_DELAY: u64 = 30 * DAY;
pub const MIN_ACTIONS_PER_PROPOSAL: usize = 1;
pub const MAX_ACTIONS_PER_PROPOSAL: usize = 50;

/// Window after the timelock during which a queued proposal may execute.
pub const EXECUTION_GRACE_PERIOD: u64 = 14 * DAY;

/// Longest accepted proposal title, in bytes.
pub const MAX_TITLE_LEN: usize = 256;
/// Longest accepted content pointer, in bytes.
pub const MAX_CONTENT_POINTER_LEN: usize = 128;

const DEFAULT_DECIMALS: u8 = 18;
const DEFAULT_SCALE: u128 = 10u128.pow(DEFAULT_DECIMALS as u32);

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceSettings {
    pub token: TokenConfig,
    pub voting: VotingConfig,
    pub logging: LoggingConfig,
}

impl GovernanceSettings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: GovernanceSettings =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token.validate()?;
        self.voting.validate(self.token.decimals)?;
        self.logging.validate()
    }
}

/// Token metadata and supply cap for the voting-power ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Raw units
    pub max_supply: Amount,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Agora".to_string(),
            symbol: "AGR".to_string(),
            decimals: DEFAULT_DECIMALS,
            // 1 billion tokens
            max_supply: Amount::new(1_000_000_000 * DEFAULT_SCALE),
        }
    }
}

impl TokenConfig {
    /// Non-empty name and symbol, supported decimals, non-zero cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Empty("token.name"));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Empty("token.symbol"));
        }
        Amount::scale(self.decimals)?;
        if self.max_supply.is_zero() {
            return Err(out_of_range("token.max_supply", self.max_supply, 1, Amount::MAX));
        }
        Ok(())
    }
}

/// Proposal and voting parameters. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Current voting power needed to propose, raw units
    pub proposal_threshold: Amount,
    /// Delay from creation to the start of voting
    pub voting_delay: u64,
    /// Length of the voting window
    pub voting_period: u64,
    /// Total votes cast needed to queue
    pub quorum_votes: u64,
    pub max_votes_per_wallet: u64,
    /// Minimum time between two proposals from one address
    pub proposal_cooldown: u64,
    /// Delay between queueing and execution
    pub timelock_delay: u64,
    pub max_actions_per_proposal: usize,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            proposal_threshold: Amount::new(1_000 * DEFAULT_SCALE),
            voting_delay: DAY,
            voting_period: 7 * DAY,
            quorum_votes: 1_000,
            max_votes_per_wallet: 1_000,
            proposal_cooldown: DAY,
            timelock_delay: 2 * DAY,
            max_actions_per_proposal: 10,
        }
    }
}

impl VotingConfig {
    /// Check every parameter against its bounds for a token with `decimals`.
    pub fn validate(&self, decimals: u8) -> Result<(), ConfigError> {
        check_proposal_threshold(self.proposal_threshold, decimals)?;
        check_voting_delay(self.voting_delay)?;
        check_voting_period(self.voting_period)?;
        check_quorum_votes(self.quorum_votes)?;
        check_max_votes_per_wallet(self.max_votes_per_wallet)?;
        check_proposal_cooldown(self.proposal_cooldown)?;
        check_timelock_delay(self.timelock_delay)?;
        check_max_actions(self.max_actions_per_proposal)
    }
}

/// Logging setup read by the host at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `agora_governance=debug`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Non-empty filter and a known format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::Empty("logging.level"));
        }
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::UnknownLogFormat(other.to_string())),
        }
    }

    /// Whether the JSON subscriber is selected.
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

fn out_of_range(
    parameter: &'static str,
    value: impl Display,
    min: impl Display,
    max: impl Display,
) -> ConfigError {
    ConfigError::OutOfRange {
        parameter,
        value: value.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
}

fn check_bounds<T>(parameter: &'static str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(out_of_range(parameter, value, min, max));
    }
    Ok(())
}

/// Between the min and max whole-token thresholds, scaled by `decimals`.
pub fn check_proposal_threshold(value: Amount, decimals: u8) -> Result<(), ConfigError> {
    let min = Amount::from_tokens(MIN_PROPOSAL_THRESHOLD_TOKENS, decimals)?;
    let max = Amount::from_tokens(MAX_PROPOSAL_THRESHOLD_TOKENS, decimals)?;
    check_bounds("proposal_threshold", value, min, max)
}

/// Up to [`MAX_VOTING_DELAY`]. Zero opens voting at creation.
pub fn check_voting_delay(value: u64) -> Result<(), ConfigError> {
    check_bounds("voting_delay", value, 0, MAX_VOTING_DELAY)
}

pub fn check_voting_period(value: u64) -> Result<(), ConfigError> {
    check_bounds("voting_period", value, MIN_VOTING_PERIOD, MAX_VOTING_PERIOD)
}

/// At least one vote.
pub fn check_quorum_votes(value: u64) -> Result<(), ConfigError> {
    check_bounds("quorum_votes", value, MIN_QUORUM_VOTES, MAX_QUORUM_VOTES)
}

/// Capped so the squared cost of a full allocation fits the vote math.
pub fn check_max_votes_per_wallet(value: u64) -> Result<(), ConfigError> {
    check_bounds("max_votes_per_wallet", value, MIN_MAX_VOTES_PER_WALLET, MAX_SAFE_VOTES)
}

/// Up to [`MAX_PROPOSAL_COOLDOWN`]. Zero disables the cooldown.
pub fn check_proposal_cooldown(value: u64) -> Result<(), ConfigError> {
    check_bounds("proposal_cooldown", value, 0, MAX_PROPOSAL_COOLDOWN)
}

pub fn check_timelock_delay(value: u64) -> Result<(), ConfigError> {
    check_bounds("timelock_delay", value, MIN_TIMELOCK_DELAY, MAX_TIMELOCK_DELAY)
}

pub fn check_max_actions(value: usize) -> Result<(), ConfigError> {
    check_bounds(
        "max_actions_per_proposal",
        value,
        MIN_ACTIONS_PER_PROPOSAL,
        MAX_ACTIONS_PER_PROPOSAL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = GovernanceSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.token.decimals, 18);
        assert_eq!(settings.voting.max_actions_per_proposal, 10);
    }

    #[test]
    fn test_bounds() {
        assert!(check_voting_period(HOUR).is_ok());
        assert!(check_voting_period(HOUR - 1).is_err());
        assert!(check_voting_period(30 * DAY + 1).is_err());
        assert!(check_voting_delay(0).is_ok());
        assert!(check_quorum_votes(0).is_err());
        assert!(check_max_votes_per_wallet(MAX_SAFE_VOTES).is_ok());
        assert!(check_max_votes_per_wallet(MAX_SAFE_VOTES + 1).is_err());
        assert!(check_timelock_delay(0).is_err());
        assert!(check_max_actions(51).is_err());
    }

    #[test]
    fn test_threshold_bounds_follow_decimals() {
        assert!(check_proposal_threshold(Amount::new(1), 0).is_ok());
        assert!(check_proposal_threshold(Amount::new(1), 18).is_err());
        assert!(check_proposal_threshold(Amount::from_tokens(1_000_000, 18).unwrap(), 18).is_ok());

        let err =
            check_proposal_threshold(Amount::from_tokens(1_000_001, 0).unwrap(), 0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                parameter: "proposal_threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = GovernanceSettings::default();
        let text = settings.to_toml_string().unwrap();
        assert!(text.contains("[voting]"));
        assert!(text.contains("proposal_threshold = \"1000000000000000000000\""));

        let parsed = GovernanceSettings::from_toml_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed = GovernanceSettings::from_toml_str(
            r#"
            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert!(parsed.logging.is_json());
        assert_eq!(parsed.voting, VotingConfig::default());
    }

    #[test]
    fn test_rejects_out_of_range_file() {
        let mut settings = GovernanceSettings::default();
        settings.voting.timelock_delay = 60;
        let text = settings.to_toml_string().unwrap();

        let err = GovernanceSettings::from_toml_str(&text).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                parameter: "timelock_delay",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_format() {
        let mut settings = GovernanceSettings::default();
        settings.logging.format = "xml".to_string();
        assert_eq!(
            settings.validate(),
            Err(ConfigError::UnknownLogFormat("xml".to_string()))
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let text = GovernanceSettings::default().to_toml_string().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let loaded = GovernanceSettings::from_file(file.path()).unwrap();
        assert_eq!(loaded, GovernanceSettings::default());

        assert!(matches!(
            GovernanceSettings::from_file("/nonexistent/agora.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
