/// Block context an operation executes in.
///
/// `number` keys the voting-power checkpoints; `timestamp` (seconds) drives
/// the voting, timelock and expiry windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockEnv {
    pub number: u64,
    pub timestamp: u64,
}

impl BlockEnv {
    pub const fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }

    /// `blocks` blocks later, each `block_time` seconds apart.
    pub fn advance(&self, blocks: u64, block_time: u64) -> Self {
        Self {
            number: self.number.saturating_add(blocks),
            timestamp: self
                .timestamp
                .saturating_add(blocks.saturating_mul(block_time)),
        }
    }
}
