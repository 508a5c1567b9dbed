/// Tunables for DPoS validator selection and the forging loop.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Wall-clock interval between forger evaluations (§4.7's "slot
    /// interval T"), default ~5s.
    pub block_time_secs: u64,
    /// Size of the delegate set consulted by `select_validator` (§4.6's
    /// `N`), default 3.
    pub delegate_count: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig { block_time_secs: 5, delegate_count: 3 }
    }
}
