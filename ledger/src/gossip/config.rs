use std::time::Duration;

/// Timeouts for the outbound gossip client (spec.md §5 "Cancellation &
/// timeouts"): short per-request bounds for `/info` and `/transaction`
/// and `/block` broadcasts, a longer bound for a full `/chain` download.
#[derive(Clone, Debug)]
pub struct GossipConfig {
    pub info_timeout: Duration,
    pub transaction_timeout: Duration,
    pub block_timeout: Duration,
    pub chain_timeout: Duration,
}

impl Default for GossipConfig {
    fn default() -> Self {
        GossipConfig {
            info_timeout: Duration::from_secs(1),
            transaction_timeout: Duration::from_secs(2),
            block_timeout: Duration::from_secs(2),
            chain_timeout: Duration::from_secs(10),
        }
    }
}
