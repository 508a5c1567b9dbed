//! The error taxonomy shared across the store, validation, consensus, and
//! gossip layers — one kind per category in spec.md's "Error Handling
//! Design" section, each carrying the context an HTTP handler needs to
//! pick a status code.

use thiserror::Error;

/// Sub-kinds of a rejected smart-contract rule check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("receiver is not a registered participant")]
    UnknownCandidate,
    #[error("shipment already has an active row")]
    AlreadyActive,
    #[error("shipment does not exist")]
    UnknownShipment,
    #[error("shipment is no longer active")]
    InactiveShipment,
    #[error("sender is not the shipment's current owner")]
    NotOwner,
}

/// Sub-kinds of a rejected block-chain linkage check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChainLinkageError {
    #[error("block #1 is not a valid genesis block")]
    BadGenesis,
    #[error("block index does not follow the local tip contiguously")]
    IndexGap,
    #[error("block.previous_hash does not match the local tip's hash")]
    BrokenChain,
    #[error("block.hash or merkle_root does not match the recomputed value")]
    BadHash,
}

/// Errors raised while decoding, validating, committing, or gossiping
/// ledger data.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("malformed input: {0}")]
    Decode(String),

    #[error("signature verification failed")]
    InvalidSignature(#[from] crate::crypto::CryptoError),

    #[error("contract rule violated: {0}")]
    Contract(#[from] ContractViolation),

    #[error("chain linkage rejected: {0}")]
    ChainLinkage(#[from] ChainLinkageError),

    #[error("duplicate submission, treated as a no-op")]
    DuplicateSubmit,

    #[error("peer unreachable: {0}")]
    Transport(String),

    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),
}

impl LedgerError {
    /// True when this error should be surfaced as `200 OK` rather than an
    /// error response (idempotent resubmission of something already
    /// accepted).
    pub fn is_idempotent_noop(&self) -> bool {
        matches!(self, LedgerError::DuplicateSubmit)
    }

    /// True when this error should trigger an asynchronous
    /// `synchronize_chain` task (per §4.10, a gap-shaped rejection).
    pub fn triggers_resync(&self) -> bool {
        matches!(
            self,
            LedgerError::ChainLinkage(ChainLinkageError::IndexGap)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_submit_is_the_only_idempotent_noop() {
        assert!(LedgerError::DuplicateSubmit.is_idempotent_noop());
        assert!(!LedgerError::Contract(ContractViolation::NotOwner).is_idempotent_noop());
        assert!(!LedgerError::ChainLinkage(ChainLinkageError::IndexGap).is_idempotent_noop());
    }

    #[test]
    fn only_index_gap_triggers_resync() {
        assert!(LedgerError::ChainLinkage(ChainLinkageError::IndexGap).triggers_resync());
        assert!(!LedgerError::ChainLinkage(ChainLinkageError::BrokenChain).triggers_resync());
        assert!(!LedgerError::ChainLinkage(ChainLinkageError::BadGenesis).triggers_resync());
        assert!(!LedgerError::ChainLinkage(ChainLinkageError::BadHash).triggers_resync());
        assert!(!LedgerError::DuplicateSubmit.triggers_resync());
    }
}
