//! DPoS validator selection (spec.md §4.6).

use crate::crypto;
use crate::store::{Store, StoreError};

/// Name used when no participant has ever been registered — an
/// unreachable state in normal operation, kept only so the function
/// totals over an empty delegate set.
pub const UNKNOWN_VALIDATOR: &str = "Unknown";

/// Selects the validator expected to forge the next block after
/// `previous_hash`, given `seed_offset` (default `0`, reserved for future
/// liveness-driven rotation per §9).
///
/// 1. Reads the top `delegate_count` participants by `(votes DESC, name
///    ASC)`.
/// 2. If none are registered, returns [`UNKNOWN_VALIDATOR`].
/// 3. Otherwise `seed = SHA-256(previous_hash || ascii(seed_offset))`,
///    interpreted as a big-endian integer mod the delegate count, indexes
///    into the ordered delegate list.
pub fn select_validator(
    store: &Store,
    previous_hash: &str,
    seed_offset: u64,
    delegate_count: usize,
) -> Result<String, StoreError> {
    let delegates = store.top_delegates(delegate_count)?;
    if delegates.is_empty() {
        return Ok(UNKNOWN_VALIDATOR.to_string());
    }

    let mut seed_input = previous_hash.as_bytes().to_vec();
    seed_input.extend_from_slice(seed_offset.to_string().as_bytes());
    let digest = crypto::sha256(&seed_input);

    let index = big_endian_mod(&digest, delegates.len() as u64) as usize;
    Ok(delegates[index].name.clone())
}

/// Interprets `digest` as a big-endian unsigned integer and reduces it
/// modulo `modulus` without requiring a bignum type: processes the digest
/// byte by byte, the standard "Horner's method" reduction.
fn big_endian_mod(digest: &[u8], modulus: u64) -> u64 {
    let mut acc: u64 = 0;
    for &byte in digest {
        acc = (acc * 256 + byte as u64) % modulus;
    }
    acc
}
