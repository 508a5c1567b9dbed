//! Reads (never generates) the hex-encoded SECP256k1 private scalar a
//! node's own key file holds. Provisioning that file is an external
//! collaborator (spec.md §1 "Key-file storage on disk"); this module
//! only validates that it can be read and decoded.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error("failed to read private key file: {0}")]
    Io(#[from] std::io::Error),
    #[error("private key file does not contain valid hex: {0}")]
    BadHex(#[from] hex::FromHexError),
}

/// Reads `path`, trims surrounding whitespace, and validates that the
/// remaining contents are a well-formed hex string before returning it.
pub fn load_private_key_hex(path: &Path) -> Result<String, KeyLoadError> {
    let raw = std::fs::read_to_string(path)?;
    let trimmed = raw.trim().to_string();
    hex::decode(&trimmed)?;
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_hex_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.key");
        std::fs::write(&path, "not hex at all!!").unwrap();
        assert!(load_private_key_hex(&path).is_err());
    }

    #[test]
    fn reads_and_trims_valid_hex_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.key");
        std::fs::write(&path, "deadbeef\n").unwrap();
        assert_eq!(load_private_key_hex(&path).unwrap(), "deadbeef");
    }
}
