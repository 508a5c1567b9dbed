//! Hashing, signing, and hex codecs used throughout the ledger.
//!
//! Everything here is deliberately small: SHA-256 content hashes, raw
//! SECP256k1 signatures over those hashes, and lowercase-hex encode/decode
//! helpers. Higher layers (canonical JSON, transactions, blocks) build on
//! top of these primitives rather than reaching for `sha2`/`secp256k1`
//! directly.

use secp256k1::{
    All, Message, PublicKey, Secp256k1, SecretKey,
    ecdsa::Signature as EcdsaSignature,
};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors arising from hashing, signing, or verifying.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid hex encoding: {0}")]
    BadHex(#[from] hex::FromHexError),
    #[error("invalid secp256k1 key or signature: {0}")]
    Secp256k1(#[from] secp256k1::Error),
    #[error("signature does not verify against the sender's public key")]
    InvalidSignature,
}

/// Shared, thread-safe SECP256k1 context (signing + verification).
fn secp() -> &'static Secp256k1<All> {
    static CTX: OnceLock<Secp256k1<All>> = OnceLock::new();
    CTX.get_or_init(Secp256k1::new)
}

/// Returns the lowercase hex-encoded SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Returns the raw SHA-256 digest of `bytes`.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Signs `message_hash` (the SHA-256 digest of the value being signed) with
/// `private_key_hex`, a hex-encoded 32-byte SECP256k1 scalar.
///
/// Returns the raw `r||s` signature, hex-encoded (64 bytes -> 128 hex
/// chars), matching the wire format produced by the original Python
/// `ecdsa` signer.
pub fn sign(private_key_hex: &str, message_hash: &[u8; 32]) -> Result<String, CryptoError> {
    let sk_bytes = hex::decode(private_key_hex)?;
    let sk = SecretKey::from_slice(&sk_bytes)?;
    let msg = Message::from_digest(*message_hash);
    let sig = secp().sign_ecdsa(&msg, &sk);
    Ok(hex::encode(sig.serialize_compact()))
}

/// Verifies that `signature_hex` is a valid SECP256k1 signature over
/// `message_hash` under `public_key_hex`.
pub fn verify(
    public_key_hex: &str,
    message_hash: &[u8; 32],
    signature_hex: &str,
) -> Result<(), CryptoError> {
    let pk_bytes = hex::decode(public_key_hex)?;
    let pk = PublicKey::from_slice(&pk_bytes)?;

    let sig_bytes = hex::decode(signature_hex)?;
    let sig = EcdsaSignature::from_compact(&sig_bytes)?;

    let msg = Message::from_digest(*message_hash);
    secp()
        .verify_ecdsa(&msg, &sig, &pk)
        .map_err(|_| CryptoError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn keypair() -> (String, String) {
        let secp = secp();
        let (sk, pk) = secp.generate_keypair(&mut OsRng);
        (hex::encode(sk.secret_bytes()), hex::encode(pk.serialize()))
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let (sk_hex, pk_hex) = keypair();
        let digest = sha256(b"hello provenance ledger");

        let sig = sign(&sk_hex, &digest).expect("sign");
        verify(&pk_hex, &digest, &sig).expect("verify should succeed");
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let (sk_hex, pk_hex) = keypair();
        let digest = sha256(b"original message");
        let sig = sign(&sk_hex, &digest).expect("sign");

        let other_digest = sha256(b"tampered message");
        let err = verify(&pk_hex, &other_digest, &sig).unwrap_err();
        matches!(err, CryptoError::InvalidSignature);
    }

    #[test]
    fn sha256_hex_is_deterministic() {
        let a = sha256_hex(b"abc");
        let b = sha256_hex(b"abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
