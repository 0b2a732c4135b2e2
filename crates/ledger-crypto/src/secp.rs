use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("private key must be 32 bytes (or 33 with a leading zero pad), got {0}")]
    InvalidPrivateKey(usize),
    #[error("message must be a 32-byte digest, got {0}")]
    InvalidMessageLength(usize),
}

/// Strips a single leading zero pad byte, the form extended private keys
/// carry their 32-byte scalar in to line up with compressed public keys.
fn unpad_private_key(key: &[u8]) -> Result<&[u8], SigningError> {
    match key.len() {
        32 => Ok(key),
        33 if key[0] == 0 => Ok(&key[1..]),
        other => Err(SigningError::InvalidPrivateKey(other)),
    }
}

/// Signs a 32-byte digest, returning a 64-byte compact signature (r ‖ s).
/// Any recovery id the backend might produce is never part of the output.
pub fn sign(digest: &[u8], private_key: &[u8]) -> Result<[u8; 64], SigningError> {
    if digest.len() != 32 {
        return Err(SigningError::InvalidMessageLength(digest.len()));
    }
    let scalar = unpad_private_key(private_key)?;
    let secp = Secp256k1::signing_only();
    let secret = SecretKey::from_slice(scalar).map_err(|_| SigningError::InvalidPrivateKey(scalar.len()))?;
    let message = Message::from_digest_slice(digest).map_err(|_| SigningError::InvalidMessageLength(digest.len()))?;
    let sig = secp.sign_ecdsa(&message, &secret);
    Ok(sig.serialize_compact())
}

/// Verifies a 64-byte compact signature against a compressed or
/// zero-padded public key. Never panics or returns an error: a malformed
/// key, signature, or digest simply fails to verify.
pub fn verify(digest: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    if digest.len() != 32 {
        return false;
    }
    let sig_bytes = match signature.len() {
        64 => signature,
        65 => &signature[..64],
        _ => return false,
    };
    let key_bytes: &[u8] = match public_key.len() {
        33 => public_key,
        34 if public_key[0] == 0 => &public_key[1..],
        _ => return false,
    };
    let secp = Secp256k1::verification_only();
    let (Ok(pubkey), Ok(sig), Ok(message)) = (
        PublicKey::from_slice(key_bytes),
        Signature::from_compact(sig_bytes),
        Message::from_digest_slice(digest),
    ) else {
        return false;
    };
    secp.verify_ecdsa(&message, &sig, &pubkey).is_ok()
}
