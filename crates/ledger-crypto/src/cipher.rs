use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("authentication failed: wrong key or corrupted ciphertext")]
    AuthenticationFailed,
    #[error("blob shorter than the 12-byte nonce prefix")]
    TooShort,
}

const NONCE_LEN: usize = 12;

/// AES-256-GCM encrypt with a fresh random nonce.
/// Output layout: nonce(12) ‖ ciphertext ‖ tag(16).
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    if key.len() != 32 {
        return Err(CipherError::InvalidKeyLength(key.len()));
    }
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CipherError::AuthenticationFailed)?;
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Inverse of [`encrypt`]. Fails with [`CipherError::AuthenticationFailed`]
/// when the key is wrong or the blob was tampered with.
pub fn decrypt(blob: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    if key.len() != 32 {
        return Err(CipherError::InvalidKeyLength(key.len()));
    }
    if blob.len() < NONCE_LEN {
        return Err(CipherError::TooShort);
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CipherError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key32(tag: u8) -> Vec<u8> {
        vec![tag; 32]
    }

    #[test]
    fn round_trips() {
        let key = key32(7);
        let msg = b"the ledger accepts what the policy demands";
        let blob = encrypt(msg, &key).unwrap();
        let back = decrypt(&blob, &key).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let key = key32(1);
        let other = key32(2);
        let blob = encrypt(b"secret", &key).unwrap();
        assert!(matches!(
            decrypt(&blob, &other),
            Err(CipherError::AuthenticationFailed)
        ));
    }

    #[test]
    fn tampered_blob_fails() {
        let key = key32(9);
        let mut blob = encrypt(b"secret payload", &key).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        assert!(decrypt(&blob, &key).is_err());
    }

    #[test]
    fn nonces_are_not_reused() {
        let key = key32(3);
        let a = encrypt(b"same message", &key).unwrap();
        let b = encrypt(b"same message", &key).unwrap();
        assert_ne!(a, b, "fresh nonce must vary ciphertext");
    }
}
