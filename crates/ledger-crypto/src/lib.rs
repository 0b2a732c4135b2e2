//! Low-level cryptographic primitives for the ledger: hashing, key
//! derivation, authenticated encryption, and secp256k1 signatures.
//! Nothing in this crate knows about transactions, organizations, or the
//! wire protocol — those live in `ledger-core` and `ledger-p2p`.

pub mod cipher;
pub mod hash;
pub mod kdf;
pub mod secp;

pub use cipher::{decrypt, encrypt, CipherError};
pub use hash::{dhash, hash, hash160};
pub use kdf::pbkdf2;
pub use secp::{sign, verify, SigningError};
