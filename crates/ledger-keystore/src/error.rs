use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("wrong password: cannot decrypt keystore entry {0}")]
    WrongPassword(String),

    #[error("extended key is public-only; a private-capable key is required here")]
    NotPrivateCapable,

    #[error("HD key error: {0}")]
    HdKey(#[from] ledger_hdkey::HdKeyError),

    #[error("signing error: {0}")]
    Signing(#[from] ledger_crypto::SigningError),

    #[error("cipher error: {0}")]
    Cipher(#[from] ledger_crypto::CipherError),

    #[error("store error: {0}")]
    Store(#[from] ledger_store::StoreError),

    #[error("stored extended key blob is not valid UTF-8")]
    InvalidEncoding,
}
