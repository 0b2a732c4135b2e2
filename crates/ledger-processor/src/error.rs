use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("codec error: {0}")]
    Codec(#[from] ledger_core::CoreError),

    #[error("store error: {0}")]
    Store(#[from] ledger_store::StoreError),

    #[error("keystore error: {0}")]
    Keystore(#[from] ledger_keystore::KeystoreError),

    #[error("organization transaction {0} not found in store")]
    UnknownOrganization(String),

    #[error("organization reference {0} does not point at a Genesis transaction")]
    OrganizationRefNotGenesis(String),
}
