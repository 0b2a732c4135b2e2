use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Parsing ───────────────────────────────────────────────────────────────
    #[error("transaction shorter than the minimum {0}-byte header")]
    TooShort(usize),

    #[error("hash must be exactly 32 bytes, got {0}")]
    MalformedHash(usize),

    #[error("organization reference must be empty or 32 bytes, got {0}")]
    MalformedOrganizationRef(usize),

    #[error("invalid hex encoding")]
    InvalidHex,

    #[error("unknown object type byte: {0}")]
    UnknownObjectType(u8),

    #[error("invalid organization JSON: {0}")]
    InvalidOrganizationJson(String),

    #[error("signature-set arrays have mismatched lengths: {signatures} signatures, {public_keys} public keys, {paths} paths")]
    SignerArityMismatch {
        signatures: usize,
        public_keys: usize,
        paths: usize,
    },

    // ── Invariant violations (I3/I4) ─────────────────────────────────────────
    #[error("Genesis transaction must carry an empty organization_tx")]
    GenesisWithOrganizationRef,

    #[error("non-Genesis transaction must carry a 32-byte organization_tx")]
    MissingOrganizationRef,

    #[error("organization transaction not found in store: {0}")]
    UnknownOrganization(String),

    #[error("organization transaction is not itself a Genesis transaction")]
    OrganizationRefNotGenesis,

    // ── Signature / policy ────────────────────────────────────────────────────
    #[error("initial signer (proposer) signature does not verify")]
    InvalidInitialSignature,

    #[error("signer {0} signature does not verify against the transaction hash")]
    InvalidSignerSignature(usize),

    #[error("signer {0} derivation path does not derive to its claimed public key")]
    DerivationPathMismatch(usize),

    // ── Build ─────────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}
