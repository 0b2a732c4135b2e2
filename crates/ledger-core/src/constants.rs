//! ─── Ledger Protocol Constants ──────────────────────────────────────────────

// ── Keystore key derivation ──────────────────────────────────────────────────

/// Fixed build-time salt for the keystore's password KDF. Not secret — its
/// role is to separate this deployment's derived keys from any other
/// PBKDF2 user of the same password, not to add entropy.
pub const KEYSTORE_SALT: [u8; 21] = *b"ledger-keystore-salt0";

/// PBKDF2-HMAC-SHA256 iteration count for the keystore encryption key.
pub const KEYSTORE_PBKDF2_ITERATIONS: u32 = 1_000_000;

/// Derived keystore encryption key length, in bytes.
pub const KEYSTORE_KEY_LENGTH: usize = 32;

/// Name given to the keystore's self-generated identity key when a fresh
/// store is opened with no persisted keys.
pub const NODE_KEY_NAME: &str = "Node";

/// Derivation path recorded for the node's own identity key.
pub const NODE_KEY_DERIVATION_PATH: &str = "0";

// ── Wire protocol ────────────────────────────────────────────────────────────

/// Default TCP port the node listens on.
pub const DEFAULT_PORT: u16 = 8443;

/// Frame terminator byte. No payload may contain this byte (see
/// `ledger_p2p` for the length-prefixed replacement framing).
pub const FRAME_TERMINATOR: u8 = 0xFF;

/// Soft cap on simultaneously active peer connections.
pub const MAXIMUM_CONNECTIONS: usize = 20;

/// Number of peers queried during head synchronization.
pub const HEAD_SYNC_FANOUT: usize = 10;

// ── Transaction codec ────────────────────────────────────────────────────────

/// Byte width of one signer block: public_key(33) ‖ signature(64) ‖
/// derivation_path(16).
pub const SIGNER_STRIDE: usize = 33 + 64 + 16;

/// Minimum byte length of a well-formed serialized transaction (meta ‖
/// data_length ‖ targets_length, with both length fields zero).
pub const MIN_TRANSACTION_LENGTH: usize = 8;

/// Compressed secp256k1 public key length.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Compact secp256k1 signature length.
pub const SIGNATURE_LENGTH: usize = 64;

/// Fixed-width derivation path encoding length.
pub const DERIVATION_PATH_LENGTH: usize = 16;

/// Length of a transaction hash / organization reference.
pub const HASH_LENGTH: usize = 32;
