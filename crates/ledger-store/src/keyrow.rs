use serde::{Deserialize, Serialize};

/// A persisted keystore entry. The private key material here is always the
/// AES-GCM-encrypted serialized extended private key — the store never
/// sees a plaintext private key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRow {
    pub name: String,
    pub derivation_path: String,
    pub address: String,
    pub public_key: [u8; 33],
    pub encrypted_private_key: Vec<u8>,
}
