use zeroize::Zeroizing;

/// An owned signing identity: the keystore's in-memory view of one
/// persisted key row, with the private key decrypted and held only for
/// the lifetime of the process.
pub struct KeyPair {
    pub name: String,
    pub derivation_path: String,
    pub address: String,
    pub public_key: [u8; 33],
    private_key: Zeroizing<[u8; 32]>,
}

impl KeyPair {
    pub(crate) fn new(
        name: String,
        derivation_path: String,
        address: String,
        public_key: [u8; 33],
        private_key: [u8; 32],
    ) -> Self {
        Self {
            name,
            derivation_path,
            address,
            public_key,
            private_key: Zeroizing::new(private_key),
        }
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    pub fn sign(&self, digest: &[u8]) -> Result<[u8; 64], ledger_crypto::SigningError> {
        ledger_crypto::sign(digest, &*self.private_key)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("derivation_path", &self.derivation_path)
            .finish_non_exhaustive()
    }
}
