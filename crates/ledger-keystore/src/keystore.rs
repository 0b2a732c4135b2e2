use std::collections::HashMap;

use rand::RngCore;
use zeroize::Zeroizing;

use ledger_core::constants::{KEYSTORE_KEY_LENGTH, KEYSTORE_PBKDF2_ITERATIONS, KEYSTORE_SALT, NODE_KEY_DERIVATION_PATH, NODE_KEY_NAME};
use ledger_hdkey::ExtendedKey;
use ledger_store::{KeyRow, Store};

use crate::error::KeystoreError;
use crate::keypair::KeyPair;

/// Password-unlocked in-memory map of owned keys. Persistence of the
/// encrypted key material is delegated to a [`Store`]; the keystore itself
/// only ever holds plaintext private keys in process memory.
pub struct Keystore {
    encryption_key: Zeroizing<[u8; KEYSTORE_KEY_LENGTH]>,
    keys: HashMap<String, KeyPair>,
}

fn derive_encryption_key(password: &[u8]) -> Zeroizing<[u8; KEYSTORE_KEY_LENGTH]> {
    let derived = ledger_crypto::pbkdf2(password, &KEYSTORE_SALT, KEYSTORE_PBKDF2_ITERATIONS, KEYSTORE_KEY_LENGTH);
    let mut key = [0u8; KEYSTORE_KEY_LENGTH];
    key.copy_from_slice(&derived);
    Zeroizing::new(key)
}

fn key_pair_from_row(row: &KeyRow, encryption_key: &[u8]) -> Result<KeyPair, KeystoreError> {
    let decrypted = ledger_crypto::decrypt(&row.encrypted_private_key, encryption_key)
        .map_err(|_| KeystoreError::WrongPassword(row.name.clone()))?;
    let encoded = String::from_utf8(decrypted).map_err(|_| KeystoreError::InvalidEncoding)?;
    let extended = ExtendedKey::from_base58(&encoded)?;
    let private_key = extended.private_key_bytes().ok_or(KeystoreError::NotPrivateCapable)?;
    Ok(KeyPair::new(
        row.name.clone(),
        row.derivation_path.clone(),
        row.address.clone(),
        extended.public_key_bytes(),
        private_key,
    ))
}

impl Keystore {
    /// Derives the PBKDF2 encryption key from `password`, loads every
    /// persisted key row from `store`, and decrypts each into memory. If
    /// the store holds no keys yet, generates and persists a fresh "Node"
    /// master key pair. Fails atomically — on the first decryption
    /// failure (wrong password), no partial state is left behind.
    pub fn open<S: Store>(password: &[u8], store: &S) -> Result<Self, KeystoreError> {
        let encryption_key = derive_encryption_key(password);
        let rows = store.get_key_pairs()?;

        if rows.is_empty() {
            let mut keystore = Keystore {
                encryption_key,
                keys: HashMap::new(),
            };
            keystore.new_key_pair(store, NODE_KEY_NAME)?;
            return Ok(keystore);
        }

        let mut keys = HashMap::with_capacity(rows.len());
        for row in &rows {
            let pair = key_pair_from_row(row, &encryption_key)?;
            keys.insert(pair.address.clone(), pair);
        }
        Ok(Keystore { encryption_key, keys })
    }

    /// Persists a key handed to us by an organization (e.g. a derived
    /// child extended private key authorized under its policy) and indexes
    /// it in memory.
    pub fn add_key_pair<S: Store>(
        &mut self,
        store: &S,
        name: &str,
        derivation_path: &str,
        extended_private_key: &str,
    ) -> Result<(), KeystoreError> {
        let extended = ExtendedKey::from_base58(extended_private_key)?;
        let public_key = extended.public_key_bytes();
        let address = extended.address();
        let private_key = extended.private_key_bytes().ok_or(KeystoreError::NotPrivateCapable)?;
        let encrypted_private_key = ledger_crypto::encrypt(extended_private_key.as_bytes(), &*self.encryption_key)?;

        store.add_key(KeyRow {
            name: name.to_string(),
            derivation_path: derivation_path.to_string(),
            address: address.clone(),
            public_key,
            encrypted_private_key,
        })?;

        self.keys.insert(
            address.clone(),
            KeyPair::new(name.to_string(), derivation_path.to_string(), address, public_key, private_key),
        );
        Ok(())
    }

    /// Generates a fresh master key, unrelated to any organization's key
    /// hierarchy, and persists it under `derivation_path = "0"`.
    pub fn new_key_pair<S: Store>(&mut self, store: &S, name: &str) -> Result<String, KeystoreError> {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        let master = ExtendedKey::master_from_seed(&seed)?;
        let extended_private_key = master.to_base58();
        self.add_key_pair(store, name, NODE_KEY_DERIVATION_PATH, &extended_private_key)?;
        tracing::info!(name, "generated a new keystore master key pair");
        Ok(extended_private_key)
    }

    /// Signs `data` with the private key of a caller-supplied extended
    /// private key, without persisting or indexing it.
    pub fn sign_with_extended(extended_private_key: &str, data: &[u8]) -> Result<[u8; 64], KeystoreError> {
        let extended = ExtendedKey::from_base58(extended_private_key)?;
        let private_key = extended.private_key_bytes().ok_or(KeystoreError::NotPrivateCapable)?;
        Ok(ledger_crypto::sign(data, &private_key)?)
    }

    pub fn is_owned_address(&self, address: &str) -> bool {
        self.keys.contains_key(address)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&KeyPair> {
        self.keys.values().find(|kp| kp.name == name)
    }

    pub fn get_by_address(&self, address: &str) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyPair> {
        self.keys.values()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::InMemoryStore;

    #[test]
    fn open_on_empty_store_generates_node_key() {
        let store = InMemoryStore::new();
        let keystore = Keystore::open(b"hunter2", &store).unwrap();
        assert_eq!(keystore.len(), 1);
        assert!(keystore.get_by_name(NODE_KEY_NAME).is_some());
        assert_eq!(store.count_keys().unwrap(), 1);
    }

    #[test]
    fn reopening_with_correct_password_recovers_keys() {
        let store = InMemoryStore::new();
        let first = Keystore::open(b"hunter2", &store).unwrap();
        let address = first.get_by_name(NODE_KEY_NAME).unwrap().address.clone();
        drop(first);

        let second = Keystore::open(b"hunter2", &store).unwrap();
        assert_eq!(second.len(), 1);
        assert!(second.is_owned_address(&address));
    }

    #[test]
    fn reopening_with_wrong_password_fails_atomically() {
        let store = InMemoryStore::new();
        let _ = Keystore::open(b"hunter2", &store).unwrap();
        let result = Keystore::open(b"wrong-password", &store);
        assert!(matches!(result, Err(KeystoreError::WrongPassword(_))));
    }

    #[test]
    fn add_key_pair_from_extended_private_key_round_trips() {
        let store = InMemoryStore::new();
        let mut keystore = Keystore::open(b"hunter2", &store).unwrap();
        let seed = [9u8; 32];
        let extended = ExtendedKey::master_from_seed(&seed).unwrap().child(5).unwrap();
        let xprv = extended.to_base58();
        keystore.add_key_pair(&store, "Org Signer", "5", &xprv).unwrap();
        assert!(keystore.get_by_name("Org Signer").is_some());
        assert_eq!(store.count_keys().unwrap(), 2);
    }

    #[test]
    fn sign_with_extended_does_not_require_keystore_state() {
        let seed = [3u8; 32];
        let extended = ExtendedKey::master_from_seed(&seed).unwrap();
        let xprv = extended.to_base58();
        let digest = ledger_crypto::dhash(b"message");
        let signature = Keystore::sign_with_extended(&xprv, &digest).unwrap();
        assert!(ledger_crypto::verify(&digest, &signature, &extended.public_key_bytes()));
    }
}
