use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use ledger_core::{Transaction, TxHash};

use crate::error::StoreError;
use crate::keyrow::KeyRow;
use crate::traits::Store;

/// An in-memory [`Store`] used by unit and integration tests elsewhere in
/// the workspace (processor, p2p) so they don't need a `sled` database on
/// disk to exercise the engine.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    main: HashMap<[u8; 32], Transaction>,
    order: Vec<[u8; 32]>,
    related: HashMap<[u8; 32], Transaction>,
    keys: HashMap<String, KeyRow>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn insert_main(&self, mut tx: Transaction) -> Result<Transaction, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let (index, prev_hash) = match inner.order.last() {
            Some(last_key) => {
                let last = &inner.main[last_key];
                (last.index.unwrap() + 1, last.hash)
            }
            None => (0, tx.hash),
        };
        tx.index = Some(index);
        tx.prev_hash = if inner.order.is_empty() { None } else { Some(prev_hash) };
        tx.date = Some(Utc::now());
        inner.order.push(*tx.hash.as_bytes());
        inner.main.insert(*tx.hash.as_bytes(), tx.clone());
        Ok(tx)
    }

    fn insert_related(&self, tx: &Transaction) -> Result<(), StoreError> {
        self.inner.lock().unwrap().related.insert(*tx.hash.as_bytes(), tx.clone());
        Ok(())
    }

    fn get(&self, hash: &TxHash) -> Result<Option<Transaction>, StoreError> {
        Ok(self.inner.lock().unwrap().main.get(hash.as_bytes()).cloned())
    }

    fn get_last(&self) -> Result<Option<Transaction>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.order.last().and_then(|k| inner.main.get(k)).cloned())
    }

    fn get_by_object_type(&self, object_type: u8) -> Result<Vec<Transaction>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .main
            .values()
            .filter(|tx| tx.object_type as u8 == object_type)
            .cloned()
            .collect())
    }

    fn count_main(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().main.len() as u64)
    }

    fn add_key(&self, row: KeyRow) -> Result<(), StoreError> {
        self.inner.lock().unwrap().keys.insert(row.address.clone(), row);
        Ok(())
    }

    fn get_key_by_name(&self, name: &str) -> Result<Option<KeyRow>, StoreError> {
        Ok(self.inner.lock().unwrap().keys.values().find(|k| k.name == name).cloned())
    }

    fn get_keys_by_derivation_path(&self, derivation_path: &str) -> Result<Vec<KeyRow>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .keys
            .values()
            .filter(|k| k.derivation_path == derivation_path)
            .cloned()
            .collect())
    }

    fn get_key_pairs(&self) -> Result<Vec<KeyRow>, StoreError> {
        Ok(self.inner.lock().unwrap().keys.values().cloned().collect())
    }

    fn count_keys(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().keys.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{ObjectType, OrgTxRef};

    fn genesis_tx() -> Transaction {
        Transaction::build(
            ObjectType::Genesis,
            "",
            OrgTxRef::Genesis,
            None,
            br#"{"Name":"Test Org","Description":"d","MasterPublicKey":"","MinimumRequiredSignaturePaths":[],"RequiredSignaturePathsPerObject":{},"Rules":[]}"#.to_vec(),
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn assigns_sequential_index() {
        let store = InMemoryStore::new();
        let a = store.insert_main(genesis_tx()).unwrap();
        let b = store.insert_main(genesis_tx()).unwrap();
        assert_eq!(a.index, Some(0));
        assert_eq!(b.index, Some(1));
        assert_eq!(b.prev_hash, Some(a.hash));
    }

    #[test]
    fn counts_and_lookups_work() {
        let store = InMemoryStore::new();
        assert_eq!(store.count_main().unwrap(), 0);
        let tx = store.insert_main(genesis_tx()).unwrap();
        assert_eq!(store.count_main().unwrap(), 1);
        assert!(store.get(&tx.hash).unwrap().is_some());
        assert_eq!(store.get_by_object_type(0).unwrap().len(), 1);
    }
}
