use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;

use ledger_core::{ObjectType, Transaction, TxHash};

use crate::error::StoreError;
use crate::keyrow::KeyRow;
use crate::traits::Store;

const META_HEAD_INDEX: &str = "head_index";
const META_HEAD_HASH: &str = "head_hash";

/// `sled`-backed reference implementation of [`Store`]. Named trees:
///
///   main     — tx hash(32)        → bincode(Transaction)
///   related  — tx hash(32)        → bincode(Transaction)
///   meta     — utf8 key           → raw bytes (head index/hash counters)
///   keys     — address utf8       → bincode(KeyRow)
///
/// `insert_main` serializes index/prev_hash assignment behind `insert_lock`
/// — sled's per-tree operations are individually atomic, but the
/// read-current-head-then-write-next-index sequence is not, per §5.
pub struct SledStore {
    main: sled::Tree,
    related: sled::Tree,
    meta: sled::Tree,
    keys: sled::Tree,
    insert_lock: Mutex<()>,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        let main = db.open_tree("main").map_err(|e| StoreError::Backend(e.to_string()))?;
        let related = db.open_tree("related").map_err(|e| StoreError::Backend(e.to_string()))?;
        let meta = db.open_tree("meta").map_err(|e| StoreError::Backend(e.to_string()))?;
        let keys = db.open_tree("keys").map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            main,
            related,
            meta,
            keys,
            insert_lock: Mutex::new(()),
        })
    }

    fn head(&self) -> Result<Option<(u64, TxHash)>, StoreError> {
        let index = match self.meta.get(META_HEAD_INDEX).map_err(|e| StoreError::Backend(e.to_string()))? {
            Some(bytes) => u64::from_be_bytes(bytes.as_ref().try_into().map_err(|_| StoreError::Backend("corrupt head_index".into()))?),
            None => return Ok(None),
        };
        let hash_bytes = self
            .meta
            .get(META_HEAD_HASH)
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .ok_or_else(|| StoreError::Backend("head_index present without head_hash".into()))?;
        let hash = TxHash::from_bytes(&hash_bytes).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Some((index, hash)))
    }
}

impl Store for SledStore {
    fn insert_main(&self, mut tx: Transaction) -> Result<Transaction, StoreError> {
        let _guard = self.insert_lock.lock().unwrap();
        let (index, prev_hash) = match self.head()? {
            Some((index, hash)) => (index + 1, Some(hash)),
            None => (0, None),
        };
        tx.index = Some(index);
        tx.prev_hash = prev_hash;
        tx.date = Some(Utc::now());

        let bytes = bincode::serialize(&tx).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.main
            .insert(tx.hash.as_bytes(), bytes)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.meta
            .insert(META_HEAD_INDEX, &index.to_be_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.meta
            .insert(META_HEAD_HASH, tx.hash.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(tx)
    }

    fn insert_related(&self, tx: &Transaction) -> Result<(), StoreError> {
        let bytes = bincode::serialize(tx).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.related
            .insert(tx.hash.as_bytes(), bytes)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn get(&self, hash: &TxHash) -> Result<Option<Transaction>, StoreError> {
        match self.main.get(hash.as_bytes()).map_err(|e| StoreError::Backend(e.to_string()))? {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn get_last(&self) -> Result<Option<Transaction>, StoreError> {
        match self.head()? {
            Some((_, hash)) => self.get(&hash),
            None => Ok(None),
        }
    }

    fn get_by_object_type(&self, object_type: u8) -> Result<Vec<Transaction>, StoreError> {
        let mut out = Vec::new();
        for item in self.main.iter() {
            let (_, bytes) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            let tx: Transaction = bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
            if tx.object_type as u8 == object_type {
                out.push(tx);
            }
        }
        Ok(out)
    }

    fn count_main(&self) -> Result<u64, StoreError> {
        Ok(self.main.len() as u64)
    }

    fn add_key(&self, row: KeyRow) -> Result<(), StoreError> {
        let bytes = bincode::serialize(&row).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.keys
            .insert(row.address.as_bytes(), bytes)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn get_key_by_name(&self, name: &str) -> Result<Option<KeyRow>, StoreError> {
        for item in self.keys.iter() {
            let (_, bytes) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            let row: KeyRow = bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
            if row.name == name {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn get_keys_by_derivation_path(&self, derivation_path: &str) -> Result<Vec<KeyRow>, StoreError> {
        let mut out = Vec::new();
        for item in self.keys.iter() {
            let (_, bytes) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            let row: KeyRow = bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;
            if row.derivation_path == derivation_path {
                out.push(row);
            }
        }
        Ok(out)
    }

    fn get_key_pairs(&self) -> Result<Vec<KeyRow>, StoreError> {
        let mut out = Vec::new();
        for item in self.keys.iter() {
            let (_, bytes) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            out.push(bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?);
        }
        Ok(out)
    }

    fn count_keys(&self) -> Result<u64, StoreError> {
        Ok(self.keys.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::OrgTxRef;

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
    fn insert_main_assigns_index_and_prev_hash() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let first = store.insert_main(genesis_tx()).unwrap();
        assert_eq!(first.index, Some(0));
        assert_eq!(first.prev_hash, None);

        let second = store.insert_main(genesis_tx()).unwrap();
        assert_eq!(second.index, Some(1));
        assert_eq!(second.prev_hash, Some(first.hash));
    }

    #[test]
    fn get_and_get_last_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let tx = store.insert_main(genesis_tx()).unwrap();
        let fetched = store.get(&tx.hash).unwrap().unwrap();
        assert_eq!(fetched.hash, tx.hash);
        let last = store.get_last().unwrap().unwrap();
        assert_eq!(last.hash, tx.hash);
    }

    #[test]
    fn key_rows_round_trip_by_name_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        store
            .add_key(KeyRow {
                name: "Node".into(),
                derivation_path: "0".into(),
                address: "addr1".into(),
                public_key: [1u8; 33],
                encrypted_private_key: vec![1, 2, 3],
            })
            .unwrap();
        assert_eq!(store.count_keys().unwrap(), 1);
        assert!(store.get_key_by_name("Node").unwrap().is_some());
        assert_eq!(store.get_keys_by_derivation_path("0").unwrap().len(), 1);
        assert!(store.get_keys_by_derivation_path("1").unwrap().is_empty());
    }
}
