use ledger_core::{Transaction, TxHash};

use crate::error::StoreError;
use crate::keyrow::KeyRow;

/// The persistence contract the engine requires from its append store. The
/// spec treats this as an opaque external collaborator; this trait is the
/// capability set the rest of the workspace is written against (§9
/// "Generic interface" guidance — a capability set rather than a runtime
/// type check).
pub trait Store: Send + Sync {
    /// Atomically assigns `index = prev.index + 1` and `prev_hash =
    /// prev.hash`, stores the transaction, and returns it with those
    /// fields (and `date`) populated.
    fn insert_main(&self, tx: Transaction) -> Result<Transaction, StoreError>;

    /// Append-only side-store insert for transactions of local interest.
    fn insert_related(&self, tx: &Transaction) -> Result<(), StoreError>;

    fn get(&self, hash: &TxHash) -> Result<Option<Transaction>, StoreError>;

    fn get_last(&self) -> Result<Option<Transaction>, StoreError>;

    fn get_by_object_type(&self, object_type: u8) -> Result<Vec<Transaction>, StoreError>;

    fn count_main(&self) -> Result<u64, StoreError>;

    fn add_key(&self, row: KeyRow) -> Result<(), StoreError>;

    fn get_key_by_name(&self, name: &str) -> Result<Option<KeyRow>, StoreError>;

    fn get_keys_by_derivation_path(&self, derivation_path: &str) -> Result<Vec<KeyRow>, StoreError>;

    fn get_key_pairs(&self) -> Result<Vec<KeyRow>, StoreError>;

    fn count_keys(&self) -> Result<u64, StoreError>;
}
