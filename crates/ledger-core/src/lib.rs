//! The transaction data model: the canonical wire codec, hashing rule, and
//! the newtypes (`TxHash`, `OrgTxRef`, `ObjectType`) everything else in the
//! workspace builds on.

pub mod codec;
pub mod constants;
pub mod error;
pub mod transaction;
pub mod types;

pub use codec::{decode, encode, hash_transaction, hashed_bytes};
pub use error::CoreError;
pub use transaction::{Signer, Transaction};
pub use types::{ObjectType, Organization, OrgTxRef, TxHash};
