//! Hierarchical-deterministic keys and the derivation-path predicate logic
//! that organization policies and transaction signers are built on.

pub mod key;
pub mod path;

pub use key::{check_public_key_path, ExtendedKey, HdKeyError, PrivateExtendedKey, PublicExtendedKey};
pub use path::{is_path_under, DerivationPath, PathError, HARDENED_FLAG};
