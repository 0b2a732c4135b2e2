//! The local keystore: password-derived encryption key, decrypted
//! in-memory key map, and the operations an organization or the node
//! itself uses to mint and sign with owned keys.

pub mod error;
pub mod keypair;
pub mod keystore;

pub use error::KeystoreError;
pub use keypair::KeyPair;
pub use keystore::Keystore;
