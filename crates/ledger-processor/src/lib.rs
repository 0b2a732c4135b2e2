//! Signature-set policy and the transaction-intake pipeline: everything
//! between "bytes arrived" and "transaction is durably part of the chain".

pub mod error;
pub mod policy;
pub mod processor;

pub use error::ProcessorError;
pub use policy::{check_signatures, SignatureCheck};
pub use processor::process;
