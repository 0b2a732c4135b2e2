//! The canonical transaction wire format (§4.4): a hand-written codec, kept
//! separate from the `serde`/`bincode` encoding used for store persistence.
//!
//!     meta[4]
//!     organization_tx[0 or 32]       (0 bytes iff object_type == Genesis)
//!     data_length: u32 (LE)
//!     data[data_length]
//!     targets_length: u16 (LE)
//!     targets_bytes[targets_length]  (utf8(join(targets, ",")))
//!     signer* { public_key[33], signature[64], derivation_path[16] }
//!
//! The signer section advances in fixed `SIGNER_STRIDE`-byte strides; a
//! trailing partial stride is silently dropped.

use crate::constants::{DERIVATION_PATH_LENGTH, MIN_TRANSACTION_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH, SIGNER_STRIDE};
use crate::error::CoreError;
use crate::transaction::{Signer, Transaction};
use crate::types::{ObjectType, OrgTxRef, TxHash};

/// `meta ‖ organization_tx ‖ data ‖ utf8(join(targets, ","))` — the bytes
/// that `dhash` is computed over (I2). Signer fields never participate.
pub fn hashed_bytes(meta: &[u8; 4], organization_tx: &OrgTxRef, data: &[u8], targets: &[String]) -> Vec<u8> {
    let joined = targets.join(",");
    let mut bytes = Vec::with_capacity(4 + organization_tx.as_wire_bytes().len() + data.len() + joined.len());
    bytes.extend_from_slice(meta);
    bytes.extend_from_slice(organization_tx.as_wire_bytes());
    bytes.extend_from_slice(data);
    bytes.extend_from_slice(joined.as_bytes());
    bytes
}

pub fn hash_transaction(meta: &[u8; 4], organization_tx: &OrgTxRef, data: &[u8], targets: &[String]) -> TxHash {
    TxHash(ledger_crypto::dhash(&hashed_bytes(meta, organization_tx, data, targets)))
}

/// Serializes a transaction to its canonical wire bytes. Round-trips
/// byte-for-byte through [`decode`] (P1).
pub fn encode(tx: &Transaction) -> Vec<u8> {
    let joined_targets = tx.targets.join(",");
    let org_bytes = tx.organization_tx.as_wire_bytes();

    let mut out = Vec::with_capacity(
        4 + org_bytes.len() + 4 + tx.data.len() + 2 + joined_targets.len() + tx.signers.len() * SIGNER_STRIDE,
    );
    out.extend_from_slice(&tx.meta);
    out.extend_from_slice(org_bytes);
    out.extend_from_slice(&(tx.data.len() as u32).to_le_bytes());
    out.extend_from_slice(&tx.data);
    out.extend_from_slice(&(joined_targets.len() as u16).to_le_bytes());
    out.extend_from_slice(joined_targets.as_bytes());
    for signer in &tx.signers {
        out.extend_from_slice(&signer.public_key);
        out.extend_from_slice(&signer.signature);
        out.extend_from_slice(&signer.derivation_path);
    }
    out
}

/// Parses the canonical wire bytes back into a transaction. `index`,
/// `prev_hash`, `organization`, and `date` are store-assigned fields and
/// are left unset; callers populate them on insert.
pub fn decode(bytes: &[u8]) -> Result<Transaction, CoreError> {
    if bytes.len() < MIN_TRANSACTION_LENGTH {
        return Err(CoreError::TooShort(MIN_TRANSACTION_LENGTH));
    }

    let mut cursor = 0usize;
    let meta: [u8; 4] = bytes[0..4].try_into().unwrap();
    cursor += 4;

    let object_type = ObjectType::try_from(meta[0])?;
    let org_len = if object_type.is_genesis() { 0 } else { 32 };
    if bytes.len() < cursor + org_len {
        return Err(CoreError::TooShort(cursor + org_len));
    }
    let organization_tx = OrgTxRef::from_bytes(&bytes[cursor..cursor + org_len])?;
    cursor += org_len;

    if bytes.len() < cursor + 4 {
        return Err(CoreError::TooShort(cursor + 4));
    }
    let data_length = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()) as usize;
    cursor += 4;
    if bytes.len() < cursor + data_length {
        return Err(CoreError::TooShort(cursor + data_length));
    }
    let data = bytes[cursor..cursor + data_length].to_vec();
    cursor += data_length;

    if bytes.len() < cursor + 2 {
        return Err(CoreError::TooShort(cursor + 2));
    }
    let targets_length = u16::from_le_bytes(bytes[cursor..cursor + 2].try_into().unwrap()) as usize;
    cursor += 2;
    if bytes.len() < cursor + targets_length {
        return Err(CoreError::TooShort(cursor + targets_length));
    }
    let targets_bytes = &bytes[cursor..cursor + targets_length];
    cursor += targets_length;
    let targets: Vec<String> = if targets_bytes.is_empty() {
        Vec::new()
    } else {
        std::str::from_utf8(targets_bytes)
            .map_err(|_| CoreError::InvalidHex)?
            .split(',')
            .map(|s| s.to_string())
            .collect()
    };

    let remaining = &bytes[cursor..];
    let signer_count = remaining.len() / SIGNER_STRIDE;
    let mut signers = Vec::with_capacity(signer_count);
    for i in 0..signer_count {
        let block = &remaining[i * SIGNER_STRIDE..(i + 1) * SIGNER_STRIDE];
        let mut public_key = [0u8; PUBLIC_KEY_LENGTH];
        public_key.copy_from_slice(&block[0..PUBLIC_KEY_LENGTH]);
        let mut signature = [0u8; SIGNATURE_LENGTH];
        signature.copy_from_slice(&block[PUBLIC_KEY_LENGTH..PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH]);
        let mut derivation_path = [0u8; DERIVATION_PATH_LENGTH];
        derivation_path.copy_from_slice(&block[PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH..SIGNER_STRIDE]);
        signers.push(Signer {
            public_key,
            signature,
            derivation_path,
        });
    }

    let hash = hash_transaction(&meta, &organization_tx, &data, &targets);
    let sub_type = String::new();
    let organization = if object_type.is_genesis() {
        Some(crate::types::Organization::from_json(&data)?)
    } else {
        None
    };

    Ok(Transaction {
        index: None,
        hash,
        prev_hash: None,
        meta,
        object_type,
        sub_type,
        organization_tx,
        organization,
        data,
        targets,
        signers,
        date: None,
    })
}
