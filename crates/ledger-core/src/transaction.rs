use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledger_hdkey::DerivationPath;

use crate::constants::{DERIVATION_PATH_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::error::CoreError;
use crate::types::{ObjectType, Organization, OrgTxRef, TxHash};

/// One signer's contribution to a transaction: the signature it produced,
/// the public key it claims, and the derivation path under the organization
/// master key that public key is supposed to come from.
#[derive(Clone, Serialize, Deserialize)]
pub struct Signer {
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
    pub signature: [u8; SIGNATURE_LENGTH],
    pub derivation_path: [u8; DERIVATION_PATH_LENGTH],
}

impl Signer {
    pub fn derivation_steps(&self) -> Result<DerivationPath, CoreError> {
        DerivationPath::from_fixed_bytes(&self.derivation_path)
            .map_err(|_| CoreError::Other("malformed derivation path bytes".into()))
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("public_key", &hex::encode(self.public_key))
            .field("derivation_path", &hex::encode(self.derivation_path))
            .finish_non_exhaustive()
    }
}

/// A ledger transaction: the central entity of the chain. `hash` is frozen
/// at `Build` time and never recomputed afterward (I2); `signers` grows
/// incrementally via `Sign`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned monotonic position; `None` until persisted.
    pub index: Option<u64>,
    pub hash: TxHash,
    /// Store-assigned; `None` until persisted.
    pub prev_hash: Option<TxHash>,
    pub meta: [u8; 4],
    pub object_type: ObjectType,
    pub sub_type: String,
    pub organization_tx: OrgTxRef,
    /// Resolved by looking up `organization_tx`, or parsed from `data` for
    /// Genesis. Not part of the wire codec; populated by the processor.
    pub organization: Option<Organization>,
    pub data: Vec<u8>,
    pub targets: Vec<String>,
    pub signers: Vec<Signer>,
    /// Wall-clock time recorded at first store insertion; `None` until then.
    pub date: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Builds a new, unsigned transaction. For non-Genesis object types the
    /// caller must supply the resolved `organization` (looked up via
    /// `organization_tx` in the store) so the hash-freezing step has
    /// everything it needs; Genesis transactions parse `data` as the
    /// organization JSON instead.
    pub fn build(
        object_type: ObjectType,
        sub_type: impl Into<String>,
        organization_tx: OrgTxRef,
        organization: Option<Organization>,
        data: Vec<u8>,
        targets: Vec<String>,
    ) -> Result<Self, CoreError> {
        match object_type {
            ObjectType::Genesis => {
                if !organization_tx.is_genesis() {
                    return Err(CoreError::GenesisWithOrganizationRef);
                }
                // Validate the payload parses, even though the parsed value
                // isn't strictly required until Process resolves it.
                let parsed = Organization::from_json(&data)?;
                let meta = [object_type as u8, 0, 0, 0];
                let hash = crate::codec::hash_transaction(&meta, &organization_tx, &data, &targets);
                Ok(Transaction {
                    index: None,
                    hash,
                    prev_hash: None,
                    meta,
                    object_type,
                    sub_type: sub_type.into(),
                    organization_tx,
                    organization: Some(parsed),
                    data,
                    targets,
                    signers: Vec::new(),
                    date: None,
                })
            }
            _ => {
                if organization_tx.is_genesis() {
                    return Err(CoreError::MissingOrganizationRef);
                }
                let meta = [object_type as u8, 0, 0, 0];
                let hash = crate::codec::hash_transaction(&meta, &organization_tx, &data, &targets);
                Ok(Transaction {
                    index: None,
                    hash,
                    prev_hash: None,
                    meta,
                    object_type,
                    sub_type: sub_type.into(),
                    organization_tx,
                    organization,
                    data,
                    targets,
                    signers: Vec::new(),
                    date: None,
                })
            }
        }
    }

    /// Appends one signer triple: a 64-byte signature over `self.hash`, the
    /// signing public key, and its derivation path. Preserves I1 by
    /// construction — there are no parallel arrays to fall out of sync.
    pub fn sign(
        &mut self,
        private_key: &[u8],
        public_key: [u8; PUBLIC_KEY_LENGTH],
        derivation_path: &DerivationPath,
    ) -> Result<(), ledger_crypto::SigningError> {
        let signature = ledger_crypto::sign(&self.hash.0, private_key)?;
        self.signers.push(Signer {
            public_key,
            signature,
            derivation_path: derivation_path.to_fixed_bytes(),
        });
        Ok(())
    }

    pub fn is_genesis(&self) -> bool {
        self.object_type.is_genesis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a_org_json() -> Vec<u8> {
        br#"{"Name":"Test Org","Description":"Test Desc","MasterPublicKey":"","MinimumRequiredSignaturePaths":["1/*+"],"RequiredSignaturePathsPerObject":{},"Rules":["Rule1","Rule2"]}"#.to_vec()
    }

    #[test]
    fn build_genesis_freezes_expected_hash() {
        let tx = Transaction::build(
            ObjectType::Genesis,
            "",
            OrgTxRef::Genesis,
            None,
            scenario_a_org_json(),
            vec!["m/1'/1:5".to_string()],
        )
        .unwrap();
        assert_eq!(
            tx.hash.to_hex(),
            "337349113a5c51e8bc96c9c7182fdb16fd3aec7f292ce5e1847ef0f70530bb2d"
        );
    }

    #[test]
    fn build_genesis_rejects_non_empty_organization_tx() {
        let result = Transaction::build(
            ObjectType::Genesis,
            "",
            OrgTxRef::Ref(TxHash([1; 32])),
            None,
            scenario_a_org_json(),
            vec![],
        );
        assert!(matches!(result, Err(CoreError::GenesisWithOrganizationRef)));
    }

    #[test]
    fn build_non_genesis_requires_organization_ref() {
        let result = Transaction::build(
            ObjectType::File,
            "txt",
            OrgTxRef::Genesis,
            None,
            b"payload".to_vec(),
            vec![],
        );
        assert!(matches!(result, Err(CoreError::MissingOrganizationRef)));
    }

    #[test]
    fn sign_appends_signer_without_disturbing_hash() {
        let secp = secp256k1::Secp256k1::new();
        let secret = secp256k1::SecretKey::from_slice(&[0x22; 32]).unwrap();
        let public = secp256k1::PublicKey::from_secret_key(&secp, &secret);
        let mut tx = Transaction::build(
            ObjectType::Genesis,
            "",
            OrgTxRef::Genesis,
            None,
            scenario_a_org_json(),
            vec!["m/1'/1:5".to_string()],
        )
        .unwrap();
        let hash_before = tx.hash;
        let path = DerivationPath(vec![1, 0, 0, 0]);
        tx.sign(&secret.secret_bytes(), public.serialize(), &path).unwrap();
        assert_eq!(tx.hash, hash_before);
        assert_eq!(tx.signers.len(), 1);
    }
}
