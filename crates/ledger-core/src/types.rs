use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ── TxHash ────────────────────────────────────────────────────────────────────

/// 32-byte double-SHA-256 transaction hash; also doubles as an organization
/// identifier (the Genesis transaction's hash).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() != 32 {
            return Err(CoreError::MalformedHash(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({}…)", &self.to_hex()[..12])
    }
}

// ── OrgTxRef ──────────────────────────────────────────────────────────────────

/// A transaction's reference to the Genesis transaction that defines its
/// owning organization. Empty for Genesis itself (I3); exactly 32 bytes for
/// every other transaction (I4).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrgTxRef {
    Genesis,
    Ref(TxHash),
}

impl OrgTxRef {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        match bytes.len() {
            0 => Ok(OrgTxRef::Genesis),
            32 => Ok(OrgTxRef::Ref(TxHash::from_bytes(bytes)?)),
            other => Err(CoreError::MalformedOrganizationRef(other)),
        }
    }

    /// Bytes as they appear on the wire: empty for Genesis, 32 bytes otherwise.
    pub fn as_wire_bytes(&self) -> &[u8] {
        match self {
            OrgTxRef::Genesis => &[],
            OrgTxRef::Ref(hash) => &hash.0,
        }
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, OrgTxRef::Genesis)
    }

    pub fn hash(&self) -> Option<&TxHash> {
        match self {
            OrgTxRef::Genesis => None,
            OrgTxRef::Ref(hash) => Some(hash),
        }
    }
}

impl fmt::Debug for OrgTxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrgTxRef::Genesis => write!(f, "OrgTxRef::Genesis"),
            OrgTxRef::Ref(hash) => write!(f, "OrgTxRef::Ref({hash:?})"),
        }
    }
}

// ── ObjectType ────────────────────────────────────────────────────────────────

/// The wire-level object-type tag carried in `meta[0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectType {
    Genesis = 0,
    File = 1,
    Object = 2,
    Certificate = 3,
    Executable = 4,
    Asset = 5,
    Token = 6,
    Decision = 7,
    Law = 8,
    Proposal = 9,
    EncryptedFile = 10,
    EncryptedCertificate = 11,
    EncryptedDecision = 12,
    EncryptedIdentity = 13,
    EncryptedProposal = 14,
    EncryptedExecutable = 15,
    EncryptedAsset = 16,
    EncryptedObject = 17,
}

impl ObjectType {
    pub fn is_genesis(self) -> bool {
        matches!(self, ObjectType::Genesis)
    }

    /// Name used as the key into an organization's
    /// `RequiredSignaturePathsPerObject` override map.
    pub fn name(self) -> &'static str {
        match self {
            ObjectType::Genesis => "Genesis",
            ObjectType::File => "File",
            ObjectType::Object => "Object",
            ObjectType::Certificate => "Certificate",
            ObjectType::Executable => "Executable",
            ObjectType::Asset => "Asset",
            ObjectType::Token => "Token",
            ObjectType::Decision => "Decision",
            ObjectType::Law => "Law",
            ObjectType::Proposal => "Proposal",
            ObjectType::EncryptedFile => "EncryptedFile",
            ObjectType::EncryptedCertificate => "EncryptedCertificate",
            ObjectType::EncryptedDecision => "EncryptedDecision",
            ObjectType::EncryptedIdentity => "EncryptedIdentity",
            ObjectType::EncryptedProposal => "EncryptedProposal",
            ObjectType::EncryptedExecutable => "EncryptedExecutable",
            ObjectType::EncryptedAsset => "EncryptedAsset",
            ObjectType::EncryptedObject => "EncryptedObject",
        }
    }
}

impl TryFrom<u8> for ObjectType {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use ObjectType::*;
        Ok(match value {
            0 => Genesis,
            1 => File,
            2 => Object,
            3 => Certificate,
            4 => Executable,
            5 => Asset,
            6 => Token,
            7 => Decision,
            8 => Law,
            9 => Proposal,
            10 => EncryptedFile,
            11 => EncryptedCertificate,
            12 => EncryptedDecision,
            13 => EncryptedIdentity,
            14 => EncryptedProposal,
            15 => EncryptedExecutable,
            16 => EncryptedAsset,
            17 => EncryptedObject,
            other => return Err(CoreError::UnknownObjectType(other)),
        })
    }
}

// ── Organization ──────────────────────────────────────────────────────────────

/// The organization value object embedded in a Genesis transaction's `data`
/// and cached on every transaction that refers back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "MasterPublicKey")]
    pub master_public_key: String,
    #[serde(rename = "MinimumRequiredSignaturePaths")]
    pub minimum_required_signature_paths: Vec<String>,
    #[serde(rename = "RequiredSignaturePathsPerObject")]
    pub required_signature_paths_per_object: std::collections::BTreeMap<String, Vec<String>>,
    #[serde(rename = "Rules")]
    pub rules: Vec<String>,
}

impl Organization {
    pub fn from_json(data: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(data).map_err(|e| CoreError::InvalidOrganizationJson(e.to_string()))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(|e| CoreError::InvalidOrganizationJson(e.to_string()))
    }

    /// Patterns required for `object_type`, falling back to the
    /// organization-wide minimum when no per-object override exists.
    pub fn required_paths_for(&self, object_type_name: &str) -> &[String] {
        self.required_signature_paths_per_object
            .get(object_type_name)
            .map(|v| v.as_slice())
            .unwrap_or(&self.minimum_required_signature_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_round_trips_through_byte_values() {
        for value in 0u8..=17 {
            let ty = ObjectType::try_from(value).unwrap();
            assert_eq!(ty as u8, value);
        }
    }

    #[test]
    fn object_type_rejects_out_of_range() {
        assert!(ObjectType::try_from(18).is_err());
    }

    #[test]
    fn org_tx_ref_round_trips() {
        assert!(OrgTxRef::from_bytes(&[]).unwrap().is_genesis());
        let hash_bytes = [7u8; 32];
        let ref_ = OrgTxRef::from_bytes(&hash_bytes).unwrap();
        assert_eq!(ref_.as_wire_bytes(), &hash_bytes);
    }

    #[test]
    fn org_tx_ref_rejects_wrong_length() {
        assert!(OrgTxRef::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn organization_json_round_trips_scenario_a() {
        let json = br#"{"Name":"Test Org","Description":"Test Desc","MasterPublicKey":"","MinimumRequiredSignaturePaths":["1/*+"],"RequiredSignaturePathsPerObject":{},"Rules":["Rule1","Rule2"]}"#;
        let org = Organization::from_json(json).unwrap();
        assert_eq!(org.name, "Test Org");
        assert_eq!(org.minimum_required_signature_paths, vec!["1/*+".to_string()]);
        assert_eq!(org.to_json().unwrap().len(), json.len());
    }
}
