use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::Sha512;
use thiserror::Error;

use crate::path::DerivationPath;

type HmacSha512 = Hmac<Sha512>;

const PRIVATE_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
const PUBLIC_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];
const SEED_HMAC_KEY: &[u8] = b"Bitcoin seed";

#[derive(Debug, Error)]
pub enum HdKeyError {
    #[error("secp256k1 error: {0}")]
    Secp(#[from] secp256k1::Error),
    #[error("base58 decode error: {0}")]
    Base58(#[from] bs58::decode::Error),
    #[error("extended key checksum mismatch")]
    BadChecksum,
    #[error("extended key payload must be 78 bytes, got {0}")]
    BadLength(usize),
    #[error("unrecognized extended key version bytes")]
    BadVersion,
    #[error("hardened child derivation requires a private-capable parent key")]
    HardenedFromPublicParent,
}

/// One step of an HD key tree: a master or derived key, either
/// private-capable (can derive hardened children and sign) or
/// public-only (a watch key, derived down from an organization's
/// published master public key).
#[derive(Clone)]
pub enum ExtendedKey {
    Private(PrivateExtendedKey),
    Public(PublicExtendedKey),
}

#[derive(Clone)]
pub struct PrivateExtendedKey {
    pub chain_code: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub(crate) secret: SecretKey,
}

#[derive(Clone)]
pub struct PublicExtendedKey {
    pub chain_code: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub(crate) public: PublicKey,
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn fingerprint(pubkey: &[u8; 33]) -> [u8; 4] {
    let h = ledger_crypto::hash160(pubkey);
    [h[0], h[1], h[2], h[3]]
}

impl ExtendedKey {
    /// Derives a master extended private key from a random seed, the BIP32
    /// root of a new HD tree (used both for fresh organization master keys
    /// and the keystore's own "Node" identity key).
    pub fn master_from_seed(seed: &[u8]) -> Result<Self, HdKeyError> {
        let i = hmac_sha512(SEED_HMAC_KEY, seed);
        let (il, ir) = i.split_at(32);
        let secret = SecretKey::from_slice(il)?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);
        Ok(ExtendedKey::Private(PrivateExtendedKey {
            chain_code,
            depth: 0,
            parent_fingerprint: [0; 4],
            child_number: 0,
            secret,
        }))
    }

    pub fn is_private(&self) -> bool {
        matches!(self, ExtendedKey::Private(_))
    }

    /// Strips private material, yielding the public-only counterpart.
    /// Idempotent on an already-public key.
    pub fn neuter(&self) -> ExtendedKey {
        match self {
            ExtendedKey::Private(p) => {
                let secp = Secp256k1::new();
                ExtendedKey::Public(PublicExtendedKey {
                    chain_code: p.chain_code,
                    depth: p.depth,
                    parent_fingerprint: p.parent_fingerprint,
                    child_number: p.child_number,
                    public: PublicKey::from_secret_key(&secp, &p.secret),
                })
            }
            ExtendedKey::Public(p) => ExtendedKey::Public(p.clone()),
        }
    }

    pub fn public_key_bytes(&self) -> [u8; 33] {
        match self {
            ExtendedKey::Private(p) => {
                let secp = Secp256k1::new();
                PublicKey::from_secret_key(&secp, &p.secret).serialize()
            }
            ExtendedKey::Public(p) => p.public.serialize(),
        }
    }

    pub fn private_key_bytes(&self) -> Option<[u8; 32]> {
        match self {
            ExtendedKey::Private(p) => Some(p.secret.secret_bytes()),
            ExtendedKey::Public(_) => None,
        }
    }

    /// `base58(hash160(pub_key))`, with no version byte or checksum.
    pub fn address(&self) -> String {
        bs58::encode(ledger_crypto::hash160(&self.public_key_bytes())).into_string()
    }

    /// Derives the child at `index`. Indices `>= 0x8000_0000` are hardened
    /// and require a private-capable parent.
    pub fn child(&self, index: u32) -> Result<ExtendedKey, HdKeyError> {
        let hardened = index >= crate::path::HARDENED_FLAG;
        match self {
            ExtendedKey::Private(p) => {
                let secp = Secp256k1::new();
                let mut data = if hardened {
                    let mut d = vec![0u8];
                    d.extend_from_slice(&p.secret.secret_bytes());
                    d
                } else {
                    PublicKey::from_secret_key(&secp, &p.secret).serialize().to_vec()
                };
                data.extend_from_slice(&index.to_be_bytes());
                let i = hmac_sha512(&p.chain_code, &data);
                let (il, ir) = i.split_at(32);
                let tweak = Scalar::from_be_bytes(il.try_into().unwrap())?;
                let child_secret = p.secret.add_tweak(&tweak)?;
                let mut chain_code = [0u8; 32];
                chain_code.copy_from_slice(ir);
                let parent_pub = PublicKey::from_secret_key(&secp, &p.secret);
                Ok(ExtendedKey::Private(PrivateExtendedKey {
                    chain_code,
                    depth: p.depth.wrapping_add(1),
                    parent_fingerprint: fingerprint(&parent_pub.serialize()),
                    child_number: index,
                    secret: child_secret,
                }))
            }
            ExtendedKey::Public(p) => {
                if hardened {
                    return Err(HdKeyError::HardenedFromPublicParent);
                }
                let secp = Secp256k1::new();
                let mut data = p.public.serialize().to_vec();
                data.extend_from_slice(&index.to_be_bytes());
                let i = hmac_sha512(&p.chain_code, &data);
                let (il, ir) = i.split_at(32);
                let il_secret = SecretKey::from_slice(il)?;
                let il_point = PublicKey::from_secret_key(&secp, &il_secret);
                let child_public = il_point.combine(&p.public)?;
                let mut chain_code = [0u8; 32];
                chain_code.copy_from_slice(ir);
                Ok(ExtendedKey::Public(PublicExtendedKey {
                    chain_code,
                    depth: p.depth.wrapping_add(1),
                    parent_fingerprint: fingerprint(&p.public.serialize()),
                    child_number: index,
                    public: child_public,
                }))
            }
        }
    }

    /// Serializes to the standard 78-byte BIP32 envelope plus a 4-byte
    /// double-SHA256 checksum, base58-encoded.
    pub fn to_base58(&self) -> String {
        let mut payload = Vec::with_capacity(82);
        let (version, depth, parent_fingerprint, child_number, chain_code, key_material): (
            [u8; 4],
            u8,
            [u8; 4],
            u32,
            [u8; 32],
            [u8; 33],
        ) = match self {
            ExtendedKey::Private(p) => {
                let mut material = [0u8; 33];
                material[1..].copy_from_slice(&p.secret.secret_bytes());
                (
                    PRIVATE_VERSION,
                    p.depth,
                    p.parent_fingerprint,
                    p.child_number,
                    p.chain_code,
                    material,
                )
            }
            ExtendedKey::Public(p) => (
                PUBLIC_VERSION,
                p.depth,
                p.parent_fingerprint,
                p.child_number,
                p.chain_code,
                p.public.serialize(),
            ),
        };
        payload.extend_from_slice(&version);
        payload.push(depth);
        payload.extend_from_slice(&parent_fingerprint);
        payload.extend_from_slice(&child_number.to_be_bytes());
        payload.extend_from_slice(&chain_code);
        payload.extend_from_slice(&key_material);
        let checksum = ledger_crypto::dhash(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    pub fn from_base58(encoded: &str) -> Result<ExtendedKey, HdKeyError> {
        let payload = bs58::decode(encoded).into_vec()?;
        if payload.len() != 82 {
            return Err(HdKeyError::BadLength(payload.len()));
        }
        let (body, checksum) = payload.split_at(78);
        let expected = ledger_crypto::dhash(body);
        if &expected[..4] != checksum {
            return Err(HdKeyError::BadChecksum);
        }
        let version: [u8; 4] = body[0..4].try_into().unwrap();
        let depth = body[4];
        let parent_fingerprint: [u8; 4] = body[5..9].try_into().unwrap();
        let child_number = u32::from_be_bytes(body[9..13].try_into().unwrap());
        let chain_code: [u8; 32] = body[13..45].try_into().unwrap();
        let key_material = &body[45..78];

        if version == PRIVATE_VERSION {
            let secret = SecretKey::from_slice(&key_material[1..])?;
            Ok(ExtendedKey::Private(PrivateExtendedKey {
                chain_code,
                depth,
                parent_fingerprint,
                child_number,
                secret,
            }))
        } else if version == PUBLIC_VERSION {
            let public = PublicKey::from_slice(key_material)?;
            Ok(ExtendedKey::Public(PublicExtendedKey {
                chain_code,
                depth,
                parent_fingerprint,
                child_number,
                public,
            }))
        } else {
            Err(HdKeyError::BadVersion)
        }
    }
}

/// Derives the organization's master public key down `path`, stopping at
/// the first zero step (the path-terminator convention), and checks the
/// result matches `public_key`.
pub fn check_public_key_path(
    path: &DerivationPath,
    public_key: &[u8],
    master_public_key: &ExtendedKey,
) -> bool {
    let mut current = master_public_key.neuter();
    for &step in path.steps() {
        if step == 0 {
            break;
        }
        current = match current.child(step) {
            Ok(next) => next,
            Err(_) => return false,
        };
    }
    current.public_key_bytes() == public_key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_key_round_trips_through_base58() {
        let master = ExtendedKey::master_from_seed(b"correct horse battery staple seed").unwrap();
        let encoded = master.to_base58();
        let decoded = ExtendedKey::from_base58(&encoded).unwrap();
        assert_eq!(decoded.public_key_bytes(), master.public_key_bytes());
        assert_eq!(decoded.private_key_bytes(), master.private_key_bytes());
    }

    #[test]
    fn neutered_public_key_derives_same_point_as_private_child() {
        let master = ExtendedKey::master_from_seed(b"another test seed value").unwrap();
        let private_child = master.child(5).unwrap();
        let public_parent = master.neuter();
        let public_child = public_parent.child(5).unwrap();
        assert_eq!(private_child.public_key_bytes(), public_child.public_key_bytes());
        assert!(public_child.private_key_bytes().is_none());
    }

    #[test]
    fn hardened_derivation_requires_private_parent() {
        let master = ExtendedKey::master_from_seed(b"yet another seed").unwrap();
        let public = master.neuter();
        let result = public.child(crate::path::HARDENED_FLAG + 1);
        assert!(matches!(result, Err(HdKeyError::HardenedFromPublicParent)));
    }

    #[test]
    fn check_public_key_path_accepts_correct_derivation() {
        let master = ExtendedKey::master_from_seed(b"org master seed").unwrap();
        let child = master.child(1).unwrap().child(5).unwrap();
        let path = DerivationPath(vec![1, 5, 0, 0]);
        let public_master = master.neuter();
        assert!(check_public_key_path(&path, &child.public_key_bytes(), &public_master));
    }

    #[test]
    fn check_public_key_path_rejects_wrong_key() {
        let master = ExtendedKey::master_from_seed(b"org master seed two").unwrap();
        let child = master.child(1).unwrap();
        let other = master.child(2).unwrap();
        let path = DerivationPath(vec![1, 0, 0, 0]);
        let public_master = master.neuter();
        assert!(!check_public_key_path(&path, &other.public_key_bytes(), &public_master));
        let _ = child;
    }
}
