//! Signature-set verification (§4.5).
//!
//! Signer 0 is the proposer seat: its signature must be valid over
//! `tx.hash`, but it is never counted toward the policy. Every signer
//! after that is checked three ways — signature validity, derivation-path
//! agreement with the organization's master public key, and membership
//! under one of the transaction's target patterns — and each match adds
//! one to the running count.
//!
//! The source's `MinimumRequiredSignatures` field is declared but never
//! populated anywhere in the original, so its comparison is always against
//! zero. We treat the intended policy as "one signature per required
//! path" instead: `required` is the number of patterns the organization
//! declares for the transaction's object type, via
//! `Organization::required_paths_for` (the per-object override when one
//! exists, otherwise the organization-wide minimum). Threshold suffixes on
//! a pattern ("1/*+", "2:3/*") are not parsed — a pattern counts as
//! satisfied the first time any signer matches it, the same brittle
//! one-shot rule the source implements.

use ledger_core::{Organization, Transaction};
use ledger_hdkey::{is_path_under, ExtendedKey};

/// Outcome of running the policy check over a transaction's signer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureCheck {
    /// Whether signer 0's signature verified against its claimed public key.
    pub initial_signature_valid: bool,
    /// Count of (signer, target) pairs that verified and matched.
    pub matched: usize,
    /// Number of patterns the organization requires for this object type.
    pub required: usize,
}

impl SignatureCheck {
    pub fn is_verified(&self) -> bool {
        self.initial_signature_valid && self.matched == self.required
    }
}

/// Runs the full policy check described above. `organization` is the
/// already-resolved Genesis organization the transaction belongs to.
pub fn check_signatures(tx: &Transaction, organization: &Organization) -> SignatureCheck {
    let required = organization.required_paths_for(tx.object_type.name()).len();

    let initial_signature_valid = match tx.signers.first() {
        Some(signer) => ledger_crypto::verify(&tx.hash.0, &signer.signature, &signer.public_key),
        None => false,
    };

    let target_patterns: Vec<_> = tx.targets.iter().map(|t| ledger_hdkey::DerivationPath::parse_text(t)).collect();

    let mut matched = 0usize;
    if let Ok(master_public_key) = ExtendedKey::from_base58(&organization.master_public_key) {
        for signer in tx.signers.iter().skip(1) {
            if !ledger_crypto::verify(&tx.hash.0, &signer.signature, &signer.public_key) {
                continue;
            }
            let Ok(steps) = signer.derivation_steps() else {
                continue;
            };
            if !ledger_hdkey::check_public_key_path(&steps, &signer.public_key, &master_public_key) {
                continue;
            }
            for pattern in &target_patterns {
                if is_path_under(&steps, pattern) {
                    matched += 1;
                }
            }
        }
    }

    SignatureCheck {
        initial_signature_valid,
        matched,
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{ObjectType, OrgTxRef};
    use ledger_hdkey::{DerivationPath, ExtendedKey};

    fn test_organization(master_public_key: &str) -> Organization {
        Organization {
            name: "Test Org".into(),
            description: "Test Desc".into(),
            master_public_key: master_public_key.into(),
            minimum_required_signature_paths: vec!["1/*".into()],
            required_signature_paths_per_object: Default::default(),
            rules: vec![],
        }
    }

    #[test]
    fn verified_when_every_target_is_matched() {
        let master = ExtendedKey::master_from_seed(&[1u8; 32]).unwrap();
        let master_public_b58 = master.neuter().to_base58();

        let mut tx = Transaction::build(
            ObjectType::Object,
            "",
            OrgTxRef::Genesis,
            None,
            b"payload".to_vec(),
            vec!["1/*".to_string()],
        )
        .unwrap();
        // force a non-genesis organization_tx so build() doesn't reject it
        tx.organization_tx = OrgTxRef::Ref(ledger_core::TxHash([9u8; 32]));

        let proposer = ExtendedKey::master_from_seed(&[2u8; 32]).unwrap();
        tx.sign(&proposer.private_key_bytes().unwrap(), proposer.public_key_bytes(), &DerivationPath(vec![]))
            .unwrap();

        // The "1/*" target parses its leading token as the char code of
        // '1' (0x31 = 49), not the integer 1 — derive and sign under that
        // same step so `is_path_under` and `check_public_key_path` agree.
        let signer_key = master.child(b'1' as u32).unwrap();
        tx.sign(
            &signer_key.private_key_bytes().unwrap(),
            signer_key.public_key_bytes(),
            &DerivationPath::parse_text("1"),
        )
        .unwrap();

        let org = test_organization(&master_public_b58);
        let result = check_signatures(&tx, &org);
        assert!(result.initial_signature_valid);
        assert_eq!(result.matched, 1);
        assert_eq!(result.required, 1);
        assert!(result.is_verified());
    }

    #[test]
    fn unmatched_signer_does_not_count() {
        let master = ExtendedKey::master_from_seed(&[1u8; 32]).unwrap();
        let master_public_b58 = master.neuter().to_base58();

        let mut tx = Transaction::build(
            ObjectType::Object,
            "",
            OrgTxRef::Genesis,
            None,
            b"payload".to_vec(),
            vec!["1/*".to_string()],
        )
        .unwrap();
        tx.organization_tx = OrgTxRef::Ref(ledger_core::TxHash([9u8; 32]));

        let proposer = ExtendedKey::master_from_seed(&[2u8; 32]).unwrap();
        tx.sign(&proposer.private_key_bytes().unwrap(), proposer.public_key_bytes(), &DerivationPath(vec![]))
            .unwrap();

        let outside_key = master.child(2).unwrap();
        tx.sign(
            &outside_key.private_key_bytes().unwrap(),
            outside_key.public_key_bytes(),
            &DerivationPath(vec![2]),
        )
        .unwrap();

        let org = test_organization(&master_public_b58);
        let result = check_signatures(&tx, &org);
        assert_eq!(result.matched, 0);
        assert!(!result.is_verified());
    }
}
