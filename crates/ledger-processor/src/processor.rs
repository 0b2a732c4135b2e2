//! The five-step pipeline a raw wire-format transaction goes through on
//! arrival, whether it reached this node over the network or was produced
//! locally (§4.7).

use ledger_core::{ObjectType, Organization, OrgTxRef, Transaction};
use ledger_hdkey::{is_path_under, DerivationPath};
use ledger_keystore::Keystore;
use ledger_store::Store;

use crate::error::ProcessorError;
use crate::policy::{check_signatures, SignatureCheck};

/// Decodes, structurally validates, files into the related side-store if
/// relevant, and persists a transaction. Returns the persisted transaction
/// (with `index`, `prev_hash`, and `date` now populated) alongside the
/// policy check it was evaluated against.
pub fn process<S: Store>(bytes: &[u8], store: &S, keystore: &Keystore) -> Result<(Transaction, SignatureCheck), ProcessorError> {
    let mut tx = ledger_core::decode(bytes)?;
    let check = validate(&mut tx, store)?;
    process_related(&tx, keystore, store)?;
    let persisted = store.insert_main(tx)?;
    Ok((persisted, check))
}

/// Resolves the transaction's organization (parsing `data` for Genesis,
/// looking up `organization_tx` otherwise), recomputes the hash to confirm
/// it still matches the frozen value, and runs the signature-set policy
/// check. Does not reject unverified transactions outright — callers that
/// require verification should inspect the returned [`SignatureCheck`]; the
/// source persists unverified-but-structurally-valid transactions too.
fn validate<S: Store>(tx: &mut Transaction, store: &S) -> Result<SignatureCheck, ProcessorError> {
    let organization = resolve_organization(tx, store)?;

    let recomputed = ledger_core::hash_transaction(&tx.meta, &tx.organization_tx, &tx.data, &tx.targets);
    debug_assert_eq!(recomputed, tx.hash, "decode() must reproduce the frozen hash");

    let check = check_signatures(tx, &organization);
    tx.organization = Some(organization);
    Ok(check)
}

fn resolve_organization<S: Store>(tx: &Transaction, store: &S) -> Result<Organization, ProcessorError> {
    if tx.object_type == ObjectType::Genesis {
        return Organization::from_json(&tx.data).map_err(ProcessorError::from);
    }

    let org_hash = match &tx.organization_tx {
        OrgTxRef::Ref(hash) => hash,
        OrgTxRef::Genesis => return Err(ProcessorError::UnknownOrganization("<empty>".into())),
    };

    let genesis_tx = store
        .get(org_hash)?
        .ok_or_else(|| ProcessorError::UnknownOrganization(org_hash.to_hex()))?;

    if genesis_tx.object_type != ObjectType::Genesis {
        return Err(ProcessorError::OrganizationRefNotGenesis(org_hash.to_hex()));
    }

    Ok(Organization::from_json(&genesis_tx.data)?)
}

/// Checks whether any key this node owns falls under one of the
/// transaction's target patterns, and if so files it in the related
/// side-store. Mirrors the source's `processRelated`: no attempt is made
/// to avoid a duplicate insert if `process` runs twice on the same bytes
/// (unspecified in the source).
fn process_related<S: Store>(tx: &Transaction, keystore: &Keystore, store: &S) -> Result<(), ProcessorError> {
    let target_patterns: Vec<DerivationPath> = tx.targets.iter().map(|t| DerivationPath::parse_text(t)).collect();

    let is_related = target_patterns.iter().any(|pattern| {
        keystore
            .iter()
            .any(|kp| is_path_under(&DerivationPath::parse_text(&kp.derivation_path), pattern))
    });

    if is_related {
        store.insert_related(tx)?;
    }
    Ok(())
}
