//! Multisig transaction envelopes.
//!
//! Co-signers usually work apart: one creates the envelope, each signer
//! fills their own slot (either appending to a blob handed along, or
//! producing an independent partial copy), and someone merges the copies
//! once the threshold is reachable. Every step here takes and returns
//! encoded envelopes so blobs can move between machines unchanged.

use tracing::debug;

use super::metadata::{EncodedMultisig, MultisigMetadata};
use crate::address::Address;
use crate::crypto::keys::Account;
use crate::encoding::encode_msgpack;
use crate::error::{Error, Result};
use crate::transaction::signing::{decode_signed_transaction, SignedTransaction, SignedTxnBlob};
use crate::transaction::Transaction;

/// `sgnr` for a multisig envelope: the multisig address unless it is the
/// sender.
fn authorizer(txn: &Transaction, msig: &EncodedMultisig) -> Result<Option<Address>> {
    let addr = msig.address()?;
    Ok((addr != txn.sender()).then_some(addr))
}

fn envelope(txn: &Transaction, msig: EncodedMultisig) -> Result<SignedTransaction> {
    Ok(SignedTransaction {
        sgnr: authorizer(txn, &msig)?,
        msig: Some(msig),
        ..SignedTransaction::unsigned(txn.clone())
    })
}

fn blob(envelope: &SignedTransaction) -> Result<SignedTxnBlob> {
    Ok(SignedTxnBlob {
        tx_id: envelope.tx_id()?,
        blob: encode_msgpack(envelope)?,
    })
}

/// Decode a blob that must carry a multisig and no other authorization.
fn decode_multisig_envelope(bytes: &[u8]) -> Result<(SignedTransaction, EncodedMultisig)> {
    let envelope = decode_signed_transaction(bytes)?;
    let msig = envelope
        .msig
        .clone()
        .ok_or_else(|| Error::Validation("signed transaction carries no multisig".into()))?;
    Ok((envelope, msig))
}

/// An envelope with one empty slot per member, ready to pass around.
pub fn create_multisig_transaction(txn: &Transaction, metadata: &MultisigMetadata) -> Result<Vec<u8>> {
    encode_msgpack(&envelope(txn, metadata.unsigned()?)?)
}

/// Sign `txn` as one member of `metadata`, filling only that member's slot.
pub fn sign_multisig_transaction(
    txn: &Transaction,
    metadata: &MultisigMetadata,
    account: &Account,
) -> Result<SignedTxnBlob> {
    let msig = metadata.unsigned()?.sign(&txn.bytes_to_sign()?, account)?;
    let signed = blob(&envelope(txn, msig)?)?;
    debug!(txid = %signed.tx_id, signer = %account.address(), "signed multisig slot");
    Ok(signed)
}

/// Add `account`'s signature to an existing multisig envelope.
pub fn append_sign_multisig_transaction(
    bytes: &[u8],
    metadata: &MultisigMetadata,
    account: &Account,
) -> Result<SignedTxnBlob> {
    let (envelope, _) = decode_multisig_envelope(bytes)?;
    let partial = sign_multisig_transaction(&envelope.txn, metadata, account)?;
    let merged = merge_multisig_transactions(&[bytes, partial.blob.as_slice()])?;
    Ok(SignedTxnBlob {
        tx_id: partial.tx_id,
        blob: merged,
    })
}

/// Add an externally produced signature by `signer` to a multisig envelope.
pub fn append_sign_raw_multisig_signature(
    bytes: &[u8],
    metadata: &MultisigMetadata,
    signer: &Address,
    signature: &[u8],
) -> Result<SignedTxnBlob> {
    let (envelope, _) = decode_multisig_envelope(bytes)?;
    let msig = metadata.unsigned()?.attach_signature(signer, signature)?;
    let partial = encode_msgpack(&self::envelope(&envelope.txn, msig)?)?;
    let merged = merge_multisig_transactions(&[bytes, partial.as_slice()])?;
    Ok(SignedTxnBlob {
        tx_id: envelope.tx_id()?,
        blob: merged,
    })
}

/// Union the filled slots of several copies of one multisig envelope.
///
/// All copies must carry the same transaction, the same `sgnr` and the same
/// multisig preimage; any disagreement aborts the merge.
pub fn merge_multisig_transactions(blobs: &[&[u8]]) -> Result<Vec<u8>> {
    let (first, rest) = match blobs {
        [first, rest @ ..] if !rest.is_empty() => (first, rest),
        _ => {
            return Err(Error::Validation(
                "not enough multisig transactions to merge: need at least two".into(),
            ))
        }
    };

    let (reference, mut merged) = decode_multisig_envelope(first)?;
    let reference_id = reference.tx_id()?;
    for bytes in rest {
        let (other, msig) = decode_multisig_envelope(bytes)?;
        if other.tx_id()? != reference_id {
            return Err(Error::StructuralMismatch(
                "cannot merge multisig transactions over different transactions".into(),
            ));
        }
        if other.sgnr != reference.sgnr {
            return Err(Error::StructuralMismatch(
                "cannot merge multisig transactions with different signers".into(),
            ));
        }
        merged = merged.merge(&msig)?;
    }

    encode_msgpack(&SignedTransaction {
        msig: Some(merged),
        ..reference
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
