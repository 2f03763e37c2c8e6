//! Atomic transaction groups.
//!
//! A group id commits to the ordered list of member transaction IDs. Every
//! member carries the id in its `grp` field; the ledger applies either all of
//! them or none.

use std::sync::OnceLock;
use tracing::debug;

use super::builder::Transaction;
use crate::address::Address;
use crate::config::{GROUP_ID_LENGTH, MAX_GROUP_SIZE, TX_GROUP_TAG};
use crate::crypto::hash::sha512_256;
use crate::encoding::{
    msgpack, ArraySchema, FixedLengthByteArraySchema, NamedMapEntry, NamedMapSchema, Schema,
    Value,
};
use crate::error::{Error, Result};

fn tx_group_schema() -> &'static NamedMapSchema {
    static SCHEMA: OnceLock<NamedMapSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        NamedMapSchema::new(vec![NamedMapEntry::omit_empty(
            "txlist",
            ArraySchema::new(FixedLengthByteArraySchema::new(GROUP_ID_LENGTH)),
        )])
    })
}

/// `hash("TG" ++ encode({txlist: [raw txid, ...]}))` over `txns` in order.
///
/// The IDs are taken from the transactions as given; a `grp` already set on
/// a member is part of its ID.
pub fn compute_group_id(txns: &[Transaction]) -> Result<[u8; GROUP_ID_LENGTH]> {
    if txns.is_empty() {
        return Err(Error::Validation("cannot group an empty transaction list".into()));
    }
    if txns.len() > MAX_GROUP_SIZE {
        return Err(Error::Validation(format!(
            "group of {} transactions exceeds the limit of {}",
            txns.len(),
            MAX_GROUP_SIZE
        )));
    }
    let ids = txns
        .iter()
        .map(|t| Ok(Value::Bytes(t.raw_tx_id()?.to_vec())))
        .collect::<Result<Vec<_>>>()?;
    let data = Value::map([("txlist", Value::Array(ids))]);
    let encoded = msgpack::encode(&tx_group_schema().prepare_msgpack(&data)?)?;
    Ok(sha512_256(&[TX_GROUP_TAG, encoded.as_slice()].concat()))
}

/// Compute the group id of `txns` and return copies carrying it.
///
/// With `sender` set, only that sender's transactions are returned; the id
/// still covers the whole list.
pub fn assign_group_id(txns: &[Transaction], sender: Option<Address>) -> Result<Vec<Transaction>> {
    let group = compute_group_id(txns)?;
    debug!(size = txns.len(), "assigned group id");
    Ok(txns
        .iter()
        .filter(|t| sender.map_or(true, |s| t.sender() == s))
        .map(|t| t.with_group(Some(group)))
        .collect())
}
