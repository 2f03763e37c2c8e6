//! # Multisig
//!
//! Threshold accounts: `threshold` of the listed members must sign. The
//! account's address is derived from its version, threshold and ordered
//! member keys, so the same members in a different order are a different
//! account.
//!
//! - `metadata.rs` describes accounts and the per-slot signature container.
//! - `signing.rs` creates, signs, appends to and merges encoded envelopes.

pub mod metadata;
pub mod signing;

pub(crate) use metadata::multisig_schema;
pub use metadata::{verify_multisig, EncodedMultisig, MultisigMetadata, MultisigSubsig};
pub use signing::{
    append_sign_multisig_transaction, append_sign_raw_multisig_signature,
    create_multisig_transaction, merge_multisig_transactions, sign_multisig_transaction,
};
