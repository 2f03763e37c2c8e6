//! # Transaction Module
//!
//! Construction, canonical encoding, signing and grouping of ledger
//! transactions. Every payment, key registration, asset operation,
//! application call and state proof is a [`Transaction`].
//!
//! ## Architecture
//!
//! ```text
//! types.rs    - TransactionType, SuggestedParams and the per-kind field structs
//! builder.rs  - TransactionBuilder, validation and the fee policy
//! encoding.rs - the wire schema and the projection to and from it
//! signing.rs  - transaction IDs, signatures and the signed envelope
//! group.rs    - atomic group ids
//! boxes.rs    - box references and their foreign-index translation
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] assembles and validates the fields
//!    and settles the fee.
//! 2. **Group** (optional): [`assign_group_id`] stamps the members of an
//!    atomic group.
//! 3. **Sign**: [`sign_transaction`], a multisig or a logic signature wraps
//!    the transaction in a [`SignedTransaction`] envelope.
//! 4. **Submit**: the envelope bytes go to a node. That part is not here.
//!
//! ## Design Decisions
//!
//! - Transaction IDs are `base32(sha512_256("TX" ++ msgpack))`. The
//!   encoding is canonical, so the ID is a pure function of the fields.
//! - Amounts and rounds are `u64`. Values that must also survive a trip
//!   through a float-based JSON client are bounded by `MAX_SAFE_INTEGER`.
//! - A transaction is immutable once built. Fee bumps, leases, rekeys and
//!   group ids all produce a new value.

pub mod boxes;
pub mod builder;
pub mod encoding;
pub mod group;
pub mod signing;
pub mod types;

pub use boxes::{BoxReference, EncodedBoxReference};
pub use builder::{Transaction, TransactionBuilder};
pub use encoding::{decode_unsigned_transaction, encode_unsigned_transaction};
pub use group::{assign_group_id, compute_group_id};
pub use signing::{
    decode_signed_transaction, encode_signed_transaction, encode_unsigned_simulate_transaction,
    sign_transaction, SignedTransaction, SignedTxnBlob,
};
pub use types::{
    ApplicationCallFields, AssetConfigFields, AssetFreezeFields, AssetTransferFields,
    KeyRegistrationFields, OnApplicationComplete, PaymentFields, StateProofFields, StateSchema,
    SuggestedParams, TransactionKind, TransactionType,
};
