// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # algotx: Client-Side Transaction Library
//!
//! Build, canonically encode and sign transactions for an Algorand-style
//! ledger without talking to a node.
//!
//! The one thing this crate must never get wrong is bytes. A node decodes
//! what we send with its own codec and checks signatures over its own
//! re-encoding, so our encoding has to match it exactly: sorted map keys,
//! minimal integer widths, empty fields left out. Everything else (fee
//! policy, validation, multisig bookkeeping) is built on that foundation.
//!
//! ## Architecture
//!
//! - **encoding**: msgpack value model, canonical writer, strict reader and
//!   the schemas that project typed records onto the wire.
//! - **address**: 32-byte public keys with their base32 text form.
//! - **transaction**: the seven transaction kinds, the builder and fee
//!   policy, IDs, signing, groups.
//! - **multisig**: threshold accounts and partially signed envelopes.
//! - **logicsig**: programs acting as accounts, and delegated authority.
//! - **abi**: method signatures, selectors, contract descriptions.
//! - **crypto**: SHA-512/256 and Ed25519.
//! - **config**: protocol constants.
//!
//! ## Design Philosophy
//!
//! 1. Validation happens at construction. A transaction that failed its
//!    checks never exists.
//! 2. Decoding is strict. Non-canonical bytes are an error, not something
//!    to be tolerant about.
//! 3. Pure and synchronous. No I/O, no global state beyond lazily built
//!    schema tables.

pub mod abi;
pub mod address;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod logicsig;
pub mod multisig;
pub mod transaction;

pub use address::Address;
pub use error::{Error, Result};
