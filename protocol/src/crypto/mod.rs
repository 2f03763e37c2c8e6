//! # Cryptographic Capabilities
//!
//! The library treats hashing, signing and verifying as external
//! capabilities with three tiny contracts:
//!
//! - `hash(bytes) -> digest`: SHA-512/256 via `sha2`.
//! - `sign(message, secret key) -> signature`: Ed25519 via `ed25519-dalek`.
//! - `verify(message, signature, public key) -> bool`.
//!
//! Everything in this module is a thin typed wrapper over audited crates.
//! All of it is synchronous and side-effect free.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{sha512_256, sha512_256_multi};
pub use keys::{Account, KeyError};
pub use signatures::{sign_bytes, verify_bytes, verify_signed_bytes};
