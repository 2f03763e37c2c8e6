//! # Hashing
//!
//! The ledger uses exactly one hash function: SHA-512/256 (SHA-512 with the
//! distinct initial values from FIPS 180-4, truncated to 256 bits). It backs
//! address checksums, transaction IDs, group IDs, multisig and program
//! addresses, and ABI selectors.
//!
//! Domain separation is done by prefixing a short ASCII tag (`"TX"`,
//! `"Program"`, ...) to the hashed bytes. [`sha512_256_multi`] feeds the tag
//! and payload into the hasher separately so callers never have to
//! concatenate into a scratch buffer.

use sha2::{Digest, Sha512_256};

use crate::config::HASH_LENGTH;

/// Compute the SHA-512/256 digest of `data`.
///
/// # Example
///
/// ```
/// use algotx_protocol::crypto::sha512_256;
///
/// let digest = sha512_256(b"algotx");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha512_256(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha512_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash several byte slices as if they were concatenated.
pub fn sha512_256_multi(parts: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha512_256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
