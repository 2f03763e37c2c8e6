//! Error types for the client library.
//!
//! Every fallible operation returns [`Result`]. The variants are the
//! library's complete failure vocabulary: nothing degrades silently, and a
//! value that failed validation is never constructed.

use thiserror::Error;

/// Errors produced by encoding, construction, signing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Wrong length, type or shape of caller input (bad address text, a
    /// key of the wrong size, a program that is obviously not bytecode).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An address string decoded cleanly but its checksum did not match.
    #[error("checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch {
        /// Checksum recomputed from the decoded public key (hex).
        expected: String,
        /// Checksum carried by the input (hex).
        found: String,
    },

    /// A field is outside protocol bounds, or a required combination of
    /// fields is incomplete.
    #[error("validation error: {0}")]
    Validation(String),

    /// A value does not match its governing schema, or bytes are not in
    /// canonical form.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A box, application or asset reference cannot be resolved against
    /// the transaction's foreign arrays.
    #[error("reference error: {0}")]
    Reference(String),

    /// A signature is invalid, or the supplied key is not allowed to sign.
    #[error("crypto verification failure: {0}")]
    CryptoVerification(String),

    /// Objects that must describe the same payload disagree (multisig merge).
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
