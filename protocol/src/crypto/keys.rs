//! # Accounts
//!
//! Ed25519 key handling for signing transactions, multisig slots and
//! delegated programs.
//!
//! The ledger's wire format for a secret key is 64 bytes: the 32-byte seed
//! followed by the 32-byte public key. [`Account::from_secret_key`] accepts
//! that form and refuses it when the two halves disagree, which is the
//! usual symptom of a truncated or spliced key.
//!
//! Key bytes are never logged and never appear in `Debug` output.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

use crate::address::Address;
use crate::config::{SECRET_KEY_LENGTH, SEED_LENGTH, SIGNATURE_LENGTH};
use crate::error::Error;

/// Errors that can occur while loading key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key: expected 32 or 64 bytes")]
    InvalidSecretKey,

    #[error("keypair validation failed: public key does not match secret key")]
    KeypairMismatch,

    #[error("invalid hex encoding for secret key")]
    InvalidHex,
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        Error::CryptoVerification(err.to_string())
    }
}

/// An Ed25519 keypair able to sign on behalf of one address.
///
/// # Examples
///
/// ```
/// use algotx_protocol::crypto::Account;
///
/// let account = Account::from_seed(&[7u8; 32]);
/// let sig = account.sign(b"hello");
/// assert_eq!(sig.len(), 64);
/// ```
pub struct Account {
    signing_key: SigningKey,
}

impl Account {
    /// Generate a fresh account from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build an account deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Load an account from a 64-byte `seed ++ public key` secret key.
    ///
    /// The public half is re-derived from the seed and compared with the
    /// supplied one.
    pub fn from_secret_key(secret_key: &[u8]) -> Result<Self, KeyError> {
        let bytes: &[u8; SECRET_KEY_LENGTH] = secret_key
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        let signing_key =
            SigningKey::from_keypair_bytes(bytes).map_err(|_| KeyError::KeypairMismatch)?;
        Ok(Self { signing_key })
    }

    /// Load an account from hex: either a 32-byte seed or a 64-byte secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidHex)?;
        match bytes.len() {
            SEED_LENGTH => {
                let mut seed = [0u8; SEED_LENGTH];
                seed.copy_from_slice(&bytes);
                Ok(Self::from_seed(&seed))
            }
            SECRET_KEY_LENGTH => Self::from_secret_key(&bytes),
            _ => Err(KeyError::InvalidSecretKey),
        }
    }

    /// Raw public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The address controlled by this account.
    pub fn address(&self) -> Address {
        Address::new(self.public_key())
    }

    /// The 64-byte `seed ++ public key` secret key.
    ///
    /// Handle with care; this is everything needed to spend from the account.
    pub fn secret_key(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }

    /// Sign a message. Ed25519 is deterministic, so the same message always
    /// yields the same signature.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Clone for Account {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self.address())
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for Account {}
