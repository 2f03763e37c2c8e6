//! # Signature Verification
//!
//! Verification is a yes/no question. Malformed keys, wrong-length
//! signatures and genuine forgeries all come back as `false`; nothing here
//! panics or returns an error on bad input.
//!
//! Also home to arbitrary-bytes signing, which prefixes the `"MX"` tag so
//! that a signed blob can never be replayed as a transaction.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use super::keys::Account;
use crate::config::{BYTES_TAG, SIGNATURE_LENGTH};

/// Verify an Ed25519 signature over `message` by `public_key`.
pub fn verify_bytes(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(pk_bytes) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(signature) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key.verify(message, &signature).is_ok()
}

/// Sign arbitrary bytes with the `"MX"` domain-separation prefix.
pub fn sign_bytes(data: &[u8], account: &Account) -> [u8; SIGNATURE_LENGTH] {
    account.sign(&tagged(data))
}

/// Verify a signature produced by [`sign_bytes`].
pub fn verify_signed_bytes(data: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    verify_bytes(public_key, &tagged(data), signature)
}

fn tagged(data: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(BYTES_TAG.len() + data.len());
    message.extend_from_slice(BYTES_TAG);
    message.extend_from_slice(data);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_bytes_round_trip() {
        let account = Account::from_seed(&[4u8; 32]);
        let sig = sign_bytes(b"arbitrary", &account);
        assert!(verify_signed_bytes(b"arbitrary", &sig, &account.public_key()));
        // The tag is part of the message, so a plain verify must fail.
        assert!(!verify_bytes(&account.public_key(), b"arbitrary", &sig));
    }

    #[test]
    fn test_malformed_inputs_are_false() {
        let account = Account::from_seed(&[4u8; 32]);
        let sig = account.sign(b"m");
        assert!(!verify_bytes(&[0u8; 31], b"m", &sig));
        assert!(!verify_bytes(&account.public_key(), b"m", &sig[..63]));
        assert!(verify_bytes(&account.public_key(), b"m", &sig));
    }
}
