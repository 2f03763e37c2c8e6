//! # Addresses
//!
//! An address is a 32-byte Ed25519 public key (or a hash standing in for
//! one: multisig accounts, program escrows, application escrows). Its text
//! form appends a 4-byte checksum and base32-encodes the result:
//!
//! ```text
//! public_key (32 bytes)
//!     -> checksum = SHA-512/256(public_key)[28..32]
//!     -> base32(public_key ++ checksum), padding stripped
//!     -> 58 characters
//! ```
//!
//! The checksum is never stored; it is derived whenever the text form is
//! produced or checked. Parsing distinguishes malformed text
//! ([`Error::MalformedInput`]) from text that decodes but fails its
//! checksum ([`Error::ChecksumMismatch`]), because the second usually means
//! a typo in an otherwise plausible address.

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::config::{
    ADDRESS_TEXT_LENGTH, APP_ID_TAG, CHECKSUM_LENGTH, HASH_LENGTH, PUBLIC_KEY_LENGTH,
};
use crate::crypto::hash::{sha512_256, sha512_256_multi};
use crate::error::{Error, Result};

/// A ledger address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; PUBLIC_KEY_LENGTH]);

impl Address {
    /// Wrap a raw 32-byte public key.
    pub const fn new(public_key: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(public_key)
    }

    /// Wrap a public key given as a slice; it must be exactly 32 bytes.
    pub fn from_public_key(bytes: &[u8]) -> Result<Self> {
        let pk: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::MalformedInput(format!(
                "address must be {} bytes, got {}",
                PUBLIC_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(pk))
    }

    /// The all-zero address.
    pub const fn zero() -> Self {
        Self([0u8; PUBLIC_KEY_LENGTH])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// The 4-byte checksum: the last four bytes of the key's hash.
    pub fn checksum(&self) -> [u8; CHECKSUM_LENGTH] {
        let digest = sha512_256(&self.0);
        let mut out = [0u8; CHECKSUM_LENGTH];
        out.copy_from_slice(&digest[HASH_LENGTH - CHECKSUM_LENGTH..]);
        out
    }

    /// Escrow address of an application: `hash("appID" ++ be_u64(app_id))`.
    pub fn application_address(app_id: u64) -> Self {
        Self(sha512_256_multi(&[APP_ID_TAG, &app_id.to_be_bytes()]))
    }
}

/// True when `text` parses as an address with a valid checksum.
pub fn is_valid_address(text: &str) -> bool {
    Address::from_str(text).is_ok()
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        if text.len() != ADDRESS_TEXT_LENGTH {
            return Err(Error::MalformedInput(format!(
                "address text must be {} characters, got {}",
                ADDRESS_TEXT_LENGTH,
                text.len()
            )));
        }
        let decoded = BASE32_NOPAD
            .decode(text.as_bytes())
            .map_err(|e| Error::MalformedInput(format!("invalid base32 address: {}", e)))?;
        if decoded.len() != PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH {
            return Err(Error::MalformedInput(format!(
                "decoded address has {} bytes",
                decoded.len()
            )));
        }
        let addr = Self::from_public_key(&decoded[..PUBLIC_KEY_LENGTH])?;
        let expected = addr.checksum();
        let found = &decoded[PUBLIC_KEY_LENGTH..];
        if expected.as_slice() != found {
            return Err(Error::ChecksumMismatch {
                expected: hex::encode(expected),
                found: hex::encode(found),
            });
        }
        Ok(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = [0u8; PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH];
        raw[..PUBLIC_KEY_LENGTH].copy_from_slice(&self.0);
        raw[PUBLIC_KEY_LENGTH..].copy_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&raw))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl From<[u8; PUBLIC_KEY_LENGTH]> for Address {
    fn from(pk: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(pk)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Address::from_str(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "MO2H6ZU47Q36GJ6GVHUKGEBEQINN7ZWVACMWZQGIYUOE3RBSRVYHV4ACJI";

    #[test]
    fn test_zero_address_text() {
        assert_eq!(
            Address::zero().to_string(),
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
        );
    }

    #[test]
    fn test_parse_known_address() {
        let addr: Address = VALID.parse().unwrap();
        let expected_pk: [u8; 32] = [
            99, 180, 127, 102, 156, 252, 55, 227, 39, 198, 169, 232, 163, 16, 36, 130, 26, 223,
            230, 213, 0, 153, 108, 192, 200, 197, 28, 77, 196, 50, 141, 112,
        ];
        assert_eq!(addr.public_key(), &expected_pk);
        assert_eq!(addr.checksum(), [122, 240, 2, 74]);
        assert_eq!(addr.to_string(), VALID);
    }

    #[test]
    fn test_wrong_length_is_malformed() {
        let short = &VALID[..57];
        assert!(matches!(
            Address::from_str(short),
            Err(Error::MalformedInput(_))
        ));
        assert!(!is_valid_address(short));
    }

    #[test]
    fn test_bad_characters_are_malformed() {
        let bad = "MO2H6ZU47Q36GJ6GVHUKGEBEQINN7ZWVACererZQGI113RBSRVYHV4ACJI";
        assert!(matches!(
            Address::from_str(bad),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_checksum_mismatch() {
        // First key character changed; the trailing checksum no longer matches.
        let wrong = "AO2H6ZU47Q36GJ6GVHUKGEBEQINN7ZWVACMWZQGIYUOE3RBSRVYHV4ACJI";
        assert!(matches!(
            Address::from_str(wrong),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_round_trip_random_keys() {
        for seed in 0u8..16 {
            let addr = Address::new(sha512_256(&[seed]));
            let parsed: Address = addr.to_string().parse().unwrap();
            assert_eq!(parsed, addr);
            assert_eq!(addr.to_string().len(), ADDRESS_TEXT_LENGTH);
        }
    }

    #[test]
    fn test_from_public_key_length() {
        assert!(Address::from_public_key(&[1u8; 15]).is_err());
        assert!(Address::from_public_key(&[1u8; 32]).is_ok());
    }

    #[test]
    fn test_application_address_vector() {
        assert_eq!(
            Address::application_address(77).to_string(),
            "PCYUFPA2ZTOYWTP43MX2MOX2OWAIAXUDNC2WFCXAGMRUZ3DYD6BWFDL5YM"
        );
    }

    #[test]
    fn test_serde_as_text() {
        let addr: Address = VALID.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", VALID));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }
}
