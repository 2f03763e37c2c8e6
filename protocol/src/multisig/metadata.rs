//! Multisig account descriptions and the per-signature container.
//!
//! [`MultisigMetadata`] names an account: version, threshold and the ordered
//! member list. Hashing its preimage gives the account's address, so the
//! member order matters. [`EncodedMultisig`] is what travels on the wire: one
//! slot per member, each holding the member's public key and, once that
//! member has signed, its signature.

use std::sync::OnceLock;
use tracing::debug;

use crate::address::Address;
use crate::config::{MULTISIG_ADDR_TAG, MULTISIG_VERSION, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::hash::sha512_256;
use crate::crypto::keys::Account;
use crate::crypto::signatures::verify_bytes;
use crate::encoding::{
    ArraySchema, Encodable, FixedLengthByteArraySchema, NamedMapEntry, NamedMapSchema, Schema,
    Uint64Schema, Value,
};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// MultisigMetadata
// ---------------------------------------------------------------------------

/// Version, threshold and ordered members of a multisig account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigMetadata {
    pub version: u8,
    pub threshold: u8,
    pub addrs: Vec<Address>,
}

impl MultisigMetadata {
    /// Describe an account, rejecting unsupported versions and thresholds
    /// that are zero or larger than the member count.
    pub fn new(version: u8, threshold: u8, addrs: Vec<Address>) -> Result<Self> {
        let meta = Self {
            version,
            threshold,
            addrs,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != MULTISIG_VERSION {
            return Err(Error::Validation(format!(
                "unsupported multisig version {}",
                self.version
            )));
        }
        if self.threshold == 0 || self.addrs.is_empty() || self.threshold as usize > self.addrs.len()
        {
            return Err(Error::Validation(format!(
                "invalid multisig threshold {} for {} members",
                self.threshold,
                self.addrs.len()
            )));
        }
        Ok(())
    }

    /// `"MultisigAddr" ++ version ++ threshold ++ pk_1 ++ ... ++ pk_n`.
    pub fn preimage(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let mut out =
            Vec::with_capacity(MULTISIG_ADDR_TAG.len() + 2 + PUBLIC_KEY_LENGTH * self.addrs.len());
        out.extend_from_slice(MULTISIG_ADDR_TAG);
        out.push(self.version);
        out.push(self.threshold);
        for addr in &self.addrs {
            out.extend_from_slice(addr.public_key());
        }
        Ok(out)
    }

    /// The account's address: the hash of its preimage.
    pub fn address(&self) -> Result<Address> {
        Ok(Address::new(sha512_256(&self.preimage()?)))
    }

    /// An envelope with one empty slot per member.
    pub fn unsigned(&self) -> Result<EncodedMultisig> {
        self.validate()?;
        Ok(EncodedMultisig {
            version: self.version,
            threshold: self.threshold,
            subsigs: self
                .addrs
                .iter()
                .map(|a| MultisigSubsig {
                    public_key: *a.public_key(),
                    signature: None,
                })
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// EncodedMultisig
// ---------------------------------------------------------------------------

/// One member slot: `{pk, s?}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigSubsig {
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
    pub signature: Option<[u8; SIGNATURE_LENGTH]>,
}

/// The signature container of a multisig account: `{v, thr, subsig}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMultisig {
    pub version: u8,
    pub threshold: u8,
    pub subsigs: Vec<MultisigSubsig>,
}

impl EncodedMultisig {
    /// Recover the account description from the slots.
    pub fn metadata(&self) -> MultisigMetadata {
        MultisigMetadata {
            version: self.version,
            threshold: self.threshold,
            addrs: self
                .subsigs
                .iter()
                .map(|s| Address::new(s.public_key))
                .collect(),
        }
    }

    pub fn address(&self) -> Result<Address> {
        self.metadata().address()
    }

    /// Number of filled slots.
    pub fn signature_count(&self) -> usize {
        self.subsigs.iter().filter(|s| s.signature.is_some()).count()
    }

    /// Sign `message` with `account` and fill every slot holding its key.
    pub fn sign(&self, message: &[u8], account: &Account) -> Result<EncodedMultisig> {
        let pk = account.public_key();
        if !self.subsigs.iter().any(|s| s.public_key == pk) {
            return Err(Error::CryptoVerification(
                "invalid secret key: signer is not a member of this multisig".into(),
            ));
        }
        let signature = account.sign(message);
        let mut out = self.clone();
        for slot in out.subsigs.iter_mut().filter(|s| s.public_key == pk) {
            slot.signature = Some(signature);
        }
        Ok(out)
    }

    /// Fill the slot of `signer` with an externally produced signature.
    pub fn attach_signature(&self, signer: &Address, signature: &[u8]) -> Result<EncodedMultisig> {
        let signature: [u8; SIGNATURE_LENGTH] = signature.try_into().map_err(|_| {
            Error::MalformedInput(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LENGTH,
                signature.len()
            ))
        })?;
        if !self.subsigs.iter().any(|s| &s.public_key == signer.public_key()) {
            return Err(Error::CryptoVerification(format!(
                "{} is not a member of this multisig",
                signer
            )));
        }
        let mut out = self.clone();
        for slot in out
            .subsigs
            .iter_mut()
            .filter(|s| &s.public_key == signer.public_key())
        {
            slot.signature = Some(signature);
        }
        Ok(out)
    }

    /// Union the filled slots of two copies of the same account.
    ///
    /// The copies must agree on version, threshold and member list, and a
    /// slot filled in both must hold the same signature.
    pub fn merge(&self, other: &EncodedMultisig) -> Result<EncodedMultisig> {
        if self.version != other.version || self.threshold != other.threshold {
            return Err(Error::StructuralMismatch(format!(
                "multisig preimages differ: v{}/thr{} vs v{}/thr{}",
                self.version, self.threshold, other.version, other.threshold
            )));
        }
        if self.subsigs.len() != other.subsigs.len()
            || self
                .subsigs
                .iter()
                .zip(&other.subsigs)
                .any(|(a, b)| a.public_key != b.public_key)
        {
            return Err(Error::StructuralMismatch(
                "multisig preimages differ: member lists do not match".into(),
            ));
        }

        let mut merged = self.clone();
        for (slot, theirs) in merged.subsigs.iter_mut().zip(&other.subsigs) {
            match (slot.signature, theirs.signature) {
                (Some(mine), Some(other_sig)) if mine != other_sig => {
                    return Err(Error::StructuralMismatch(
                        "subsignatures are mismatched".into(),
                    ))
                }
                (None, Some(other_sig)) => slot.signature = Some(other_sig),
                _ => {}
            }
        }
        debug!(
            signatures = merged.signature_count(),
            threshold = merged.threshold,
            "merged multisig"
        );
        Ok(merged)
    }

    /// True when at least `threshold` slots carry valid signatures over
    /// `message` and the slots hash to `addr`.
    pub fn verify(&self, message: &[u8], addr: &Address) -> bool {
        let threshold = self.threshold as usize;
        if self.subsigs.len() < threshold {
            return false;
        }
        match self.address() {
            Ok(derived) if &derived == addr => {}
            _ => return false,
        }
        if self.signature_count() < threshold {
            return false;
        }
        let verified = self
            .subsigs
            .iter()
            .filter_map(|s| s.signature.map(|sig| (s.public_key, sig)))
            .filter(|(pk, sig)| verify_bytes(pk, message, sig))
            .count();
        verified >= threshold
    }
}

/// Check a multisig signature container against `message` and `addr`.
pub fn verify_multisig(message: &[u8], msig: &EncodedMultisig, addr: &Address) -> bool {
    msig.verify(message, addr)
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

pub(crate) fn multisig_schema() -> &'static NamedMapSchema {
    static SCHEMA: OnceLock<NamedMapSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        NamedMapSchema::new(vec![
            NamedMapEntry::omit_empty(
                "subsig",
                ArraySchema::new(NamedMapSchema::new(vec![
                    NamedMapEntry::omit_empty("pk", FixedLengthByteArraySchema::new(PUBLIC_KEY_LENGTH)),
                    NamedMapEntry::omit_empty("s", FixedLengthByteArraySchema::new(SIGNATURE_LENGTH)),
                ])),
            ),
            NamedMapEntry::omit_empty("thr", Uint64Schema),
            NamedMapEntry::omit_empty("v", Uint64Schema),
        ])
    })
}

fn small(data: &Value, key: &str) -> Result<u8> {
    let n = data.field(key)?.as_u64()?;
    u8::try_from(n).map_err(|_| Error::Encoding(format!("multisig {} {} exceeds 255", key, n)))
}

impl Encodable for EncodedMultisig {
    fn encoding_schema() -> &'static dyn Schema {
        multisig_schema()
    }

    fn to_encoding_data(&self) -> Result<Value> {
        let subsigs = self
            .subsigs
            .iter()
            .map(|s| {
                Value::map([
                    ("pk", Value::Bytes(s.public_key.to_vec())),
                    (
                        "s",
                        Value::Bytes(s.signature.map_or_else(|| vec![0u8; SIGNATURE_LENGTH], |x| x.to_vec())),
                    ),
                ])
            })
            .collect();
        Ok(Value::map([
            ("subsig", Value::Array(subsigs)),
            ("thr", Value::Uint(self.threshold as u64)),
            ("v", Value::Uint(self.version as u64)),
        ]))
    }

    fn from_encoding_data(data: &Value) -> Result<Self> {
        let subsigs = data
            .field("subsig")?
            .as_array()?
            .iter()
            .map(|s| {
                let sig = s.field("s")?.as_byte_array::<SIGNATURE_LENGTH>()?;
                Ok(MultisigSubsig {
                    public_key: s.field("pk")?.as_byte_array::<PUBLIC_KEY_LENGTH>()?,
                    signature: sig.iter().any(|b| *b != 0).then_some(sig),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            version: small(data, "v")?,
            threshold: small(data, "thr")?,
            subsigs,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
