//! Transaction identifiers, signing and the signed envelope.
//!
//! Signing is a separate step from building because the key may not be
//! available at construction time (hardware wallet, remote signer, a
//! multisig co-signer on another machine). Every signer covers the same
//! bytes, [`Transaction::bytes_to_sign`], and the transaction ID is the hash
//! of those bytes, so an ID never changes once a transaction is built.
//!
//! The signed envelope is `{txn, sig?, msig?, lsig?, sgnr?}`. At most one of
//! the three authorization forms may be present. `sgnr` names the
//! authorizing address when it differs from the sender (a rekeyed account,
//! a multisig, or a program).

use data_encoding::BASE32_NOPAD;
use std::sync::OnceLock;
use tracing::debug;

use super::builder::Transaction;
use super::encoding::transaction_schema;
use crate::address::Address;
use crate::config::{HASH_LENGTH, SIGNATURE_LENGTH, TX_TAG};
use crate::crypto::hash::sha512_256;
use crate::crypto::keys::Account;
use crate::encoding::{
    decode_msgpack, encode_msgpack, AddressSchema, Encodable, FixedLengthByteArraySchema,
    NamedMapEntry, NamedMapSchema, OptionalSchema, Schema, Value,
};
use crate::error::{Error, Result};
use crate::logicsig::{logicsig_schema, LogicSig};
use crate::multisig::{multisig_schema, EncodedMultisig};

impl Transaction {
    /// `"TX" ++ canonical msgpack`: the exact bytes every signer covers.
    pub fn bytes_to_sign(&self) -> Result<Vec<u8>> {
        let encoded = encode_msgpack(self)?;
        Ok([TX_TAG, encoded.as_slice()].concat())
    }

    pub fn raw_tx_id(&self) -> Result<[u8; HASH_LENGTH]> {
        Ok(sha512_256(&self.bytes_to_sign()?))
    }

    /// The 52-character base32 transaction ID.
    pub fn tx_id(&self) -> Result<String> {
        Ok(BASE32_NOPAD.encode(&self.raw_tx_id()?))
    }

    /// Sign with `account`, returning only the signature.
    pub fn raw_sign(&self, account: &Account) -> Result<[u8; SIGNATURE_LENGTH]> {
        Ok(account.sign(&self.bytes_to_sign()?))
    }

    /// Sign with `account` and return the encoded envelope. `sgnr` is set
    /// when the signer is not the sender.
    pub fn sign(&self, account: &Account) -> Result<Vec<u8>> {
        let signature = self.raw_sign(account)?;
        self.attach_signature(account.address(), &signature)
    }

    /// Wrap an externally produced signature by `signer` in an envelope.
    pub fn attach_signature(&self, signer: Address, signature: &[u8]) -> Result<Vec<u8>> {
        let sig: [u8; SIGNATURE_LENGTH] = signature.try_into().map_err(|_| {
            Error::MalformedInput(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LENGTH,
                signature.len()
            ))
        })?;
        let envelope = SignedTransaction {
            sig: Some(sig),
            sgnr: (signer != self.sender).then_some(signer),
            ..SignedTransaction::unsigned(self.clone())
        };
        encode_msgpack(&envelope)
    }
}

/// A signed transaction's ID alongside its encoded envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTxnBlob {
    pub tx_id: String,
    pub blob: Vec<u8>,
}

/// Sign `txn` with `account`.
///
/// # Example
///
/// ```
/// use algotx_protocol::crypto::Account;
/// use algotx_protocol::transaction::{sign_transaction, SuggestedParams, TransactionBuilder};
///
/// let alice = Account::from_seed(&[1u8; 32]);
/// let bob = Account::from_seed(&[2u8; 32]);
/// let params = SuggestedParams {
///     flat_fee: false,
///     fee: 0,
///     min_fee: 1000,
///     first_valid: 100,
///     last_valid: 1100,
///     genesis_id: "testnet-v1.0".into(),
///     genesis_hash: [7u8; 32],
/// };
/// let txn = TransactionBuilder::payment(alice.address(), bob.address(), 5, &params)
///     .build()
///     .unwrap();
/// let signed = sign_transaction(&txn, &alice).unwrap();
/// assert_eq!(signed.tx_id.len(), 52);
/// ```
pub fn sign_transaction(txn: &Transaction, account: &Account) -> Result<SignedTxnBlob> {
    let tx_id = txn.tx_id()?;
    let blob = txn.sign(account)?;
    debug!(txid = %tx_id, signer = %account.address(), "signed transaction");
    Ok(SignedTxnBlob { tx_id, blob })
}

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// The signed envelope: a transaction plus at most one authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub txn: Transaction,
    pub sig: Option<[u8; SIGNATURE_LENGTH]>,
    pub msig: Option<EncodedMultisig>,
    pub lsig: Option<LogicSig>,
    /// The authorizing address, when it is not the sender.
    pub sgnr: Option<Address>,
}

impl SignedTransaction {
    /// An envelope carrying no authorization (the simulate form).
    pub fn unsigned(txn: Transaction) -> Self {
        Self {
            txn,
            sig: None,
            msig: None,
            lsig: None,
            sgnr: None,
        }
    }

    pub fn tx_id(&self) -> Result<String> {
        self.txn.tx_id()
    }

    fn check_authorization(&self) -> Result<()> {
        let forms = [self.sig.is_some(), self.msig.is_some(), self.lsig.is_some()];
        if forms.iter().filter(|f| **f).count() > 1 {
            return Err(Error::Validation(
                "signed transaction carries more than one of sig, msig and lsig".into(),
            ));
        }
        Ok(())
    }
}

fn signed_transaction_schema() -> &'static NamedMapSchema {
    static SCHEMA: OnceLock<NamedMapSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        NamedMapSchema::new(vec![
            NamedMapEntry::omit_empty("lsig", OptionalSchema::new(logicsig_schema())),
            NamedMapEntry::omit_empty("msig", OptionalSchema::new(multisig_schema())),
            NamedMapEntry::omit_empty("sgnr", AddressSchema),
            NamedMapEntry::omit_empty("sig", FixedLengthByteArraySchema::new(SIGNATURE_LENGTH)),
            NamedMapEntry::required("txn", transaction_schema()),
        ])
    })
}

impl Encodable for SignedTransaction {
    fn encoding_schema() -> &'static dyn Schema {
        signed_transaction_schema()
    }

    fn to_encoding_data(&self) -> Result<Value> {
        self.check_authorization()?;
        let lsig = match &self.lsig {
            Some(l) => l.to_encoding_data()?,
            None => Value::Nil,
        };
        let msig = match &self.msig {
            Some(m) => m.to_encoding_data()?,
            None => Value::Nil,
        };
        let sgnr = self.sgnr.unwrap_or_else(Address::zero);
        let sig = self.sig.map_or_else(|| vec![0u8; SIGNATURE_LENGTH], |s| s.to_vec());
        Ok(Value::map([
            ("lsig", lsig),
            ("msig", msig),
            ("sgnr", Value::Bytes(sgnr.public_key().to_vec())),
            ("sig", Value::Bytes(sig)),
            ("txn", self.txn.to_encoding_data()?),
        ]))
    }

    fn from_encoding_data(data: &Value) -> Result<Self> {
        let sig = data.field("sig")?.as_byte_array::<SIGNATURE_LENGTH>()?;
        let sgnr = Address::new(data.field("sgnr")?.as_byte_array()?);
        let envelope = Self {
            txn: Transaction::from_encoding_data(data.field("txn")?)?,
            sig: sig.iter().any(|b| *b != 0).then_some(sig),
            msig: match data.field("msig")? {
                Value::Nil => None,
                m => Some(EncodedMultisig::from_encoding_data(m)?),
            },
            lsig: match data.field("lsig")? {
                Value::Nil => None,
                l => Some(LogicSig::from_encoding_data(l)?),
            },
            sgnr: (!sgnr.is_zero()).then_some(sgnr),
        };
        envelope.check_authorization()?;
        Ok(envelope)
    }
}

pub fn encode_signed_transaction(envelope: &SignedTransaction) -> Result<Vec<u8>> {
    encode_msgpack(envelope)
}

/// Strictly decode a signed envelope.
pub fn decode_signed_transaction(bytes: &[u8]) -> Result<SignedTransaction> {
    decode_msgpack(bytes)
}

/// An envelope holding only `txn`, as submitted for simulation.
pub fn encode_unsigned_simulate_transaction(txn: &Transaction) -> Result<Vec<u8>> {
    encode_msgpack(&SignedTransaction::unsigned(txn.clone()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
