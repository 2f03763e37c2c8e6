//! # Logic Signatures
//!
//! A logic signature lets a compiled program authorize transactions. It
//! comes in three modes:
//!
//! - **Escrow**: no signature at all. The program's hash *is* the account,
//!   so the program approves spends from its own address.
//! - **Delegated**: one account signs `"Program" ++ program`, letting the
//!   program approve spends from that account.
//! - **Multisig delegated**: a multisig account does the same through an
//!   [`EncodedMultisig`].
//!
//! [`LogicSig`] carries the program, its arguments and at most one of the
//! two signature forms. [`LogicSigAccount`] adds the delegating public key
//! so the authorizing address can be resolved without guessing.

pub mod program;

use std::sync::OnceLock;
use tracing::debug;

use crate::address::Address;
use crate::config::{PROGRAM_DATA_TAG, PROGRAM_TAG, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::hash::sha512_256;
use crate::crypto::keys::Account;
use crate::crypto::signatures::verify_bytes;
use crate::encoding::{
    encode_msgpack, ArraySchema, ByteArraySchema, Encodable, FixedLengthByteArraySchema,
    NamedMapEntry, NamedMapSchema, OptionalSchema, Schema, Value,
};
use crate::error::{Error, Result};
use crate::multisig::{multisig_schema, verify_multisig, EncodedMultisig, MultisigMetadata};
use crate::transaction::signing::{SignedTransaction, SignedTxnBlob};
use crate::transaction::Transaction;

pub use program::{check_program, read_uvarint};

// ---------------------------------------------------------------------------
// LogicSig
// ---------------------------------------------------------------------------

/// A program, its arguments and an optional delegation signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicSig {
    logic: Vec<u8>,
    args: Vec<Vec<u8>>,
    sig: Option<[u8; SIGNATURE_LENGTH]>,
    msig: Option<EncodedMultisig>,
}

impl LogicSig {
    /// Wrap `program`, rejecting input that is not plausibly bytecode.
    pub fn new(program: Vec<u8>, args: Vec<Vec<u8>>) -> Result<Self> {
        check_program(&program, &args)?;
        Ok(Self {
            logic: program,
            args,
            sig: None,
            msig: None,
        })
    }

    pub fn logic(&self) -> &[u8] {
        &self.logic
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    pub fn sig(&self) -> Option<&[u8; SIGNATURE_LENGTH]> {
        self.sig.as_ref()
    }

    pub fn msig(&self) -> Option<&EncodedMultisig> {
        self.msig.as_ref()
    }

    /// True when the program carries a single or multisig delegation.
    pub fn is_delegated(&self) -> bool {
        self.sig.is_some() || self.msig.is_some()
    }

    /// `"Program" ++ program`: what delegators sign and what the escrow
    /// address hashes.
    pub fn bytes_to_sign(&self) -> Vec<u8> {
        [PROGRAM_TAG, self.logic.as_slice()].concat()
    }

    /// The program's escrow address.
    pub fn address(&self) -> Address {
        Address::new(sha512_256(&self.bytes_to_sign()))
    }

    /// Check the program against the account it claims to act for.
    ///
    /// Never errors: an invalid program, a bad signature or a signature
    /// alongside a multisig all yield `false`.
    pub fn verify(&self, addr: &Address) -> bool {
        if self.sig.is_some() && self.msig.is_some() {
            return false;
        }
        if check_program(&self.logic, &self.args).is_err() {
            return false;
        }
        let message = self.bytes_to_sign();
        match (&self.sig, &self.msig) {
            (Some(sig), _) => verify_bytes(addr.public_key(), &message, sig),
            (None, Some(msig)) => verify_multisig(&message, msig, addr),
            (None, None) => &self.address() == addr,
        }
    }

    /// Delegate `account`'s authority to the program.
    pub fn sign(&mut self, account: &Account) -> Result<()> {
        if self.msig.is_some() {
            return Err(Error::Validation(
                "logic signature already carries a multisig".into(),
            ));
        }
        self.sig = Some(account.sign(&self.bytes_to_sign()));
        Ok(())
    }

    /// Start a multisig delegation and fill `account`'s slot.
    pub fn sign_multisig(&mut self, metadata: &MultisigMetadata, account: &Account) -> Result<()> {
        if self.sig.is_some() {
            return Err(Error::Validation(
                "logic signature already carries a single signature".into(),
            ));
        }
        let msig = metadata.unsigned()?.sign(&self.bytes_to_sign(), account)?;
        self.msig = Some(msig);
        Ok(())
    }

    /// Add `account`'s slot to an existing multisig delegation.
    pub fn append_to_multisig(&mut self, account: &Account) -> Result<()> {
        let message = self.bytes_to_sign();
        let msig = self
            .msig
            .as_ref()
            .ok_or_else(|| Error::Validation("no multisig present".into()))?;
        self.msig = Some(msig.sign(&message, account)?);
        Ok(())
    }
}

pub(crate) fn logicsig_schema() -> &'static NamedMapSchema {
    static SCHEMA: OnceLock<NamedMapSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        NamedMapSchema::new(vec![
            NamedMapEntry::omit_empty("arg", ArraySchema::new(ByteArraySchema)),
            NamedMapEntry::required("l", ByteArraySchema),
            NamedMapEntry::omit_empty("msig", OptionalSchema::new(multisig_schema())),
            NamedMapEntry::omit_empty("sig", FixedLengthByteArraySchema::new(SIGNATURE_LENGTH)),
        ])
    })
}

impl Encodable for LogicSig {
    fn encoding_schema() -> &'static dyn Schema {
        logicsig_schema()
    }

    fn to_encoding_data(&self) -> Result<Value> {
        let msig = match &self.msig {
            Some(m) => m.to_encoding_data()?,
            None => Value::Nil,
        };
        Ok(Value::map([
            (
                "arg",
                Value::Array(self.args.iter().map(|a| Value::Bytes(a.clone())).collect()),
            ),
            ("l", Value::Bytes(self.logic.clone())),
            ("msig", msig),
            (
                "sig",
                Value::Bytes(self.sig.map_or_else(|| vec![0u8; SIGNATURE_LENGTH], |s| s.to_vec())),
            ),
        ]))
    }

    fn from_encoding_data(data: &Value) -> Result<Self> {
        let args = data
            .field("arg")?
            .as_array()?
            .iter()
            .map(|a| a.as_bytes().map(<[u8]>::to_vec))
            .collect::<Result<Vec<_>>>()?;
        let mut lsig = LogicSig::new(data.field("l")?.as_bytes()?.to_vec(), args)?;

        let sig = data.field("sig")?.as_byte_array::<SIGNATURE_LENGTH>()?;
        lsig.sig = sig.iter().any(|b| *b != 0).then_some(sig);
        lsig.msig = match data.field("msig")? {
            Value::Nil => None,
            m => Some(EncodedMultisig::from_encoding_data(m)?),
        };
        if lsig.sig.is_some() && lsig.msig.is_some() {
            return Err(Error::Encoding(
                "logic signature carries both sig and msig".into(),
            ));
        }
        Ok(lsig)
    }
}

// ---------------------------------------------------------------------------
// LogicSigAccount
// ---------------------------------------------------------------------------

/// A [`LogicSig`] together with the public key of its single-key delegator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicSigAccount {
    lsig: LogicSig,
    signer: Option<Address>,
}

impl LogicSigAccount {
    pub fn new(program: Vec<u8>, args: Vec<Vec<u8>>) -> Result<Self> {
        Ok(Self {
            lsig: LogicSig::new(program, args)?,
            signer: None,
        })
    }

    pub fn lsig(&self) -> &LogicSig {
        &self.lsig
    }

    pub fn signer(&self) -> Option<Address> {
        self.signer
    }

    pub fn is_delegated(&self) -> bool {
        self.lsig.is_delegated()
    }

    /// The account this logic signature authorizes: the delegator, the
    /// delegating multisig, or the program's escrow address.
    pub fn address(&self) -> Result<Address> {
        match (&self.lsig.sig, &self.lsig.msig, self.signer) {
            (Some(_), _, Some(signer)) => Ok(signer),
            (Some(_), _, None) => Err(Error::Validation(
                "delegated logic signature is missing its signing key".into(),
            )),
            (None, Some(msig), _) => msig.address(),
            (None, None, _) => Ok(self.lsig.address()),
        }
    }

    pub fn sign(&mut self, account: &Account) -> Result<()> {
        self.lsig.sign(account)?;
        self.signer = Some(account.address());
        Ok(())
    }

    pub fn sign_multisig(&mut self, metadata: &MultisigMetadata, account: &Account) -> Result<()> {
        self.lsig.sign_multisig(metadata, account)?;
        self.signer = None;
        Ok(())
    }

    pub fn append_to_multisig(&mut self, account: &Account) -> Result<()> {
        self.lsig.append_to_multisig(account)
    }

    /// True when the delegation (if any) is valid for [`Self::address`].
    pub fn verify(&self) -> bool {
        if self.lsig.sig.is_none() && self.signer.is_some() {
            return false;
        }
        match self.address() {
            Ok(addr) => self.lsig.verify(&addr),
            Err(_) => false,
        }
    }
}

fn logicsig_account_schema() -> &'static NamedMapSchema {
    static SCHEMA: OnceLock<NamedMapSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        NamedMapSchema::new(vec![
            NamedMapEntry::required("lsig", logicsig_schema()),
            NamedMapEntry::omit_empty("sigkey", FixedLengthByteArraySchema::new(PUBLIC_KEY_LENGTH)),
        ])
    })
}

impl Encodable for LogicSigAccount {
    fn encoding_schema() -> &'static dyn Schema {
        logicsig_account_schema()
    }

    fn to_encoding_data(&self) -> Result<Value> {
        let sigkey = self.signer.unwrap_or_else(Address::zero);
        Ok(Value::map([
            ("lsig", self.lsig.to_encoding_data()?),
            ("sigkey", Value::Bytes(sigkey.public_key().to_vec())),
        ]))
    }

    fn from_encoding_data(data: &Value) -> Result<Self> {
        let signer = Address::new(data.field("sigkey")?.as_byte_array::<PUBLIC_KEY_LENGTH>()?);
        Ok(Self {
            lsig: LogicSig::from_encoding_data(data.field("lsig")?)?,
            signer: (!signer.is_zero()).then_some(signer),
        })
    }
}

// ---------------------------------------------------------------------------
// Transaction signing
// ---------------------------------------------------------------------------

/// Authorize `txn` with `lsig` acting for `authorizer`.
///
/// The logic signature must verify against `authorizer`; when that is not
/// the sender, the envelope records it as `sgnr`.
pub fn sign_logic_sig_transaction_with_address(
    txn: &Transaction,
    lsig: &LogicSig,
    authorizer: &Address,
) -> Result<SignedTxnBlob> {
    if !lsig.verify(authorizer) {
        return Err(Error::CryptoVerification(format!(
            "logic signature does not verify for {}",
            authorizer
        )));
    }
    let envelope = SignedTransaction {
        txn: txn.clone(),
        sig: None,
        msig: None,
        lsig: Some(lsig.clone()),
        sgnr: (authorizer != &txn.sender()).then_some(*authorizer),
    };
    let tx_id = txn.tx_id()?;
    debug!(txid = %tx_id, signer = %authorizer, "signed transaction with logic signature");
    Ok(SignedTxnBlob {
        tx_id,
        blob: encode_msgpack(&envelope)?,
    })
}

/// Authorize `txn` with a logic-signature account.
pub fn sign_logic_sig_transaction(
    txn: &Transaction,
    account: &LogicSigAccount,
) -> Result<SignedTxnBlob> {
    let authorizer = account.address()?;
    sign_logic_sig_transaction_with_address(txn, &account.lsig, &authorizer)
}

/// Authorize `txn` with a bare [`LogicSig`], resolving the authorizer from
/// the signature it carries.
///
/// A single-key delegation carries no signer key, so it is taken to act for
/// the sender. A multisig delegation acts for its multisig address and an
/// escrow for its program address.
pub fn sign_logic_sig_transaction_object(txn: &Transaction, lsig: &LogicSig) -> Result<SignedTxnBlob> {
    let authorizer = match (&lsig.sig, &lsig.msig) {
        (Some(_), Some(_)) => {
            return Err(Error::CryptoVerification(
                "logic signature carries both sig and msig".into(),
            ))
        }
        (Some(_), None) => txn.sender(),
        (None, Some(msig)) => msig.address()?,
        (None, None) => lsig.address(),
    };
    sign_logic_sig_transaction_with_address(txn, lsig, &authorizer)
}

// ---------------------------------------------------------------------------
// Program-data signatures
// ---------------------------------------------------------------------------

fn program_data(program_address: &Address, data: &[u8]) -> Vec<u8> {
    [PROGRAM_DATA_TAG, program_address.public_key().as_slice(), data].concat()
}

/// Sign `data` for the program at `program_address`, in the form the
/// `ed25519verify` opcode checks.
pub fn teal_sign(account: &Account, data: &[u8], program_address: &Address) -> [u8; SIGNATURE_LENGTH] {
    account.sign(&program_data(program_address, data))
}

/// [`teal_sign`] for a program given by its bytes.
pub fn teal_sign_from_program(
    account: &Account,
    data: &[u8],
    program: &[u8],
) -> Result<[u8; SIGNATURE_LENGTH]> {
    let lsig = LogicSig::new(program.to_vec(), Vec::new())?;
    Ok(teal_sign(account, data, &lsig.address()))
}

pub fn verify_teal_sign(
    data: &[u8],
    program_address: &Address,
    signature: &[u8],
    public_key: &Address,
) -> bool {
    verify_bytes(public_key.public_key(), &program_data(program_address, data), signature)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode_msgpack, encode_msgpack};

    const PROGRAM: [u8; 5] = [1, 32, 1, 1, 34];

    #[test]
    fn test_escrow_address() {
        let lsig = LogicSig::new(PROGRAM.to_vec(), vec![]).unwrap();
        assert_eq!(
            lsig.address().to_string(),
            "6Z3C3LDVWGMX23BMSYMANACQOSINPFIRF77H7N3AWJZYV6OH6GWTJKVMXY"
        );
        assert!(lsig.verify(&lsig.address()));
        assert!(!lsig.verify(&Address::zero()));
    }

    #[test]
    fn test_rejects_non_program() {
        assert!(matches!(
            LogicSig::new(b"6Z3C3LDVWGMX23BMSYMANACQOSINPFIRF77H7N3AWJZYV6OH6GWTJKVMXY".to_vec(), vec![]),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_single_delegation() {
        let account = Account::from_seed(&[9; 32]);
        let mut lsig = LogicSig::new(PROGRAM.to_vec(), vec![b"x".to_vec()]).unwrap();
        lsig.sign(&account).unwrap();
        assert!(lsig.verify(&account.address()));
        assert!(!lsig.verify(&lsig.address()));

        // A single signature excludes a multisig.
        let meta = MultisigMetadata::new(1, 1, vec![account.address()]).unwrap();
        assert!(lsig.sign_multisig(&meta, &account).is_err());
    }

    #[test]
    fn test_multisig_delegation() {
        let a = Account::from_seed(&[1; 32]);
        let b = Account::from_seed(&[2; 32]);
        let meta = MultisigMetadata::new(1, 2, vec![a.address(), b.address()]).unwrap();
        let msig_addr = meta.address().unwrap();

        let mut account = LogicSigAccount::new(PROGRAM.to_vec(), vec![]).unwrap();
        account.sign_multisig(&meta, &a).unwrap();
        assert_eq!(account.address().unwrap(), msig_addr);
        assert!(!account.verify());

        account.append_to_multisig(&b).unwrap();
        assert!(account.verify());
        assert!(account.is_delegated());
    }

    #[test]
    fn test_append_without_multisig() {
        let mut lsig = LogicSig::new(PROGRAM.to_vec(), vec![]).unwrap();
        let err = lsig.append_to_multisig(&Account::from_seed(&[1; 32])).unwrap_err();
        assert!(err.to_string().contains("no multisig present"));
    }

    #[test]
    fn test_account_wire_form() {
        let signer = Account::from_seed(&[4; 32]);
        let mut account = LogicSigAccount::new(PROGRAM.to_vec(), vec![vec![0, 1]]).unwrap();
        account.sign(&signer).unwrap();
        let bytes = encode_msgpack(&account).unwrap();
        let back: LogicSigAccount = decode_msgpack(&bytes).unwrap();
        assert_eq!(back, account);
        assert_eq!(back.address().unwrap(), signer.address());
        assert!(back.verify());

        let escrow = LogicSigAccount::new(PROGRAM.to_vec(), vec![]).unwrap();
        let back: LogicSigAccount = decode_msgpack(&encode_msgpack(&escrow).unwrap()).unwrap();
        assert_eq!(back.signer(), None);
        assert!(!back.is_delegated());
    }

    #[test]
    fn test_teal_sign() {
        let account = Account::from_seed(&[5; 32]);
        let lsig = LogicSig::new(PROGRAM.to_vec(), vec![]).unwrap();
        let sig = teal_sign_from_program(&account, b"data", &PROGRAM).unwrap();
        assert_eq!(sig, teal_sign(&account, b"data", &lsig.address()));
        assert!(verify_teal_sign(b"data", &lsig.address(), &sig, &account.address()));
        assert!(!verify_teal_sign(b"other", &lsig.address(), &sig, &account.address()));
    }
}
