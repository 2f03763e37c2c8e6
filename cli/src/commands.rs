//! # Command Handlers
//!
//! One function per leaf subcommand. Each returns the text to print on
//! stdout so `main` stays a thin dispatcher and the handlers can be tested
//! without capturing process output. File writes happen here; nothing is
//! printed from inside a handler.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use algotx_protocol::abi::AbiMethod;
use algotx_protocol::crypto::Account;
use algotx_protocol::encoding::encode_json_value;
use algotx_protocol::logicsig::LogicSig;
use algotx_protocol::multisig::MultisigMetadata;
use algotx_protocol::transaction::{
    decode_signed_transaction, decode_unsigned_transaction, encode_unsigned_transaction,
    SuggestedParams, TransactionBuilder,
};
use algotx_protocol::Address;

use crate::cli::{AbiCommand, AddressCommand, LsigCommand, MsigCommand, PayArgs, SignArgs, TxnCommand};

fn parse_address(text: &str) -> Result<Address> {
    text.parse::<Address>()
        .with_context(|| format!("invalid address: {}", text))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

// ---------------------------------------------------------------------------
// address
// ---------------------------------------------------------------------------

pub fn address(cmd: AddressCommand) -> Result<String> {
    match cmd {
        AddressCommand::FromKey { public_key } => {
            let bytes = hex::decode(public_key.trim()).context("public key is not valid hex")?;
            let addr = Address::from_public_key(&bytes)?;
            Ok(addr.to_string())
        }
        AddressCommand::Validate { address } => {
            parse_address(&address)?;
            Ok("valid".to_string())
        }
        AddressCommand::App { app_id } => Ok(Address::application_address(app_id).to_string()),
    }
}

// ---------------------------------------------------------------------------
// txn
// ---------------------------------------------------------------------------

pub fn txn(cmd: TxnCommand) -> Result<String> {
    match cmd {
        TxnCommand::Pay(args) => pay(args),
        TxnCommand::Decode { file, signed } => {
            let bytes = read_file(&file)?;
            let json = if signed {
                let envelope = decode_signed_transaction(&bytes)
                    .with_context(|| format!("{} is not a signed transaction", file.display()))?;
                encode_json_value(&envelope)?
            } else {
                let txn = decode_unsigned_transaction(&bytes)
                    .with_context(|| format!("{} is not an unsigned transaction", file.display()))?;
                encode_json_value(&txn)?
            };
            Ok(serde_json::to_string_pretty(&json)?)
        }
        TxnCommand::Id { file } => {
            let bytes = read_file(&file)?;
            let txn = decode_unsigned_transaction(&bytes)
                .with_context(|| format!("{} is not an unsigned transaction", file.display()))?;
            Ok(txn.tx_id()?)
        }
        TxnCommand::Sign(args) => sign(args),
    }
}

fn pay(args: PayArgs) -> Result<String> {
    let params_text = fs::read_to_string(&args.params)
        .with_context(|| format!("failed to read {}", args.params.display()))?;
    let params: SuggestedParams = serde_json::from_str(&params_text)
        .with_context(|| format!("invalid suggested params in {}", args.params.display()))?;

    let from = parse_address(&args.from)?;
    let to = parse_address(&args.to)?;

    let mut builder = TransactionBuilder::payment(from, to, args.amount, &params);
    if let Some(close_to) = &args.close_to {
        builder = builder.close_remainder_to(parse_address(close_to)?);
    }
    if let Some(note) = args.note {
        builder = builder.note(note.into_bytes());
    }
    let txn = builder.build().context("failed to build payment")?;

    write_file(&args.out, &encode_unsigned_transaction(&txn)?)?;
    tracing::info!(
        out = %args.out.display(),
        fee = txn.fee(),
        "unsigned payment written"
    );
    Ok(txn.tx_id()?)
}

fn sign(args: SignArgs) -> Result<String> {
    let account = Account::from_hex(&args.secret_key).context("invalid secret key")?;
    let bytes = read_file(&args.file)?;
    let txn = decode_unsigned_transaction(&bytes)
        .with_context(|| format!("{} is not an unsigned transaction", args.file.display()))?;

    let signed = txn.sign(&account)?;
    write_file(&args.out, &signed)?;

    let tx_id = txn.tx_id()?;
    tracing::info!(
        tx_id = %tx_id,
        signer = %account.address(),
        out = %args.out.display(),
        "transaction signed"
    );
    Ok(tx_id)
}

// ---------------------------------------------------------------------------
// msig / lsig
// ---------------------------------------------------------------------------

pub fn msig(cmd: MsigCommand) -> Result<String> {
    match cmd {
        MsigCommand::Address {
            version,
            threshold,
            addrs,
        } => {
            let addrs = addrs
                .iter()
                .map(|a| parse_address(a))
                .collect::<Result<Vec<_>>>()?;
            let metadata = MultisigMetadata::new(version, threshold, addrs)?;
            Ok(metadata.address()?.to_string())
        }
    }
}

pub fn lsig(cmd: LsigCommand) -> Result<String> {
    match cmd {
        LsigCommand::Address { program } => {
            let bytes = read_file(&program)?;
            let lsig = LogicSig::new(bytes, Vec::new())
                .with_context(|| format!("{} is not a compiled program", program.display()))?;
            Ok(lsig.address().to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// abi
// ---------------------------------------------------------------------------

pub fn abi(cmd: AbiCommand) -> Result<String> {
    match cmd {
        AbiCommand::Selector { signature } => {
            let method = AbiMethod::from_signature(&signature)?;
            Ok(hex::encode(method.selector()))
        }
        AbiCommand::Method { signature } => {
            let method = AbiMethod::from_signature(&signature)?;
            Ok(serde_json::to_string_pretty(&method)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ZERO_ADDR: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ";
    const SEED_HEX: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    fn write_params(dir: &Path) -> PathBuf {
        let path = dir.join("params.json");
        let params = serde_json::json!({
            "flatFee": false,
            "fee": 0,
            "minFee": 1000,
            "firstValid": 100,
            "lastValid": 1100,
            "genesisID": "testnet-v1.0",
            "genesisHash": "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=",
        });
        fs::write(&path, params.to_string()).unwrap();
        path
    }

    fn build_payment(dir: &Path) -> PathBuf {
        let receiver = Account::generate().address().to_string();
        let sender = Account::from_hex(SEED_HEX).unwrap().address().to_string();
        let out = dir.join("pay.msgpack");
        pay(PayArgs {
            params: write_params(dir),
            from: sender,
            to: receiver,
            amount: 5_000,
            close_to: None,
            note: Some("hello".into()),
            out: out.clone(),
        })
        .unwrap();
        out
    }

    #[test]
    fn address_commands() {
        let out = address(AddressCommand::FromKey {
            public_key: "00".repeat(32),
        })
        .unwrap();
        assert_eq!(out, ZERO_ADDR);

        assert!(address(AddressCommand::Validate {
            address: ZERO_ADDR.into()
        })
        .is_ok());

        let mut broken = ZERO_ADDR.to_string();
        broken.replace_range(0..1, "B");
        assert!(address(AddressCommand::Validate { address: broken }).is_err());

        let app = address(AddressCommand::App { app_id: 1 }).unwrap();
        assert_eq!(app.len(), 58);
    }

    #[test]
    fn pay_then_id_then_decode() {
        let dir = tempfile::tempdir().unwrap();
        let file = build_payment(dir.path());

        let id = txn(TxnCommand::Id { file: file.clone() }).unwrap();
        assert_eq!(id.len(), 52);

        let json = txn(TxnCommand::Decode {
            file,
            signed: false,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "pay");
        assert_eq!(value["amt"], 5_000);
        assert_eq!(value["fee"], 1000);
    }

    #[test]
    fn sign_writes_signed_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let file = build_payment(dir.path());
        let out = dir.path().join("signed.msgpack");

        let unsigned_id = txn(TxnCommand::Id { file: file.clone() }).unwrap();
        let signed_id = txn(TxnCommand::Sign(SignArgs {
            file,
            out: out.clone(),
            secret_key: SEED_HEX.into(),
        }))
        .unwrap();
        assert_eq!(unsigned_id, signed_id);

        let json = txn(TxnCommand::Decode {
            file: out,
            signed: true,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["sig"].is_string());
        assert!(value.get("sgnr").is_none());
    }

    #[test]
    fn sign_rejects_bad_key() {
        let dir = tempfile::tempdir().unwrap();
        let file = build_payment(dir.path());
        let result = txn(TxnCommand::Sign(SignArgs {
            file,
            out: dir.path().join("x"),
            secret_key: "zz".into(),
        }));
        assert!(result.is_err());
    }

    #[test]
    fn msig_address_matches_library() {
        let a = Account::generate().address();
        let b = Account::generate().address();
        let expected = MultisigMetadata::new(1, 2, vec![a, b])
            .unwrap()
            .address()
            .unwrap()
            .to_string();
        let out = msig(MsigCommand::Address {
            version: 1,
            threshold: 2,
            addrs: vec![a.to_string(), b.to_string()],
        })
        .unwrap();
        assert_eq!(out, expected);

        assert!(msig(MsigCommand::Address {
            version: 1,
            threshold: 3,
            addrs: vec![a.to_string(), b.to_string()],
        })
        .is_err());
    }

    #[test]
    fn lsig_address_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("prog.teal.tok");
        fs::write(&program, [1u8, 32, 1, 1, 34]).unwrap();
        let out = lsig(LsigCommand::Address { program }).unwrap();
        assert_eq!(
            out,
            "6Z3C3LDVWGMX23BMSYMANACQOSINPFIRF77H7N3AWJZYV6OH6GWTJKVMXY"
        );
    }

    #[test]
    fn abi_commands() {
        let selector = abi(AbiCommand::Selector {
            signature: "add(uint64,uint64)uint64".into(),
        })
        .unwrap();
        assert_eq!(selector, "fe6bdf69");

        let json = abi(AbiCommand::Method {
            signature: "add(uint64,uint64)uint64".into(),
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "add");
        assert_eq!(value["args"][0]["type"], "uint64");
        assert_eq!(value["returns"]["type"], "uint64");
    }
}
