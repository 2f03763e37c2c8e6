//! Wire projection of [`Transaction`].
//!
//! One schema covers every kind: the header keys plus the union of all
//! kind-specific keys, each omit-empty. Encoding projects only the keys of
//! the transaction's own kind; decoding switches on `type` and then insists
//! that every key belonging to another kind is still at its default, so a
//! `pay` carrying `xaid` is rejected rather than silently dropped.
//!
//! ```text
//! header  type snd fee fv lv gen gh note lx rekey grp
//! pay     rcv amt close
//! keyreg  votekey selkey sprfkey votefst votelst votekd nonpart
//! acfg    caid apar{t dc df m r f c un an au am}
//! axfer   xaid aamt arcv asnd aclose
//! afrz    faid fadd afrz
//! appl    apid apan apaa apat apfa apas apbx[{i n}] apap apsu
//!         apls{nui nbs} apgs{nui nbs} apep
//! stpf    sptype sp spmsg
//! ```

use std::sync::OnceLock;

use super::boxes::{resolve_box_references, translate_box_references, EncodedBoxReference};
use super::builder::{Transaction, TransactionBuilder};
use super::types::{
    ApplicationCallFields, AssetConfigFields, AssetFreezeFields, AssetTransferFields,
    KeyRegistrationFields, OnApplicationComplete, PaymentFields, StateProofFields, StateSchema,
    SuggestedParams, TransactionKind, TransactionType,
};
use crate::address::Address;
use crate::config::{
    GROUP_ID_LENGTH, HASH_LENGTH, LEASE_LENGTH, METADATA_HASH_LENGTH, SELECTION_KEY_LENGTH,
    STATE_PROOF_KEY_LENGTH, VOTE_KEY_LENGTH,
};
use crate::encoding::{
    decode_msgpack, encode_msgpack, AddressSchema, ArraySchema, BooleanSchema, ByteArraySchema,
    Encodable, FixedLengthByteArraySchema, NamedMapEntry, NamedMapSchema, Schema, StringSchema,
    Uint64Schema, UntypedSchema, Value,
};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const HEADER_KEYS: &[&str] = &[
    "type", "snd", "fee", "fv", "lv", "gen", "gh", "note", "lx", "rekey", "grp",
];

fn kind_keys(tx_type: TransactionType) -> &'static [&'static str] {
    match tx_type {
        TransactionType::Payment => &["rcv", "amt", "close"],
        TransactionType::KeyRegistration => &[
            "votekey", "selkey", "sprfkey", "votefst", "votelst", "votekd", "nonpart",
        ],
        TransactionType::AssetConfig => &["caid", "apar"],
        TransactionType::AssetTransfer => &["xaid", "aamt", "arcv", "asnd", "aclose"],
        TransactionType::AssetFreeze => &["faid", "fadd", "afrz"],
        TransactionType::ApplicationCall => &[
            "apid", "apan", "apaa", "apat", "apfa", "apas", "apbx", "apap", "apsu", "apls",
            "apgs", "apep",
        ],
        TransactionType::StateProof => &["sptype", "sp", "spmsg"],
    }
}

fn state_schema_schema() -> NamedMapSchema {
    NamedMapSchema::new(vec![
        NamedMapEntry::omit_empty("nui", Uint64Schema),
        NamedMapEntry::omit_empty("nbs", Uint64Schema),
    ])
}

fn asset_params_schema() -> NamedMapSchema {
    NamedMapSchema::new(vec![
        NamedMapEntry::omit_empty("t", Uint64Schema),
        NamedMapEntry::omit_empty("dc", Uint64Schema),
        NamedMapEntry::omit_empty("df", BooleanSchema),
        NamedMapEntry::omit_empty("m", AddressSchema),
        NamedMapEntry::omit_empty("r", AddressSchema),
        NamedMapEntry::omit_empty("f", AddressSchema),
        NamedMapEntry::omit_empty("c", AddressSchema),
        NamedMapEntry::omit_empty("un", StringSchema),
        NamedMapEntry::omit_empty("an", StringSchema),
        NamedMapEntry::omit_empty("au", StringSchema),
        NamedMapEntry::omit_empty("am", FixedLengthByteArraySchema::new(METADATA_HASH_LENGTH)),
    ])
}

fn box_reference_schema() -> NamedMapSchema {
    NamedMapSchema::new(vec![
        NamedMapEntry::omit_empty("i", Uint64Schema),
        NamedMapEntry::omit_empty("n", ByteArraySchema),
    ])
}

/// The schema shared by every transaction kind.
pub(crate) fn transaction_schema() -> &'static NamedMapSchema {
    static SCHEMA: OnceLock<NamedMapSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        NamedMapSchema::combine(vec![
            vec![
                NamedMapEntry::omit_empty("type", StringSchema),
                NamedMapEntry::omit_empty("snd", AddressSchema),
                NamedMapEntry::omit_empty("fee", Uint64Schema),
                NamedMapEntry::omit_empty("fv", Uint64Schema),
                NamedMapEntry::omit_empty("lv", Uint64Schema),
                NamedMapEntry::omit_empty("gen", StringSchema),
                NamedMapEntry::omit_empty("gh", FixedLengthByteArraySchema::new(HASH_LENGTH)),
                NamedMapEntry::omit_empty("note", ByteArraySchema),
                NamedMapEntry::omit_empty("lx", FixedLengthByteArraySchema::new(LEASE_LENGTH)),
                NamedMapEntry::omit_empty("rekey", AddressSchema),
                NamedMapEntry::omit_empty("grp", FixedLengthByteArraySchema::new(GROUP_ID_LENGTH)),
            ],
            vec![
                NamedMapEntry::omit_empty("rcv", AddressSchema),
                NamedMapEntry::omit_empty("amt", Uint64Schema),
                NamedMapEntry::omit_empty("close", AddressSchema),
            ],
            vec![
                NamedMapEntry::omit_empty("votekey", FixedLengthByteArraySchema::new(VOTE_KEY_LENGTH)),
                NamedMapEntry::omit_empty("selkey", FixedLengthByteArraySchema::new(SELECTION_KEY_LENGTH)),
                NamedMapEntry::omit_empty("sprfkey", FixedLengthByteArraySchema::new(STATE_PROOF_KEY_LENGTH)),
                NamedMapEntry::omit_empty("votefst", Uint64Schema),
                NamedMapEntry::omit_empty("votelst", Uint64Schema),
                NamedMapEntry::omit_empty("votekd", Uint64Schema),
                NamedMapEntry::omit_empty("nonpart", BooleanSchema),
            ],
            vec![
                NamedMapEntry::omit_empty("caid", Uint64Schema),
                NamedMapEntry::omit_empty("apar", asset_params_schema()),
            ],
            vec![
                NamedMapEntry::omit_empty("xaid", Uint64Schema),
                NamedMapEntry::omit_empty("aamt", Uint64Schema),
                NamedMapEntry::omit_empty("arcv", AddressSchema),
                NamedMapEntry::omit_empty("asnd", AddressSchema),
                NamedMapEntry::omit_empty("aclose", AddressSchema),
            ],
            vec![
                NamedMapEntry::omit_empty("faid", Uint64Schema),
                NamedMapEntry::omit_empty("fadd", AddressSchema),
                NamedMapEntry::omit_empty("afrz", BooleanSchema),
            ],
            vec![
                NamedMapEntry::omit_empty("apid", Uint64Schema),
                NamedMapEntry::omit_empty("apan", Uint64Schema),
                NamedMapEntry::omit_empty("apaa", ArraySchema::new(ByteArraySchema)),
                NamedMapEntry::omit_empty("apat", ArraySchema::new(AddressSchema)),
                NamedMapEntry::omit_empty("apfa", ArraySchema::new(Uint64Schema)),
                NamedMapEntry::omit_empty("apas", ArraySchema::new(Uint64Schema)),
                NamedMapEntry::omit_empty("apbx", ArraySchema::new(box_reference_schema())),
                NamedMapEntry::omit_empty("apap", ByteArraySchema),
                NamedMapEntry::omit_empty("apsu", ByteArraySchema),
                NamedMapEntry::omit_empty("apls", state_schema_schema()),
                NamedMapEntry::omit_empty("apgs", state_schema_schema()),
                NamedMapEntry::omit_empty("apep", Uint64Schema),
            ],
            vec![
                NamedMapEntry::omit_empty("sptype", Uint64Schema),
                NamedMapEntry::omit_empty("sp", UntypedSchema),
                NamedMapEntry::omit_empty("spmsg", UntypedSchema),
            ],
        ])
    })
}

// ---------------------------------------------------------------------------
// Projection helpers
// ---------------------------------------------------------------------------

fn addr(a: &Address) -> Value {
    Value::Bytes(a.public_key().to_vec())
}

fn opt_addr(a: &Option<Address>) -> Value {
    a.as_ref().map(addr).unwrap_or_else(|| addr(&Address::zero()))
}

fn opt_array<const N: usize>(bytes: &Option<[u8; N]>) -> Value {
    Value::Bytes(bytes.map_or_else(|| vec![0u8; N], |b| b.to_vec()))
}

fn state_schema_value(s: &StateSchema) -> Value {
    Value::map([
        ("nui", Value::Uint(s.num_uints)),
        ("nbs", Value::Uint(s.num_byte_slices)),
    ])
}

fn read_u64(data: &Value, key: &str) -> Result<u64> {
    data.field(key)?.as_u64()
}

fn read_bool(data: &Value, key: &str) -> Result<bool> {
    data.field(key)?.as_bool()
}

fn read_string(data: &Value, key: &str) -> Result<String> {
    Ok(data.field(key)?.as_str()?.to_string())
}

fn read_bytes(data: &Value, key: &str) -> Result<Vec<u8>> {
    Ok(data.field(key)?.as_bytes()?.to_vec())
}

fn read_addr(data: &Value, key: &str) -> Result<Address> {
    Ok(Address::new(data.field(key)?.as_byte_array::<32>()?))
}

fn read_opt_addr(data: &Value, key: &str) -> Result<Option<Address>> {
    let a = read_addr(data, key)?;
    Ok((!a.is_zero()).then_some(a))
}

fn read_opt_array<const N: usize>(data: &Value, key: &str) -> Result<Option<[u8; N]>> {
    let bytes = data.field(key)?.as_byte_array::<N>()?;
    Ok(bytes.iter().any(|b| *b != 0).then_some(bytes))
}

fn read_state_schema(data: &Value, key: &str) -> Result<StateSchema> {
    let map = data.field(key)?;
    Ok(StateSchema {
        num_uints: read_u64(map, "nui")?,
        num_byte_slices: read_u64(map, "nbs")?,
    })
}

fn read_list<T>(data: &Value, key: &str, f: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    data.field(key)?.as_array()?.iter().map(f).collect()
}

// ---------------------------------------------------------------------------
// Encodable
// ---------------------------------------------------------------------------

fn kind_entries(kind: &TransactionKind) -> Result<Vec<(&'static str, Value)>> {
    Ok(match kind {
        TransactionKind::Payment(pay) => vec![
            ("rcv", addr(&pay.receiver)),
            ("amt", Value::Uint(pay.amount)),
            ("close", opt_addr(&pay.close_remainder_to)),
        ],
        TransactionKind::KeyRegistration(k) => vec![
            ("votekey", opt_array(&k.vote_key)),
            ("selkey", opt_array(&k.selection_key)),
            ("sprfkey", opt_array(&k.state_proof_key)),
            ("votefst", Value::Uint(k.vote_first.unwrap_or(0))),
            ("votelst", Value::Uint(k.vote_last.unwrap_or(0))),
            ("votekd", Value::Uint(k.vote_key_dilution.unwrap_or(0))),
            ("nonpart", Value::Bool(k.non_participation)),
        ],
        TransactionKind::AssetConfig(a) => vec![
            ("caid", Value::Uint(a.asset_index)),
            (
                "apar",
                Value::map([
                    ("t", Value::Uint(a.total)),
                    ("dc", Value::Uint(a.decimals)),
                    ("df", Value::Bool(a.default_frozen)),
                    ("m", opt_addr(&a.manager)),
                    ("r", opt_addr(&a.reserve)),
                    ("f", opt_addr(&a.freeze)),
                    ("c", opt_addr(&a.clawback)),
                    ("un", Value::from(a.unit_name.as_str())),
                    ("an", Value::from(a.asset_name.as_str())),
                    ("au", Value::from(a.asset_url.as_str())),
                    ("am", opt_array(&a.metadata_hash)),
                ]),
            ),
        ],
        TransactionKind::AssetTransfer(x) => vec![
            ("xaid", Value::Uint(x.asset_index)),
            ("aamt", Value::Uint(x.amount)),
            ("arcv", addr(&x.receiver)),
            ("asnd", opt_addr(&x.asset_sender)),
            ("aclose", opt_addr(&x.close_remainder_to)),
        ],
        TransactionKind::AssetFreeze(f) => vec![
            ("faid", Value::Uint(f.asset_index)),
            ("fadd", addr(&f.freeze_account)),
            ("afrz", Value::Bool(f.frozen)),
        ],
        TransactionKind::ApplicationCall(a) => {
            let boxes = translate_box_references(&a.boxes, &a.foreign_apps, a.app_index)?
                .into_iter()
                .map(|b| Value::map([("i", Value::Uint(b.index)), ("n", Value::Bytes(b.name))]))
                .collect();
            vec![
                ("apid", Value::Uint(a.app_index)),
                ("apan", Value::Uint(a.on_complete.as_u64())),
                (
                    "apaa",
                    Value::Array(a.app_args.iter().map(|x| Value::Bytes(x.clone())).collect()),
                ),
                ("apat", Value::Array(a.accounts.iter().map(addr).collect())),
                (
                    "apfa",
                    Value::Array(a.foreign_apps.iter().map(|x| Value::Uint(*x)).collect()),
                ),
                (
                    "apas",
                    Value::Array(a.foreign_assets.iter().map(|x| Value::Uint(*x)).collect()),
                ),
                ("apbx", Value::Array(boxes)),
                ("apap", Value::Bytes(a.approval_program.clone())),
                ("apsu", Value::Bytes(a.clear_program.clone())),
                ("apls", state_schema_value(&a.local_schema)),
                ("apgs", state_schema_value(&a.global_schema)),
                ("apep", Value::Uint(a.extra_pages)),
            ]
        }
        TransactionKind::StateProof(s) => vec![
            ("sptype", Value::Uint(s.state_proof_type)),
            ("sp", s.state_proof.clone()),
            ("spmsg", s.message.clone()),
        ],
    })
}

fn read_keyreg(data: &Value) -> Result<KeyRegistrationFields> {
    let vote_key = read_opt_array(data, "votekey")?;
    let selection_key = read_opt_array(data, "selkey")?;
    // Round zero is a legal vote round, so once keys are present the
    // omitted rounds read back as zero rather than as "unset".
    let online = vote_key.is_some() || selection_key.is_some();
    let round = |key: &str| -> Result<Option<u64>> {
        let v = read_u64(data, key)?;
        Ok((online || v != 0).then_some(v))
    };
    Ok(KeyRegistrationFields {
        vote_key,
        selection_key,
        state_proof_key: read_opt_array(data, "sprfkey")?,
        vote_first: round("votefst")?,
        vote_last: round("votelst")?,
        vote_key_dilution: round("votekd")?,
        non_participation: read_bool(data, "nonpart")?,
    })
}

fn read_kind(tx_type: TransactionType, data: &Value) -> Result<TransactionKind> {
    Ok(match tx_type {
        TransactionType::Payment => TransactionKind::Payment(PaymentFields {
            receiver: read_addr(data, "rcv")?,
            amount: read_u64(data, "amt")?,
            close_remainder_to: read_opt_addr(data, "close")?,
        }),
        TransactionType::KeyRegistration => TransactionKind::KeyRegistration(read_keyreg(data)?),
        TransactionType::AssetConfig => {
            let apar = data.field("apar")?;
            TransactionKind::AssetConfig(AssetConfigFields {
                asset_index: read_u64(data, "caid")?,
                total: read_u64(apar, "t")?,
                decimals: read_u64(apar, "dc")?,
                default_frozen: read_bool(apar, "df")?,
                manager: read_opt_addr(apar, "m")?,
                reserve: read_opt_addr(apar, "r")?,
                freeze: read_opt_addr(apar, "f")?,
                clawback: read_opt_addr(apar, "c")?,
                unit_name: read_string(apar, "un")?,
                asset_name: read_string(apar, "an")?,
                asset_url: read_string(apar, "au")?,
                metadata_hash: read_opt_array(apar, "am")?,
            })
        }
        TransactionType::AssetTransfer => TransactionKind::AssetTransfer(AssetTransferFields {
            asset_index: read_u64(data, "xaid")?,
            amount: read_u64(data, "aamt")?,
            receiver: read_addr(data, "arcv")?,
            asset_sender: read_opt_addr(data, "asnd")?,
            close_remainder_to: read_opt_addr(data, "aclose")?,
        }),
        TransactionType::AssetFreeze => TransactionKind::AssetFreeze(AssetFreezeFields {
            asset_index: read_u64(data, "faid")?,
            freeze_account: read_addr(data, "fadd")?,
            frozen: read_bool(data, "afrz")?,
        }),
        TransactionType::ApplicationCall => {
            let foreign_apps = read_list(data, "apfa", Value::as_u64)?;
            let encoded_boxes = read_list(data, "apbx", |b| {
                Ok(EncodedBoxReference {
                    index: read_u64(b, "i")?,
                    name: read_bytes(b, "n")?,
                })
            })?;
            TransactionKind::ApplicationCall(ApplicationCallFields {
                app_index: read_u64(data, "apid")?,
                on_complete: OnApplicationComplete::try_from(read_u64(data, "apan")?)?,
                local_schema: read_state_schema(data, "apls")?,
                global_schema: read_state_schema(data, "apgs")?,
                extra_pages: read_u64(data, "apep")?,
                approval_program: read_bytes(data, "apap")?,
                clear_program: read_bytes(data, "apsu")?,
                app_args: read_list(data, "apaa", |v| Ok(v.as_bytes()?.to_vec()))?,
                accounts: read_list(data, "apat", |v| Ok(Address::new(v.as_byte_array::<32>()?)))?,
                foreign_assets: read_list(data, "apas", Value::as_u64)?,
                boxes: resolve_box_references(&encoded_boxes, &foreign_apps)?,
                foreign_apps,
            })
        }
        TransactionType::StateProof => TransactionKind::StateProof(StateProofFields {
            state_proof_type: read_u64(data, "sptype")?,
            state_proof: data.field("sp")?.clone(),
            message: data.field("spmsg")?.clone(),
        }),
    })
}

impl Encodable for Transaction {
    fn encoding_schema() -> &'static dyn Schema {
        transaction_schema()
    }

    fn to_encoding_data(&self) -> Result<Value> {
        let mut entries = vec![
            ("type", Value::from(self.tx_type().as_str())),
            ("snd", addr(&self.sender)),
            ("fee", Value::Uint(self.fee)),
            ("fv", Value::Uint(self.first_valid)),
            ("lv", Value::Uint(self.last_valid)),
            ("gen", Value::from(self.genesis_id.as_str())),
            ("gh", Value::Bytes(self.genesis_hash.to_vec())),
            ("note", Value::Bytes(self.note.clone())),
            ("lx", opt_array(&self.lease)),
            ("rekey", opt_addr(&self.rekey_to)),
            ("grp", opt_array(&self.group)),
        ];
        entries.extend(kind_entries(&self.kind)?);
        Ok(Value::map(entries))
    }

    fn from_encoding_data(data: &Value) -> Result<Self> {
        let tx_type: TransactionType = data.field("type")?.as_str()?.parse()?;

        let own = kind_keys(tx_type);
        for entry in transaction_schema().entries() {
            if HEADER_KEYS.contains(&entry.key) || own.contains(&entry.key) {
                continue;
            }
            if let Some(v) = data.get(entry.key) {
                if !entry.schema.is_default_value(v) {
                    return Err(Error::Encoding(format!(
                        "field '{}' is not valid for {} transactions",
                        entry.key, tx_type
                    )));
                }
            }
        }

        let params = SuggestedParams {
            flat_fee: true,
            fee: read_u64(data, "fee")?,
            min_fee: 0,
            first_valid: read_u64(data, "fv")?,
            last_valid: read_u64(data, "lv")?,
            genesis_id: read_string(data, "gen")?,
            genesis_hash: data.field("gh")?.as_byte_array::<HASH_LENGTH>()?,
        };
        let mut builder =
            TransactionBuilder::new(read_addr(data, "snd")?, &params, read_kind(tx_type, data)?)
                .note(read_bytes(data, "note")?);
        if let Some(lease) = read_opt_array::<LEASE_LENGTH>(data, "lx")? {
            builder = builder.lease(lease);
        }
        if let Some(rekey) = read_opt_addr(data, "rekey")? {
            builder = builder.rekey_to(rekey);
        }
        let group = read_opt_array::<GROUP_ID_LENGTH>(data, "grp")?;
        Ok(builder.build()?.with_group(group))
    }
}

/// Canonical msgpack of an unsigned transaction.
pub fn encode_unsigned_transaction(txn: &Transaction) -> Result<Vec<u8>> {
    encode_msgpack(txn)
}

/// Strictly decode an unsigned transaction.
pub fn decode_unsigned_transaction(bytes: &[u8]) -> Result<Transaction> {
    decode_msgpack(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode_json, encode_json, msgpack};
    use crate::transaction::BoxReference;

    fn params() -> SuggestedParams {
        SuggestedParams {
            flat_fee: true,
            fee: 1000,
            min_fee: 1000,
            first_valid: 51,
            last_valid: 61,
            genesis_id: "testnet-v1.0".into(),
            genesis_hash: [3u8; 32],
        }
    }

    fn a(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    fn round_trip(txn: &Transaction) -> Transaction {
        let bytes = encode_unsigned_transaction(txn).unwrap();
        let back = decode_unsigned_transaction(&bytes).unwrap();
        assert_eq!(&back, txn);
        assert_eq!(encode_unsigned_transaction(&back).unwrap(), bytes);
        back
    }

    #[test]
    fn test_payment_key_set() {
        let txn = TransactionBuilder::payment(a(1), a(2), 0, &params())
            .note(b"hi".to_vec())
            .build()
            .unwrap();
        let raw = msgpack::decode(&encode_unsigned_transaction(&txn).unwrap()).unwrap();
        let keys: Vec<&str> = raw
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap())
            .collect();
        // amt is zero and omitted; keys come out sorted.
        assert_eq!(keys, vec!["fee", "fv", "gen", "gh", "lv", "note", "rcv", "snd", "type"]);
        round_trip(&txn);
    }

    #[test]
    fn test_every_kind_round_trips() {
        let p = params();
        let txns = vec![
            TransactionBuilder::payment(a(1), a(2), 7, &p)
                .close_remainder_to(a(3))
                .lease([4; 32])
                .rekey_to(a(5))
                .build()
                .unwrap(),
            TransactionBuilder::key_registration_online(a(1), [6; 32], [7; 32], (0, 100), 10, &p)
                .build()
                .unwrap(),
            TransactionBuilder::key_registration_offline(a(1), &p).build().unwrap(),
            TransactionBuilder::key_registration_nonparticipation(a(1), &p)
                .build()
                .unwrap(),
            TransactionBuilder::asset_create(a(1), 1_000_000, 2, &p)
                .unit_name("GLD")
                .asset_name("Gold")
                .asset_url("https://gold.example")
                .manager(a(8))
                .metadata_hash([9; 32])
                .default_frozen(true)
                .build()
                .unwrap(),
            TransactionBuilder::asset_destroy(a(1), 33, &p).build().unwrap(),
            TransactionBuilder::asset_transfer(a(1), a(2), 33, 5, &p)
                .asset_sender(a(10))
                .build()
                .unwrap(),
            TransactionBuilder::asset_opt_in(a(1), 33, &p).build().unwrap(),
            TransactionBuilder::asset_freeze(a(1), 33, a(2), true, &p)
                .build()
                .unwrap(),
            TransactionBuilder::app_call(a(1), 12, OnApplicationComplete::OptIn, &p)
                .app_args(vec![b"arg".to_vec(), vec![]])
                .accounts(vec![a(2)])
                .foreign_apps(vec![44])
                .foreign_assets(vec![55])
                .boxes(vec![BoxReference::new(44, "b1"), BoxReference::new(0, "own")])
                .build()
                .unwrap(),
            TransactionBuilder::app_create(a(1), vec![6, 129, 1], vec![6, 129, 1], &p)
                .state_schemas(
                    StateSchema { num_uints: 1, num_byte_slices: 2 },
                    StateSchema { num_uints: 3, num_byte_slices: 0 },
                )
                .extra_pages(1)
                .build()
                .unwrap(),
            TransactionBuilder::new(
                a(1),
                &p,
                StateProofFields {
                    state_proof_type: 0,
                    state_proof: Value::map([("c", Value::Array(vec![Value::Uint(1), Value::Int(-2)]))]),
                    message: Value::map([("f", Value::Uint(9))]),
                },
            )
            .build()
            .unwrap(),
        ];
        for txn in &txns {
            round_trip(txn);
            let json = encode_json(txn).unwrap();
            let back: Transaction = decode_json(&json).unwrap();
            assert_eq!(&back, txn, "json round trip of {}", txn.tx_type());
        }
    }

    #[test]
    fn test_empty_asset_params_dropped() {
        let txn = TransactionBuilder::asset_destroy(a(1), 33, &params()).build().unwrap();
        let raw = msgpack::decode(&encode_unsigned_transaction(&txn).unwrap()).unwrap();
        assert!(raw.get("apar").is_none());
        assert_eq!(raw.get("caid"), Some(&Value::Uint(33)));
    }

    #[test]
    fn test_self_box_reads_back_as_zero() {
        let txn = TransactionBuilder::app_call(a(1), 12, OnApplicationComplete::NoOp, &params())
            .boxes(vec![BoxReference::new(12, "own")])
            .build()
            .unwrap();
        let back =
            decode_unsigned_transaction(&encode_unsigned_transaction(&txn).unwrap()).unwrap();
        let TransactionKind::ApplicationCall(appl) = back.kind() else {
            panic!("wrong kind");
        };
        assert_eq!(appl.boxes, vec![BoxReference::new(0, "own")]);
    }

    #[test]
    fn test_foreign_kind_field_rejected() {
        let txn = TransactionBuilder::payment(a(1), a(2), 1, &params()).build().unwrap();
        let mut data = txn.to_encoding_data().unwrap();
        if let Value::Map(entries) = &mut data {
            entries.push((Value::from("xaid"), Value::Uint(9)));
        }
        let prepared = transaction_schema().prepare_msgpack(&data).unwrap();
        let bytes = msgpack::encode(&prepared).unwrap();
        let err = decode_unsigned_transaction(&bytes).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)), "{err}");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let txn = TransactionBuilder::payment(a(1), a(2), 1, &params()).build().unwrap();
        let mut raw = msgpack::decode(&encode_unsigned_transaction(&txn).unwrap()).unwrap();
        if let Value::Map(entries) = &mut raw {
            entries.push((Value::from("zzz"), Value::Uint(1)));
        }
        let bytes = msgpack::encode(&raw).unwrap();
        assert!(decode_unsigned_transaction(&bytes).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let raw = Value::map([("type", Value::from("nope")), ("fee", Value::Uint(1))]);
        let bytes = msgpack::encode(&raw).unwrap();
        assert!(decode_unsigned_transaction(&bytes).is_err());
    }

    #[test]
    fn test_group_survives_round_trip() {
        let txn = TransactionBuilder::payment(a(1), a(2), 1, &params())
            .build()
            .unwrap()
            .with_group(Some([8; 32]));
        let back = round_trip(&txn);
        assert_eq!(back.group(), Some(&[8; 32]));
    }

    #[test]
    fn test_zero_participation_keys_never_encode() {
        // Zero keys would be omitted on the wire, so the online
        // registration they belong to is incomplete from the start.
        let zero_keys =
            TransactionBuilder::key_registration_online(a(1), [0; 32], [0; 32], (5, 100), 10, &params())
                .build();
        assert!(matches!(zero_keys, Err(Error::Validation(_))));

        let fields = KeyRegistrationFields {
            vote_key: Some([1; 32]),
            selection_key: Some([2; 32]),
            state_proof_key: Some([0; 64]),
            vote_first: Some(5),
            vote_last: Some(100),
            vote_key_dilution: Some(10),
            non_participation: false,
        };
        let txn = TransactionBuilder::new(a(1), &params(), fields).build().unwrap();
        let back = round_trip(&txn);
        match back.kind() {
            TransactionKind::KeyRegistration(keyreg) => assert!(keyreg.state_proof_key.is_none()),
            other => panic!("unexpected kind: {:?}", other),
        }
    }
}
