//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] enforces a disciplined construction flow:
//! pick a kind (or hand over a filled field struct), layer on header extras
//! such as a note or lease, call `.build()`, and get back a validated,
//! immutable [`Transaction`] with its fee already settled.
//!
//! All validation happens inside `build()`. A builder that was misused (for
//! example `.close_remainder_to()` on an application call) remembers the
//! first mistake and reports it there, so fluent chains never need `?` in
//! the middle.
//!
//! # Fee policy
//!
//! With `flat_fee` unset, `SuggestedParams::fee` is a per-byte rate:
//!
//! ```text
//! fee = max(fee_per_byte * (encoded_len + 75), min_fee)
//! ```
//!
//! where `75` is the size a single-signature envelope adds around the
//! unsigned encoding. With `flat_fee` set the fee is taken verbatim.

use tracing::debug;

use super::boxes::{translate_box_references, BoxReference};
use super::types::{
    ApplicationCallFields, AssetConfigFields, AssetFreezeFields, AssetTransferFields,
    KeyRegistrationFields, OnApplicationComplete, PaymentFields, StateSchema, SuggestedParams,
    TransactionKind, TransactionType,
};
use crate::address::Address;
use crate::config::{
    GROUP_ID_LENGTH, HASH_LENGTH, LEASE_LENGTH, MAX_ASSET_DECIMALS, MAX_ASSET_NAME_LENGTH,
    MAX_ASSET_URL_LENGTH, MAX_EXTRA_PAGES, MAX_NOTE_LENGTH, MAX_SAFE_INTEGER,
    MAX_UNIT_NAME_LENGTH, METADATA_HASH_LENGTH, NUM_ADDL_BYTES_AFTER_SIGNING, PUBLIC_KEY_LENGTH,
};
use crate::encoding::encode_msgpack;
use crate::error::{Error, Result};

/// Bytes a lease adds to the signed encoding: the `lx` key and its value.
const LEASE_OVERHEAD: u64 = 5 + LEASE_LENGTH as u64;

/// Bytes a rekey adds to the signed encoding: the `rekey` key and its value.
const REKEY_OVERHEAD: u64 = 5 + PUBLIC_KEY_LENGTH as u64;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A validated, unsigned transaction.
///
/// The header (sender, fee, validity window, genesis, note, lease, rekey,
/// group) is shared by every kind; the kind-specific half lives in
/// [`TransactionKind`]. Instances only come out of
/// [`TransactionBuilder::build`] or the decoder, which runs the same
/// checks, and are never mutated afterwards: `add_lease`, `add_rekey` and
/// `with_group` return new transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub(super) sender: Address,
    pub(super) fee: u64,
    pub(super) first_valid: u64,
    pub(super) last_valid: u64,
    pub(super) genesis_id: String,
    pub(super) genesis_hash: [u8; HASH_LENGTH],
    pub(super) note: Vec<u8>,
    pub(super) lease: Option<[u8; LEASE_LENGTH]>,
    pub(super) rekey_to: Option<Address>,
    pub(super) group: Option<[u8; GROUP_ID_LENGTH]>,
    pub(super) kind: TransactionKind,
}

impl Transaction {
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// The final fee in microunits.
    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn first_valid(&self) -> u64 {
        self.first_valid
    }

    pub fn last_valid(&self) -> u64 {
        self.last_valid
    }

    pub fn genesis_id(&self) -> &str {
        &self.genesis_id
    }

    pub fn genesis_hash(&self) -> &[u8; HASH_LENGTH] {
        &self.genesis_hash
    }

    pub fn note(&self) -> &[u8] {
        &self.note
    }

    pub fn lease(&self) -> Option<&[u8; LEASE_LENGTH]> {
        self.lease.as_ref()
    }

    pub fn rekey_to(&self) -> Option<Address> {
        self.rekey_to
    }

    pub fn group(&self) -> Option<&[u8; GROUP_ID_LENGTH]> {
        self.group.as_ref()
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn tx_type(&self) -> TransactionType {
        self.kind.tx_type()
    }

    /// Size of the signed envelope this transaction will most likely end up
    /// in: the unsigned encoding plus the single-signature overhead.
    pub fn estimate_size(&self) -> Result<usize> {
        Ok(encode_msgpack(self)?.len() + NUM_ADDL_BYTES_AFTER_SIGNING)
    }

    /// Copy with `lease` set. A non-zero `fee_per_byte` also raises the fee
    /// by what the extra field costs.
    pub fn add_lease(&self, lease: [u8; LEASE_LENGTH], fee_per_byte: u64) -> Result<Transaction> {
        let mut txn = self.clone();
        txn.lease = non_zero_bytes(lease);
        txn.fee = bump_fee(txn.fee, LEASE_OVERHEAD, fee_per_byte)?;
        Ok(txn)
    }

    /// Copy with `rekey_to` set. A non-zero `fee_per_byte` also raises the
    /// fee by what the extra field costs.
    pub fn add_rekey(&self, rekey_to: Address, fee_per_byte: u64) -> Result<Transaction> {
        let mut txn = self.clone();
        txn.rekey_to = Some(non_zero_address("rekey address", rekey_to)?);
        txn.fee = bump_fee(txn.fee, REKEY_OVERHEAD, fee_per_byte)?;
        Ok(txn)
    }

    /// Copy carrying `group` as its group id (`None` clears it).
    pub fn with_group(&self, group: Option<[u8; GROUP_ID_LENGTH]>) -> Transaction {
        let mut txn = self.clone();
        txn.group = group.and_then(non_zero_bytes);
        txn
    }

    /// Check every header and kind-specific bound.
    fn validate(&self) -> Result<()> {
        safe_integer("fee", self.fee)?;
        safe_integer("first valid round", self.first_valid)?;
        safe_integer("last valid round", self.last_valid)?;
        if self.first_valid > self.last_valid {
            return Err(Error::Validation(format!(
                "first valid round {} is after last valid round {}",
                self.first_valid, self.last_valid
            )));
        }
        if self.note.len() > MAX_NOTE_LENGTH {
            return Err(Error::Validation(format!(
                "note is {} bytes, limit is {}",
                self.note.len(),
                MAX_NOTE_LENGTH
            )));
        }
        if let Some(addr) = self.rekey_to {
            non_zero_address("rekey address", addr)?;
        }

        match &self.kind {
            TransactionKind::Payment(pay) => {
                optional_address("close remainder address", pay.close_remainder_to)?;
            }
            TransactionKind::KeyRegistration(keyreg) => validate_keyreg(keyreg)?,
            TransactionKind::AssetConfig(acfg) => validate_asset_config(acfg)?,
            TransactionKind::AssetTransfer(axfer) => {
                optional_address("asset sender", axfer.asset_sender)?;
                optional_address("asset close address", axfer.close_remainder_to)?;
            }
            TransactionKind::AssetFreeze(_) => {}
            TransactionKind::ApplicationCall(appl) => validate_app_call(appl)?,
            TransactionKind::StateProof(stpf) => {
                safe_integer("state proof type", stpf.state_proof_type)?;
            }
        }
        Ok(())
    }
}

fn validate_keyreg(keyreg: &KeyRegistrationFields) -> Result<()> {
    if !keyreg.has_participation_fields() {
        return Ok(());
    }
    if keyreg.non_participation {
        return Err(Error::Validation(
            "non-participating key registration cannot carry participation fields".into(),
        ));
    }
    // The state proof key is optional; the other five travel together.
    let (Some(_), Some(_), Some(first), Some(last), Some(dilution)) = (
        keyreg.vote_key,
        keyreg.selection_key,
        keyreg.vote_first,
        keyreg.vote_last,
        keyreg.vote_key_dilution,
    ) else {
        return Err(Error::Validation(
            "online key registration requires vote key, selection key, vote first, \
             vote last and vote key dilution"
                .into(),
        ));
    };
    safe_integer("vote first round", first)?;
    safe_integer("vote last round", last)?;
    safe_integer("vote key dilution", dilution)?;
    Ok(())
}

fn validate_asset_config(acfg: &AssetConfigFields) -> Result<()> {
    if acfg.decimals > MAX_ASSET_DECIMALS {
        return Err(Error::Validation(format!(
            "asset decimals {} exceed {}",
            acfg.decimals, MAX_ASSET_DECIMALS
        )));
    }
    max_len("unit name", acfg.unit_name.len(), MAX_UNIT_NAME_LENGTH)?;
    max_len("asset name", acfg.asset_name.len(), MAX_ASSET_NAME_LENGTH)?;
    max_len("asset url", acfg.asset_url.len(), MAX_ASSET_URL_LENGTH)?;
    optional_address("manager", acfg.manager)?;
    optional_address("reserve", acfg.reserve)?;
    optional_address("freeze", acfg.freeze)?;
    optional_address("clawback", acfg.clawback)?;
    Ok(())
}

fn validate_app_call(appl: &ApplicationCallFields) -> Result<()> {
    safe_integer("local ints", appl.local_schema.num_uints)?;
    safe_integer("local byte slices", appl.local_schema.num_byte_slices)?;
    safe_integer("global ints", appl.global_schema.num_uints)?;
    safe_integer("global byte slices", appl.global_schema.num_byte_slices)?;
    if appl.extra_pages > MAX_EXTRA_PAGES {
        return Err(Error::Validation(format!(
            "extra pages {} exceed {}",
            appl.extra_pages, MAX_EXTRA_PAGES
        )));
    }
    translate_box_references(&appl.boxes, &appl.foreign_apps, appl.app_index)?;
    Ok(())
}

fn safe_integer(what: &str, value: u64) -> Result<()> {
    if value > MAX_SAFE_INTEGER {
        return Err(Error::Validation(format!(
            "{} {} exceeds 2^53 - 1",
            what, value
        )));
    }
    Ok(())
}

fn max_len(what: &str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(Error::Validation(format!(
            "{} is {} bytes, limit is {}",
            what, len, max
        )));
    }
    Ok(())
}

fn non_zero_address(what: &str, addr: Address) -> Result<Address> {
    if addr.is_zero() {
        return Err(Error::Validation(format!("{} must not be the zero address", what)));
    }
    Ok(addr)
}

fn optional_address(what: &str, addr: Option<Address>) -> Result<()> {
    match addr {
        Some(a) => non_zero_address(what, a).map(|_| ()),
        None => Ok(()),
    }
}

/// All-zero byte fields are indistinguishable from absent on the wire.
fn non_zero_bytes<const N: usize>(bytes: [u8; N]) -> Option<[u8; N]> {
    bytes.iter().any(|b| *b != 0).then_some(bytes)
}

fn bump_fee(fee: u64, extra_bytes: u64, fee_per_byte: u64) -> Result<u64> {
    if fee_per_byte == 0 {
        return Ok(fee);
    }
    let bumped = extra_bytes
        .checked_mul(fee_per_byte)
        .and_then(|extra| fee.checked_add(extra))
        .ok_or_else(|| Error::Validation("fee overflows u64".into()))?;
    safe_integer("fee", bumped)?;
    Ok(bumped)
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Transaction`] instances.
///
/// # Usage
///
/// ```rust,no_run
/// use algotx_protocol::address::Address;
/// use algotx_protocol::transaction::{SuggestedParams, TransactionBuilder};
///
/// # fn demo(from: Address, to: Address, params: SuggestedParams) -> algotx_protocol::error::Result<()> {
/// let txn = TransactionBuilder::payment(from, to, 1_000_000, &params)
///     .note(b"rent".to_vec())
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender: Address,
    params: SuggestedParams,
    note: Vec<u8>,
    lease: Option<[u8; LEASE_LENGTH]>,
    rekey_to: Option<Address>,
    kind: TransactionKind,
    misuse: Option<String>,
}

impl TransactionBuilder {
    /// Start from a filled per-kind field struct.
    pub fn new(sender: Address, params: &SuggestedParams, kind: impl Into<TransactionKind>) -> Self {
        Self {
            sender,
            params: params.clone(),
            note: Vec::new(),
            lease: None,
            rekey_to: None,
            kind: kind.into(),
            misuse: None,
        }
    }

    /// Send `amount` microunits from `sender` to `receiver`.
    pub fn payment(sender: Address, receiver: Address, amount: u64, params: &SuggestedParams) -> Self {
        Self::new(
            sender,
            params,
            PaymentFields {
                receiver,
                amount,
                close_remainder_to: None,
            },
        )
    }

    /// Register participation keys and go online.
    pub fn key_registration_online(
        sender: Address,
        vote_key: [u8; 32],
        selection_key: [u8; 32],
        vote_rounds: (u64, u64),
        vote_key_dilution: u64,
        params: &SuggestedParams,
    ) -> Self {
        Self::new(
            sender,
            params,
            KeyRegistrationFields {
                vote_key: Some(vote_key),
                selection_key: Some(selection_key),
                vote_first: Some(vote_rounds.0),
                vote_last: Some(vote_rounds.1),
                vote_key_dilution: Some(vote_key_dilution),
                ..Default::default()
            },
        )
    }

    /// Go offline.
    pub fn key_registration_offline(sender: Address, params: &SuggestedParams) -> Self {
        Self::new(sender, params, KeyRegistrationFields::default())
    }

    /// Mark the account as permanently non-participating.
    pub fn key_registration_nonparticipation(sender: Address, params: &SuggestedParams) -> Self {
        Self::new(
            sender,
            params,
            KeyRegistrationFields {
                non_participation: true,
                ..Default::default()
            },
        )
    }

    /// Create a new asset with `total` base units and `decimals` places.
    pub fn asset_create(sender: Address, total: u64, decimals: u64, params: &SuggestedParams) -> Self {
        Self::new(
            sender,
            params,
            AssetConfigFields {
                total,
                decimals,
                ..Default::default()
            },
        )
    }

    /// Reconfigure an existing asset. Role addresses left unset are
    /// cleared, so callers must repeat the ones they want to keep.
    pub fn asset_config(sender: Address, asset_index: u64, params: &SuggestedParams) -> Self {
        Self::new(
            sender,
            params,
            AssetConfigFields {
                asset_index,
                ..Default::default()
            },
        )
    }

    /// Destroy an asset: a configuration with every parameter empty.
    pub fn asset_destroy(sender: Address, asset_index: u64, params: &SuggestedParams) -> Self {
        Self::asset_config(sender, asset_index, params)
    }

    /// Move `amount` base units of `asset_index` to `receiver`.
    pub fn asset_transfer(
        sender: Address,
        receiver: Address,
        asset_index: u64,
        amount: u64,
        params: &SuggestedParams,
    ) -> Self {
        Self::new(
            sender,
            params,
            AssetTransferFields {
                asset_index,
                amount,
                receiver,
                ..Default::default()
            },
        )
    }

    /// Opt `sender` into `asset_index`: a zero transfer to itself.
    pub fn asset_opt_in(sender: Address, asset_index: u64, params: &SuggestedParams) -> Self {
        Self::asset_transfer(sender, sender, asset_index, 0, params)
    }

    /// Freeze or unfreeze `account`'s holding of `asset_index`.
    pub fn asset_freeze(
        sender: Address,
        asset_index: u64,
        account: Address,
        frozen: bool,
        params: &SuggestedParams,
    ) -> Self {
        Self::new(
            sender,
            params,
            AssetFreezeFields {
                asset_index,
                freeze_account: account,
                frozen,
            },
        )
    }

    /// Call an existing application.
    pub fn app_call(
        sender: Address,
        app_index: u64,
        on_complete: OnApplicationComplete,
        params: &SuggestedParams,
    ) -> Self {
        Self::new(
            sender,
            params,
            ApplicationCallFields {
                app_index,
                on_complete,
                ..Default::default()
            },
        )
    }

    /// Create an application from compiled programs.
    pub fn app_create(
        sender: Address,
        approval_program: Vec<u8>,
        clear_program: Vec<u8>,
        params: &SuggestedParams,
    ) -> Self {
        Self::new(
            sender,
            params,
            ApplicationCallFields {
                approval_program,
                clear_program,
                ..Default::default()
            },
        )
    }

    // ---- Header ----

    pub fn note(mut self, note: Vec<u8>) -> Self {
        self.note = note;
        self
    }

    pub fn lease(mut self, lease: [u8; LEASE_LENGTH]) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn rekey_to(mut self, addr: Address) -> Self {
        self.rekey_to = Some(addr);
        self
    }

    // ---- Kind-specific ----

    /// Close the sender's balance (`pay`) or holding (`axfer`) into `addr`.
    pub fn close_remainder_to(mut self, addr: Address) -> Self {
        match &mut self.kind {
            TransactionKind::Payment(pay) => pay.close_remainder_to = Some(addr),
            TransactionKind::AssetTransfer(axfer) => axfer.close_remainder_to = Some(addr),
            _ => self.reject("close_remainder_to"),
        }
        self
    }

    /// Claw back from `addr` instead of transferring from the sender.
    pub fn asset_sender(self, addr: Address) -> Self {
        self.edit_axfer("asset_sender", |axfer| axfer.asset_sender = Some(addr))
    }

    pub fn unit_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.edit_acfg("unit_name", |acfg| acfg.unit_name = name)
    }

    pub fn asset_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.edit_acfg("asset_name", |acfg| acfg.asset_name = name)
    }

    pub fn asset_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.edit_acfg("asset_url", |acfg| acfg.asset_url = url)
    }

    pub fn metadata_hash(self, hash: [u8; METADATA_HASH_LENGTH]) -> Self {
        self.edit_acfg("metadata_hash", |acfg| acfg.metadata_hash = Some(hash))
    }

    pub fn default_frozen(self, frozen: bool) -> Self {
        self.edit_acfg("default_frozen", |acfg| acfg.default_frozen = frozen)
    }

    pub fn manager(self, addr: Address) -> Self {
        self.edit_acfg("manager", |acfg| acfg.manager = Some(addr))
    }

    pub fn reserve(self, addr: Address) -> Self {
        self.edit_acfg("reserve", |acfg| acfg.reserve = Some(addr))
    }

    pub fn freeze(self, addr: Address) -> Self {
        self.edit_acfg("freeze", |acfg| acfg.freeze = Some(addr))
    }

    pub fn clawback(self, addr: Address) -> Self {
        self.edit_acfg("clawback", |acfg| acfg.clawback = Some(addr))
    }

    pub fn app_args(self, args: Vec<Vec<u8>>) -> Self {
        self.edit_appl("app_args", |appl| appl.app_args = args)
    }

    pub fn accounts(self, accounts: Vec<Address>) -> Self {
        self.edit_appl("accounts", |appl| appl.accounts = accounts)
    }

    pub fn foreign_apps(self, apps: Vec<u64>) -> Self {
        self.edit_appl("foreign_apps", |appl| appl.foreign_apps = apps)
    }

    pub fn foreign_assets(self, assets: Vec<u64>) -> Self {
        self.edit_appl("foreign_assets", |appl| appl.foreign_assets = assets)
    }

    pub fn boxes(self, boxes: Vec<BoxReference>) -> Self {
        self.edit_appl("boxes", |appl| appl.boxes = boxes)
    }

    pub fn state_schemas(self, local: StateSchema, global: StateSchema) -> Self {
        self.edit_appl("state_schemas", |appl| {
            appl.local_schema = local;
            appl.global_schema = global;
        })
    }

    pub fn extra_pages(self, pages: u64) -> Self {
        self.edit_appl("extra_pages", |appl| appl.extra_pages = pages)
    }

    fn edit_axfer(mut self, setter: &str, f: impl FnOnce(&mut AssetTransferFields)) -> Self {
        if let TransactionKind::AssetTransfer(axfer) = &mut self.kind {
            f(axfer);
        } else {
            self.reject(setter);
        }
        self
    }

    fn edit_acfg(mut self, setter: &str, f: impl FnOnce(&mut AssetConfigFields)) -> Self {
        if let TransactionKind::AssetConfig(acfg) = &mut self.kind {
            f(acfg);
        } else {
            self.reject(setter);
        }
        self
    }

    fn edit_appl(mut self, setter: &str, f: impl FnOnce(&mut ApplicationCallFields)) -> Self {
        if let TransactionKind::ApplicationCall(appl) = &mut self.kind {
            f(appl);
        } else {
            self.reject(setter);
        }
        self
    }

    /// Remember the first setter that does not apply to this kind.
    fn reject(&mut self, setter: &str) {
        if self.misuse.is_none() {
            self.misuse = Some(format!(
                "{} does not apply to {} transactions",
                setter,
                self.kind.tx_type()
            ));
        }
    }

    /// Validate and settle the fee.
    pub fn build(self) -> Result<Transaction> {
        if let Some(misuse) = self.misuse {
            return Err(Error::Validation(misuse));
        }

        let mut kind = self.kind;
        // All-zero byte fields are absent on the wire; normalise them here so
        // validation sees what a decoder will see.
        match &mut kind {
            TransactionKind::AssetConfig(acfg) => {
                acfg.metadata_hash = acfg.metadata_hash.and_then(non_zero_bytes);
            }
            TransactionKind::KeyRegistration(keyreg) => {
                keyreg.vote_key = keyreg.vote_key.and_then(non_zero_bytes);
                keyreg.selection_key = keyreg.selection_key.and_then(non_zero_bytes);
                keyreg.state_proof_key = keyreg.state_proof_key.and_then(non_zero_bytes);
            }
            _ => {}
        }

        let mut txn = Transaction {
            sender: self.sender,
            fee: self.params.fee,
            first_valid: self.params.first_valid,
            last_valid: self.params.last_valid,
            genesis_id: self.params.genesis_id,
            genesis_hash: self.params.genesis_hash,
            note: self.note,
            lease: self.lease.and_then(non_zero_bytes),
            rekey_to: self.rekey_to,
            group: None,
            kind,
        };
        txn.validate()?;

        if !self.params.flat_fee {
            // The size is measured with the per-byte rate in the fee slot,
            // exactly as the final encoding would carry a fee of that width.
            let size = txn.estimate_size()? as u64;
            let fee = self
                .params
                .fee
                .checked_mul(size)
                .ok_or_else(|| Error::Validation("fee overflows u64".into()))?;
            txn.fee = fee.max(self.params.min_fee);
            safe_integer("fee", txn.fee)?;
        }

        debug!(
            tx_type = %txn.tx_type(),
            sender = %txn.sender,
            fee = txn.fee,
            "built transaction"
        );
        Ok(txn)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
