//! Core type definitions for transactions.
//!
//! These types form the vocabulary of every transaction the library can
//! build: the kind discriminant, the application completion action, the
//! suggested network parameters and one plain field struct per kind. The
//! field structs are deliberately dumb (public fields, `Default`) so callers
//! can fill them with struct-update syntax; all checking happens when the
//! [`TransactionBuilder`](super::TransactionBuilder) turns them into a
//! [`Transaction`](super::Transaction).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::boxes::BoxReference;
use crate::address::Address;
use crate::config::{
    HASH_LENGTH, METADATA_HASH_LENGTH, SELECTION_KEY_LENGTH, STATE_PROOF_KEY_LENGTH,
    VOTE_KEY_LENGTH,
};
use crate::encoding::Value;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// The wire form is the short string in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Move the native currency between two accounts.
    #[serde(rename = "pay")]
    Payment,
    /// Register (or deregister) participation keys.
    #[serde(rename = "keyreg")]
    KeyRegistration,
    /// Create, reconfigure or destroy an asset.
    #[serde(rename = "acfg")]
    AssetConfig,
    /// Move, opt into, close out of or claw back an asset.
    #[serde(rename = "axfer")]
    AssetTransfer,
    /// Freeze or unfreeze an account's holding of an asset.
    #[serde(rename = "afrz")]
    AssetFreeze,
    /// Create, call, update or delete an application.
    #[serde(rename = "appl")]
    ApplicationCall,
    /// Record a state proof. Only ever issued by the network itself.
    #[serde(rename = "stpf")]
    StateProof,
}

impl TransactionType {
    pub const ALL: [TransactionType; 7] = [
        Self::Payment,
        Self::KeyRegistration,
        Self::AssetConfig,
        Self::AssetTransfer,
        Self::AssetFreeze,
        Self::ApplicationCall,
        Self::StateProof,
    ];

    /// The wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "pay",
            Self::KeyRegistration => "keyreg",
            Self::AssetConfig => "acfg",
            Self::AssetTransfer => "axfer",
            Self::AssetFreeze => "afrz",
            Self::ApplicationCall => "appl",
            Self::StateProof => "stpf",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Encoding(format!("unrecognized transaction type '{}'", s)))
    }
}

// ---------------------------------------------------------------------------
// OnApplicationComplete
// ---------------------------------------------------------------------------

/// What happens to the caller's application state after an app call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum OnApplicationComplete {
    #[default]
    NoOp = 0,
    OptIn = 1,
    CloseOut = 2,
    ClearState = 3,
    UpdateApplication = 4,
    DeleteApplication = 5,
}

impl OnApplicationComplete {
    pub fn as_u64(self) -> u64 {
        self as u64
    }
}

impl TryFrom<u64> for OnApplicationComplete {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        Ok(match value {
            0 => Self::NoOp,
            1 => Self::OptIn,
            2 => Self::CloseOut,
            3 => Self::ClearState,
            4 => Self::UpdateApplication,
            5 => Self::DeleteApplication,
            other => {
                return Err(Error::Validation(format!(
                    "on-completion value {} is out of range",
                    other
                )))
            }
        })
    }
}

// ---------------------------------------------------------------------------
// SuggestedParams
// ---------------------------------------------------------------------------

/// Network parameters flattened into a transaction header at construction.
///
/// When `flat_fee` is false, `fee` is a per-byte rate and the final fee is
/// derived from the encoded size (floored at `min_fee`). When it is true,
/// `fee` is used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedParams {
    #[serde(default)]
    pub flat_fee: bool,
    pub fee: u64,
    #[serde(default)]
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    #[serde(rename = "genesisID", default)]
    pub genesis_id: String,
    #[serde(with = "base64_hash")]
    pub genesis_hash: [u8; HASH_LENGTH],
}

mod base64_hash {
    use super::*;

    pub fn serialize<S: Serializer>(
        hash: &[u8; HASH_LENGTH],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<[u8; HASH_LENGTH], D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(text).map_err(serde::de::Error::custom)?;
        bytes.try_into().map_err(|b: Vec<u8>| {
            serde::de::Error::custom(format!(
                "genesis hash must be {} bytes, got {}",
                HASH_LENGTH,
                b.len()
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// Per-kind fields
// ---------------------------------------------------------------------------

/// `pay`: move `amount` microunits to `receiver`, optionally closing the
/// sender's account into `close_remainder_to`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentFields {
    pub receiver: Address,
    pub amount: u64,
    pub close_remainder_to: Option<Address>,
}

/// `keyreg`: all participation fields set means "go online"; none set means
/// "go offline"; `non_participation` marks the account as permanently
/// non-participating.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyRegistrationFields {
    pub vote_key: Option<[u8; VOTE_KEY_LENGTH]>,
    pub selection_key: Option<[u8; SELECTION_KEY_LENGTH]>,
    pub state_proof_key: Option<[u8; STATE_PROOF_KEY_LENGTH]>,
    pub vote_first: Option<u64>,
    pub vote_last: Option<u64>,
    pub vote_key_dilution: Option<u64>,
    pub non_participation: bool,
}

impl KeyRegistrationFields {
    /// True when any participation field is supplied.
    pub fn has_participation_fields(&self) -> bool {
        self.vote_key.is_some()
            || self.selection_key.is_some()
            || self.state_proof_key.is_some()
            || self.vote_first.is_some()
            || self.vote_last.is_some()
            || self.vote_key_dilution.is_some()
    }
}

/// `acfg`: `asset_index == 0` creates an asset from the parameters; a
/// non-zero index with all parameters empty destroys it; anything else
/// reconfigures it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetConfigFields {
    pub asset_index: u64,
    pub total: u64,
    pub decimals: u64,
    pub default_frozen: bool,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
    pub unit_name: String,
    pub asset_name: String,
    pub asset_url: String,
    pub metadata_hash: Option<[u8; METADATA_HASH_LENGTH]>,
}

/// `axfer`: a zero-amount transfer to oneself is an opt-in; setting
/// `asset_sender` makes it a clawback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetTransferFields {
    pub asset_index: u64,
    pub amount: u64,
    pub receiver: Address,
    pub asset_sender: Option<Address>,
    pub close_remainder_to: Option<Address>,
}

/// `afrz`: set the frozen flag of `freeze_account`'s holding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetFreezeFields {
    pub asset_index: u64,
    pub freeze_account: Address,
    pub frozen: bool,
}

/// Storage quota of an application, in key/value slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

/// `appl`: `app_index == 0` creates a new application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationCallFields {
    pub app_index: u64,
    pub on_complete: OnApplicationComplete,
    pub local_schema: StateSchema,
    pub global_schema: StateSchema,
    pub extra_pages: u64,
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub app_args: Vec<Vec<u8>>,
    pub accounts: Vec<Address>,
    pub foreign_apps: Vec<u64>,
    pub foreign_assets: Vec<u64>,
    pub boxes: Vec<BoxReference>,
}

/// `stpf`: the proof and message are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateProofFields {
    pub state_proof_type: u64,
    pub state_proof: Value,
    pub message: Value,
}

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

/// The kind-specific half of a transaction. Exactly one set of fields is
/// ever meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Payment(PaymentFields),
    KeyRegistration(KeyRegistrationFields),
    AssetConfig(AssetConfigFields),
    AssetTransfer(AssetTransferFields),
    AssetFreeze(AssetFreezeFields),
    ApplicationCall(ApplicationCallFields),
    StateProof(StateProofFields),
}

impl TransactionKind {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            Self::Payment(_) => TransactionType::Payment,
            Self::KeyRegistration(_) => TransactionType::KeyRegistration,
            Self::AssetConfig(_) => TransactionType::AssetConfig,
            Self::AssetTransfer(_) => TransactionType::AssetTransfer,
            Self::AssetFreeze(_) => TransactionType::AssetFreeze,
            Self::ApplicationCall(_) => TransactionType::ApplicationCall,
            Self::StateProof(_) => TransactionType::StateProof,
        }
    }
}

macro_rules! impl_from_fields {
    ($($fields:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$fields> for TransactionKind {
                fn from(fields: $fields) -> Self {
                    TransactionKind::$variant(fields)
                }
            }
        )*
    };
}

impl_from_fields! {
    PaymentFields => Payment,
    KeyRegistrationFields => KeyRegistration,
    AssetConfigFields => AssetConfig,
    AssetTransferFields => AssetTransfer,
    AssetFreezeFields => AssetFreeze,
    ApplicationCallFields => ApplicationCall,
    StateProofFields => StateProof,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
