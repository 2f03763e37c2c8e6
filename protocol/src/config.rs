//! # Protocol Constants
//!
//! Every fixed length, limit and domain-separation tag the client library
//! relies on lives here. These are not tunables: the consensus node checks
//! the same numbers, and a transaction built against different values is
//! simply rejected at submission time.

// ---------------------------------------------------------------------------
// Key & Hash Lengths
// ---------------------------------------------------------------------------

/// Length of an Ed25519 public key, which is also the raw address length.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of an Ed25519 secret key in its expanded `seed ++ public key` form.
pub const SECRET_KEY_LENGTH: usize = 64;

/// Length of an Ed25519 seed.
pub const SEED_LENGTH: usize = 32;

/// Length of an Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Length of a SHA-512/256 digest.
pub const HASH_LENGTH: usize = 32;

/// Number of trailing digest bytes appended to an address as its checksum.
pub const CHECKSUM_LENGTH: usize = 4;

/// Length of the base32 text form of an address (36 bytes, padding stripped).
pub const ADDRESS_TEXT_LENGTH: usize = 58;

/// Length of the base32 text form of a transaction ID (32 bytes, padding stripped).
pub const TRANSACTION_ID_LENGTH: usize = 52;

// ---------------------------------------------------------------------------
// Transaction Field Lengths
// ---------------------------------------------------------------------------

/// Transaction lease length.
pub const LEASE_LENGTH: usize = 32;

/// Group ID length.
pub const GROUP_ID_LENGTH: usize = 32;

/// Participation vote key length.
pub const VOTE_KEY_LENGTH: usize = 32;

/// VRF selection key length.
pub const SELECTION_KEY_LENGTH: usize = 32;

/// State-proof key length. Twice the others: it is a Falcon commitment root
/// plus lifetime material, not an Ed25519 key.
pub const STATE_PROOF_KEY_LENGTH: usize = 64;

/// Asset metadata hash length.
pub const METADATA_HASH_LENGTH: usize = 32;

/// Bytes a signature envelope adds on top of the unsigned transaction
/// encoding. Used by the fee estimator.
pub const NUM_ADDL_BYTES_AFTER_SIGNING: usize = 75;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Largest integer that survives a round trip through an IEEE-754 double.
/// Counts, rounds and fees are capped here so that JSON consumers never
/// lose precision.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Maximum number of transactions in an atomic group.
pub const MAX_GROUP_SIZE: usize = 16;

/// Maximum note field size in bytes.
pub const MAX_NOTE_LENGTH: usize = 1024;

/// Maximum number of decimals an asset may declare.
pub const MAX_ASSET_DECIMALS: u64 = 19;

/// Maximum asset unit name length in bytes.
pub const MAX_UNIT_NAME_LENGTH: usize = 8;

/// Maximum asset name length in bytes.
pub const MAX_ASSET_NAME_LENGTH: usize = 32;

/// Maximum asset URL length in bytes.
pub const MAX_ASSET_URL_LENGTH: usize = 96;

/// Maximum extra program pages an application may request.
pub const MAX_EXTRA_PAGES: u64 = 3;

/// Maximum combined size of a logic-signature program and its arguments.
pub const MAX_LOGIC_SIG_LENGTH: usize = 1000;

/// Highest multisig version understood by this library.
pub const MULTISIG_VERSION: u8 = 1;

/// Maximum number of ABI method arguments before the tail is packed into a
/// tuple. Informational for callers composing app calls.
pub const MAX_ABI_ARGS: usize = 15;

/// Nesting limit for the strict msgpack reader.
pub const MAX_DECODE_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Domain-Separation Tags
// ---------------------------------------------------------------------------

/// Prefix hashed or signed ahead of a transaction encoding.
pub const TX_TAG: &[u8] = b"TX";

/// Prefix for group ID computation.
pub const TX_GROUP_TAG: &[u8] = b"TG";

/// Prefix for multisig address preimages.
pub const MULTISIG_ADDR_TAG: &[u8] = b"MultisigAddr";

/// Prefix for logic-signature programs.
pub const PROGRAM_TAG: &[u8] = b"Program";

/// Prefix for data signed for consumption by a program (`ed25519verify`).
pub const PROGRAM_DATA_TAG: &[u8] = b"ProgData";

/// Prefix for application escrow addresses.
pub const APP_ID_TAG: &[u8] = b"appID";

/// Prefix for arbitrary bytes signed outside a transaction.
pub const BYTES_TAG: &[u8] = b"MX";
