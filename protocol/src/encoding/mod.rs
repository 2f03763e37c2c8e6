//! # Canonical Encoding
//!
//! The wire format is msgpack with three extra rules (sorted keys, minimal
//! integer widths, default fields omitted) plus a JSON rendering for humans
//! and REST payloads. Both forms are driven by the same schema objects.
//!
//! ```text
//! value.rs   - Value, the in-memory msgpack model
//! msgpack.rs - canonical writer and strict reader
//! schema.rs  - Schema trait and the scalar/composite schemas
//! map.rs     - NamedMapSchema and Uint64MapSchema
//! ```
//!
//! Typed records implement [`Encodable`] and get `encode_msgpack` /
//! `decode_msgpack` / `encode_json` / `decode_json` for free. Schemas are
//! process-wide statics built once on first use and never mutated.

pub mod map;
pub mod msgpack;
pub mod schema;
pub mod value;

pub use map::{NamedMapEntry, NamedMapSchema, Uint64MapSchema};
pub use schema::{
    AddressSchema, ArraySchema, BooleanSchema, ByteArraySchema, FixedLengthByteArraySchema,
    OptionalSchema, Schema, StringSchema, Uint64Schema, UntypedSchema,
};
pub use value::Value;

use crate::error::{Error, Result};

/// A typed record with a canonical wire form.
pub trait Encodable: Sized {
    /// The schema governing this record's encoding data.
    fn encoding_schema() -> &'static dyn Schema;

    /// Project into encoding data: every field present, defaults included.
    fn to_encoding_data(&self) -> Result<Value>;

    /// Rebuild from complete encoding data (as produced by the schema).
    fn from_encoding_data(data: &Value) -> Result<Self>;
}

/// Encode a record into canonical msgpack bytes.
pub fn encode_msgpack<T: Encodable>(record: &T) -> Result<Vec<u8>> {
    let data = record.to_encoding_data()?;
    let prepared = T::encoding_schema().prepare_msgpack(&data)?;
    msgpack::encode(&prepared)
}

/// Decode a record from canonical msgpack bytes.
pub fn decode_msgpack<T: Encodable>(bytes: &[u8]) -> Result<T> {
    let raw = msgpack::decode(bytes)?;
    let data = T::encoding_schema().from_prepared_msgpack(&raw)?;
    T::from_encoding_data(&data)
}

/// Render a record as a JSON value.
pub fn encode_json_value<T: Encodable>(record: &T) -> Result<serde_json::Value> {
    let data = record.to_encoding_data()?;
    T::encoding_schema().prepare_json(&data)
}

/// Render a record as JSON text with sorted keys.
pub fn encode_json<T: Encodable>(record: &T) -> Result<String> {
    serde_json::to_string(&encode_json_value(record)?)
        .map_err(|e| Error::Encoding(format!("json write failed: {}", e)))
}

/// Parse a record from JSON text.
pub fn decode_json<T: Encodable>(text: &str) -> Result<T> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::Encoding(format!("invalid json: {}", e)))?;
    let data = T::encoding_schema().from_prepared_json(&json)?;
    T::from_encoding_data(&data)
}
