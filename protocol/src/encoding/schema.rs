//! Schema primitives.
//!
//! A schema knows the default value of the thing it governs and how to move
//! it between three representations:
//!
//! ```text
//!   encoding data (Value) --prepare_msgpack--> msgpack-ready Value --> bytes
//!   encoding data (Value) <--from_prepared_msgpack-- decoded Value <-- bytes
//!   encoding data (Value) --prepare_json--> serde_json::Value
//!   encoding data (Value) <--from_prepared_json-- serde_json::Value
//! ```
//!
//! Schemas never coerce. A value of the wrong shape is an
//! [`Error::Encoding`], reported immediately. Composite schemas own their
//! children and delegate recursively.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::str::FromStr;

use super::value::Value;
use crate::address::Address;
use crate::error::{Error, Result};

/// The encode/decode contract shared by every schema.
pub trait Schema: Send + Sync + fmt::Debug {
    /// The value a field takes when it is absent from the wire.
    fn default_value(&self) -> Value;

    /// Whether `data` equals the default (and may therefore be omitted).
    fn is_default_value(&self, data: &Value) -> bool;

    /// Validate encoding data and project it into its msgpack-ready form.
    fn prepare_msgpack(&self, data: &Value) -> Result<Value>;

    /// Validate a decoded msgpack value and restore it to encoding data.
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value>;

    /// Project encoding data into its JSON form.
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value>;

    /// Restore encoding data from its JSON form.
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value>;
}

impl<S: Schema + ?Sized> Schema for &'static S {
    fn default_value(&self) -> Value {
        (**self).default_value()
    }
    fn is_default_value(&self, data: &Value) -> bool {
        (**self).is_default_value(data)
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        (**self).prepare_msgpack(data)
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        (**self).from_prepared_msgpack(encoded)
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        (**self).prepare_json(data)
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        (**self).from_prepared_json(encoded)
    }
}

fn json_mismatch(expected: &str, found: &serde_json::Value) -> Error {
    Error::Encoding(format!("expected JSON {}, found {}", expected, found))
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Unsigned 64-bit integer. Default `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uint64Schema;

impl Schema for Uint64Schema {
    fn default_value(&self) -> Value {
        Value::Uint(0)
    }
    fn is_default_value(&self, data: &Value) -> bool {
        matches!(data, Value::Uint(0))
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        Ok(Value::Uint(data.as_u64()?))
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        Ok(Value::Uint(encoded.as_u64()?))
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        Ok(serde_json::Value::from(data.as_u64()?))
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        encoded
            .as_u64()
            .map(Value::Uint)
            .ok_or_else(|| json_mismatch("unsigned integer", encoded))
    }
}

/// Boolean. Default `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanSchema;

impl Schema for BooleanSchema {
    fn default_value(&self) -> Value {
        Value::Bool(false)
    }
    fn is_default_value(&self, data: &Value) -> bool {
        matches!(data, Value::Bool(false))
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        Ok(Value::Bool(data.as_bool()?))
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        Ok(Value::Bool(encoded.as_bool()?))
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Bool(data.as_bool()?))
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        encoded
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| json_mismatch("boolean", encoded))
    }
}

/// UTF-8 string. Default `""`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSchema;

impl Schema for StringSchema {
    fn default_value(&self) -> Value {
        Value::String(String::new())
    }
    fn is_default_value(&self, data: &Value) -> bool {
        matches!(data, Value::String(s) if s.is_empty())
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        Ok(Value::String(data.as_str()?.to_string()))
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        Ok(Value::String(encoded.as_str()?.to_string()))
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        Ok(serde_json::Value::String(data.as_str()?.to_string()))
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        encoded
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| json_mismatch("string", encoded))
    }
}

/// Variable-length byte string. Default empty. JSON form is base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteArraySchema;

impl Schema for ByteArraySchema {
    fn default_value(&self) -> Value {
        Value::Bytes(Vec::new())
    }
    fn is_default_value(&self, data: &Value) -> bool {
        matches!(data, Value::Bytes(b) if b.is_empty())
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        Ok(Value::Bytes(data.as_bytes()?.to_vec()))
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        Ok(Value::Bytes(encoded.as_bytes()?.to_vec()))
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        Ok(serde_json::Value::String(STANDARD.encode(data.as_bytes()?)))
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        Ok(Value::Bytes(base64_from_json(encoded)?))
    }
}

fn base64_from_json(encoded: &serde_json::Value) -> Result<Vec<u8>> {
    let text = encoded
        .as_str()
        .ok_or_else(|| json_mismatch("base64 string", encoded))?;
    STANDARD
        .decode(text)
        .map_err(|e| Error::Encoding(format!("invalid base64: {}", e)))
}

/// Byte string of exactly `length` bytes. Default all zeros.
#[derive(Debug, Clone, Copy)]
pub struct FixedLengthByteArraySchema {
    length: usize,
}

impl FixedLengthByteArraySchema {
    pub const fn new(length: usize) -> Self {
        Self { length }
    }

    fn check(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        if bytes.len() != self.length {
            return Err(Error::Encoding(format!(
                "expected {} bytes, found {}",
                self.length,
                bytes.len()
            )));
        }
        Ok(bytes.to_vec())
    }
}

impl Schema for FixedLengthByteArraySchema {
    fn default_value(&self) -> Value {
        Value::Bytes(vec![0u8; self.length])
    }
    fn is_default_value(&self, data: &Value) -> bool {
        matches!(data, Value::Bytes(b) if b.len() == self.length && b.iter().all(|x| *x == 0))
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        Ok(Value::Bytes(self.check(data.as_bytes()?)?))
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        Ok(Value::Bytes(self.check(encoded.as_bytes()?)?))
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        let bytes = self.check(data.as_bytes()?)?;
        Ok(serde_json::Value::String(STANDARD.encode(bytes)))
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        Ok(Value::Bytes(self.check(&base64_from_json(encoded)?)?))
    }
}

/// A 32-byte public key carried as raw bytes on the wire and as the
/// 58-character address string in JSON. Default is the zero address.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressSchema;

impl Schema for AddressSchema {
    fn default_value(&self) -> Value {
        Value::Bytes(vec![0u8; 32])
    }
    fn is_default_value(&self, data: &Value) -> bool {
        matches!(data, Value::Bytes(b) if b.len() == 32 && b.iter().all(|x| *x == 0))
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        Ok(Value::Bytes(data.as_byte_array::<32>()?.to_vec()))
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        Ok(Value::Bytes(encoded.as_byte_array::<32>()?.to_vec()))
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        let addr = Address::new(data.as_byte_array::<32>()?);
        Ok(serde_json::Value::String(addr.to_string()))
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        let text = encoded
            .as_str()
            .ok_or_else(|| json_mismatch("address string", encoded))?;
        let addr = Address::from_str(text)?;
        Ok(Value::Bytes(addr.public_key().to_vec()))
    }
}

// ---------------------------------------------------------------------------
// Composites
// ---------------------------------------------------------------------------

/// Either nil or a value governed by the inner schema. Default nil.
#[derive(Debug)]
pub struct OptionalSchema {
    inner: Box<dyn Schema>,
}

impl OptionalSchema {
    pub fn new(inner: impl Schema + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl Schema for OptionalSchema {
    fn default_value(&self) -> Value {
        Value::Nil
    }
    fn is_default_value(&self, data: &Value) -> bool {
        data.is_nil()
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        match data {
            Value::Nil => Ok(Value::Nil),
            other => self.inner.prepare_msgpack(other),
        }
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        match encoded {
            Value::Nil => Ok(Value::Nil),
            other => self.inner.from_prepared_msgpack(other),
        }
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        match data {
            Value::Nil => Ok(serde_json::Value::Null),
            other => self.inner.prepare_json(other),
        }
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        match encoded {
            serde_json::Value::Null => Ok(Value::Nil),
            other => self.inner.from_prepared_json(other),
        }
    }
}

/// Homogeneous array. Default empty.
#[derive(Debug)]
pub struct ArraySchema {
    item: Box<dyn Schema>,
}

impl ArraySchema {
    pub fn new(item: impl Schema + 'static) -> Self {
        Self {
            item: Box::new(item),
        }
    }
}

impl Schema for ArraySchema {
    fn default_value(&self) -> Value {
        Value::Array(Vec::new())
    }
    fn is_default_value(&self, data: &Value) -> bool {
        matches!(data, Value::Array(items) if items.is_empty())
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        data.as_array()?
            .iter()
            .map(|item| self.item.prepare_msgpack(item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        encoded
            .as_array()?
            .iter()
            .map(|item| self.item.from_prepared_msgpack(item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        data.as_array()?
            .iter()
            .map(|item| self.item.prepare_json(item))
            .collect::<Result<Vec<_>>>()
            .map(serde_json::Value::Array)
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        encoded
            .as_array()
            .ok_or_else(|| json_mismatch("array", encoded))?
            .iter()
            .map(|item| self.item.from_prepared_json(item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
}

/// Arbitrary structure carried verbatim, for fields whose layout this
/// library does not model (state proofs). Default nil.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntypedSchema;

impl Schema for UntypedSchema {
    fn default_value(&self) -> Value {
        Value::Nil
    }
    fn is_default_value(&self, data: &Value) -> bool {
        match data {
            Value::Nil => true,
            Value::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }
    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        Ok(data.clone())
    }
    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        Ok(encoded.clone())
    }
    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        Ok(value_to_json(data))
    }
    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        json_to_value(encoded)
    }
}

/// Render an untyped value as JSON. Byte strings become base64 text and
/// map keys are rendered with `Display` when they are not strings.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Uint(n) => serde_json::Value::from(*n),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::String(STANDARD.encode(b)),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key, value_to_json(v))
                })
                .collect(),
        ),
    }
}

/// Parse JSON into an untyped value. Floats have no wire representation and
/// are rejected.
pub fn json_to_value(json: &serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::Uint(u)
            } else if let Some(i) = n.as_i64() {
                Value::int(i)
            } else {
                return Err(Error::Encoding(format!("non-integer number {}", n)));
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(
            items
                .iter()
                .map(json_to_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| Ok((Value::String(k.clone()), json_to_value(v)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
    })
}
