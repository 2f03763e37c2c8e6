//! The in-memory msgpack value model.
//!
//! [`Value`] sits between typed records and bytes. Typed records project
//! themselves into a `Value` tree ("encoding data"), schemas validate and
//! normalise that tree, and the canonical writer turns it into bytes. Floats
//! and extension types are absent on purpose: nothing in the wire format
//! uses them, and the strict reader rejects them.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// A msgpack value restricted to the types the ledger's wire format uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    /// Any non-negative integer.
    Uint(u64),
    /// Negative integers only; non-negative values always normalise to `Uint`.
    Int(i64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Key/value pairs. Order is irrelevant in memory; the writer sorts.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Build a map keyed by strings.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::String(k.into()), v))
                .collect(),
        )
    }

    /// Build an integer value, normalising non-negative numbers to `Uint`.
    pub fn int(n: i64) -> Self {
        if n >= 0 {
            Value::Uint(n as u64)
        } else {
            Value::Int(n)
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_u64(&self) -> Result<u64> {
        match self {
            Value::Uint(n) => Ok(*n),
            other => Err(mismatch("uint", other)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(mismatch("string", other)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", other)),
        }
    }

    /// Borrow bytes as a fixed-size array.
    pub fn as_byte_array<const N: usize>(&self) -> Result<[u8; N]> {
        let bytes = self.as_bytes()?;
        bytes.try_into().map_err(|_| {
            Error::Encoding(format!("expected {} bytes, found {}", N, bytes.len()))
        })
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(mismatch("array", other)),
        }
    }

    pub fn as_map(&self) -> Result<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Ok(entries),
            other => Err(mismatch("map", other)),
        }
    }

    /// Look up a string key in a map value. Returns `None` when absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Value::String(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a string key that must be present.
    pub fn field(&self, key: &str) -> Result<&Value> {
        self.get(key)
            .ok_or_else(|| Error::Encoding(format!("missing field '{}'", key)))
    }

    /// Canonical ordering of map keys: numbers numerically, strings and
    /// byte strings bytewise, with a fixed rank between kinds.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(_), Value::Uint(_)) => Ordering::Less,
            (Value::Uint(_), Value::Int(_)) => Ordering::Greater,
            (Value::Uint(a), Value::Uint(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Nil => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Uint(_) => 2,
            Value::String(_) => 3,
            Value::Bytes(_) => 4,
            Value::Array(_) => 5,
            Value::Map(_) => 6,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Array(items) => write!(f, "array[{}]", items.len()),
            Value::Map(entries) => write!(f, "map[{}]", entries.len()),
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

fn mismatch(expected: &str, found: &Value) -> Error {
    Error::Encoding(format!("expected {}, found {}", expected, found.kind()))
}
