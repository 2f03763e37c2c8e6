//! Map schemas: records keyed by short field names, and maps keyed by
//! integers.
//!
//! [`NamedMapSchema`] is where canonical form is enforced for records. On
//! the way out it drops every `omit_empty` field whose value is the field's
//! default. On the way in it rejects unknown keys, rejects omit-empty fields
//! that are present but hold their default (a canonical encoder would never
//! have written them) and fills absent fields with their defaults, so the
//! typed layer always sees a complete record.

use super::schema::Schema;
use super::value::Value;
use crate::error::{Error, Result};

/// One field of a [`NamedMapSchema`].
#[derive(Debug)]
pub struct NamedMapEntry {
    pub key: &'static str,
    pub schema: Box<dyn Schema>,
    pub omit_empty: bool,
}

impl NamedMapEntry {
    /// A field left off the wire whenever it holds its default value.
    pub fn omit_empty(key: &'static str, schema: impl Schema + 'static) -> Self {
        Self {
            key,
            schema: Box::new(schema),
            omit_empty: true,
        }
    }

    /// A field that is always written and must always be present.
    pub fn required(key: &'static str, schema: impl Schema + 'static) -> Self {
        Self {
            key,
            schema: Box::new(schema),
            omit_empty: false,
        }
    }
}

/// A record with a fixed set of string keys.
#[derive(Debug)]
pub struct NamedMapSchema {
    entries: Vec<NamedMapEntry>,
}

impl NamedMapSchema {
    pub fn new(entries: Vec<NamedMapEntry>) -> Self {
        Self { entries }
    }

    /// Concatenate several entry lists into one schema. Keys must be unique.
    pub fn combine(parts: Vec<Vec<NamedMapEntry>>) -> Self {
        let entries: Vec<NamedMapEntry> = parts.into_iter().flatten().collect();
        debug_assert!(
            {
                let mut keys: Vec<&str> = entries.iter().map(|e| e.key).collect();
                keys.sort_unstable();
                keys.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate key in combined schema"
        );
        Self { entries }
    }

    pub fn entries(&self) -> &[NamedMapEntry] {
        &self.entries
    }

    fn entry(&self, key: &str) -> Option<&NamedMapEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Reject keys in `data` that this schema does not declare.
    fn check_known_keys(&self, data: &[(Value, Value)]) -> Result<()> {
        for (k, _) in data {
            let key = k.as_str()?;
            if self.entry(key).is_none() {
                return Err(Error::Encoding(format!("unknown field '{}'", key)));
            }
        }
        Ok(())
    }
}

impl Schema for NamedMapSchema {
    fn default_value(&self) -> Value {
        Value::map(self.entries.iter().map(|e| (e.key, e.schema.default_value())))
    }

    fn is_default_value(&self, data: &Value) -> bool {
        let Value::Map(_) = data else {
            return false;
        };
        self.entries.iter().all(|e| match data.get(e.key) {
            Some(v) => e.schema.is_default_value(v),
            None => true,
        })
    }

    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        self.check_known_keys(data.as_map()?)?;
        let mut out = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            let default = e.schema.default_value();
            let v = data.get(e.key).unwrap_or(&default);
            if e.omit_empty && e.schema.is_default_value(v) {
                continue;
            }
            let prepared = e
                .schema
                .prepare_msgpack(v)
                .map_err(|err| nest(e.key, err))?;
            out.push((Value::from(e.key), prepared));
        }
        Ok(Value::Map(out))
    }

    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        self.check_known_keys(encoded.as_map()?)?;
        let mut out = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            let restored = match encoded.get(e.key) {
                Some(v) => {
                    let restored = e
                        .schema
                        .from_prepared_msgpack(v)
                        .map_err(|err| nest(e.key, err))?;
                    if e.omit_empty && e.schema.is_default_value(&restored) {
                        return Err(Error::Encoding(format!(
                            "field '{}' holds its default value and must be omitted",
                            e.key
                        )));
                    }
                    restored
                }
                None if e.omit_empty => e.schema.default_value(),
                None => {
                    return Err(Error::Encoding(format!(
                        "missing required field '{}'",
                        e.key
                    )))
                }
            };
            out.push((Value::from(e.key), restored));
        }
        Ok(Value::Map(out))
    }

    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        self.check_known_keys(data.as_map()?)?;
        let mut out = serde_json::Map::new();
        for e in &self.entries {
            let default = e.schema.default_value();
            let v = data.get(e.key).unwrap_or(&default);
            if e.omit_empty && e.schema.is_default_value(v) {
                continue;
            }
            let prepared = e.schema.prepare_json(v).map_err(|err| nest(e.key, err))?;
            out.insert(e.key.to_string(), prepared);
        }
        Ok(serde_json::Value::Object(out))
    }

    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        let obj = encoded
            .as_object()
            .ok_or_else(|| Error::Encoding(format!("expected JSON object, found {}", encoded)))?;
        if let Some(key) = obj.keys().find(|k| self.entry(k).is_none()) {
            return Err(Error::Encoding(format!("unknown field '{}'", key)));
        }
        let mut out = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            let restored = match obj.get(e.key) {
                Some(v) => e
                    .schema
                    .from_prepared_json(v)
                    .map_err(|err| nest(e.key, err))?,
                None if e.omit_empty => e.schema.default_value(),
                None => {
                    return Err(Error::Encoding(format!(
                        "missing required field '{}'",
                        e.key
                    )))
                }
            };
            out.push((Value::from(e.key), restored));
        }
        Ok(Value::Map(out))
    }
}

/// Prefix an encoding error with the field it came from.
fn nest(key: &str, err: Error) -> Error {
    match err {
        Error::Encoding(msg) => Error::Encoding(format!("{}: {}", key, msg)),
        other => other,
    }
}

/// A map from unsigned integers to values of one schema. Default empty.
#[derive(Debug)]
pub struct Uint64MapSchema {
    value: Box<dyn Schema>,
}

impl Uint64MapSchema {
    pub fn new(value: impl Schema + 'static) -> Self {
        Self {
            value: Box::new(value),
        }
    }
}

impl Schema for Uint64MapSchema {
    fn default_value(&self) -> Value {
        Value::Map(Vec::new())
    }

    fn is_default_value(&self, data: &Value) -> bool {
        matches!(data, Value::Map(entries) if entries.is_empty())
    }

    fn prepare_msgpack(&self, data: &Value) -> Result<Value> {
        data.as_map()?
            .iter()
            .map(|(k, v)| Ok((Value::Uint(k.as_u64()?), self.value.prepare_msgpack(v)?)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Map)
    }

    fn from_prepared_msgpack(&self, encoded: &Value) -> Result<Value> {
        encoded
            .as_map()?
            .iter()
            .map(|(k, v)| {
                Ok((
                    Value::Uint(k.as_u64()?),
                    self.value.from_prepared_msgpack(v)?,
                ))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Map)
    }

    fn prepare_json(&self, data: &Value) -> Result<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (k, v) in data.as_map()? {
            out.insert(k.as_u64()?.to_string(), self.value.prepare_json(v)?);
        }
        Ok(serde_json::Value::Object(out))
    }

    fn from_prepared_json(&self, encoded: &serde_json::Value) -> Result<Value> {
        let obj = encoded
            .as_object()
            .ok_or_else(|| Error::Encoding(format!("expected JSON object, found {}", encoded)))?;
        obj.iter()
            .map(|(k, v)| {
                let key: u64 = k
                    .parse()
                    .map_err(|_| Error::Encoding(format!("map key '{}' is not a u64", k)))?;
                Ok((Value::Uint(key), self.value.from_prepared_json(v)?))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Map)
    }
}
