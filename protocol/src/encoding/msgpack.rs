//! Canonical msgpack writer and strict reader.
//!
//! The consensus node hashes and verifies the exact bytes it receives, so
//! there is exactly one acceptable encoding for every value:
//!
//! 1. Integers use the narrowest marker that holds them, and a non-negative
//!    integer is always written with an unsigned marker.
//! 2. Strings, byte strings, arrays and maps use the narrowest length marker.
//! 3. Map keys are sorted ascending and unique.
//!
//! [`encode`] produces that form. [`decode`] accepts only that form and
//! rejects everything else (floats, extension types, trailing bytes) with
//! [`Error::Encoding`]. Marker constants and minimal-width writes come from
//! `rmp`; ordering and strictness are layered on top.

use rmp::encode as wr;
use rmp::Marker;

use super::value::Value;
use crate::config::MAX_DECODE_DEPTH;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Encode a value in canonical form.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    write_value(&mut buf, value)?;
    Ok(buf)
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Nil => wr::write_nil(buf).map_err(write_err)?,
        Value::Bool(b) => wr::write_bool(buf, *b).map_err(write_err)?,
        Value::Uint(n) => {
            wr::write_uint(buf, *n).map_err(write_err)?;
        }
        Value::Int(n) if *n >= 0 => {
            wr::write_uint(buf, *n as u64).map_err(write_err)?;
        }
        Value::Int(n) => {
            wr::write_sint(buf, *n).map_err(write_err)?;
        }
        Value::String(s) => wr::write_str(buf, s).map_err(write_err)?,
        Value::Bytes(b) => wr::write_bin(buf, b).map_err(write_err)?,
        Value::Array(items) => {
            wr::write_array_len(buf, len_u32(items.len())?).map_err(write_err)?;
            for item in items {
                write_value(buf, item)?;
            }
        }
        Value::Map(entries) => {
            let mut sorted: Vec<&(Value, Value)> = entries.iter().collect();
            sorted.sort_by(|a, b| a.0.canonical_cmp(&b.0));
            if let Some(dup) = sorted
                .windows(2)
                .find(|w| w[0].0.canonical_cmp(&w[1].0).is_eq())
            {
                return Err(Error::Encoding(format!("duplicate map key {}", dup[0].0)));
            }
            wr::write_map_len(buf, len_u32(sorted.len())?).map_err(write_err)?;
            for (k, v) in sorted {
                write_value(buf, k)?;
                write_value(buf, v)?;
            }
        }
    }
    Ok(())
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::Encoding(format!("length {} exceeds u32", len)))
}

fn write_err<E: std::fmt::Display>(err: E) -> Error {
    Error::Encoding(format!("msgpack write failed: {}", err))
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Decode a single canonical value occupying all of `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let mut reader = Reader { buf: bytes, pos: 0 };
    let value = reader.read_value(0)?;
    if reader.pos != bytes.len() {
        return Err(Error::Encoding(format!(
            "{} trailing bytes after value",
            bytes.len() - reader.pos
        )));
    }
    Ok(value)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| Error::Encoding("unexpected end of input".into()))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_be(&mut self, n: usize) -> Result<u64> {
        Ok(self
            .take(n)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    fn read_value(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DECODE_DEPTH {
            return Err(Error::Encoding("nesting too deep".into()));
        }
        let at = self.pos;
        let marker = Marker::from_u8(self.take(1)?[0]);
        match marker {
            Marker::Null => Ok(Value::Nil),
            Marker::True => Ok(Value::Bool(true)),
            Marker::False => Ok(Value::Bool(false)),

            Marker::FixPos(n) => Ok(Value::Uint(u64::from(n))),
            Marker::U8 => self.read_uint(1, 1 << 7, at),
            Marker::U16 => self.read_uint(2, 1 << 8, at),
            Marker::U32 => self.read_uint(4, 1 << 16, at),
            Marker::U64 => self.read_uint(8, 1 << 32, at),

            Marker::FixNeg(n) => Ok(Value::Int(i64::from(n))),
            Marker::I8 => self.read_sint(1, -32, at),
            Marker::I16 => self.read_sint(2, i64::from(i8::MIN), at),
            Marker::I32 => self.read_sint(4, i64::from(i16::MIN), at),
            Marker::I64 => self.read_sint(8, i64::from(i32::MIN), at),

            Marker::FixStr(n) => self.read_str(usize::from(n)),
            Marker::Str8 => {
                let len = self.read_len(1, 32, at)?;
                self.read_str(len)
            }
            Marker::Str16 => {
                let len = self.read_len(2, 1 << 8, at)?;
                self.read_str(len)
            }
            Marker::Str32 => {
                let len = self.read_len(4, 1 << 16, at)?;
                self.read_str(len)
            }

            Marker::Bin8 => {
                let len = self.read_len(1, 0, at)?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            Marker::Bin16 => {
                let len = self.read_len(2, 1 << 8, at)?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            Marker::Bin32 => {
                let len = self.read_len(4, 1 << 16, at)?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }

            Marker::FixArray(n) => self.read_array(usize::from(n), depth),
            Marker::Array16 => {
                let len = self.read_len(2, 16, at)?;
                self.read_array(len, depth)
            }
            Marker::Array32 => {
                let len = self.read_len(4, 1 << 16, at)?;
                self.read_array(len, depth)
            }

            Marker::FixMap(n) => self.read_map(usize::from(n), depth),
            Marker::Map16 => {
                let len = self.read_len(2, 16, at)?;
                self.read_map(len, depth)
            }
            Marker::Map32 => {
                let len = self.read_len(4, 1 << 16, at)?;
                self.read_map(len, depth)
            }

            other => Err(Error::Encoding(format!(
                "unsupported msgpack marker {:?} at offset {}",
                other, at
            ))),
        }
    }

    /// Read an unsigned integer of `width` bytes that must be at least `min`
    /// (anything smaller fits a narrower marker).
    fn read_uint(&mut self, width: usize, min: u64, at: usize) -> Result<Value> {
        let n = self.read_be(width)?;
        if n < min {
            return Err(non_canonical("integer", at));
        }
        Ok(Value::Uint(n))
    }

    /// Read a signed integer of `width` bytes that must be below `limit`.
    /// Non-negative values must use unsigned markers.
    fn read_sint(&mut self, width: usize, limit: i64, at: usize) -> Result<Value> {
        let raw = self.read_be(width)?;
        let shift = 64 - 8 * width as u32;
        let n = ((raw << shift) as i64) >> shift;
        if n >= limit {
            return Err(non_canonical("signed integer", at));
        }
        Ok(Value::Int(n))
    }

    fn read_len(&mut self, width: usize, min: usize, at: usize) -> Result<usize> {
        let len = self.read_be(width)? as usize;
        if len < min {
            return Err(non_canonical("length prefix", at));
        }
        Ok(len)
    }

    fn read_str(&mut self, len: usize) -> Result<Value> {
        let bytes = self.take(len)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|_| Error::Encoding("string is not valid UTF-8".into()))?;
        Ok(Value::String(s.to_string()))
    }

    fn read_array(&mut self, len: usize, depth: usize) -> Result<Value> {
        // Every element needs at least one byte.
        if len > self.buf.len() - self.pos {
            return Err(Error::Encoding("array length exceeds input".into()));
        }
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.read_value(depth + 1)?);
        }
        Ok(Value::Array(items))
    }

    fn read_map(&mut self, len: usize, depth: usize) -> Result<Value> {
        if len > (self.buf.len() - self.pos) / 2 {
            return Err(Error::Encoding("map length exceeds input".into()));
        }
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(len);
        for _ in 0..len {
            let at = self.pos;
            let key = self.read_value(depth + 1)?;
            if let Some((prev, _)) = entries.last() {
                if !prev.canonical_cmp(&key).is_lt() {
                    return Err(Error::Encoding(format!(
                        "map key {} at offset {} is not in canonical order",
                        key, at
                    )));
                }
            }
            let value = self.read_value(depth + 1)?;
            entries.push((key, value));
        }
        Ok(Value::Map(entries))
    }
}

fn non_canonical(what: &str, at: usize) -> Error {
    Error::Encoding(format!("non-canonical {} at offset {}", what, at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_integer_widths() {
        assert_eq!(encode(&Value::Uint(0)).unwrap(), vec![0x00]);
        assert_eq!(encode(&Value::Uint(127)).unwrap(), vec![0x7f]);
        assert_eq!(encode(&Value::Uint(128)).unwrap(), vec![0xcc, 0x80]);
        assert_eq!(encode(&Value::Uint(256)).unwrap(), vec![0xcd, 0x01, 0x00]);
        assert_eq!(
            encode(&Value::Uint(65536)).unwrap(),
            vec![0xce, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(
            encode(&Value::Uint(1 << 32)).unwrap(),
            vec![0xcf, 0, 0, 0, 1, 0, 0, 0, 0]
        );
        assert_eq!(encode(&Value::Int(-1)).unwrap(), vec![0xff]);
        assert_eq!(encode(&Value::Int(-33)).unwrap(), vec![0xd0, 0xdf]);
    }

    #[test]
    fn test_positive_int_uses_unsigned_marker() {
        assert_eq!(encode(&Value::Int(200)).unwrap(), vec![0xcc, 0xc8]);
    }

    #[test]
    fn test_map_keys_sorted() {
        let v = Value::map([("b", Value::Uint(1)), ("a", Value::Uint(2))]);
        assert_eq!(
            encode(&v).unwrap(),
            vec![0x82, 0xa1, b'a', 0x02, 0xa1, b'b', 0x01]
        );
    }

    #[test]
    fn test_duplicate_keys_rejected_on_encode() {
        let v = Value::map([("a", Value::Uint(1)), ("a", Value::Uint(2))]);
        assert!(matches!(encode(&v), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_decode_reencode_identity() {
        let v = Value::map([
            ("amt", Value::Uint(1000)),
            ("note", Value::Bytes(vec![1, 2, 3])),
            ("type", Value::from("pay")),
            ("apaa", Value::Array(vec![Value::Bytes(vec![]), Value::Bool(true)])),
        ]);
        let bytes = encode(&v).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_reject_non_minimal_integer() {
        // 5 encoded as uint8 instead of positive fixint.
        assert!(decode(&[0xcc, 0x05]).is_err());
        // 200 encoded as uint16.
        assert!(decode(&[0xcd, 0x00, 0xc8]).is_err());
        // Positive number with a signed marker.
        assert!(decode(&[0xd0, 0x05]).is_err());
        // -1 as int8 instead of negative fixint.
        assert!(decode(&[0xd0, 0xff]).is_err());
        assert_eq!(decode(&[0xd0, 0xdf]).unwrap(), Value::Int(-33));
    }

    #[test]
    fn test_reject_unsorted_and_duplicate_keys() {
        assert!(decode(&[0x82, 0xa1, b'b', 0x01, 0xa1, b'a', 0x02]).is_err());
        assert!(decode(&[0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02]).is_err());
    }

    #[test]
    fn test_reject_non_minimal_lengths() {
        // "a" as str8.
        assert!(decode(&[0xd9, 0x01, b'a']).is_err());
        // Empty array as array16.
        assert!(decode(&[0xdc, 0x00, 0x00]).is_err());
        // bin8 has no shorter form, so any length is fine.
        assert_eq!(decode(&[0xc4, 0x00]).unwrap(), Value::Bytes(vec![]));
    }

    #[test]
    fn test_reject_floats_ext_and_trailing() {
        assert!(decode(&[0xca, 0, 0, 0, 0]).is_err());
        assert!(decode(&[0xd4, 0x01, 0x00]).is_err());
        assert!(decode(&[0x01, 0x02]).is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_reject_truncated_and_oversized() {
        assert!(decode(&[0xc4, 0x05, 1, 2]).is_err());
        assert!(decode(&[0xdd, 0xff, 0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_str8_boundary() {
        let long = "x".repeat(32);
        let bytes = encode(&Value::String(long.clone())).unwrap();
        assert_eq!(&bytes[..2], &[0xd9, 32]);
        assert_eq!(decode(&bytes).unwrap(), Value::String(long));
    }
}
