//! The ABI type grammar.
//!
//! ```text
//! uint<N>        8 <= N <= 512, N % 8 == 0
//! ufixed<N>x<M>  N as above, 1 <= M <= 160
//! byte | bool | address | string
//! <T>[<len>]     static array, 1 <= len <= 65535
//! <T>[]          dynamic array
//! (<T1>,...)     tuple
//! ```

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::config::PUBLIC_KEY_LENGTH;
use crate::error::{Error, Result};

/// Largest static array length and tuple arity the encoding can express.
const MAX_LEN: usize = u16::MAX as usize;

/// A parsed ABI value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    Uint(u16),
    Ufixed { bits: u16, precision: u8 },
    Byte,
    Bool,
    Address,
    String,
    StaticArray(Box<AbiType>, usize),
    DynamicArray(Box<AbiType>),
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// True when values of this type have no fixed encoded length.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::String | AbiType::DynamicArray(_) => true,
            AbiType::StaticArray(child, _) => child.is_dynamic(),
            AbiType::Tuple(children) => children.iter().any(AbiType::is_dynamic),
            _ => false,
        }
    }

    /// Encoded length in bytes of a static type. Consecutive bools in a
    /// tuple, and bools in a static array, pack eight to a byte.
    pub fn byte_len(&self) -> Result<usize> {
        match self {
            AbiType::Uint(bits) | AbiType::Ufixed { bits, .. } => Ok(*bits as usize / 8),
            AbiType::Byte | AbiType::Bool => Ok(1),
            AbiType::Address => Ok(PUBLIC_KEY_LENGTH),
            AbiType::StaticArray(child, len) if **child == AbiType::Bool => Ok(len.div_ceil(8)),
            AbiType::StaticArray(child, len) => child
                .byte_len()?
                .checked_mul(*len)
                .ok_or_else(|| self.too_long()),
            AbiType::Tuple(children) => {
                let mut total: usize = 0;
                let mut bools: usize = 0;
                for child in children {
                    if *child == AbiType::Bool {
                        bools += 1;
                        continue;
                    }
                    let child_len = child.byte_len()?;
                    total = total
                        .checked_add(bools.div_ceil(8))
                        .and_then(|t| t.checked_add(child_len))
                        .ok_or_else(|| self.too_long())?;
                    bools = 0;
                }
                total
                    .checked_add(bools.div_ceil(8))
                    .ok_or_else(|| self.too_long())
            }
            AbiType::String | AbiType::DynamicArray(_) => Err(Error::Validation(format!(
                "{} is a dynamic type",
                self
            ))),
        }
    }

    fn too_long(&self) -> Error {
        Error::Validation(format!("encoded length of {} overflows usize", self))
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Uint(bits) => write!(f, "uint{}", bits),
            AbiType::Ufixed { bits, precision } => write!(f, "ufixed{}x{}", bits, precision),
            AbiType::Byte => f.write_str("byte"),
            AbiType::Bool => f.write_str("bool"),
            AbiType::Address => f.write_str("address"),
            AbiType::String => f.write_str("string"),
            AbiType::StaticArray(child, len) => write!(f, "{}[{}]", child, len),
            AbiType::DynamicArray(child) => write!(f, "{}[]", child),
            AbiType::Tuple(children) => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn static_array_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-z\d\[\](),]+)\[([1-9]\d*)\]$")
            .unwrap_or_else(|e| unreachable!("static pattern: {}", e))
    })
}

fn ufixed_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^ufixed([1-9]\d*)x([1-9]\d*)$")
            .unwrap_or_else(|e| unreachable!("static pattern: {}", e))
    })
}

fn malformed(text: &str) -> Error {
    Error::MalformedInput(format!("cannot convert '{}' to an ABI type", text))
}

fn bit_size(kind: &str, digits: &str) -> Result<u16> {
    let bits: u16 = digits
        .parse()
        .map_err(|_| Error::MalformedInput(format!("malformed {} size: {}", kind, digits)))?;
    if bits % 8 != 0 || !(8..=512).contains(&bits) {
        return Err(Error::MalformedInput(format!(
            "unsupported {} bit size: {}",
            kind, bits
        )));
    }
    Ok(bits)
}

/// Split the inside of a tuple at its top-level commas.
///
/// `"uint64,(bool,byte),string"` yields three segments. Empty input yields
/// none; leading, trailing or doubled commas and unbalanced parentheses are
/// errors.
pub fn parse_tuple_content(content: &str) -> Result<Vec<String>> {
    if content.is_empty() {
        return Ok(Vec::new());
    }
    if content.starts_with(',') || content.ends_with(',') {
        return Err(Error::MalformedInput(
            "tuple string should not start or end with a comma".into(),
        ));
    }
    if content.contains(",,") {
        return Err(Error::MalformedInput(
            "tuple string should not have consecutive commas".into(),
        ));
    }

    let mut segments = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    for (i, c) in content.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            ',' if depth == 0 => {
                segments.push(content[start..i].to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::MalformedInput(
            "tuple string has mismatched parentheses".into(),
        ));
    }
    segments.push(content[start..].to_string());
    Ok(segments)
}

impl FromStr for AbiType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        if let Some(child) = text.strip_suffix("[]") {
            return Ok(AbiType::DynamicArray(Box::new(child.parse()?)));
        }
        if text.ends_with(']') {
            let caps = static_array_pattern()
                .captures(text)
                .ok_or_else(|| Error::MalformedInput(format!("malformed static array: {}", text)))?;
            let len: usize = caps[2]
                .parse()
                .map_err(|_| Error::MalformedInput(format!("malformed static array: {}", text)))?;
            if len > MAX_LEN {
                return Err(Error::MalformedInput(format!(
                    "array length {} exceeds limit {}",
                    len, MAX_LEN
                )));
            }
            return Ok(AbiType::StaticArray(Box::new(caps[1].parse()?), len));
        }
        if let Some(digits) = text.strip_prefix("uint") {
            return Ok(AbiType::Uint(bit_size("uint", digits)?));
        }
        if text.starts_with("ufixed") {
            let caps = ufixed_pattern()
                .captures(text)
                .ok_or_else(|| Error::MalformedInput(format!("malformed ufixed type: {}", text)))?;
            let bits = bit_size("ufixed", &caps[1])?;
            let precision = caps[2]
                .parse::<u8>()
                .ok()
                .filter(|p| (1..=160).contains(p))
                .ok_or_else(|| {
                    Error::MalformedInput(format!("unsupported ufixed precision: {}", &caps[2]))
                })?;
            return Ok(AbiType::Ufixed { bits, precision });
        }
        match text {
            "byte" => return Ok(AbiType::Byte),
            "bool" => return Ok(AbiType::Bool),
            "address" => return Ok(AbiType::Address),
            "string" => return Ok(AbiType::String),
            _ => {}
        }
        if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            let children = parse_tuple_content(inner)?
                .iter()
                .map(|s| s.parse())
                .collect::<Result<Vec<AbiType>>>()?;
            if children.len() > MAX_LEN {
                return Err(Error::MalformedInput(format!(
                    "tuple has more than {} elements",
                    MAX_LEN
                )));
            }
            return Ok(AbiType::Tuple(children));
        }
        Err(malformed(text))
    }
}
