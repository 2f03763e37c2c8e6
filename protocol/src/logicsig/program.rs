//! Program sanity checks.
//!
//! These run before a program is wrapped in a [`LogicSig`](super::LogicSig)
//! and again on verification. They do not disassemble the program; they catch
//! the inputs callers most often pass by mistake (an address string, base64
//! text, other printable text) and enforce the version prefix and size limit.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::address::is_valid_address;
use crate::config::MAX_LOGIC_SIG_LENGTH;
use crate::error::{Error, Result};

/// Decode a little-endian base-128 varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` when the
/// buffer ends mid-varint or the value overflows 64 bits.
pub fn read_uvarint(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, b) in bytes.iter().enumerate() {
        if i == 10 {
            return None;
        }
        if *b < 0x80 {
            if i == 9 && *b > 1 {
                return None;
            }
            return Some((value | (u64::from(*b) << shift), i + 1));
        }
        value |= u64::from(b & 0x7f) << shift;
        shift += 7;
    }
    None
}

fn is_printable(program: &[u8]) -> bool {
    program
        .iter()
        .all(|b| (0x20..=0x7e).contains(b) || *b == b'\n')
}

fn base64_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9+/]{4})*([A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
            .unwrap_or_else(|e| unreachable!("static pattern: {}", e))
    })
}

fn reject(reason: &str) -> Error {
    warn!(reason, "rejected logic signature program");
    Error::MalformedInput(reason.to_string())
}

/// Reject byte strings that are plainly not compiled programs.
fn check_shape(program: &[u8]) -> Result<()> {
    if !is_printable(program) {
        return Ok(());
    }
    // All bytes are ASCII here, so the conversion cannot fail.
    let text = std::str::from_utf8(program).map_err(|e| Error::MalformedInput(e.to_string()))?;
    if is_valid_address(text) {
        return Err(reject("requesting program bytes, get Algorand address"));
    }
    if base64_shape().is_match(text) {
        return Err(reject("program should not be b64 encoded"));
    }
    Err(reject(
        "program bytes are all ASCII printable characters, not looking like TEAL byte code",
    ))
}

/// Check that `program` looks like compiled bytecode and that it fits, with
/// its arguments, in a logic signature.
pub fn check_program(program: &[u8], args: &[Vec<u8>]) -> Result<()> {
    if program.is_empty() {
        return Err(Error::MalformedInput("empty program".into()));
    }
    check_shape(program)?;

    if read_uvarint(program).is_none() {
        return Err(Error::MalformedInput("version parsing error".into()));
    }
    let total = program.len() + args.iter().map(Vec::len).sum::<usize>();
    if total > MAX_LOGIC_SIG_LENGTH {
        return Err(Error::MalformedInput(format!(
            "program too long: {} bytes with arguments, limit {}",
            total, MAX_LOGIC_SIG_LENGTH
        )));
    }
    Ok(())
}
