//! Decoding of raw register words into typed values
//!
//! Words arrive as big-endian 16-bit registers; 32-bit values span two
//! registers, high word first.

use crate::error::{DriverError, Result};
use crate::registers::{Encoding, Register, SENTINEL_U32};
use std::fmt;

/// A decoded register quantity
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterValue {
    /// Unscaled integer count
    Count(u32),
    /// Fixed-point value after applying the register divisor
    Scaled(f64),
    /// Three scaled per-phase values
    Triplet([f64; 3]),
    /// Identifier text
    Text(String),
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterValue::Count(v) => write!(f, "{}", v),
            RegisterValue::Scaled(v) => write!(f, "{}", v),
            RegisterValue::Triplet([l1, l2, l3]) => write!(f, "{} / {} / {}", l1, l2, l3),
            RegisterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl RegisterValue {
    /// Numeric value in engineering units; `None` for triplets and text
    pub fn number(&self) -> Option<f64> {
        match self {
            RegisterValue::Count(v) => Some(f64::from(*v)),
            RegisterValue::Scaled(v) => Some(*v),
            _ => None,
        }
    }

    pub fn triplet(&self) -> Option<[f64; 3]> {
        match self {
            RegisterValue::Triplet(t) => Some(*t),
            _ => None,
        }
    }
}

fn ensure_len(words: &[u16], needed: usize, what: &str) -> Result<()> {
    if words.len() < needed {
        return Err(DriverError::protocol(format!(
            "Insufficient registers for {}: got {}, need {}",
            what,
            words.len(),
            needed
        )));
    }
    Ok(())
}

/// Decode a single 16-bit register
pub fn decode_u16(words: &[u16]) -> Result<u16> {
    ensure_len(words, 1, "16-bit value")?;
    Ok(words[0])
}

/// Decode an unsigned 32-bit value from two registers
pub fn decode_u32(words: &[u16]) -> Result<u32> {
    ensure_len(words, 2, "32-bit value")?;
    Ok((u32::from(words[0]) << 16) | u32::from(words[1]))
}

fn normalize_sentinel(raw: u32, sentinel: bool) -> u32 {
    if sentinel && raw == SENTINEL_U32 {
        0
    } else {
        raw
    }
}

/// Decode three consecutive 32-bit values, each divided by `divisor`.
///
/// With `sentinel` set, a slot holding the all-ones pattern reads as 0.
pub fn decode_triplet(words: &[u16], divisor: f64, sentinel: bool) -> Result<[f64; 3]> {
    ensure_len(words, 6, "phase triplet")?;
    let mut res = [0.0; 3];
    for (slot, chunk) in res.iter_mut().zip(words.chunks_exact(2)) {
        let raw = normalize_sentinel(decode_u32(chunk)?, sentinel);
        *slot = f64::from(raw) / divisor;
    }
    Ok(res)
}

/// Split register words into their big-endian bytes
pub fn words_to_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Decode an identifier byte block as text.
///
/// Trailing NUL bytes are dropped and surrounding whitespace trimmed; a block
/// of zero bytes yields an empty string. Non-ASCII bytes are replaced rather
/// than rejected.
pub fn decode_text(words: &[u16]) -> String {
    let bytes = words_to_bytes(words);
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end])
        .trim_matches('\0')
        .trim()
        .to_string()
}

/// Encode a 16-bit value for a single-register write
pub fn encode_u16(value: u16) -> [u16; 1] {
    [value]
}

/// Decode `words` read from `reg` according to its catalog entry.
///
/// The entry's divisor scales numeric values and its sentinel flag decides
/// whether an all-ones 32-bit value reads as 0.
pub fn decode(reg: Register, words: &[u16]) -> Result<RegisterValue> {
    ensure_len(words, usize::from(reg.count), reg.name)?;
    let divisor = f64::from(reg.divisor);
    match reg.encoding {
        Encoding::U16 => Ok(RegisterValue::Count(u32::from(decode_u16(words)?))),
        Encoding::U32 => {
            let raw = normalize_sentinel(decode_u32(words)?, reg.sentinel);
            if reg.divisor == 1 {
                Ok(RegisterValue::Count(raw))
            } else {
                Ok(RegisterValue::Scaled(f64::from(raw) / divisor))
            }
        }
        Encoding::U32Triplet => Ok(RegisterValue::Triplet(decode_triplet(
            words,
            divisor,
            reg.sentinel,
        )?)),
        Encoding::Text => Ok(RegisterValue::Text(decode_text(&words[..usize::from(reg.count)]))),
    }
}
