// SPDX-License-Identifier: Apache-2.0

//! Value decoders
//!
//! Lazy extraction of string, number and boolean values from the position a token
//! starts at. Nothing here allocates except [`unescape_into`], which appends to a
//! caller-owned scratch buffer.
//!
//! ## Performance notes
//! String bodies are walked with `memchr2` so runs without quotes or backslashes are
//! copied in bulk. Number parsing validates the JSON grammar in the same pass that
//! finds the end of the literal.

use memchr::memchr2;

use crate::scanner::is_delimiter;
use crate::types::{HwkitError, NumberType, Result};

#[inline]
fn decode_error(message: String) -> HwkitError {
    HwkitError::Decode(message)
}

fn unterminated() -> HwkitError {
    decode_error("unterminated string".to_string())
}

// =============================================================================
// STRINGS
// =============================================================================

/// Find the closing quote of the string body that begins at `start`.
///
/// Returns the offset of the closing quote and whether the body contains escapes.
pub fn string_span(data: &[u8], start: usize) -> Option<(usize, bool)> {
    let mut from = start;
    let mut escaped = false;
    loop {
        let hit = from + memchr2(b'"', b'\\', data.get(from..)?)?;
        if data[hit] == b'"' {
            return Some((hit, escaped));
        }
        escaped = true;
        from = hit + 2;
    }
}

/// Unescape the string body that begins at `start`, appending UTF-8 to `out`.
///
/// Returns the offset of the closing quote.
pub fn unescape_into(data: &[u8], start: usize, out: &mut Vec<u8>) -> Result<usize> {
    let mut i = start;
    loop {
        let rest = data.get(i..).ok_or_else(unterminated)?;
        let off = memchr2(b'"', b'\\', rest).ok_or_else(unterminated)?;
        out.extend_from_slice(&rest[..off]);
        i += off;
        if data[i] == b'"' {
            return Ok(i);
        }

        let escape = *data.get(i + 1).ok_or_else(unterminated)?;
        i += 2;
        match escape {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
                let (ch, used) = decode_unicode_escape(data, i)?;
                i += used;
                let mut utf8 = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
            other => {
                return Err(decode_error(format!(
                    "invalid escape '\\{}' at byte {}",
                    other.escape_ascii(),
                    i - 2
                )))
            }
        }
    }
}

// `at` points just past the `\u`. Returns the char and the number of bytes consumed.
fn decode_unicode_escape(data: &[u8], at: usize) -> Result<(char, usize)> {
    let first = hex4(data, at)?;
    match first {
        0xD800..=0xDBFF => {
            if data.get(at + 4) != Some(&b'\\') || data.get(at + 5) != Some(&b'u') {
                return Err(decode_error(format!(
                    "unpaired high surrogate at byte {}",
                    at - 2
                )));
            }
            let second = hex4(data, at + 6)?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(decode_error(format!(
                    "invalid low surrogate at byte {}",
                    at + 4
                )));
            }
            let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
            char::from_u32(code)
                .map(|c| (c, 10))
                .ok_or_else(|| decode_error(format!("invalid code point {:#x}", code)))
        }
        0xDC00..=0xDFFF => Err(decode_error(format!(
            "unpaired low surrogate at byte {}",
            at - 2
        ))),
        _ => char::from_u32(first)
            .map(|c| (c, 4))
            .ok_or_else(|| decode_error(format!("invalid code point {:#x}", first))),
    }
}

fn hex4(data: &[u8], at: usize) -> Result<u32> {
    let digits = data
        .get(at..at + 4)
        .ok_or_else(|| decode_error(format!("truncated unicode escape at byte {}", at)))?;
    let mut value = 0u32;
    for &d in digits {
        let nibble = match d {
            b'0'..=b'9' => d - b'0',
            b'a'..=b'f' => d - b'a' + 10,
            b'A'..=b'F' => d - b'A' + 10,
            _ => {
                return Err(decode_error(format!(
                    "invalid hex digit '{}' in unicode escape at byte {}",
                    d.escape_ascii(),
                    at
                )))
            }
        };
        value = (value << 4) | nibble as u32;
    }
    Ok(value)
}

// =============================================================================
// NUMBERS
// =============================================================================

/// Extent of a number literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberSpan {
    /// One past the last byte of the literal.
    pub end: usize,
    /// No fraction and no exponent.
    pub is_integer: bool,
}

fn malformed_number(data: &[u8], start: usize) -> HwkitError {
    let rest = &data[start.min(data.len())..];
    let end = rest.iter().position(|&b| is_delimiter(b)).unwrap_or(rest.len());
    decode_error(format!(
        "malformed number '{}' at byte {}",
        String::from_utf8_lossy(&rest[..end]),
        start
    ))
}

/// Validate the JSON number grammar at `start` and find where the literal ends.
pub fn number_span(data: &[u8], start: usize) -> Result<NumberSpan> {
    let at = |i: usize| data.get(i).copied().unwrap_or(0);
    let mut i = start;
    if at(i) == b'-' {
        i += 1;
    }
    match at(i) {
        b'0' => i += 1,
        b'1'..=b'9' => {
            while at(i).is_ascii_digit() {
                i += 1;
            }
        }
        _ => return Err(malformed_number(data, start)),
    }

    let mut is_integer = true;
    if at(i) == b'.' {
        is_integer = false;
        i += 1;
        if !at(i).is_ascii_digit() {
            return Err(malformed_number(data, start));
        }
        while at(i).is_ascii_digit() {
            i += 1;
        }
    }
    if matches!(at(i), b'e' | b'E') {
        is_integer = false;
        i += 1;
        if matches!(at(i), b'+' | b'-') {
            i += 1;
        }
        if !at(i).is_ascii_digit() {
            return Err(malformed_number(data, start));
        }
        while at(i).is_ascii_digit() {
            i += 1;
        }
    }

    if i < data.len() && !is_delimiter(data[i]) {
        return Err(malformed_number(data, start));
    }
    Ok(NumberSpan { end: i, is_integer })
}

/// Parse a signed 64-bit integer at `start`.
pub fn parse_i64(data: &[u8], start: usize) -> Result<i64> {
    let span = number_span(data, start)?;
    let text = &data[start..span.end];
    if !span.is_integer {
        return Err(decode_error(format!(
            "'{}' is not an integer",
            String::from_utf8_lossy(text)
        )));
    }

    let (negative, digits) = match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, text),
    };
    // Accumulate towards the sign so that i64::MIN is reachable.
    let mut acc: i64 = 0;
    for &d in digits {
        let digit = (d - b'0') as i64;
        acc = acc
            .checked_mul(10)
            .and_then(|a| {
                if negative {
                    a.checked_sub(digit)
                } else {
                    a.checked_add(digit)
                }
            })
            .ok_or_else(|| {
                decode_error(format!(
                    "integer '{}' out of range",
                    String::from_utf8_lossy(text)
                ))
            })?;
    }
    Ok(acc)
}

/// Parse an IEEE-754 double at `start`. Integers are accepted.
pub fn parse_f64(data: &[u8], start: usize) -> Result<f64> {
    let span = number_span(data, start)?;
    // The grammar check above leaves only ASCII digits, signs, '.', 'e' and 'E'.
    let text = std::str::from_utf8(&data[start..span.end])
        .map_err(|e| decode_error(e.to_string()))?;
    let value = text
        .parse::<f64>()
        .map_err(|e| decode_error(format!("'{}': {}", text, e)))?;
    if value.is_infinite() {
        return Err(decode_error(format!("double '{}' out of range", text)));
    }
    Ok(value)
}

/// Classify the number literal at `start`.
pub fn number_type(data: &[u8], start: usize) -> Result<NumberType> {
    let span = number_span(data, start)?;
    if !span.is_integer {
        return Ok(NumberType::Double);
    }
    Ok(match parse_i64(data, start) {
        Ok(_) => NumberType::Long,
        Err(_) => NumberType::BigInteger,
    })
}

// =============================================================================
// LITERALS
// =============================================================================

/// Parse `true` or `false` at `start`.
pub fn parse_bool(data: &[u8], start: usize) -> Result<bool> {
    let rest = &data[start.min(data.len())..];
    let (value, n) = if rest.starts_with(b"true") {
        (true, 4)
    } else if rest.starts_with(b"false") {
        (false, 5)
    } else {
        return Err(decode_error(format!("not a boolean at byte {}", start)));
    };
    match rest.get(n) {
        Some(&b) if !is_delimiter(b) => Err(decode_error(format!(
            "not a boolean at byte {}",
            start
        ))),
        _ => Ok(value),
    }
}
