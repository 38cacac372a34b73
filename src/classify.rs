// SPDX-License-Identifier: Apache-2.0

//! Value classification
//!
//! Maps the first byte of a JSON value to the token it starts. The lookup is a single
//! table load and never looks past that byte; the value itself is decoded lazily by
//! [`crate::strings`] when the caller asks for it.

use crate::types::Token;

const NONE: u8 = 0;
const STRING: u8 = 1;
const NUMBER: u8 = 2;
const OBJECT: u8 = 3;
const ARRAY: u8 = 4;
const BOOLEAN: u8 = 5;
const NULL: u8 = 6;

static VALUE_START: [u8; 256] = build_value_start_table();

const fn build_value_start_table() -> [u8; 256] {
    let mut table = [NONE; 256];
    let mut d = b'0';
    while d <= b'9' {
        table[d as usize] = NUMBER;
        d += 1;
    }
    table[b'-' as usize] = NUMBER;
    table[b'"' as usize] = STRING;
    table[b'{' as usize] = OBJECT;
    table[b'[' as usize] = ARRAY;
    table[b't' as usize] = BOOLEAN;
    table[b'f' as usize] = BOOLEAN;
    table[b'n' as usize] = NULL;
    table
}

/// Token started by `b`, or `None` if no JSON value can start with it.
#[inline(always)]
pub fn classify_value_start(b: u8) -> Option<Token> {
    match VALUE_START[b as usize] {
        STRING => Some(Token::ValueString),
        NUMBER => Some(Token::ValueNumber),
        OBJECT => Some(Token::StartObject),
        ARRAY => Some(Token::StartArray),
        BOOLEAN => Some(Token::ValueBoolean),
        NULL => Some(Token::ValueNull),
        _ => None,
    }
}
