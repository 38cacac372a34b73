// SPDX-License-Identifier: Apache-2.0

//! C ABI
//!
//! Flat `extern "C"` functions over the tokenizer and the kernels, for hosts that
//! load the `cdylib`.
//!
//! Handles are boxed Rust objects passed around as raw pointers. Null handles are
//! tolerated and return the terminal/sentinel value; everything else is trusted:
//! pointers must be valid for the lengths given, and the document buffer handed to
//! `create_parser` must outlive the parser. Byte pointers returned by
//! `current_name`/`string_value` stay valid until the next `next_token` call on the
//! same parser.

#![allow(clippy::missing_safety_doc)]

use std::ptr;
use std::slice;

use log::debug;

use crate::constants::QUERY_BIT_PLANES;
use crate::dispatch::{detect_tier, kernels};
use crate::tokenize::{PaddedInput, Parser, ParserFactory};
use crate::types::{Result, Token};

// =============================================================================
// HELPERS
// =============================================================================

unsafe fn raw_slice<'a, T>(p: *const T, n: usize) -> &'a [T] {
    debug_assert!(!p.is_null() || n == 0, "null pointer for {} elements", n);
    if p.is_null() || n == 0 {
        &[]
    } else {
        slice::from_raw_parts(p, n)
    }
}

unsafe fn raw_slice_mut<'a, T>(p: *mut T, n: usize) -> &'a mut [T] {
    debug_assert!(!p.is_null() || n == 0, "null pointer for {} elements", n);
    if p.is_null() || n == 0 {
        &mut []
    } else {
        slice::from_raw_parts_mut(p, n)
    }
}

#[inline]
fn to_len(n: i32) -> usize {
    debug_assert!(n >= 0, "negative length {}", n);
    n.max(0) as usize
}

unsafe fn write_size(out_size: *mut usize, n: usize) {
    if !out_size.is_null() {
        *out_size = n;
    }
}

unsafe fn bytes_out(bytes: &[u8], out_size: *mut usize) -> *const u8 {
    write_size(out_size, bytes.len());
    bytes.as_ptr()
}

// =============================================================================
// TOKENIZER
// =============================================================================

/// Factory handle. Keeps the message of the last failed `create_parser`.
pub struct FactoryHandle {
    factory: ParserFactory,
    last_error: Option<String>,
}

impl FactoryHandle {
    unsafe fn create(&mut self, data: *const u8, data_length: usize, capacity: usize) -> Result<Parser<'static>> {
        let bytes = raw_slice(data, capacity);
        let input = PaddedInput::new(bytes, data_length)?;
        self.factory.create_parser(input)
    }
}

#[no_mangle]
pub extern "C" fn create_parser_factory() -> *mut FactoryHandle {
    Box::into_raw(Box::new(FactoryHandle {
        factory: ParserFactory::new(),
        last_error: None,
    }))
}

#[no_mangle]
pub unsafe extern "C" fn delete_parser_factory(factory: *mut FactoryHandle) {
    if !factory.is_null() {
        drop(Box::from_raw(factory));
    }
}

/// Returns null on failure; the reason is available from `factory_last_error`.
#[no_mangle]
pub unsafe extern "C" fn create_parser(
    factory: *mut FactoryHandle,
    data: *const u8,
    data_length: usize,
    buffer_capacity: usize,
) -> *mut Parser<'static> {
    let Some(handle) = factory.as_mut() else {
        return ptr::null_mut();
    };
    match handle.create(data, data_length, buffer_capacity) {
        Ok(parser) => {
            handle.last_error = None;
            Box::into_raw(Box::new(parser))
        }
        Err(err) => {
            debug!("create_parser failed: {}", err);
            handle.last_error = Some(err.to_string());
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn delete_parser(parser: *mut Parser<'static>) {
    if !parser.is_null() {
        drop(Box::from_raw(parser));
    }
}

#[no_mangle]
pub unsafe extern "C" fn next_token(parser: *mut Parser<'static>) -> i32 {
    match parser.as_mut() {
        Some(p) => p.next_token().code(),
        None => Token::Error.code(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn current_name(parser: *mut Parser<'static>, out_size: *mut usize) -> *const u8 {
    match parser.as_ref() {
        Some(p) => bytes_out(p.current_name(), out_size),
        None => {
            write_size(out_size, 0);
            ptr::null()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn string_value(parser: *mut Parser<'static>, out_size: *mut usize) -> *const u8 {
    match parser.as_mut() {
        Some(p) => bytes_out(p.string_value(), out_size),
        None => {
            write_size(out_size, 0);
            ptr::null()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn long_value(parser: *mut Parser<'static>) -> i64 {
    parser.as_mut().map_or(0, |p| p.long_value())
}

#[no_mangle]
pub unsafe extern "C" fn double_value(parser: *mut Parser<'static>) -> f64 {
    parser.as_mut().map_or(0.0, |p| p.double_value())
}

#[no_mangle]
pub unsafe extern "C" fn boolean_value(parser: *mut Parser<'static>) -> i32 {
    parser.as_mut().map_or(0, |p| p.boolean_value() as i32)
}

/// Last syntax or decode error of the parser, null if there is none.
#[no_mangle]
pub unsafe extern "C" fn parser_last_error(parser: *mut Parser<'static>, out_size: *mut usize) -> *const u8 {
    match parser.as_ref().and_then(|p| p.last_error()) {
        Some(msg) => bytes_out(msg.as_bytes(), out_size),
        None => {
            write_size(out_size, 0);
            ptr::null()
        }
    }
}

/// Why the last `create_parser` on this factory returned null, null if it did not.
#[no_mangle]
pub unsafe extern "C" fn factory_last_error(factory: *mut FactoryHandle, out_size: *mut usize) -> *const u8 {
    match factory.as_ref().and_then(|f| f.last_error.as_deref()) {
        Some(msg) => bytes_out(msg.as_bytes(), out_size),
        None => {
            write_size(out_size, 0);
            ptr::null()
        }
    }
}

// =============================================================================
// VECTOR KERNELS
// =============================================================================

#[no_mangle]
pub extern "C" fn vec_caps() -> i32 {
    detect_tier().code()
}

#[no_mangle]
pub extern "C" fn dot8s_stride() -> i32 {
    kernels().stride() as i32
}

#[no_mangle]
pub extern "C" fn sqr8s_stride() -> i32 {
    kernels().stride() as i32
}

#[no_mangle]
pub unsafe extern "C" fn dot8s(a: *const i8, b: *const i8, dims: i32) -> i32 {
    let dims = to_len(dims);
    let (a, b) = (raw_slice(a, dims), raw_slice(b, dims));
    (kernels().dot_i8)(a, b, a.len().min(b.len()))
}

#[no_mangle]
pub unsafe extern "C" fn sqr8s(a: *const i8, b: *const i8, dims: i32) -> i32 {
    let dims = to_len(dims);
    let (a, b) = (raw_slice(a, dims), raw_slice(b, dims));
    (kernels().sqr_i8)(a, b, a.len().min(b.len()))
}

#[no_mangle]
pub unsafe extern "C" fn vec_dot_int1_int4(a: *const u8, query: *const u8, length: i32) -> i64 {
    let length = to_len(length);
    let a = raw_slice(a, length);
    let query = raw_slice(query, QUERY_BIT_PLANES * length);
    if a.len() < length || query.len() < QUERY_BIT_PLANES * length {
        return 0;
    }
    (kernels().dot_bit4)(a, query, length)
}

#[no_mangle]
pub unsafe extern "C" fn vec_dot_int1_int4_bulk(
    a: *const u8,
    query: *const u8,
    length: i32,
    count: i32,
    results: *mut f32,
) {
    let (length, count) = (to_len(length), to_len(count));
    let a = raw_slice(a, length * count);
    let query = raw_slice(query, QUERY_BIT_PLANES * length);
    let results = raw_slice_mut(results, count);
    if results.len() < count || a.len() < length * count || query.len() < QUERY_BIT_PLANES * length {
        return;
    }
    (kernels().dot_bit4_bulk)(a, query, length, count, results)
}

#[no_mangle]
pub unsafe extern "C" fn vec_dot_int1_int4_bulk_offsets(
    a: *const u8,
    query: *const u8,
    length: i32,
    pitch: i32,
    offsets: *const i32,
    count: i32,
    results: *mut f32,
) {
    let (length, pitch, count) = (to_len(length), to_len(pitch), to_len(count));
    let offsets = raw_slice(offsets, count);
    let results = raw_slice_mut(results, count);
    let query = raw_slice(query, QUERY_BIT_PLANES * length);
    if offsets.len() < count || results.len() < count || query.len() < QUERY_BIT_PLANES * length {
        return;
    }
    // The arena size is implied by the furthest candidate.
    let extent = offsets
        .iter()
        .map(|&o| to_len(o) * pitch + length)
        .max()
        .unwrap_or(0);
    let a = raw_slice(a, extent);
    if a.len() < extent {
        return;
    }
    (kernels().dot_bit4_bulk_offsets)(a, query, length, pitch, offsets, count, results)
}
