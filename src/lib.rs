// SPDX-License-Identifier: Apache-2.0

//! HWKIT library
//!
//! Two throughput-oriented engines meant to be called millions of times per second
//! from a host process:
//!
//! - A pull-based JSON token cursor over padded buffers (structural index, lazy value
//!   decoding, zero-copy strings)
//! - Quantized vector kernels (int8 dot product / squared distance, 1-bit x 4-bit
//!   bit-plane dot product with bulk and gathered variants)
//!
//! Both are also exported through a C ABI (see [`ffi`]).
//!
//! ## Hardware support
//! - **AVX2** on x86_64 and **NEON** on aarch64, selected at runtime
//! - A scalar tier everywhere else, or everywhere with the `disable-hwkit` feature
//!
//! ## Usage
//!
//! ```rust
//! use hwkit::{PaddedBuffer, ParserFactory, Token};
//!
//! let doc = PaddedBuffer::from_slice(br#"{"tags":["a","b"]}"#)?;
//! let mut parser = ParserFactory::new().create_parser(doc.as_input())?;
//! let mut strings = 0;
//! while !parser.next_token().is_terminal() {
//!     if parser.current_token() == Token::ValueString {
//!         strings += 1;
//!     }
//! }
//! assert_eq!(strings, 2);
//!
//! // 1-bit stored vector against a 4-bit query
//! let a = hwkit::quantize::pack_as_binary(&[1, 0, 1, 1]);
//! let q = hwkit::quantize::transpose_half_byte(&[3, 7, 2, 15]);
//! assert_eq!(hwkit::vec_dot_int1_int4(&a, &q)?, 3 + 2 + 15);
//!
//! println!("kernel tier: {:?}", hwkit::detect_tier());
//! # Ok::<(), hwkit::HwkitError>(())
//! ```

#![allow(clippy::missing_safety_doc)]

pub mod classify;
pub mod constants;
pub mod dispatch;
pub mod distance;
pub mod ffi;
pub mod quantize;
pub mod scanner;
pub mod strings;
pub mod tokenize;
pub mod types;

pub use types::*;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
#[path = "tests/classify_tests.rs"]
mod classify_tests;
#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod dispatch_tests;
#[cfg(test)]
#[path = "tests/distance_tests.rs"]
mod distance_tests;
#[cfg(test)]
#[path = "tests/ffi_tests.rs"]
mod ffi_tests;
#[cfg(test)]
#[path = "tests/quantize_tests.rs"]
mod quantize_tests;
#[cfg(test)]
#[path = "tests/scanner_tests.rs"]
mod scanner_tests;
#[cfg(test)]
#[path = "tests/strings_tests.rs"]
mod strings_tests;
#[cfg(test)]
#[path = "tests/tokenize_tests.rs"]
mod tokenize_tests;

pub use dispatch::{
    available_tiers, detect_tier, dot8s, dot8s_stride, get_hw_capabilities, kernels, sqr8s,
    sqr8s_stride, vec_caps, vec_dot_int1_int4, vec_dot_int1_int4_bulk,
    vec_dot_int1_int4_bulk_offsets, HardwareCapabilities, KernelSet,
};
pub use tokenize::{PaddedBuffer, PaddedInput, Parser, ParserFactory};
