// SPDX-License-Identifier: Apache-2.0

//! Common constants used across implementations
//!
//! This module centralizes lane counts, padding requirements and sizing rules used by
//! the scalar/SIMD kernels and by the JSON cursor.

// =============================================================================
// JSON INPUT PADDING AND SCRATCH SIZING
// =============================================================================

/// Zeroed bytes every input allocation must carry past the real content, so that
/// vectorized readers and fixed-width literal checks never read past the allocation.
pub const JSON_PADDING: usize = 64;

/// Scratch buffers are rounded up to this boundary.
pub const SCRATCH_ALIGNMENT: usize = 64;

/// Escaped-string expansion bound: scratch = capacity * NUM / DEN + padding.
pub const SCRATCH_GROWTH_NUM: usize = 5;
pub const SCRATCH_GROWTH_DEN: usize = 3;

/// Default nesting limit for objects/arrays.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Number of bit-planes in a 4-bit quantized query.
pub const QUERY_BIT_PLANES: usize = 4;

/// Candidates scored together by the interleaved bulk kernels.
pub const BULK_INTERLEAVE: usize = 4;

/// Largest dimension count for which `sqr_i8` is guaranteed not to wrap
/// (65025 per term at int8 range).
pub const MAX_SQR_I8_DIMS: usize = 33_025;

// =============================================================================
// SIMD Lane Counts by Architecture
// =============================================================================

/// Scalar "lane" width in bytes.
pub const LANES_SCALAR_BYTES: usize = 1;

// x86/x86_64 Constants (AVX2)
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use x86_constants::*;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86_constants {
    // AVX2 (256-bit registers)
    pub const LANES_AVX2_U64: usize = 4; // 256/64 = 4 u64 elements
    pub const LANES_AVX2_I32: usize = 8; // 256/32 = 8 i32 elements
    pub const LANES_AVX2_BYTES: usize = 32; // 256/8 = 32 byte elements
}

// NEON Constants (ARM64 only)
#[cfg(target_arch = "aarch64")]
pub use neon_constants::*;
#[cfg(target_arch = "aarch64")]
mod neon_constants {
    pub const LANES_NEON_BYTES: usize = 16; // 128/8 = 16 byte elements
}

/// Round `n` up to the next multiple of [`SCRATCH_ALIGNMENT`].
#[inline]
pub const fn round_up_to_alignment(n: usize) -> usize {
    (n + SCRATCH_ALIGNMENT - 1) & !(SCRATCH_ALIGNMENT - 1)
}

/// Scratch bytes needed for an input allocation of `capacity` bytes.
#[inline]
pub const fn scratch_capacity(capacity: usize) -> usize {
    round_up_to_alignment((capacity * SCRATCH_GROWTH_NUM).div_ceil(SCRATCH_GROWTH_DEN) + JSON_PADDING)
}
