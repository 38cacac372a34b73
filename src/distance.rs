// SPDX-License-Identifier: Apache-2.0

//! Quantized distance kernels
//!
//! Integer similarity kernels over quantized vectors, one implementation per
//! capability tier:
//!
//! - `dot_i8` / `sqr_i8`: dot product and squared euclidean distance of int8 vectors,
//!   accumulated in wrapping `i32`
//! - `dot_bit4`: a 1-bit stored vector against a 4-bit query given as four bit-planes,
//!   `Σ_j popcount(a & plane_j) << j`
//! - bulk `dot_bit4` over many candidates, either packed back to back or gathered
//!   through an offsets table
//!
//! Every tier returns exactly what the scalar reference returns. Vector tiers only
//! change how the sums are formed, never their value.
//!
//! ## Safety
//! Kernels are `unsafe` and do no bounds checks beyond `debug_assert!`. Callers
//! guarantee that `a`/`b` hold `dims` elements, that `query` holds
//! `QUERY_BIT_PLANES * length` bytes, that every candidate lies inside `a`, and that
//! `results` holds `count` slots. [`crate::dispatch`] checks this once per call.

#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::all)]

use crate::constants::{BULK_INTERLEAVE, QUERY_BIT_PLANES};

#[cfg(target_arch = "x86_64")]
use crate::constants::{LANES_AVX2_BYTES, LANES_AVX2_I32, LANES_AVX2_U64};

#[cfg(target_arch = "aarch64")]
use crate::constants::LANES_NEON_BYTES;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m256i, _mm256_add_epi32, _mm256_add_epi64, _mm256_add_epi8, _mm256_and_si256,
    _mm256_castsi256_si128, _mm256_cvtepi8_epi16, _mm256_extracti128_si256,
    _mm256_loadu_si256, _mm256_madd_epi16, _mm256_sad_epu8, _mm256_set1_epi8,
    _mm256_setr_epi8, _mm256_setzero_si256, _mm256_shuffle_epi8, _mm256_slli_epi64,
    _mm256_srli_epi16, _mm256_storeu_si256, _mm256_sub_epi16,
};

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::{
    uint8x16_t, vaddlvq_u8, vaddvq_s32, vandq_u8, vcntq_u8, vdupq_n_s32, vget_low_s16,
    vget_low_s8, vld1q_s8, vld1q_u8, vmlal_high_s16, vmlal_s16, vmull_high_s8, vmull_s8,
    vpadalq_s16, vsubl_high_s8, vsubl_s8,
};

// =============================================================================
// CANDIDATE ADDRESSING
// =============================================================================

/// Maps a candidate index to the byte offset of its vector inside the arena.
///
/// The bulk kernels are generic over this, so the contiguous and gathered
/// variants share one loop body.
pub trait OffsetMapper: Copy {
    fn offset(&self, c: usize) -> usize;
}

/// Candidates stored back to back, `pitch` bytes apart.
#[derive(Debug, Clone, Copy)]
pub struct Contiguous {
    pub pitch: usize,
}

impl OffsetMapper for Contiguous {
    #[inline(always)]
    fn offset(&self, c: usize) -> usize {
        c * self.pitch
    }
}

/// Candidate `c` lives at `offsets[c] * pitch`.
#[derive(Debug, Clone, Copy)]
pub struct Indexed<'a> {
    pub offsets: &'a [i32],
    pub pitch: usize,
}

impl OffsetMapper for Indexed<'_> {
    #[inline(always)]
    fn offset(&self, c: usize) -> usize {
        let o = self.offsets[c];
        debug_assert!(o >= 0, "negative candidate offset {}", o);
        o as usize * self.pitch
    }
}

#[inline(always)]
fn debug_check_bulk<M: OffsetMapper>(
    a: &[u8],
    query: &[u8],
    length: usize,
    map: M,
    count: usize,
    results: &[f32],
) {
    debug_assert!(query.len() >= QUERY_BIT_PLANES * length);
    debug_assert!(results.len() >= count);
    debug_assert!((0..count).all(|c| map.offset(c) + length <= a.len()));
}

// =============================================================================
// SCALAR REFERENCE
// =============================================================================

/// Scalar int8 dot product. This is the reference every tier must match.
pub unsafe fn dot_i8_scalar(a: &[i8], b: &[i8], dims: usize) -> i32 {
    debug_assert!(a.len() >= dims && b.len() >= dims);
    let mut sum = 0i32;
    for i in 0..dims {
        sum = sum.wrapping_add(*a.get_unchecked(i) as i32 * *b.get_unchecked(i) as i32);
    }
    sum
}

pub unsafe fn sqr_i8_scalar(a: &[i8], b: &[i8], dims: usize) -> i32 {
    debug_assert!(a.len() >= dims && b.len() >= dims);
    let mut sum = 0i32;
    for i in 0..dims {
        let d = *a.get_unchecked(i) as i32 - *b.get_unchecked(i) as i32;
        sum = sum.wrapping_add(d * d);
    }
    sum
}

// Bytes [from, length) of one candidate against all four planes.
#[inline(always)]
unsafe fn dot_bit4_tail(pa: *const u8, q: *const u8, from: usize, length: usize) -> i64 {
    let mut sum = 0i64;
    for i in from..length {
        let v = *pa.add(i);
        for j in 0..QUERY_BIT_PLANES {
            sum += ((v & *q.add(j * length + i)).count_ones() as i64) << j;
        }
    }
    sum
}

pub unsafe fn dot_bit4_scalar(a: &[u8], query: &[u8], length: usize) -> i64 {
    debug_assert!(a.len() >= length && query.len() >= QUERY_BIT_PLANES * length);
    dot_bit4_tail(a.as_ptr(), query.as_ptr(), 0, length)
}

// The scalar tier has no interleaving: one single-vector call per candidate.
unsafe fn dot_bit4_mapped_scalar<M: OffsetMapper>(
    a: &[u8],
    query: &[u8],
    length: usize,
    map: M,
    count: usize,
    results: &mut [f32],
) {
    debug_check_bulk(a, query, length, map, count, results);
    let base = a.as_ptr();
    for c in 0..count {
        let pa = base.add(map.offset(c));
        *results.get_unchecked_mut(c) = dot_bit4_tail(pa, query.as_ptr(), 0, length) as f32;
    }
}

pub unsafe fn dot_bit4_bulk_scalar(
    a: &[u8],
    query: &[u8],
    length: usize,
    count: usize,
    results: &mut [f32],
) {
    dot_bit4_mapped_scalar(a, query, length, Contiguous { pitch: length }, count, results)
}

pub unsafe fn dot_bit4_bulk_offsets_scalar(
    a: &[u8],
    query: &[u8],
    length: usize,
    pitch: usize,
    offsets: &[i32],
    count: usize,
    results: &mut [f32],
) {
    dot_bit4_mapped_scalar(a, query, length, Indexed { offsets, pitch }, count, results)
}

// =============================================================================
// AVX2
// =============================================================================

// AVX2 int8 dot product.
//
// Each 32-byte block is sign-extended to two halves of 16 i16 lanes and multiplied
// with `madd_epi16`, so -128 * -128 is exact. Lanes accumulate in wrapping i32.
//
// # Safety
// Requires AVX2 support. Use `is_x86_feature_detected!("avx2")` before calling.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub unsafe fn dot_i8_avx2(a: &[i8], b: &[i8], dims: usize) -> i32 {
    debug_assert!(a.len() >= dims && b.len() >= dims);
    const LANES: usize = LANES_AVX2_BYTES;
    let simd_len = dims & !(LANES - 1);
    let pa = a.as_ptr();
    let pb = b.as_ptr();
    let mut acc = _mm256_setzero_si256();

    let mut i = 0;
    while i < simd_len {
        let va = _mm256_loadu_si256(pa.add(i).cast());
        let vb = _mm256_loadu_si256(pb.add(i).cast());
        let a_lo = _mm256_cvtepi8_epi16(_mm256_castsi256_si128(va));
        let b_lo = _mm256_cvtepi8_epi16(_mm256_castsi256_si128(vb));
        let a_hi = _mm256_cvtepi8_epi16(_mm256_extracti128_si256(va, 1));
        let b_hi = _mm256_cvtepi8_epi16(_mm256_extracti128_si256(vb, 1));
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(a_lo, b_lo));
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(a_hi, b_hi));
        i += LANES;
    }

    let mut sum = hsum_epi32_avx2(acc);
    for i in simd_len..dims {
        sum = sum.wrapping_add(*pa.add(i) as i32 * *pb.add(i) as i32);
    }
    sum
}

// AVX2 int8 squared distance. Differences are taken in i16 (range ±255) and squared
// pairwise with `madd_epi16`.
//
// # Safety
// Requires AVX2 support. Use `is_x86_feature_detected!("avx2")` before calling.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub unsafe fn sqr_i8_avx2(a: &[i8], b: &[i8], dims: usize) -> i32 {
    debug_assert!(a.len() >= dims && b.len() >= dims);
    const LANES: usize = LANES_AVX2_BYTES;
    let simd_len = dims & !(LANES - 1);
    let pa = a.as_ptr();
    let pb = b.as_ptr();
    let mut acc = _mm256_setzero_si256();

    let mut i = 0;
    while i < simd_len {
        let va = _mm256_loadu_si256(pa.add(i).cast());
        let vb = _mm256_loadu_si256(pb.add(i).cast());
        let d_lo = _mm256_sub_epi16(
            _mm256_cvtepi8_epi16(_mm256_castsi256_si128(va)),
            _mm256_cvtepi8_epi16(_mm256_castsi256_si128(vb)),
        );
        let d_hi = _mm256_sub_epi16(
            _mm256_cvtepi8_epi16(_mm256_extracti128_si256(va, 1)),
            _mm256_cvtepi8_epi16(_mm256_extracti128_si256(vb, 1)),
        );
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(d_lo, d_lo));
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(d_hi, d_hi));
        i += LANES;
    }

    let mut sum = hsum_epi32_avx2(acc);
    for i in simd_len..dims {
        let d = *pa.add(i) as i32 - *pb.add(i) as i32;
        sum = sum.wrapping_add(d * d);
    }
    sum
}

#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn hsum_epi32_avx2(v: __m256i) -> i32 {
    let mut lanes = [0i32; LANES_AVX2_I32];
    _mm256_storeu_si256(lanes.as_mut_ptr().cast(), v);
    lanes.iter().fold(0i32, |s, &x| s.wrapping_add(x))
}

#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn hsum_epi64_avx2(v: __m256i) -> i64 {
    let mut lanes = [0u64; LANES_AVX2_U64];
    _mm256_storeu_si256(lanes.as_mut_ptr().cast(), v);
    lanes.iter().sum::<u64>() as i64
}

// Per-byte popcount through a nibble lookup, summed into four u64 lanes.
#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn popcnt_epi64_avx2(v: __m256i) -> __m256i {
    let lut = _mm256_setr_epi8(
        0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4, //
        0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4,
    );
    let low_mask = _mm256_set1_epi8(0x0f);
    let lo = _mm256_and_si256(v, low_mask);
    let hi = _mm256_and_si256(_mm256_srli_epi16(v, 4), low_mask);
    let counts = _mm256_add_epi8(_mm256_shuffle_epi8(lut, lo), _mm256_shuffle_epi8(lut, hi));
    _mm256_sad_epu8(counts, _mm256_setzero_si256())
}

// One 32-byte block of a candidate against the four query planes, weighted by plane.
#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn weighted_block_avx2(va: __m256i, planes: &[__m256i; QUERY_BIT_PLANES]) -> __m256i {
    let p0 = popcnt_epi64_avx2(_mm256_and_si256(va, planes[0]));
    let p1 = popcnt_epi64_avx2(_mm256_and_si256(va, planes[1]));
    let p2 = popcnt_epi64_avx2(_mm256_and_si256(va, planes[2]));
    let p3 = popcnt_epi64_avx2(_mm256_and_si256(va, planes[3]));
    _mm256_add_epi64(
        _mm256_add_epi64(p0, _mm256_slli_epi64(p1, 1)),
        _mm256_add_epi64(_mm256_slli_epi64(p2, 2), _mm256_slli_epi64(p3, 3)),
    )
}

#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load_planes_avx2(q: *const u8, length: usize, i: usize) -> [__m256i; QUERY_BIT_PLANES] {
    [
        _mm256_loadu_si256(q.add(i).cast()),
        _mm256_loadu_si256(q.add(length + i).cast()),
        _mm256_loadu_si256(q.add(2 * length + i).cast()),
        _mm256_loadu_si256(q.add(3 * length + i).cast()),
    ]
}

// AVX2 1-bit x 4-bit asymmetric dot product.
//
// # Safety
// Requires AVX2 support. Use `is_x86_feature_detected!("avx2")` before calling.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub unsafe fn dot_bit4_avx2(a: &[u8], query: &[u8], length: usize) -> i64 {
    debug_assert!(a.len() >= length && query.len() >= QUERY_BIT_PLANES * length);
    const LANES: usize = LANES_AVX2_BYTES;
    let simd_len = length & !(LANES - 1);
    let pa = a.as_ptr();
    let q = query.as_ptr();
    let mut acc = _mm256_setzero_si256();

    let mut i = 0;
    while i < simd_len {
        let planes = load_planes_avx2(q, length, i);
        let va = _mm256_loadu_si256(pa.add(i).cast());
        acc = _mm256_add_epi64(acc, weighted_block_avx2(va, &planes));
        i += LANES;
    }

    hsum_epi64_avx2(acc) + dot_bit4_tail(pa, q, simd_len, length)
}

// Bulk kernel: candidates are scored four at a time so each query block is loaded
// once per group instead of once per candidate.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn dot_bit4_mapped_avx2<M: OffsetMapper>(
    a: &[u8],
    query: &[u8],
    length: usize,
    map: M,
    count: usize,
    results: &mut [f32],
) {
    debug_check_bulk(a, query, length, map, count, results);
    const LANES: usize = LANES_AVX2_BYTES;
    let simd_len = length & !(LANES - 1);
    let base = a.as_ptr();
    let q = query.as_ptr();

    let mut c = 0;
    while c + BULK_INTERLEAVE <= count {
        let p0 = base.add(map.offset(c));
        let p1 = base.add(map.offset(c + 1));
        let p2 = base.add(map.offset(c + 2));
        let p3 = base.add(map.offset(c + 3));
        let mut acc0 = _mm256_setzero_si256();
        let mut acc1 = _mm256_setzero_si256();
        let mut acc2 = _mm256_setzero_si256();
        let mut acc3 = _mm256_setzero_si256();

        let mut i = 0;
        while i < simd_len {
            let planes = load_planes_avx2(q, length, i);
            acc0 = _mm256_add_epi64(acc0, weighted_block_avx2(_mm256_loadu_si256(p0.add(i).cast()), &planes));
            acc1 = _mm256_add_epi64(acc1, weighted_block_avx2(_mm256_loadu_si256(p1.add(i).cast()), &planes));
            acc2 = _mm256_add_epi64(acc2, weighted_block_avx2(_mm256_loadu_si256(p2.add(i).cast()), &planes));
            acc3 = _mm256_add_epi64(acc3, weighted_block_avx2(_mm256_loadu_si256(p3.add(i).cast()), &planes));
            i += LANES;
        }

        let out = results.as_mut_ptr().add(c);
        *out = (hsum_epi64_avx2(acc0) + dot_bit4_tail(p0, q, simd_len, length)) as f32;
        *out.add(1) = (hsum_epi64_avx2(acc1) + dot_bit4_tail(p1, q, simd_len, length)) as f32;
        *out.add(2) = (hsum_epi64_avx2(acc2) + dot_bit4_tail(p2, q, simd_len, length)) as f32;
        *out.add(3) = (hsum_epi64_avx2(acc3) + dot_bit4_tail(p3, q, simd_len, length)) as f32;
        c += BULK_INTERLEAVE;
    }

    while c < count {
        let pa = std::slice::from_raw_parts(base.add(map.offset(c)), length);
        *results.get_unchecked_mut(c) = dot_bit4_avx2(pa, query, length) as f32;
        c += 1;
    }
}

// # Safety
// Requires AVX2 support. Use `is_x86_feature_detected!("avx2")` before calling.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub unsafe fn dot_bit4_bulk_avx2(
    a: &[u8],
    query: &[u8],
    length: usize,
    count: usize,
    results: &mut [f32],
) {
    dot_bit4_mapped_avx2(a, query, length, Contiguous { pitch: length }, count, results)
}

// # Safety
// Requires AVX2 support. Use `is_x86_feature_detected!("avx2")` before calling.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub unsafe fn dot_bit4_bulk_offsets_avx2(
    a: &[u8],
    query: &[u8],
    length: usize,
    pitch: usize,
    offsets: &[i32],
    count: usize,
    results: &mut [f32],
) {
    dot_bit4_mapped_avx2(a, query, length, Indexed { offsets, pitch }, count, results)
}

// =============================================================================
// NEON
// =============================================================================

// NEON int8 dot product.
//
// Processes 16 bytes per iteration: widening multiplies into i16, pairwise
// accumulation into four wrapping i32 lanes.
//
// # Safety
// Requires NEON support. Use NEON-enabled target before calling.
#[cfg(target_arch = "aarch64")]
pub unsafe fn dot_i8_neon(a: &[i8], b: &[i8], dims: usize) -> i32 {
    debug_assert!(a.len() >= dims && b.len() >= dims);
    const LANES: usize = LANES_NEON_BYTES;
    let simd_len = dims & !(LANES - 1);
    let pa = a.as_ptr();
    let pb = b.as_ptr();
    let mut acc = vdupq_n_s32(0);

    let mut i = 0;
    while i < simd_len {
        let va = vld1q_s8(pa.add(i));
        let vb = vld1q_s8(pb.add(i));
        acc = vpadalq_s16(acc, vmull_s8(vget_low_s8(va), vget_low_s8(vb)));
        acc = vpadalq_s16(acc, vmull_high_s8(va, vb));
        i += LANES;
    }

    let mut sum = vaddvq_s32(acc);
    for i in simd_len..dims {
        sum = sum.wrapping_add(*pa.add(i) as i32 * *pb.add(i) as i32);
    }
    sum
}

// NEON int8 squared distance.
//
// # Safety
// Requires NEON support. Use NEON-enabled target before calling.
#[cfg(target_arch = "aarch64")]
pub unsafe fn sqr_i8_neon(a: &[i8], b: &[i8], dims: usize) -> i32 {
    debug_assert!(a.len() >= dims && b.len() >= dims);
    const LANES: usize = LANES_NEON_BYTES;
    let simd_len = dims & !(LANES - 1);
    let pa = a.as_ptr();
    let pb = b.as_ptr();
    let mut acc = vdupq_n_s32(0);

    let mut i = 0;
    while i < simd_len {
        let va = vld1q_s8(pa.add(i));
        let vb = vld1q_s8(pb.add(i));
        let d_lo = vsubl_s8(vget_low_s8(va), vget_low_s8(vb));
        let d_hi = vsubl_high_s8(va, vb);
        acc = vmlal_s16(acc, vget_low_s16(d_lo), vget_low_s16(d_lo));
        acc = vmlal_high_s16(acc, d_lo, d_lo);
        acc = vmlal_s16(acc, vget_low_s16(d_hi), vget_low_s16(d_hi));
        acc = vmlal_high_s16(acc, d_hi, d_hi);
        i += LANES;
    }

    let mut sum = vaddvq_s32(acc);
    for i in simd_len..dims {
        let d = *pa.add(i) as i32 - *pb.add(i) as i32;
        sum = sum.wrapping_add(d * d);
    }
    sum
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
unsafe fn weighted_block_neon(va: uint8x16_t, planes: &[uint8x16_t; QUERY_BIT_PLANES]) -> i64 {
    let p0 = vaddlvq_u8(vcntq_u8(vandq_u8(va, planes[0]))) as i64;
    let p1 = vaddlvq_u8(vcntq_u8(vandq_u8(va, planes[1]))) as i64;
    let p2 = vaddlvq_u8(vcntq_u8(vandq_u8(va, planes[2]))) as i64;
    let p3 = vaddlvq_u8(vcntq_u8(vandq_u8(va, planes[3]))) as i64;
    p0 + (p1 << 1) + (p2 << 2) + (p3 << 3)
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
unsafe fn load_planes_neon(q: *const u8, length: usize, i: usize) -> [uint8x16_t; QUERY_BIT_PLANES] {
    [
        vld1q_u8(q.add(i)),
        vld1q_u8(q.add(length + i)),
        vld1q_u8(q.add(2 * length + i)),
        vld1q_u8(q.add(3 * length + i)),
    ]
}

// NEON 1-bit x 4-bit asymmetric dot product.
//
// # Safety
// Requires NEON support. Use NEON-enabled target before calling.
#[cfg(target_arch = "aarch64")]
pub unsafe fn dot_bit4_neon(a: &[u8], query: &[u8], length: usize) -> i64 {
    debug_assert!(a.len() >= length && query.len() >= QUERY_BIT_PLANES * length);
    const LANES: usize = LANES_NEON_BYTES;
    let simd_len = length & !(LANES - 1);
    let pa = a.as_ptr();
    let q = query.as_ptr();
    let mut sum = 0i64;

    let mut i = 0;
    while i < simd_len {
        let planes = load_planes_neon(q, length, i);
        sum += weighted_block_neon(vld1q_u8(pa.add(i)), &planes);
        i += LANES;
    }

    sum + dot_bit4_tail(pa, q, simd_len, length)
}

#[cfg(target_arch = "aarch64")]
unsafe fn dot_bit4_mapped_neon<M: OffsetMapper>(
    a: &[u8],
    query: &[u8],
    length: usize,
    map: M,
    count: usize,
    results: &mut [f32],
) {
    debug_check_bulk(a, query, length, map, count, results);
    const LANES: usize = LANES_NEON_BYTES;
    let simd_len = length & !(LANES - 1);
    let base = a.as_ptr();
    let q = query.as_ptr();

    let mut c = 0;
    while c + BULK_INTERLEAVE <= count {
        let p0 = base.add(map.offset(c));
        let p1 = base.add(map.offset(c + 1));
        let p2 = base.add(map.offset(c + 2));
        let p3 = base.add(map.offset(c + 3));
        let (mut s0, mut s1, mut s2, mut s3) = (0i64, 0i64, 0i64, 0i64);

        let mut i = 0;
        while i < simd_len {
            let planes = load_planes_neon(q, length, i);
            s0 += weighted_block_neon(vld1q_u8(p0.add(i)), &planes);
            s1 += weighted_block_neon(vld1q_u8(p1.add(i)), &planes);
            s2 += weighted_block_neon(vld1q_u8(p2.add(i)), &planes);
            s3 += weighted_block_neon(vld1q_u8(p3.add(i)), &planes);
            i += LANES;
        }

        let out = results.as_mut_ptr().add(c);
        *out = (s0 + dot_bit4_tail(p0, q, simd_len, length)) as f32;
        *out.add(1) = (s1 + dot_bit4_tail(p1, q, simd_len, length)) as f32;
        *out.add(2) = (s2 + dot_bit4_tail(p2, q, simd_len, length)) as f32;
        *out.add(3) = (s3 + dot_bit4_tail(p3, q, simd_len, length)) as f32;
        c += BULK_INTERLEAVE;
    }

    while c < count {
        let pa = std::slice::from_raw_parts(base.add(map.offset(c)), length);
        *results.get_unchecked_mut(c) = dot_bit4_neon(pa, query, length) as f32;
        c += 1;
    }
}

#[cfg(target_arch = "aarch64")]
pub unsafe fn dot_bit4_bulk_neon(
    a: &[u8],
    query: &[u8],
    length: usize,
    count: usize,
    results: &mut [f32],
) {
    dot_bit4_mapped_neon(a, query, length, Contiguous { pitch: length }, count, results)
}

#[cfg(target_arch = "aarch64")]
pub unsafe fn dot_bit4_bulk_offsets_neon(
    a: &[u8],
    query: &[u8],
    length: usize,
    pitch: usize,
    offsets: &[i32],
    count: usize,
    results: &mut [f32],
) {
    dot_bit4_mapped_neon(a, query, length, Indexed { offsets, pitch }, count, results)
}
