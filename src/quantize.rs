// SPDX-License-Identifier: Apache-2.0

//! Quantized vector layouts
//!
//! Builders for the inputs of the `dot_bit4` kernels. Bits are packed MSB-first:
//! dimension `i` lands in byte `i / 8` at bit `7 - i % 8`. Both the stored vector and
//! every query plane use the same order, so
//! `dot_bit4(pack_as_binary(a), transpose_half_byte(q)) == Σ a[i] * q[i]`.

use crate::constants::QUERY_BIT_PLANES;

/// Bytes needed to hold one bit per dimension.
#[inline]
pub const fn packed_len(dims: usize) -> usize {
    dims.div_ceil(8)
}

/// Pack one bit per dimension. Any nonzero value sets the bit.
pub fn pack_as_binary(vector: &[u8]) -> Vec<u8> {
    let mut packed = vec![0u8; packed_len(vector.len())];
    for (i, &v) in vector.iter().enumerate() {
        if v != 0 {
            packed[i / 8] |= 0x80 >> (i % 8);
        }
    }
    packed
}

/// Split 4-bit values into [`QUERY_BIT_PLANES`] consecutive bit-planes of
/// `packed_len(q.len())` bytes each. Plane `j` holds bit `j` of every value.
pub fn transpose_half_byte(q: &[u8]) -> Vec<u8> {
    let stride = packed_len(q.len());
    let mut planes = vec![0u8; QUERY_BIT_PLANES * stride];
    for (i, &v) in q.iter().enumerate() {
        debug_assert!(v < 16, "value {} at {} does not fit in 4 bits", v, i);
        let mask = 0x80 >> (i % 8);
        for j in 0..QUERY_BIT_PLANES {
            if (v >> j) & 1 != 0 {
                planes[j * stride + i / 8] |= mask;
            }
        }
    }
    planes
}
