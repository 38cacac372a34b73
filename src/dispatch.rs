// SPDX-License-Identifier: Apache-2.0

//! # Kernel dispatch
//!
//! Chooses between the scalar kernels and the wide SIMD tier once per process and
//! exposes safe entry points that validate slice lengths before handing raw slices
//! to the selected kernels.
//!
//! The selection is a [`KernelSet`]: a table of function pointers filled in for one
//! [`CapabilityTier`]. After the first call every entry point is one indirect call,
//! with no per-call feature checks.
//!
//! ```rust
//! let a = [1i8, -2, 3];
//! let b = [4i8, 5, -6];
//! assert_eq!(hwkit::dot8s(&a, &b)?, 4 - 10 - 18);
//! assert_eq!(hwkit::sqr8s(&a, &b)?, 9 + 49 + 81);
//! # Ok::<(), hwkit::HwkitError>(())
//! ```

use lazy_static::lazy_static;
use log::{debug, trace};

use crate::constants::{LANES_SCALAR_BYTES, QUERY_BIT_PLANES};
use crate::distance;
use crate::types::{CapabilityTier, HwkitError, Result};

#[cfg(target_arch = "x86_64")]
use crate::constants::LANES_AVX2_BYTES;

#[cfg(target_arch = "aarch64")]
use crate::constants::LANES_NEON_BYTES;

#[cfg(target_arch = "aarch64")]
use std::arch::is_aarch64_feature_detected;

// =============================================================================
//  HARDWARE DETECTION
// =============================================================================

/// SIMD extensions present on the running CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareCapabilities {
    pub has_avx2: bool,
    pub has_neon: bool,
}

impl HardwareCapabilities {
    #[inline]
    pub fn detect() -> Self {
        HardwareCapabilities {
            has_avx2: Self::detect_avx2(),
            has_neon: Self::detect_neon(),
        }
    }

    fn detect_avx2() -> bool {
        #[allow(unused_mut)]
        let mut detected_avx2 = false;

        #[cfg(target_arch = "x86_64")]
        if is_x86_feature_detected!("avx2") {
            detected_avx2 = true;
        }

        detected_avx2
    }

    fn detect_neon() -> bool {
        #[allow(unused_mut)]
        let mut detected_neon = false;

        #[cfg(target_arch = "aarch64")]
        if is_aarch64_feature_detected!("neon") {
            detected_neon = true;
        }

        detected_neon
    }

    /// Highest tier these capabilities can run.
    pub fn best_tier(&self) -> CapabilityTier {
        if self.supports(CapabilityTier::Wide) {
            CapabilityTier::Wide
        } else {
            CapabilityTier::Scalar
        }
    }

    pub fn supports(&self, tier: CapabilityTier) -> bool {
        match tier {
            CapabilityTier::Scalar => true,
            CapabilityTier::Wide => self.has_avx2 || self.has_neon,
        }
    }
}

/// Capabilities of the running CPU, probed once per process.
#[inline]
pub fn get_hw_capabilities() -> &'static HardwareCapabilities {
    &HW_CAPS
}

/// Every tier the running CPU supports, lowest first.
pub fn available_tiers() -> Vec<CapabilityTier> {
    let caps = get_hw_capabilities();
    [CapabilityTier::Scalar, CapabilityTier::Wide]
        .into_iter()
        .filter(|&t| caps.supports(t))
        .collect()
}

// =============================================================================
//  KERNEL TABLE
// =============================================================================

pub type DotI8Fn = unsafe fn(&[i8], &[i8], usize) -> i32;
pub type DotBit4Fn = unsafe fn(&[u8], &[u8], usize) -> i64;
pub type DotBit4BulkFn = unsafe fn(&[u8], &[u8], usize, usize, &mut [f32]);
pub type DotBit4BulkOffsetsFn = unsafe fn(&[u8], &[u8], usize, usize, &[i32], usize, &mut [f32]);

/// Kernels of one tier, all with tier-independent signatures and results.
#[derive(Clone, Copy)]
pub struct KernelSet {
    tier: CapabilityTier,
    stride: usize,
    pub(crate) dot_i8: DotI8Fn,
    pub(crate) sqr_i8: DotI8Fn,
    pub(crate) dot_bit4: DotBit4Fn,
    pub(crate) dot_bit4_bulk: DotBit4BulkFn,
    pub(crate) dot_bit4_bulk_offsets: DotBit4BulkOffsetsFn,
}

impl std::fmt::Debug for KernelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelSet")
            .field("tier", &self.tier)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

lazy_static! {
    static ref HW_CAPS: HardwareCapabilities = HardwareCapabilities::detect();
    static ref KERNELS: KernelSet = KernelSet::select();
}

/// The process-wide kernel set. Selected on first use, never re-evaluated.
#[inline]
pub fn kernels() -> &'static KernelSet {
    &KERNELS
}

/// Tier of the process-wide kernel set.
#[inline]
pub fn detect_tier() -> CapabilityTier {
    KERNELS.tier
}

impl KernelSet {
    pub fn scalar() -> Self {
        KernelSet {
            tier: CapabilityTier::Scalar,
            stride: LANES_SCALAR_BYTES,
            dot_i8: distance::dot_i8_scalar,
            sqr_i8: distance::sqr_i8_scalar,
            dot_bit4: distance::dot_bit4_scalar,
            dot_bit4_bulk: distance::dot_bit4_bulk_scalar,
            dot_bit4_bulk_offsets: distance::dot_bit4_bulk_offsets_scalar,
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn wide() -> Option<Self> {
        Some(KernelSet {
            tier: CapabilityTier::Wide,
            stride: LANES_AVX2_BYTES,
            dot_i8: distance::dot_i8_avx2,
            sqr_i8: distance::sqr_i8_avx2,
            dot_bit4: distance::dot_bit4_avx2,
            dot_bit4_bulk: distance::dot_bit4_bulk_avx2,
            dot_bit4_bulk_offsets: distance::dot_bit4_bulk_offsets_avx2,
        })
    }

    #[cfg(target_arch = "aarch64")]
    fn wide() -> Option<Self> {
        Some(KernelSet {
            tier: CapabilityTier::Wide,
            stride: LANES_NEON_BYTES,
            dot_i8: distance::dot_i8_neon,
            sqr_i8: distance::sqr_i8_neon,
            dot_bit4: distance::dot_bit4_neon,
            dot_bit4_bulk: distance::dot_bit4_bulk_neon,
            dot_bit4_bulk_offsets: distance::dot_bit4_bulk_offsets_neon,
        })
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn wide() -> Option<Self> {
        None
    }

    /// Kernels for `tier`, or `Unsupported` if the running CPU lacks it.
    pub fn for_tier(tier: CapabilityTier) -> Result<Self> {
        if !get_hw_capabilities().supports(tier) {
            return Err(HwkitError::Unsupported(format!(
                "{:?} tier is not available on this CPU",
                tier
            )));
        }
        match tier {
            CapabilityTier::Scalar => Ok(Self::scalar()),
            CapabilityTier::Wide => Self::wide().ok_or_else(|| {
                HwkitError::Unsupported("no wide kernels for this architecture".to_string())
            }),
        }
    }

    fn select() -> Self {
        if cfg!(feature = "disable-hwkit") {
            debug!("kernel tier forced to Scalar (disable-hwkit)");
            return Self::scalar();
        }
        let caps = get_hw_capabilities();
        let set = Self::for_tier(caps.best_tier()).unwrap_or_else(|_| Self::scalar());
        debug!(
            "selected kernel tier {:?} (avx2={}, neon={}, stride={})",
            set.tier, caps.has_avx2, caps.has_neon, set.stride
        );
        set
    }

    #[inline]
    pub fn tier(&self) -> CapabilityTier {
        self.tier
    }

    /// Natural block width of the fast path, in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn dot8s(&self, a: &[i8], b: &[i8]) -> Result<i32> {
        check_same_len("dot8s", a.len(), b.len())?;
        Ok(unsafe { (self.dot_i8)(a, b, a.len()) })
    }

    pub fn sqr8s(&self, a: &[i8], b: &[i8]) -> Result<i32> {
        check_same_len("sqr8s", a.len(), b.len())?;
        Ok(unsafe { (self.sqr_i8)(a, b, a.len()) })
    }

    /// `a` is a packed 1-bit vector, `query` its four bit-planes of `a.len()` bytes.
    pub fn dot_int1_int4(&self, a: &[u8], query: &[u8]) -> Result<i64> {
        let length = a.len();
        check_query_len(query, length)?;
        Ok(unsafe { (self.dot_bit4)(a, query, length) })
    }

    /// Scores `results.len()` candidates stored back to back in `a`.
    pub fn dot_int1_int4_bulk(
        &self,
        a: &[u8],
        query: &[u8],
        length: usize,
        results: &mut [f32],
    ) -> Result<()> {
        let count = results.len();
        check_query_len(query, length)?;
        let needed = count.checked_mul(length).ok_or_else(|| {
            HwkitError::InvalidInput(format!("{} candidates of {} bytes overflow", count, length))
        })?;
        if a.len() < needed {
            return Err(HwkitError::InvalidInput(format!(
                "{} candidates of {} bytes need {} bytes, got {}",
                count,
                length,
                needed,
                a.len()
            )));
        }
        unsafe { (self.dot_bit4_bulk)(a, query, length, count, results) };
        Ok(())
    }

    /// Scores candidate `c` at `a[offsets[c] * pitch..]` into `results[c]`.
    pub fn dot_int1_int4_bulk_offsets(
        &self,
        a: &[u8],
        query: &[u8],
        length: usize,
        pitch: usize,
        offsets: &[i32],
        results: &mut [f32],
    ) -> Result<()> {
        let count = offsets.len();
        check_query_len(query, length)?;
        if results.len() < count {
            return Err(HwkitError::InvalidInput(format!(
                "results holds {} slots for {} candidates",
                results.len(),
                count
            )));
        }
        for (c, &o) in offsets.iter().enumerate() {
            let end = usize::try_from(o)
                .ok()
                .and_then(|o| o.checked_mul(pitch))
                .and_then(|start| start.checked_add(length));
            match end {
                Some(end) if end <= a.len() => {}
                _ => {
                    return Err(HwkitError::InvalidInput(format!(
                        "candidate {} at offset {} (pitch {}) is outside the {} byte arena",
                        c,
                        o,
                        pitch,
                        a.len()
                    )))
                }
            }
        }
        unsafe { (self.dot_bit4_bulk_offsets)(a, query, length, pitch, offsets, count, results) };
        Ok(())
    }
}

fn check_same_len(op: &str, a: usize, b: usize) -> Result<()> {
    if a != b {
        return Err(HwkitError::InvalidInput(format!(
            "Vector length mismatch in {}: a={}, b={}",
            op, a, b
        )));
    }
    Ok(())
}

fn check_query_len(query: &[u8], length: usize) -> Result<()> {
    if length.checked_mul(QUERY_BIT_PLANES) != Some(query.len()) {
        return Err(HwkitError::InvalidInput(format!(
            "query of {} bytes is not {} bit-planes of {} bytes",
            query.len(),
            QUERY_BIT_PLANES,
            length
        )));
    }
    Ok(())
}

// =============================================================================
//  PUBLIC ENTRY POINTS
// =============================================================================

/// Tier code of the selected kernels: 0 scalar, 1 wide.
#[inline]
pub fn vec_caps() -> i32 {
    detect_tier().code()
}

/// Exact int8 dot product, wrapping `i32` accumulation.
pub fn dot8s(a: &[i8], b: &[i8]) -> Result<i32> {
    kernels().dot8s(a, b)
}

/// Exact int8 squared euclidean distance. Cannot wrap below
/// [`crate::constants::MAX_SQR_I8_DIMS`] dimensions.
pub fn sqr8s(a: &[i8], b: &[i8]) -> Result<i32> {
    kernels().sqr8s(a, b)
}

/// `Σ_j popcount(a & plane_j) << j` over the four bit-planes of `query`.
pub fn vec_dot_int1_int4(a: &[u8], query: &[u8]) -> Result<i64> {
    kernels().dot_int1_int4(a, query)
}

pub fn vec_dot_int1_int4_bulk(
    a: &[u8],
    query: &[u8],
    length: usize,
    results: &mut [f32],
) -> Result<()> {
    trace!(
        "VEC_DOT_INT1_INT4_BULK DISPATCH: length={}, count={}, tier={:?}",
        length,
        results.len(),
        detect_tier()
    );
    kernels().dot_int1_int4_bulk(a, query, length, results)
}

pub fn vec_dot_int1_int4_bulk_offsets(
    a: &[u8],
    query: &[u8],
    length: usize,
    pitch: usize,
    offsets: &[i32],
    results: &mut [f32],
) -> Result<()> {
    trace!(
        "VEC_DOT_INT1_INT4_BULK_OFFSETS DISPATCH: length={}, pitch={}, count={}, tier={:?}",
        length,
        pitch,
        offsets.len(),
        detect_tier()
    );
    kernels().dot_int1_int4_bulk_offsets(a, query, length, pitch, offsets, results)
}

#[inline]
pub fn dot8s_stride() -> usize {
    kernels().stride()
}

#[inline]
pub fn sqr8s_stride() -> usize {
    kernels().stride()
}
