// SPDX-License-Identifier: Apache-2.0

/// Test-only helpers.
///
/// Routes `log` output through the test harness; set `RUST_LOG=hwkit=trace` to see
/// tier selection and parser failures.
pub fn config_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic pseudo-random bytes (xorshift), for fixtures that must not depend on
/// proptest shrinking.
pub fn fixture_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}
