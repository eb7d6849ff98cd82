//! Naive O(N²) DFT, the correctness oracle.
//!
//! Direct summation with per-term trigonometry. Never used by the engine;
//! it exists so tests (and doubtful callers) can pin the fast path against
//! an implementation with no tables, no packing, and no derived sines.

use alloc::vec::Vec;

use crate::num::{cosf, sinf};

/// Magnitude spectrum of `input` by direct summation.
///
/// Produces `N/2` bins with the same contract as the engine: bin `k` is
/// `|Σ x[n]·e^{-2πi·k·n/N}| · 2/N`.
pub fn naive_spectrum(input: &[f32]) -> Vec<f32> {
    let n = input.len();
    let mut out = Vec::with_capacity(n / 2);
    for k in 0..n / 2 {
        let mut acc_re = 0.0f32;
        let mut acc_im = 0.0f32;
        for (i, &x) in input.iter().enumerate() {
            let t = 2.0 * core::f32::consts::PI / n as f32 * k as f32 * i as f32;
            acc_re += cosf(t) * x;
            acc_im += -sinf(t) * x;
        }
        let modulus = crate::num::sqrtf(acc_re * acc_re + acc_im * acc_im);
        out.push(modulus * 2.0 / n as f32);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn impulse_is_flat() {
        let mut input = vec![0.0f32; 16];
        input[0] = 1.0;
        let spectrum = naive_spectrum(&input);
        assert_eq!(spectrum.len(), 8);
        for &bin in &spectrum {
            assert!((bin - 2.0 / 16.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cosine_peaks_at_its_frequency() {
        let n = 64usize;
        let input: Vec<f32> = (0..n)
            .map(|i| cosf(2.0 * core::f32::consts::PI * 5.0 * i as f32 / n as f32))
            .collect();
        let spectrum = naive_spectrum(&input);
        assert!((spectrum[5] - 1.0).abs() < 1e-3);
        for (k, &bin) in spectrum.iter().enumerate() {
            if k != 5 {
                assert!(bin < 1e-3, "bin {} = {}", k, bin);
            }
        }
    }
}
