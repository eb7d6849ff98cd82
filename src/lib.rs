//! # specfft - precomputed radix-2 power-spectrum engine
//!
//! Computes the magnitude spectrum of fixed-length real signals with a
//! radix-2 Cooley-Tukey FFT tuned for repeated evaluation: the bit-reversal
//! permutation and every butterfly's twiddle are precomputed once per width
//! into flat tables, and each pass runs as an independent data-parallel
//! sweep over packed two-complex values.
//!
//! ## What makes it fast
//!
//! - **Flat tables instead of recursion**: index permutations and twiddles
//!   are built once by [`SpectrumPlan`] and indexed directly on every call.
//! - **Packed butterflies**: the working buffer stores two complex numbers
//!   per 4-lane [`ComplexPair`], and the twiddle's sine is derived from the
//!   stored cosine by a square root, with its sign baked into the packed
//!   multiply's lane mask.
//! - **Pass-level parallelism** (optional `parallel` feature): every pass is
//!   a batch job over disjoint slots, so passes parallelize with no locking;
//!   only pass-to-pass ordering is enforced.
//!
//! ## Cargo features
//!
//! - `std` (default): standard library support
//! - `parallel`: run passes through Rayon above a configurable width
//! - `verbose-logging`: trace plan construction and transforms via `log`
//!
//! ## Example
//!
//! ```
//! use specfft::SpectrumAnalyzer;
//!
//! let n = 1024;
//! let input: Vec<f32> = (0..n)
//!     .map(|i| (2.0 * core::f32::consts::PI * 64.0 * i as f32 / n as f32).sin())
//!     .collect();
//!
//! let mut engine = SpectrumAnalyzer::new(n).unwrap();
//! let spectrum = engine.transform(&input).unwrap();
//! assert!((spectrum[64] - 1.0).abs() < 1e-3);
//! ```

#![no_std]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Packed pass execution: fused first pass, butterfly sweeps, postprocess.
pub mod butterfly;

/// Naive O(N²) DFT used as a correctness oracle, never in the hot path.
pub mod dft;

/// Scalar and packed complex types.
pub mod num;

/// Permutation and operator tables, plan cache, error type.
pub mod plan;

/// The transform engine owning the working buffers.
pub mod spectrum;

#[cfg(feature = "parallel")]
pub use butterfly::{set_parallel_batch_size, set_parallel_threshold};
pub use dft::naive_spectrum;
pub use num::{Complex32, ComplexPair};
pub use plan::{Operator, PermutationEntry, SpectrumError, SpectrumPlan, SpectrumPlanner};
pub use spectrum::SpectrumAnalyzer;
