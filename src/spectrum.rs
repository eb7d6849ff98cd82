//! The transform engine.
//!
//! [`SpectrumAnalyzer`] owns the packed working buffer and the output buffer
//! for its whole lifetime, so repeated transforms allocate nothing. The
//! tables live in an [`Arc<SpectrumPlan>`] and can be shared by several
//! engines; the buffers cannot, which is why `transform` takes `&mut self`.
//! Dropping the engine releases everything deterministically.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use crate::butterfly;
use crate::num::ComplexPair;
use crate::plan::{SpectrumError, SpectrumPlan};

/// Radix-2 power-spectrum engine for one fixed width.
///
/// Construction precomputes the bit-reversal permutation and the butterfly
/// operator tables; every [`transform`](Self::transform) call reuses them.
/// Changing the width means building a new engine.
///
/// ```
/// use specfft::SpectrumAnalyzer;
///
/// let mut engine = SpectrumAnalyzer::new(8).unwrap();
/// let input = [0.0f32, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
/// let spectrum = engine.transform(&input).unwrap();
/// assert_eq!(spectrum.len(), 4);
/// ```
pub struct SpectrumAnalyzer {
    plan: Arc<SpectrumPlan>,
    packed: Vec<ComplexPair>,
    output: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create an engine for `width`-point input.
    ///
    /// `width` must be a power of two and at least 4.
    pub fn new(width: usize) -> Result<Self, SpectrumError> {
        Ok(Self::with_plan(Arc::new(SpectrumPlan::new(width)?)))
    }

    /// Create an engine over an existing plan.
    ///
    /// Plans are read-only and thread-safe; callers wanting concurrent
    /// transforms build one engine per thread over one shared plan instead
    /// of paying for the tables repeatedly.
    pub fn with_plan(plan: Arc<SpectrumPlan>) -> Self {
        let width = plan.width();
        Self {
            plan,
            packed: vec![ComplexPair::zero(); width / 2],
            output: vec![0.0; width / 2],
        }
    }

    /// Configured input width `N`.
    #[inline]
    pub fn width(&self) -> usize {
        self.plan.width()
    }

    /// Number of output bins (`N/2`).
    #[inline]
    pub fn bins(&self) -> usize {
        self.plan.width() / 2
    }

    /// The shared plan backing this engine.
    #[inline]
    pub fn plan(&self) -> &Arc<SpectrumPlan> {
        &self.plan
    }

    /// Magnitudes produced by the most recent transform.
    #[inline]
    pub fn spectrum(&self) -> &[f32] {
        &self.output
    }

    /// Compute the magnitude spectrum of `input`.
    ///
    /// Returns the `N/2` lower-half bins, each `|X_k| · 2/N`, as a view into
    /// the engine-owned output buffer; the view stays valid until the next
    /// call. Fails with [`SpectrumError::MismatchedLengths`] if `input` is
    /// not exactly `width` samples long, leaving previous output intact.
    pub fn transform(&mut self, input: &[f32]) -> Result<&[f32], SpectrumError> {
        if input.len() != self.plan.width() {
            return Err(SpectrumError::MismatchedLengths);
        }
        self.run(input);
        Ok(&self.output)
    }

    /// Like [`transform`](Self::transform), but writes the spectrum into a
    /// caller-provided buffer of length `N/2`.
    pub fn transform_into(&mut self, input: &[f32], out: &mut [f32]) -> Result<(), SpectrumError> {
        if input.len() != self.plan.width() || out.len() != self.plan.width() / 2 {
            return Err(SpectrumError::MismatchedLengths);
        }
        self.run(input);
        out.copy_from_slice(&self.output);
        Ok(())
    }

    /// Execute the fused first pass, every butterfly pass in order, and the
    /// postprocess sweep. Every slot of the working and output buffers is
    /// overwritten each call, so no state leaks across transforms.
    fn run(&mut self, input: &[f32]) {
        #[cfg(feature = "verbose-logging")]
        log::trace!(
            "{}-point transform, {} butterfly passes",
            self.plan.width(),
            self.plan.passes()
        );

        #[cfg(feature = "parallel")]
        if butterfly::should_parallelize(self.plan.width()) {
            butterfly::first_pass_parallel(input, self.plan.permutation(), &mut self.packed);
            for pass in 0..self.plan.passes() {
                // Passes are ordered; parallelism lives inside each pass.
                butterfly::butterfly_pass_parallel(
                    &mut self.packed,
                    self.plan.pass_operators(pass),
                );
            }
            butterfly::postprocess_parallel(&self.packed, self.plan.width(), &mut self.output);
            return;
        }

        butterfly::first_pass(input, self.plan.permutation(), &mut self.packed);
        for pass in 0..self.plan.passes() {
            butterfly::butterfly_pass(&mut self.packed, self.plan.pass_operators(pass));
        }
        butterfly::postprocess(&self.packed, self.plan.width(), &mut self.output);
    }
}
