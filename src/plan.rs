//! Precomputed transform plans.
//!
//! A [`SpectrumPlan`] replaces the recursive bit-reversal and per-call
//! trigonometry of a textbook radix-2 FFT with two flat tables built once per
//! width: the fused bit-reversal permutation ([`PermutationEntry`]) and the
//! full butterfly operator sequence ([`Operator`]). Plans are immutable after
//! construction and safe to share across threads; [`SpectrumPlanner`] caches
//! them per width so repeated engine construction reuses the same tables.

use core::f32::consts::PI;

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::num::{cosf, sqrtf, ComplexPair};

/// Errors reported by plan construction and transform calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumError {
    /// Requested width is not a power of two.
    WidthNotPowerOfTwo,
    /// Requested width is below the 4-point minimum.
    WidthTooSmall,
    /// Input or output slice length does not match the configured width.
    MismatchedLengths,
}

impl core::fmt::Display for SpectrumError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SpectrumError::WidthNotPowerOfTwo => write!(f, "width must be a power of two"),
            SpectrumError::WidthTooSmall => write!(f, "width must be at least 4"),
            SpectrumError::MismatchedLengths => {
                write!(f, "slice length does not match configured width")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SpectrumError {}

/// Bit-reversed source positions for two adjacent output slots.
///
/// Entry `i` of the permutation table holds the reversed indices of source
/// positions `2i` and `2i+1`, feeding the fused first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationEntry {
    pub a: u32,
    pub b: u32,
}

/// One butterfly instruction: the two packed-buffer slots it combines plus
/// the cosines of its two adjacent twiddle angles.
///
/// Only `cos θ` is stored per lane. The matching sine magnitude is derived on
/// use as `sqrt(1 - cos²θ)`, trading a trigonometric evaluation for a square
/// root. That derivation drops the sign of the sine, which is legal here only
/// because every angle the table generator emits lies in `(-π, 0]`, so the
/// sine sign is a constant folded into the packed multiply's cross-term mask
/// (see [`ComplexPair::mul_packed`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operator {
    i1: u32,
    i2: u32,
    w: [f32; 2],
}

impl Operator {
    /// First packed-buffer slot touched by this butterfly.
    #[inline(always)]
    pub fn i1(&self) -> usize {
        self.i1 as usize
    }

    /// Second packed-buffer slot touched by this butterfly.
    #[inline(always)]
    pub fn i2(&self) -> usize {
        self.i2 as usize
    }

    /// Expand the stored cosines into the 4-lane twiddle `(c0, s0, c1, s1)`.
    ///
    /// The `max(0)` clamp guards against `1 - c²` rounding slightly negative
    /// when `cos θ` is within one ulp of ±1.
    #[inline(always)]
    pub fn twiddle(&self) -> ComplexPair {
        let c0 = self.w[0];
        let c1 = self.w[1];
        let s0 = sqrtf((1.0 - c0 * c0).max(0.0));
        let s1 = sqrtf((1.0 - c1 * c1).max(0.0));
        ComplexPair::new(c0, s0, c1, s1)
    }
}

/// Immutable per-width FFT state: permutation and operator tables.
pub struct SpectrumPlan {
    width: usize,
    log_width: u32,
    permutation: Box<[PermutationEntry]>,
    operators: Box<[Operator]>,
}

impl SpectrumPlan {
    /// Build the tables for a `width`-point transform.
    ///
    /// `width` must be a power of two and at least 4; anything else is
    /// rejected before any table is allocated.
    pub fn new(width: usize) -> Result<Self, SpectrumError> {
        if width < 4 {
            return Err(SpectrumError::WidthTooSmall);
        }
        if !width.is_power_of_two() {
            return Err(SpectrumError::WidthNotPowerOfTwo);
        }
        let log_width = width.trailing_zeros();
        let plan = Self {
            width,
            log_width,
            permutation: build_permutation(width, log_width),
            operators: build_operators(width),
        };
        #[cfg(feature = "verbose-logging")]
        log::trace!(
            "built {}-point spectrum plan: {} permutation entries, {} operators over {} passes",
            width,
            plan.permutation.len(),
            plan.operators.len(),
            plan.passes(),
        );
        Ok(plan)
    }

    /// Configured transform width `N`.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// `log2` of the width.
    #[inline]
    pub fn log_width(&self) -> u32 {
        self.log_width
    }

    /// Number of butterfly passes after the fused first pass (`log2 N - 1`).
    #[inline]
    pub fn passes(&self) -> usize {
        self.log_width as usize - 1
    }

    /// The fused permutation table, `N/2` entries.
    #[inline]
    pub fn permutation(&self) -> &[PermutationEntry] {
        &self.permutation
    }

    /// The full operator sequence, `(log2 N - 1) · N/4` entries in pass order.
    #[inline]
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Operator sub-slice for one pass.
    ///
    /// Pass `p` combines blocks of size `4 << p` and must run strictly after
    /// pass `p - 1`: its operators read slots the previous pass finalized.
    /// Within the returned slice every packed slot appears in exactly one
    /// operator, so butterflies of one pass never alias each other.
    #[inline]
    pub fn pass_operators(&self, pass: usize) -> &[Operator] {
        let per_pass = self.width / 4;
        &self.operators[pass * per_pass..(pass + 1) * per_pass]
    }
}

/// Reverse the low `bits` bits of `x`.
#[inline]
fn bit_reverse(x: usize, bits: u32) -> usize {
    let mut out = 0usize;
    for k in 0..bits {
        out |= ((x >> k) & 1) << (bits - 1 - k);
    }
    out
}

fn build_permutation(width: usize, log_width: u32) -> Box<[PermutationEntry]> {
    let mut table = Vec::with_capacity(width / 2);
    for i in (0..width).step_by(2) {
        table.push(PermutationEntry {
            a: bit_reverse(i, log_width) as u32,
            b: bit_reverse(i + 1, log_width) as u32,
        });
    }
    table.into_boxed_slice()
}

fn build_operators(width: usize) -> Box<[Operator]> {
    let log_width = width.trailing_zeros() as usize;
    let mut table = Vec::with_capacity((log_width - 1) * (width / 4));
    let mut m = 4usize;
    while m <= width {
        for k in (0..width).step_by(m) {
            for j in (0..m / 2).step_by(2) {
                let theta0 = -2.0 * PI * j as f32 / m as f32;
                let theta1 = -2.0 * PI * (j + 1) as f32 / m as f32;
                // Angle-domain invariant behind the sqrt-derived sine: the
                // stored cosines only ever describe angles in (-π, 0].
                debug_assert!(theta0 <= 0.0 && theta0 > -PI);
                debug_assert!(theta1 <= 0.0 && theta1 > -PI);
                table.push(Operator {
                    i1: ((k + j) / 2) as u32,
                    i2: ((k + j + m / 2) / 2) as u32,
                    w: [cosf(theta0), cosf(theta1)],
                });
            }
        }
        m <<= 1;
    }
    table.into_boxed_slice()
}

/// Cache of [`SpectrumPlan`]s keyed by width.
///
/// Plans are read-only after construction, so handing out [`Arc`] clones lets
/// any number of engines (on any thread) share one table set per width.
pub struct SpectrumPlanner {
    cache: HashMap<usize, Arc<SpectrumPlan>>,
}

impl Default for SpectrumPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumPlanner {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Retrieve the plan for `width`, building it on first use.
    pub fn plan_for(&mut self, width: usize) -> Result<Arc<SpectrumPlan>, SpectrumError> {
        if let Some(plan) = self.cache.get(&width) {
            return Ok(Arc::clone(plan));
        }
        let plan = Arc::new(SpectrumPlan::new(width)?);
        self.cache.insert(width, Arc::clone(&plan));
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn rejects_invalid_widths() {
        assert_eq!(SpectrumPlan::new(0).err(), Some(SpectrumError::WidthTooSmall));
        assert_eq!(SpectrumPlan::new(2).err(), Some(SpectrumError::WidthTooSmall));
        assert_eq!(
            SpectrumPlan::new(6).err(),
            Some(SpectrumError::WidthNotPowerOfTwo)
        );
        assert_eq!(
            SpectrumPlan::new(1000).err(),
            Some(SpectrumError::WidthNotPowerOfTwo)
        );
        assert!(SpectrumPlan::new(4).is_ok());
    }

    #[test]
    fn bit_reverse_three_bits() {
        assert_eq!(bit_reverse(0b000, 3), 0b000);
        assert_eq!(bit_reverse(0b001, 3), 0b100);
        assert_eq!(bit_reverse(0b011, 3), 0b110);
        assert_eq!(bit_reverse(0b101, 3), 0b101);
    }

    #[test]
    fn permutation_is_bijective() {
        for log_width in 2..=10u32 {
            let width = 1usize << log_width;
            let plan = SpectrumPlan::new(width).unwrap();
            let mut seen = alloc::vec![false; width];
            for entry in plan.permutation() {
                for idx in [entry.a as usize, entry.b as usize] {
                    assert!(idx < width);
                    assert!(!seen[idx], "index {} repeated for width {}", idx, width);
                    seen[idx] = true;
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn operator_table_shape() {
        let width = 64usize;
        let plan = SpectrumPlan::new(width).unwrap();
        assert_eq!(plan.passes(), 5);
        assert_eq!(plan.operators().len(), plan.passes() * width / 4);
        for pass in 0..plan.passes() {
            assert_eq!(plan.pass_operators(pass).len(), width / 4);
        }
    }

    #[test]
    fn pass_operators_cover_slots_disjointly() {
        let width = 128usize;
        let plan = SpectrumPlan::new(width).unwrap();
        for pass in 0..plan.passes() {
            let mut touched: Vec<usize> = plan
                .pass_operators(pass)
                .iter()
                .flat_map(|op| [op.i1(), op.i2()])
                .collect();
            touched.sort_unstable();
            // Every packed slot appears exactly once per pass.
            assert_eq!(touched, (0..width / 2).collect::<Vec<_>>());
        }
    }

    #[test]
    fn first_pass_twiddles_are_trivial_and_quarter_turn() {
        // m = 4, j = 0: angles (0, -π/2) → cosines (1, 0), sines (0, 1).
        let plan = SpectrumPlan::new(4).unwrap();
        let op = plan.pass_operators(0)[0];
        assert_eq!(op.i1(), 0);
        assert_eq!(op.i2(), 1);
        let w = op.twiddle();
        assert!((w.re0 - 1.0).abs() < 1e-6);
        assert!(w.im0.abs() < 1e-3);
        assert!(w.re1.abs() < 1e-6);
        assert!((w.im1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn planner_shares_plans_per_width() {
        let mut planner = SpectrumPlanner::new();
        let a = planner.plan_for(256).unwrap();
        let b = planner.plan_for(256).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            planner.plan_for(12).err(),
            Some(SpectrumError::WidthNotPowerOfTwo)
        );
    }
}
