//! Pass execution over the packed working buffer.
//!
//! A transform is three kinds of sweep: the fused permutation + 2-point DFT
//! first pass, `log2 N - 1` in-place butterfly passes driven by the
//! precomputed operator slices, and the magnitude postprocess. Each sweep is
//! data-parallel over its index range; only the ordering *between* sweeps
//! matters, because a pass reads slots the previous pass wrote. The parallel
//! variants keep that contract by parallelizing inside a sweep and running
//! the sweeps themselves in program order on the calling thread.

use crate::num::ComplexPair;
use crate::plan::{Operator, PermutationEntry};

#[cfg(feature = "parallel")]
use core::sync::atomic::{AtomicUsize, Ordering};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Override for the minimum transform width that runs passes in parallel.
///
/// `0` means no override and the heuristic will be used.
#[cfg(feature = "parallel")]
static PARALLEL_THRESHOLD_OVERRIDE: AtomicUsize = AtomicUsize::new(0);

#[cfg(feature = "parallel")]
static PARALLEL_BATCH_OVERRIDE: AtomicUsize = AtomicUsize::new(0);

/// Butterflies handed to one worker at a time when a pass runs in parallel.
#[cfg(feature = "parallel")]
const DEFAULT_PARALLEL_BATCH: usize = 16;

/// Minimum packed slots each core should own before parallel passes pay off.
#[cfg(feature = "parallel")]
const DEFAULT_PER_CORE_WORK: usize = 4096;

/// Set a custom minimum transform width for parallel pass execution.
///
/// Passing `0` reverts to the built-in heuristic (enough per-core work for
/// every available thread). Sequential and parallel execution produce the
/// same spectrum, so this is purely a performance knob.
#[cfg(feature = "parallel")]
pub fn set_parallel_threshold(width: usize) {
    PARALLEL_THRESHOLD_OVERRIDE.store(width, Ordering::Relaxed);
}

/// Override the number of butterflies dispatched per parallel batch.
///
/// Passing `0` reverts to the built-in default.
#[cfg(feature = "parallel")]
pub fn set_parallel_batch_size(size: usize) {
    PARALLEL_BATCH_OVERRIDE.store(size, Ordering::Relaxed);
}

#[cfg(feature = "parallel")]
pub(crate) fn parallel_batch_size() -> usize {
    match PARALLEL_BATCH_OVERRIDE.load(Ordering::Relaxed) {
        0 => DEFAULT_PARALLEL_BATCH,
        size => size,
    }
}

#[cfg(feature = "parallel")]
pub(crate) fn should_parallelize(width: usize) -> bool {
    let override_thr = PARALLEL_THRESHOLD_OVERRIDE.load(Ordering::Relaxed);
    if override_thr != 0 {
        return width >= override_thr;
    }
    #[cfg(feature = "std")]
    let threads = num_cpus::get().max(1);
    #[cfg(not(feature = "std"))]
    let threads = 1;
    width >= DEFAULT_PER_CORE_WORK * threads
}

/// Fused bit-reversal permutation and 2-point DFT stage.
///
/// Pack `i` receives the two-point transform of the bit-reversed sources for
/// output slots `2i` and `2i+1`: `(a + b, 0, a - b, 0)`. Real input means
/// both imaginary lanes start at zero.
pub(crate) fn first_pass(input: &[f32], permutation: &[PermutationEntry], packed: &mut [ComplexPair]) {
    debug_assert_eq!(permutation.len(), packed.len());
    for (slot, entry) in packed.iter_mut().zip(permutation.iter()) {
        let a = input[entry.a as usize];
        let b = input[entry.b as usize];
        *slot = ComplexPair::new(a + b, 0.0, a - b, 0.0);
    }
}

#[cfg(feature = "parallel")]
pub(crate) fn first_pass_parallel(
    input: &[f32],
    permutation: &[PermutationEntry],
    packed: &mut [ComplexPair],
) {
    debug_assert_eq!(permutation.len(), packed.len());
    let batch = parallel_batch_size();
    packed
        .par_iter_mut()
        .with_min_len(batch)
        .zip(permutation.par_iter())
        .for_each(|(slot, entry)| {
            let a = input[entry.a as usize];
            let b = input[entry.b as usize];
            *slot = ComplexPair::new(a + b, 0.0, a - b, 0.0);
        });
}

/// Apply one butterfly to the two slots an operator addresses.
#[inline(always)]
fn apply(packed: &mut [ComplexPair], op: &Operator) {
    let t = op.twiddle().mul_packed(packed[op.i2()]);
    let u = packed[op.i1()];
    packed[op.i1()] = u + t;
    packed[op.i2()] = u - t;
}

/// Run one butterfly pass over `packed` using the operator slice for that
/// pass. Callers must hand passes over in order; `ops` must be one of the
/// per-pass slices of the plan that built the buffer.
pub(crate) fn butterfly_pass(packed: &mut [ComplexPair], ops: &[Operator]) {
    for op in ops {
        apply(packed, op);
    }
}

/// Shared base pointer for intra-pass parallel writes.
///
/// Safety rests on the operator-table invariant: within one pass each packed
/// slot is addressed by exactly one operator, so concurrent butterflies
/// never touch the same slot.
#[cfg(feature = "parallel")]
struct SharedSlots(*mut ComplexPair);

#[cfg(feature = "parallel")]
unsafe impl Sync for SharedSlots {}

#[cfg(feature = "parallel")]
pub(crate) fn butterfly_pass_parallel(packed: &mut [ComplexPair], ops: &[Operator]) {
    let base = SharedSlots(packed.as_mut_ptr());
    let len = packed.len();
    let batch = parallel_batch_size();
    ops.par_iter().with_min_len(batch).for_each(|op| {
        // Capture the `Sync` wrapper as a whole; naming `base.0` directly
        // would make the closure capture the raw pointer field instead.
        let base = &base;
        debug_assert!(op.i1() < len && op.i2() < len);
        // SAFETY: slot indices of distinct operators in one pass are
        // disjoint (see `SpectrumPlan::pass_operators`), so no two workers
        // alias, and both indices are in bounds of the packed buffer.
        unsafe {
            let p1 = base.0.add(op.i1());
            let p2 = base.0.add(op.i2());
            let t = op.twiddle().mul_packed(*p2);
            let u = *p1;
            *p1 = u + t;
            *p2 = u - t;
        }
    });
}

/// Convert final packed pairs into normalized magnitudes.
///
/// Pack `i` yields output bins `2i` and `2i+1`, each the Euclidean modulus
/// scaled by `2/N` so a unit-amplitude sinusoid lands at 1.0. `out` may be
/// any even-length prefix of the `N` available bins; the engine passes the
/// lower `N/2`, leaving the symmetric upper half unread.
pub(crate) fn postprocess(packed: &[ComplexPair], width: usize, out: &mut [f32]) {
    debug_assert!(out.len() % 2 == 0 && out.len() / 2 <= packed.len());
    let scale = 2.0 / width as f32;
    for (bins, slot) in out.chunks_exact_mut(2).zip(packed.iter()) {
        let (m0, m1) = slot.moduli();
        bins[0] = m0 * scale;
        bins[1] = m1 * scale;
    }
}

#[cfg(feature = "parallel")]
pub(crate) fn postprocess_parallel(packed: &[ComplexPair], width: usize, out: &mut [f32]) {
    debug_assert!(out.len() % 2 == 0 && out.len() / 2 <= packed.len());
    let scale = 2.0 / width as f32;
    let batch = parallel_batch_size();
    out.par_chunks_exact_mut(2)
        .with_min_len(batch)
        .zip(packed.par_iter())
        .for_each(|(bins, slot)| {
            let (m0, m1) = slot.moduli();
            bins[0] = m0 * scale;
            bins[1] = m1 * scale;
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::SpectrumPlan;
    use alloc::vec;

    #[test]
    fn four_point_transform_by_hand() {
        // x = [1, 2, 3, 4]: bins are 10, sqrt(8), 2 (and the mirror of bin 1).
        let plan = SpectrumPlan::new(4).unwrap();
        let input = [1.0f32, 2.0, 3.0, 4.0];
        let mut packed = vec![ComplexPair::zero(); 2];
        first_pass(&input, plan.permutation(), &mut packed);
        // Bit-reversed sources: pack 0 reads x[0], x[2]; pack 1 reads x[1], x[3].
        assert_eq!(packed[0], ComplexPair::new(4.0, 0.0, -2.0, 0.0));
        assert_eq!(packed[1], ComplexPair::new(6.0, 0.0, -2.0, 0.0));

        butterfly_pass(&mut packed, plan.pass_operators(0));
        let mut out = [0.0f32; 2];
        postprocess(&packed, 4, &mut out);
        assert!((out[0] - 10.0 * 0.5).abs() < 1e-5);
        assert!((out[1] - 8.0f32.sqrt() * 0.5).abs() < 1e-5);
    }

    #[test]
    fn postprocess_scales_by_two_over_width() {
        let packed = [ComplexPair::new(3.0, 4.0, 0.0, 8.0)];
        let mut out = [0.0f32; 2];
        postprocess(&packed, 8, &mut out);
        assert!((out[0] - 5.0 * 0.25).abs() < 1e-6);
        assert!((out[1] - 8.0 * 0.25).abs() < 1e-6);
    }
}
