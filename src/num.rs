//! Scalar and packed complex number types.
//!
//! The hot path of the engine works on [`ComplexPair`], a 4-lane packed value
//! holding two independent complex numbers `(re0, im0, re1, im1)`. Packing two
//! butterflies per value lets a single pass move through the working buffer in
//! SIMD-width steps. [`Complex32`] is the plain scalar form, kept as the
//! arithmetic reference and for the naive DFT oracle.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

/// Square root that works in both `std` and `no_std` builds.
#[inline(always)]
pub(crate) fn sqrtf(x: f32) -> f32 {
    #[cfg(feature = "std")]
    {
        x.sqrt()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::sqrtf(x)
    }
}

#[inline(always)]
pub(crate) fn cosf(x: f32) -> f32 {
    #[cfg(feature = "std")]
    {
        x.cos()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::cosf(x)
    }
}

#[inline(always)]
pub(crate) fn sinf(x: f32) -> f32 {
    #[cfg(feature = "std")]
    {
        x.sin()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::sinf(x)
    }
}

/// Single-precision complex number.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

impl Complex32 {
    #[inline(always)]
    pub fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    #[inline(always)]
    pub fn zero() -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    /// `e^{i·theta}` as a complex number.
    #[inline(always)]
    pub fn expi(theta: f32) -> Self {
        Self {
            re: cosf(theta),
            im: sinf(theta),
        }
    }

    /// Euclidean modulus `sqrt(re² + im²)`.
    #[inline(always)]
    pub fn modulus(self) -> f32 {
        sqrtf(self.re * self.re + self.im * self.im)
    }
}

impl core::ops::Add for Complex32 {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
}

impl core::ops::Sub for Complex32 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

impl core::ops::Mul for Complex32 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }
}

/// Two complex numbers packed into four `f32` lanes `(re0, im0, re1, im1)`.
///
/// The working buffer of the engine is a slice of `ComplexPair`: pack `i`
/// holds the working values for output positions `2i` and `2i+1`, so a
/// length-`N` transform runs over `N/2` packs.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ComplexPair {
    pub re0: f32,
    pub im0: f32,
    pub re1: f32,
    pub im1: f32,
}

impl ComplexPair {
    #[inline(always)]
    pub fn new(re0: f32, im0: f32, re1: f32, im1: f32) -> Self {
        Self { re0, im0, re1, im1 }
    }

    #[inline(always)]
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub fn from_parts(lo: Complex32, hi: Complex32) -> Self {
        Self::new(lo.re, lo.im, hi.re, hi.im)
    }

    #[inline(always)]
    pub fn lo(self) -> Complex32 {
        Complex32::new(self.re0, self.im0)
    }

    #[inline(always)]
    pub fn hi(self) -> Complex32 {
        Complex32::new(self.re1, self.im1)
    }

    /// Lane-wise complex multiply with the sine sign folded into a fixed
    /// `(-1, +1, -1, +1)` cross-term mask.
    ///
    /// `self` carries the twiddle lanes `(c0, s0, c1, s1)` where `s` is the
    /// non-negative root `sqrt(1 - c²)` (see [`crate::plan::Operator`]).
    /// Expanding the mask, each lane pair computes
    /// `(c·re - s·im, c·im + s·re)`, i.e. a rotation by the conjugate of the
    /// stored angle. Every angle the operator tables generate lies in
    /// `(-π, 0]`, so the conjugate rotation mirrors the spectrum across the
    /// real axis and leaves every bin magnitude unchanged. Do not reuse this
    /// multiply for angles outside that domain.
    #[inline(always)]
    pub fn mul_packed(self, rhs: Self) -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            // SAFETY: SSE2 is part of the x86_64 baseline.
            unsafe { self.mul_packed_sse2(rhs) }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            self.mul_packed_scalar(rhs)
        }
    }

    /// Scalar reference form of [`mul_packed`](Self::mul_packed), kept for
    /// non-x86 targets and for pinning the SIMD path in tests.
    #[inline(always)]
    pub fn mul_packed_scalar(self, rhs: Self) -> Self {
        Self {
            re0: self.re0 * rhs.re0 - self.im0 * rhs.im0,
            im0: self.re0 * rhs.im0 + self.im0 * rhs.re0,
            re1: self.re1 * rhs.re1 - self.im1 * rhs.im1,
            im1: self.re1 * rhs.im1 + self.im1 * rhs.re1,
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[inline(always)]
    unsafe fn mul_packed_sse2(self, rhs: Self) -> Self {
        let a = _mm_set_ps(self.im1, self.re1, self.im0, self.re0);
        let b = _mm_set_ps(rhs.im1, rhs.re1, rhs.im0, rhs.re0);
        // a.xxzz * b.xyzw + (-1, 1, -1, 1) * a.yyww * b.yxwz
        let a_even = _mm_shuffle_ps::<0b10_10_00_00>(a, a);
        let a_odd = _mm_shuffle_ps::<0b11_11_01_01>(a, a);
        let b_swap = _mm_shuffle_ps::<0b10_11_00_01>(b, b);
        let mask = _mm_set_ps(1.0, -1.0, 1.0, -1.0);
        let prod = _mm_add_ps(
            _mm_mul_ps(a_even, b),
            _mm_mul_ps(mask, _mm_mul_ps(a_odd, b_swap)),
        );
        let mut out = [0.0f32; 4];
        _mm_storeu_ps(out.as_mut_ptr(), prod);
        Self::new(out[0], out[1], out[2], out[3])
    }

    /// Euclidean moduli of the two packed complex lanes.
    #[inline(always)]
    pub fn moduli(self) -> (f32, f32) {
        (
            sqrtf(self.re0 * self.re0 + self.im0 * self.im0),
            sqrtf(self.re1 * self.re1 + self.im1 * self.im1),
        )
    }
}

impl core::ops::Add for ComplexPair {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self {
            re0: self.re0 + other.re0,
            im0: self.im0 + other.im0,
            re1: self.re1 + other.re1,
            im1: self.im1 + other.im1,
        }
    }
}

impl core::ops::Sub for ComplexPair {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Self {
            re0: self.re0 - other.re0,
            im0: self.im0 - other.im0,
            re1: self.re1 - other.re1,
            im1: self.im1 - other.im1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_mul_scalar(w: Complex32, x: Complex32) -> Complex32 {
        // (c + i·s)·x, matching one lane pair of `mul_packed`.
        Complex32::new(w.re * x.re - w.im * x.im, w.re * x.im + w.im * x.re)
    }

    #[test]
    fn packed_mul_matches_scalar_lanes() {
        let a = ComplexPair::new(0.5, 0.25, -1.5, 2.0);
        let b = ComplexPair::new(3.0, -4.0, 0.125, 7.0);
        let p = a.mul_packed(b);
        let s = a.mul_packed_scalar(b);
        assert!((p.re0 - s.re0).abs() < 1e-6);
        assert!((p.im0 - s.im0).abs() < 1e-6);
        assert!((p.re1 - s.re1).abs() < 1e-6);
        assert!((p.im1 - s.im1).abs() < 1e-6);

        let lo = mask_mul_scalar(a.lo(), b.lo());
        let hi = mask_mul_scalar(a.hi(), b.hi());
        assert!((p.re0 - lo.re).abs() < 1e-6 && (p.im0 - lo.im).abs() < 1e-6);
        assert!((p.re1 - hi.re).abs() < 1e-6 && (p.im1 - hi.im).abs() < 1e-6);
    }

    #[test]
    fn packed_add_sub() {
        let a = ComplexPair::new(1.0, 2.0, 3.0, 4.0);
        let b = ComplexPair::new(0.5, 0.5, 0.5, 0.5);
        assert_eq!(a + b, ComplexPair::new(1.5, 2.5, 3.5, 4.5));
        assert_eq!(a - b, ComplexPair::new(0.5, 1.5, 2.5, 3.5));
    }

    #[test]
    fn moduli_of_unit_lanes() {
        let p = ComplexPair::new(3.0, 4.0, 0.0, -1.0);
        let (m0, m1) = p.moduli();
        assert!((m0 - 5.0).abs() < 1e-6);
        assert!((m1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn complex_expi_and_modulus() {
        let c = Complex32::expi(-core::f32::consts::FRAC_PI_2);
        assert!(c.re.abs() < 1e-6);
        assert!((c.im + 1.0).abs() < 1e-6);
        assert!((c.modulus() - 1.0).abs() < 1e-6);
    }
}
