//! Signed fixed-point integers with a single global scale.
//!
//! Scale factor S = 10^10. Real values are encoded as `round(v * S)` in an
//! `i64`, with ties rounding away from zero. Every backend receives the same
//! encoded literals; none of them re-derives the scale or the rounding rule.
//!
//! Accumulating tree contributions must saturate instead of wrapping. The
//! saturating operation itself lives in each backend's `add` operator; the
//! reference semantics are [`Fixed::saturating_add`].

/// Scale factor: 10^10.
pub const PRECISION_MULTIPLIER: i64 = 10_000_000_000;

/// Largest magnitude a quantized value may take.
///
/// The range is symmetric so that sign/magnitude backends can always
/// represent `abs(value)`; `i64::MIN` is never produced.
pub const MAX_MAGNITUDE: i64 = i64::MAX;

/// Fixed-point value scaled by [`PRECISION_MULTIPLIER`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i64);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(PRECISION_MULTIPLIER);

    /// Encode an f64.
    ///
    /// Rounds half away from zero and clamps to `±MAX_MAGNITUDE`.
    /// NaN encodes as zero; callers that care reject it first.
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            return Self::ZERO;
        }
        let scaled = (v * PRECISION_MULTIPLIER as f64).round();
        if scaled >= MAX_MAGNITUDE as f64 {
            Self(MAX_MAGNITUDE)
        } else if scaled <= -(MAX_MAGNITUDE as f64) {
            Self(-MAX_MAGNITUDE)
        } else {
            Self(scaled as i64)
        }
    }

    /// Decode back to f64.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / PRECISION_MULTIPLIER as f64
    }

    /// Construct from an already scaled integer, clamping `i64::MIN`.
    pub fn from_scaled(raw: i64) -> Self {
        Self(raw.max(-MAX_MAGNITUDE))
    }

    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }

    /// Sign/magnitude split used by backends without native signed integers.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn magnitude(self) -> u64 {
        self.0.unsigned_abs()
    }

    /// Accumulation step shared by every backend: saturates at the
    /// symmetric range bounds.
    #[inline]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0).max(-MAX_MAGNITUDE))
    }

    /// Split predicate: `self <= threshold` takes the yes-branch.
    #[inline]
    pub fn le(self, threshold: Self) -> bool {
        self.0 <= threshold.0
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantize a floating-point threshold or leaf value.
pub fn quantize(x: f64) -> Fixed {
    Fixed::from_f64(x)
}

/// Inverse of [`quantize`], up to the scale's resolution.
pub fn dequantize(x: Fixed) -> f64 {
    x.to_f64()
}
