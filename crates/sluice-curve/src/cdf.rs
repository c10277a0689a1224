//! Half-life release curve: a normalized, truncated normal CDF.
//!
//! All computation uses integer arithmetic only. The standard normal CDF
//! `phi(z)` is evaluated via a precomputed lookup table with linear
//! interpolation, the same way on every platform.
//!
//! With `x` the elapsed fraction of the interval and `S` the spread:
//!
//! ```text
//! z(x) = (2x - 1) * S
//! f(x) = (phi(z) - phi(-S)) / (phi(S) - phi(-S))
//! ```
//!
//! so `f(0) = 0`, `f(1/2) = 1/2` and `f(1) = 1` exactly, and the curve is
//! point-symmetric around the midpoint. Release accelerates towards the
//! midpoint and flattens out near both ends.

use sluice_core::constants::{MAX_CDF_SPREAD_PPB, MIN_CDF_SPREAD_PPB, RELEASE_PRECISION};
use sluice_core::error::CurveError;
use sluice_core::traits::ReleaseCurve;
use sluice_core::types::CurveParams;

/// Step size between table entries in scaled input units (0.125).
const TABLE_STEP: u64 = RELEASE_PRECISION / 8;

/// Precomputed `phi(z) * RELEASE_PRECISION` for `z = 0.0, 0.125, ..., 4.0`.
///
/// 33 entries covering the positive half of the standard normal CDF.
/// Values computed from `phi(z) = (1 + erf(z / sqrt(2))) / 2` and rounded
/// to nearest integer.
const PHI_TABLE: [u64; 33] = [
    500_000_000, // phi(0.000) = 0.5000000000
    549_738_225, // phi(0.125) = 0.5497382248
    598_706_326, // phi(0.250) = 0.5987063257
    646_169_767, // phi(0.375) = 0.6461697667
    691_462_461, // phi(0.500) = 0.6914624613
    734_014_471, // phi(0.625) = 0.7340144710
    773_372_648, // phi(0.750) = 0.7733726476
    809_213_047, // phi(0.875) = 0.8092130471
    841_344_746, // phi(1.000) = 0.8413447461
    869_705_483, // phi(1.125) = 0.8697054829
    894_350_226, // phi(1.250) = 0.8943502263
    915_434_278, // phi(1.375) = 0.9154342776
    933_192_799, // phi(1.500) = 0.9331927987
    947_918_721, // phi(1.625) = 0.9479187206
    959_940_843, // phi(1.750) = 0.9599408431
    969_603_638, // phi(1.875) = 0.9696036382
    977_249_868, // phi(2.000) = 0.9772498681
    983_206_694, // phi(2.125) = 0.9832066936
    987_775_527, // phi(2.250) = 0.9877755273
    991_225_525, // phi(2.375) = 0.9912255249
    993_790_335, // phi(2.500) = 0.9937903347
    995_667_552, // phi(2.625) = 0.9956675516
    997_020_237, // phi(2.750) = 0.9970202368
    997_979_863, // phi(2.875) = 0.9979798625
    998_650_102, // phi(3.000) = 0.9986501020
    999_110_975, // phi(3.125) = 0.9991109747
    999_422_975, // phi(3.250) = 0.9994229750
    999_630_922, // phi(3.375) = 0.9996309215
    999_767_371, // phi(3.500) = 0.9997673709
    999_855_519, // phi(3.625) = 0.9998555193
    999_911_583, // phi(3.750) = 0.9999115827
    999_946_688, // phi(3.875) = 0.9999466877
    999_968_329, // phi(4.000) = 0.9999683288
];

/// Compute `phi(z) * RELEASE_PRECISION` for `z >= 0` using the lookup table.
///
/// Input `z_scaled` is `z * RELEASE_PRECISION`. For negative arguments use
/// the symmetry `phi(-z) = RELEASE_PRECISION - phi(z)`. Saturates at the
/// last table entry beyond `z = 4`.
pub fn phi_positive(z_scaled: u128) -> u64 {
    let step = TABLE_STEP as u128;
    let last = PHI_TABLE.len() - 1;
    let quotient = z_scaled / step;

    if quotient >= last as u128 {
        return PHI_TABLE[last];
    }

    let index = quotient as usize;
    let frac = z_scaled % step;
    let lo = PHI_TABLE[index];
    let hi = PHI_TABLE[index + 1];

    // Max diff ≈ 50M, max frac = 125M: product fits u64, u128 for headroom.
    lo + ((hi - lo) as u128 * frac / step) as u64
}

/// The half-life (CDF) release curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdfCurve {
    spread_ppb: u64,
    /// `phi(-spread)`, the mass cut off below the interval.
    tail_ppb: u64,
}

impl CdfCurve {
    /// Create a curve covering `[-spread, +spread]` standard deviations.
    ///
    /// `spread_ppb` must lie in `[MIN_CDF_SPREAD_PPB, MAX_CDF_SPREAD_PPB]`.
    pub fn new(spread_ppb: u64) -> Result<Self, CurveError> {
        if !(MIN_CDF_SPREAD_PPB..=MAX_CDF_SPREAD_PPB).contains(&spread_ppb) {
            return Err(CurveError::InvalidSpread(spread_ppb));
        }
        let tail_ppb = RELEASE_PRECISION - phi_positive(spread_ppb as u128);
        Ok(Self {
            spread_ppb,
            tail_ppb,
        })
    }

    /// Spread of the curve in ppb of one standard deviation.
    pub fn spread_ppb(&self) -> u64 {
        self.spread_ppb
    }

    /// Released fraction (ppb) for an elapsed fraction `x_ppb` of the interval.
    ///
    /// `x_ppb` is clamped to `RELEASE_PRECISION`. Returns exactly 0 at
    /// `x = 0`, `RELEASE_PRECISION / 2` at `x = 1/2` and
    /// `RELEASE_PRECISION` at `x = 1`.
    pub fn release_fraction(&self, x_ppb: u64) -> Result<u64, CurveError> {
        let p = RELEASE_PRECISION as u128;
        let x = (x_ppb as u128).min(p);

        // Distance from the midpoint in units of the half-interval, in [0, p].
        let twice = 2 * x;
        let (distance, below_mid) = if twice < p {
            (p - twice, true)
        } else {
            (twice - p, false)
        };

        let z_scaled = distance * self.spread_ppb as u128 / p;
        let phi_abs = phi_positive(z_scaled) as u128;
        let phi = if below_mid { p - phi_abs } else { phi_abs };

        let tail = self.tail_ppb as u128;
        let numerator = phi.checked_sub(tail).ok_or(CurveError::ArithmeticOverflow)?;
        let denominator = p
            .checked_sub(2 * tail)
            .filter(|d| *d > 0)
            .ok_or(CurveError::ArithmeticOverflow)?;

        Ok((numerator * p / denominator) as u64)
    }
}

impl Default for CdfCurve {
    fn default() -> Self {
        let spread_ppb = sluice_core::constants::DEFAULT_CDF_SPREAD_PPB;
        Self {
            spread_ppb,
            tail_ppb: RELEASE_PRECISION - phi_positive(spread_ppb as u128),
        }
    }
}

impl ReleaseCurve for CdfCurve {
    fn released(&self, deposit: u128, start: u64, stop: u64, height: u64) -> Result<u128, CurveError> {
        if start >= stop {
            return Err(CurveError::InvalidInterval { start, stop });
        }
        if height <= start {
            return Ok(0);
        }
        if height >= stop {
            return Ok(deposit);
        }

        // Elapsed fraction in ppb; strictly below RELEASE_PRECISION here.
        let elapsed = (height - start) as u128;
        let duration = (stop - start) as u128;
        let x_ppb = (elapsed * RELEASE_PRECISION as u128 / duration) as u64;

        let fraction = self.release_fraction(x_ppb)?;
        let released = deposit
            .checked_mul(fraction as u128)
            .ok_or(CurveError::ArithmeticOverflow)?
            / RELEASE_PRECISION as u128;
        Ok(released)
    }

    fn max_deposit(&self, _start: u64, _stop: u64) -> u128 {
        u128::MAX / RELEASE_PRECISION as u128
    }

    fn params(&self) -> CurveParams {
        CurveParams::HalfLife {
            spread_ppb: self.spread_ppb,
        }
    }
}
