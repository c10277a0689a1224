//! Constant-rate release curve.

use sluice_core::error::CurveError;
use sluice_core::traits::ReleaseCurve;
use sluice_core::types::CurveParams;

/// Releases the deposit at a constant rate per block over `[start, stop)`.
///
/// `released(h) = floor(deposit * (h - start) / (stop - start))`, clamped to
/// `[0, deposit]` outside the interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearCurve;

impl LinearCurve {
    /// Create a new LinearCurve.
    pub fn new() -> Self {
        Self
    }
}

impl ReleaseCurve for LinearCurve {
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

        let elapsed = (height - start) as u128;
        let duration = (stop - start) as u128;
        let released = deposit
            .checked_mul(elapsed)
            .ok_or(CurveError::ArithmeticOverflow)?
            / duration;
        Ok(released)
    }

    fn max_deposit(&self, start: u64, stop: u64) -> u128 {
        match stop.checked_sub(start) {
            Some(duration) if duration > 0 => u128::MAX / duration as u128,
            _ => 0,
        }
    }

    fn params(&self) -> CurveParams {
        CurveParams::Linear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn curve() -> LinearCurve {
        LinearCurve::new()
    }

    #[test]
    fn released_observed_points() {
        let c = curve();
        assert_eq!(c.released(60, 140, 160, 135).unwrap(), 0);
        assert_eq!(c.released(60, 140, 160, 155).unwrap(), 45);
        assert_eq!(c.released(60, 140, 160, 160).unwrap(), 60);
        assert_eq!(c.released(100, 200, 225, 210).unwrap(), 40);
        assert_eq!(c.released(100, 200, 225, 211).unwrap(), 44);
        assert_eq!(c.released(300, 350, 400, 360).unwrap(), 60);
    }

    #[test]
    fn released_rounds_toward_sender() {
        let c = curve();
        // 10 * 1 / 3 = 3.33 → 3
        assert_eq!(c.released(10, 0, 3, 1).unwrap(), 3);
        // 10 * 2 / 3 = 6.67 → 6
        assert_eq!(c.released(10, 0, 3, 2).unwrap(), 6);
        assert_eq!(c.unreleased(10, 0, 3, 2).unwrap(), 4);
    }

    #[test]
    fn released_zero_deposit() {
        assert_eq!(curve().released(0, 0, 10, 5).unwrap(), 0);
    }

    #[test]
    fn released_rejects_degenerate_interval() {
        assert_eq!(
            curve().released(60, 80, 30, 50),
            Err(CurveError::InvalidInterval { start: 80, stop: 30 })
        );
    }

    #[test]
    fn max_deposit_scales_with_duration() {
        let c = curve();
        assert_eq!(c.max_deposit(0, 1), u128::MAX);
        assert_eq!(c.max_deposit(0, 2), u128::MAX / 2);
        assert_eq!(c.max_deposit(5, 5), 0);
        assert_eq!(c.max_deposit(6, 5), 0);
    }

    #[test]
    fn released_at_max_deposit_does_not_overflow() {
        let c = curve();
        let max = c.max_deposit(0, 1_000);
        assert!(c.released(max, 0, 1_000, 999).is_ok());
        assert_eq!(
            c.released(u128::MAX, 0, 1_000, 999),
            Err(CurveError::ArithmeticOverflow)
        );
    }

    proptest! {
        #[test]
        fn released_monotonic(
            deposit in 0u128..=u64::MAX as u128,
            start in 0u64..1_000_000,
            len in 1u64..1_000_000,
            a in 0u64..2_000_000,
            b in 0u64..2_000_000,
        ) {
            let c = curve();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let r_lo = c.released(deposit, start, start + len, start + lo).unwrap();
            let r_hi = c.released(deposit, start, start + len, start + hi).unwrap();
            prop_assert!(r_lo <= r_hi);
            prop_assert!(r_hi <= deposit);
        }

        #[test]
        fn released_plus_unreleased_is_deposit(
            deposit in 0u128..=u64::MAX as u128,
            len in 1u64..1_000_000,
            offset in 0u64..1_000_000,
        ) {
            let c = curve();
            let r = c.released(deposit, 0, len, offset).unwrap();
            let u = c.unreleased(deposit, 0, len, offset).unwrap();
            prop_assert_eq!(r + u, deposit);
        }
    }
}
