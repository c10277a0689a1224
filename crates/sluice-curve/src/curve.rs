//! Runtime selection between the release curves.

use sluice_core::error::CurveError;
use sluice_core::traits::ReleaseCurve;
use sluice_core::types::CurveParams;

use crate::cdf::CdfCurve;
use crate::linear::LinearCurve;

/// Either release curve, selected from the parameters stored on a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// Constant-rate release.
    Linear(LinearCurve),
    /// Half-life (normal CDF) release.
    HalfLife(CdfCurve),
}

impl Curve {
    /// The linear curve.
    pub fn linear() -> Self {
        Self::Linear(LinearCurve::new())
    }

    /// The half-life curve with the default spread.
    pub fn half_life() -> Self {
        Self::HalfLife(CdfCurve::default())
    }

    fn inner(&self) -> &dyn ReleaseCurve {
        match self {
            Self::Linear(c) => c,
            Self::HalfLife(c) => c,
        }
    }
}

impl TryFrom<CurveParams> for Curve {
    type Error = CurveError;

    fn try_from(params: CurveParams) -> Result<Self, Self::Error> {
        match params {
            CurveParams::Linear => Ok(Self::linear()),
            CurveParams::HalfLife { spread_ppb } => Ok(Self::HalfLife(CdfCurve::new(spread_ppb)?)),
        }
    }
}

impl ReleaseCurve for Curve {
    fn released(&self, deposit: u128, start: u64, stop: u64, height: u64) -> Result<u128, CurveError> {
        self.inner().released(deposit, start, stop, height)
    }

    fn max_deposit(&self, start: u64, stop: u64) -> u128 {
        self.inner().max_deposit(start, stop)
    }

    fn params(&self) -> CurveParams {
        self.inner().params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_roundtrip() {
        for params in [CurveParams::Linear, CurveParams::half_life()] {
            let curve = Curve::try_from(params).unwrap();
            assert_eq!(curve.params(), params);
        }
    }

    #[test]
    fn invalid_spread_rejected() {
        assert_eq!(
            Curve::try_from(CurveParams::HalfLife { spread_ppb: 0 }),
            Err(CurveError::InvalidSpread(0))
        );
    }

    #[test]
    fn dispatch_differs_by_variant() {
        // Same window, same height: linear releases 45 of 60, half-life 56.
        assert_eq!(Curve::linear().released(60, 140, 160, 155).unwrap(), 45);
        assert_eq!(Curve::half_life().released(60, 140, 160, 155).unwrap(), 56);
    }

    #[test]
    fn max_deposit_dispatches() {
        assert_eq!(Curve::linear().max_deposit(0, 4), u128::MAX / 4);
        assert_eq!(
            Curve::half_life().max_deposit(0, 4),
            u128::MAX / sluice_core::constants::RELEASE_PRECISION as u128
        );
    }
}
