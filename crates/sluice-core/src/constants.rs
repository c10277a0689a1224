//! Protocol constants. Amounts are in the smallest unit of the streamed token.

/// Fixed-point denominator for release fractions (parts-per-billion).
///
/// A fraction of `RELEASE_PRECISION` means the whole deposit has been released.
pub const RELEASE_PRECISION: u64 = 1_000_000_000;

/// Identifier assigned to the first stream created by an engine.
pub const FIRST_STREAM_ID: u64 = 1;

/// Default spread of the half-life curve, in ppb of one standard deviation.
///
/// The curve covers `[-3.1σ, +3.1σ]` of a normal distribution over the
/// stream interval, which releases roughly 6% of the deposit at a quarter
/// of the interval and 94% at three quarters.
pub const DEFAULT_CDF_SPREAD_PPB: u64 = 3_100_000_000;

/// Smallest accepted half-life spread (0.125σ, one table step).
pub const MIN_CDF_SPREAD_PPB: u64 = 125_000_000;

/// Largest accepted half-life spread (4.0σ, the end of the CDF table).
pub const MAX_CDF_SPREAD_PPB: u64 = 4_000_000_000;
