//! # sluice-curve: Release curves for payment streams.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! Two curves map a block height inside a stream's interval to the amount
//! of the deposit released to the recipient:
//! - **Linear**: constant rate, `deposit * elapsed / duration`.
//! - **Half-life**: a normalized, truncated normal CDF evaluated through a
//!   fixed-point lookup table. Slow start, fast middle, slow finish.
//!
//! Both round down, leaving any remainder with the sender, and both reach
//! the full deposit exactly at the stop height.

pub mod cdf;
pub mod curve;
pub mod linear;

pub use cdf::CdfCurve;
pub use curve::Curve;
pub use linear::LinearCurve;
