//! # sluice-core
//! Foundation types and traits for Sluice payment streams.

pub mod constants;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;
