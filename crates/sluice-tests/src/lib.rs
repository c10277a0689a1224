//! Adversarial test suite for Sluice.
//!
//! Integration tests here drive the engines with randomized operation
//! sequences and check that value is conserved, balances never go negative
//! and settled streams never change.

pub mod helpers;
