//! Trait interfaces for Sluice.
//!
//! These traits define the seams between crates:
//! - [`ReleaseCurve`]: release math (sluice-curve implements)
//! - [`TokenLedger`]: the external token ledger the engine moves value through

use crate::error::{CurveError, LedgerError};
use crate::types::{Address, CurveParams};

/// Pure computation of how much of a deposit has released to the recipient.
///
/// All release math uses integer arithmetic. Implementations must be
/// monotonically non-decreasing in `height`, return 0 at or before
/// `start`, and return exactly `deposit` at or after `stop`.
pub trait ReleaseCurve: Send + Sync {
    /// Amount of `deposit` released to the recipient as of `height`.
    ///
    /// Rounds down: any remainder belongs to the sender.
    fn released(&self, deposit: u128, start: u64, stop: u64, height: u64) -> Result<u128, CurveError>;

    /// Amount of `deposit` still owed to the sender as of `height`.
    ///
    /// Default implementation: `deposit - released(...)`.
    fn unreleased(&self, deposit: u128, start: u64, stop: u64, height: u64) -> Result<u128, CurveError> {
        let released = self.released(deposit, start, stop, height)?;
        deposit
            .checked_sub(released)
            .ok_or(CurveError::ArithmeticOverflow)
    }

    /// Largest deposit the curve can evaluate over `[start, stop)` without overflow.
    fn max_deposit(&self, start: u64, stop: u64) -> u128;

    /// Parameters to record on a stream created with this curve.
    fn params(&self) -> CurveParams;
}

/// The external token ledger holding balances and allowances.
///
/// The engine only debits senders into its custody account and credits
/// parties out of it. Every call is all-or-nothing: on error, no balance
/// or allowance has changed.
pub trait TokenLedger: Send {
    /// Balance of `owner` in `token`.
    fn balance_of(&self, token: &Address, owner: &Address) -> u128;

    /// Amount `spender` may move out of `owner`'s balance of `token`.
    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> u128;

    /// Move `amount` from `from` into `custody`, consuming `from`'s allowance to `custody`.
    fn transfer_into(
        &mut self,
        token: &Address,
        custody: &Address,
        from: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Move `amount` out of `custody` to `to`.
    fn transfer_out(
        &mut self,
        token: &Address,
        custody: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Pay every `(to, amount)` in `payouts` out of `custody` in one call.
    ///
    /// If any debit or credit is refused, none of the payouts happen.
    fn settle(
        &mut self,
        token: &Address,
        custody: &Address,
        payouts: &[(Address, u128)],
    ) -> Result<(), LedgerError>;
}
