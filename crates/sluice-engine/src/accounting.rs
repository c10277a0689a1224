//! Per-party balance computation and stream record checks.
//!
//! Balances are derived on demand from the stored record and the stream's
//! release curve; nothing here mutates state. The rules:
//!
//! - The recipient is entitled to `min(released, deposit - sender_withdrawn)`
//!   minus what it already withdrew.
//! - The sender holds the rest of the remaining balance.
//! - Both balances are zero once the stream is terminal.
//!
//! so `sender + recipient == remaining_balance` for every active stream.

use tracing::error;

use sluice_core::error::StreamError;
use sluice_core::traits::ReleaseCurve;
use sluice_core::types::{Address, Stream};
use sluice_curve::Curve;

/// Withdrawable amounts of both parties at one height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balances {
    /// Unreleased value still owed to the sender.
    pub sender: u128,
    /// Released value the recipient has not withdrawn yet.
    pub recipient: u128,
}

impl Balances {
    /// Sum of both balances.
    pub fn total(&self) -> u128 {
        self.sender.saturating_add(self.recipient)
    }
}

/// Compute both parties' balances of `stream` at `height`.
///
/// # Errors
///
/// - [`StreamError::HeightRegression`] if `height` lies before the stream's
///   last mutation and the record can no longer be evaluated there
/// - [`StreamError::AccountingInvariant`] if the record is inconsistent
/// - [`StreamError::Curve`] if the stored curve parameters are invalid
pub fn balances(stream: &Stream, height: u64) -> Result<Balances, StreamError> {
    if stream.is_terminal() {
        return Ok(Balances::default());
    }

    let curve = Curve::try_from(stream.curve)?;
    let released = curve.released(
        stream.deposit_amount,
        stream.start_height,
        stream.stop_height,
        height,
    )?;

    let Some(sender_cap) = stream.deposit_amount.checked_sub(stream.sender_withdrawn) else {
        return Err(invariant(stream, "sender withdrew more than the deposit"));
    };
    let entitled = released.min(sender_cap);

    let Some(recipient) = entitled.checked_sub(stream.recipient_withdrawn) else {
        if height < stream.last_updated {
            return Err(StreamError::HeightRegression {
                last: stream.last_updated,
                got: height,
            });
        }
        return Err(invariant(stream, "recipient withdrew more than was released"));
    };
    let Some(sender) = stream.remaining_balance.checked_sub(recipient) else {
        return Err(invariant(stream, "recipient balance exceeds the remaining balance"));
    };

    Ok(Balances { sender, recipient })
}

/// Balance of `who` in `stream` at `height`. Zero for anyone but the parties.
pub fn balance_of(stream: &Stream, who: &Address, height: u64) -> Result<u128, StreamError> {
    if !stream.is_party(who) {
        return Ok(0);
    }
    let b = balances(stream, height)?;
    if *who == stream.recipient {
        Ok(b.recipient)
    } else {
        Ok(b.sender)
    }
}

/// Verify the structural invariants of a stored record.
///
/// Run before every write and on every record loaded from a snapshot.
pub fn check_record(stream: &Stream) -> Result<(), StreamError> {
    if stream.deposit_amount == 0 {
        return Err(invariant(stream, "zero deposit"));
    }
    if stream.start_height >= stream.stop_height {
        return Err(invariant(stream, "empty release interval"));
    }
    if stream.sender == stream.recipient {
        return Err(invariant(stream, "sender is the recipient"));
    }
    if stream.remaining_balance > stream.deposit_amount {
        return Err(invariant(stream, "remaining balance exceeds the deposit"));
    }
    let accounted = stream
        .remaining_balance
        .checked_add(stream.sender_withdrawn)
        .and_then(|v| v.checked_add(stream.recipient_withdrawn));
    if accounted != Some(stream.deposit_amount) {
        return Err(invariant(stream, "withdrawals and remaining balance do not sum to the deposit"));
    }
    if stream.canceled_at.is_some() && stream.remaining_balance != 0 {
        return Err(invariant(stream, "canceled stream holds a balance"));
    }
    Ok(())
}

pub(crate) fn invariant(stream: &Stream, what: &str) -> StreamError {
    error!(stream_id = stream.id, "accounting invariant violated: {what}");
    StreamError::AccountingInvariant(format!("stream {}: {what}", stream.id))
}
