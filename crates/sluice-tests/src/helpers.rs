//! Shared helpers for the integration suites.

use sluice_core::error::StreamError;
use sluice_core::traits::TokenLedger;
use sluice_core::types::{Address, Stream};
use sluice_engine::accounting::{self, check_record};
use sluice_engine::{MemoryLedger, StreamEngine};

/// Address made of one repeated byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// The engine's custody address in every helper-built engine.
pub fn engine_addr() -> Address {
    addr(0xEE)
}

/// The token every helper-built ledger is funded in.
pub fn token() -> Address {
    addr(0x70)
}

/// Ledger where each of `senders` holds `amount` and approved the engine for all of it.
pub fn funded_ledger(senders: &[Address], amount: u128) -> MemoryLedger {
    let mut ledger = MemoryLedger::new();
    for sender in senders {
        ledger
            .mint(&token(), sender, amount)
            .expect("fresh ledger cannot overflow");
        ledger.approve(&token(), sender, &engine_addr(), amount);
    }
    ledger
}

/// Linear engine over [`funded_ledger`].
pub fn linear_engine(senders: &[Address], amount: u128) -> StreamEngine<MemoryLedger> {
    StreamEngine::linear(engine_addr(), funded_ledger(senders, amount)).expect("valid config")
}

/// Half-life engine bound to [`token`] over [`funded_ledger`].
pub fn half_life_engine(senders: &[Address], amount: u128) -> StreamEngine<MemoryLedger> {
    StreamEngine::half_life(engine_addr(), token(), funded_ledger(senders, amount))
        .expect("valid config")
}

/// Balances of `principals` in [`token`], in order.
pub fn ledger_balances(engine: &StreamEngine<MemoryLedger>, principals: &[Address]) -> Vec<u128> {
    principals
        .iter()
        .map(|p| engine.ledger().balance_of(&token(), p))
        .collect()
}

/// Check every invariant that must hold between calls at `height`.
///
/// Returns a description of the first violation.
pub fn check_engine(engine: &StreamEngine<MemoryLedger>, height: u64) -> Result<(), String> {
    let custody = engine.custody_balance(&token());
    let owed = engine.registry().custody_total(&token());
    if custody != owed {
        return Err(format!("custody {custody} != sum of remaining balances {owed}"));
    }

    for stream in engine.registry().iter() {
        check_record(stream).map_err(|e| e.to_string())?;
        check_shares(stream, height)?;
    }
    Ok(())
}

fn check_shares(stream: &Stream, height: u64) -> Result<(), String> {
    let shares = match accounting::balances(stream, height) {
        Ok(b) => b,
        // Queries below a stream's last mutation are allowed to refuse.
        Err(StreamError::HeightRegression { .. }) => return Ok(()),
        Err(e) => return Err(format!("stream {}: {e}", stream.id)),
    };
    if stream.is_terminal() {
        if shares.total() != 0 {
            return Err(format!("terminal stream {} reports balances", stream.id));
        }
    } else if shares.total() != stream.remaining_balance {
        return Err(format!(
            "stream {}: shares {} + {} != remaining {}",
            stream.id, shares.sender, shares.recipient, stream.remaining_balance
        ));
    }
    Ok(())
}

/// Recipient's cumulative entitlement: withdrawn plus withdrawable.
pub fn recipient_entitlement(stream: &Stream, height: u64) -> Result<u128, StreamError> {
    let b = accounting::balances(stream, height)?;
    Ok(stream.recipient_withdrawn.saturating_add(b.recipient))
}
