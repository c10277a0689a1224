//! End-to-end stream scenarios against the in-memory ledger.
//!
//! Heights, deposits and expected balances are the reference cases both
//! engines must reproduce exactly.

use sluice_core::error::{ErrorKind, StreamError};
use sluice_core::event::StreamEvent;
use sluice_core::traits::TokenLedger;
use sluice_core::types::{Address, CallContext, StreamStatus};
use sluice_engine::{Balances, MemoryLedger, StreamEngine};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine_addr() -> Address {
    Address([0xEE; 20])
}

fn token() -> Address {
    Address([0x70; 20])
}

fn alice() -> Address {
    Address([0xA1; 20])
}

fn bob() -> Address {
    Address([0xB0; 20])
}

fn carol() -> Address {
    Address([0xC0; 20])
}

fn at(caller: Address, height: u64) -> CallContext {
    CallContext::new(caller, height)
}

/// Ledger where alice holds `amount` and has approved the engine for all of it.
fn alice_ledger(amount: u128) -> MemoryLedger {
    let mut ledger = MemoryLedger::new();
    ledger.mint(&token(), &alice(), amount).unwrap();
    ledger.approve(&token(), &alice(), &engine_addr(), amount);
    ledger
}

fn assert_balances(engine: &StreamEngine<MemoryLedger>, id: u64, height: u64, sender: u128, recipient: u128) {
    assert_eq!(
        engine.balance_of(id, &alice(), height).unwrap(),
        sender,
        "sender balance at {height}"
    );
    assert_eq!(
        engine.balance_of(id, &bob(), height).unwrap(),
        recipient,
        "recipient balance at {height}"
    );
}

// ---------------------------------------------------------------------------
// Half-life curve
// ---------------------------------------------------------------------------

#[test]
fn half_life_balances_follow_the_cdf() {
    let mut engine = StreamEngine::half_life(engine_addr(), token(), alice_ledger(60)).unwrap();
    let id = engine
        .create_stream(&at(alice(), 100), token(), bob(), 60, 140, 160)
        .unwrap();
    assert_eq!(id, 1);
    assert_eq!(engine.next_stream_id(), 2);

    assert_balances(&engine, id, 140, 60, 0);
    assert_balances(&engine, id, 145, 57, 3);
    assert_balances(&engine, id, 150, 30, 30);
    assert_balances(&engine, id, 155, 4, 56);
    assert_balances(&engine, id, 160, 0, 60);
    assert_balances(&engine, id, 1_000, 0, 60);
}

#[test]
fn half_life_recipient_drains_in_steps() {
    let mut engine = StreamEngine::half_life(engine_addr(), token(), alice_ledger(60)).unwrap();
    let id = engine
        .create_stream(&at(alice(), 100), token(), bob(), 60, 140, 160)
        .unwrap();

    engine.withdraw_from_stream(&at(bob(), 150), id, 30).unwrap();
    assert_balances(&engine, id, 155, 4, 26);
    engine.withdraw_from_stream(&at(bob(), 155), id, 26).unwrap();
    engine.withdraw_from_stream(&at(bob(), 160), id, 4).unwrap();

    assert_eq!(engine.ledger().balance_of(&token(), &bob()), 60);
    assert_eq!(engine.stream_status(id, 160).unwrap(), StreamStatus::Exhausted);
    assert_eq!(engine.custody_balance(&token()), 0);
}

// ---------------------------------------------------------------------------
// Linear curve
// ---------------------------------------------------------------------------

#[test]
fn linear_balances_follow_elapsed_fraction() {
    let mut engine = StreamEngine::linear(engine_addr(), alice_ledger(60)).unwrap();
    let id = engine
        .create_stream(&at(alice(), 100), token(), bob(), 60, 140, 160)
        .unwrap();

    assert_balances(&engine, id, 135, 60, 0);
    assert_balances(&engine, id, 155, 15, 45);
    assert_balances(&engine, id, 160, 0, 60);
    assert_eq!(engine.balance_of(id, &carol(), 155).unwrap(), 0);
}

#[test]
fn withdrawal_scenario() {
    let mut engine = StreamEngine::linear(engine_addr(), alice_ledger(100)).unwrap();
    let id = engine
        .create_stream(&at(alice(), 190), token(), bob(), 100, 200, 225)
        .unwrap();

    let err = engine.withdraw_from_stream(&at(carol(), 195), id, 1).unwrap_err();
    assert_eq!(err, StreamError::Unauthorized);
    assert_eq!(err.to_string(), "caller is not the sender or the recipient of the stream");
    assert_eq!(err.kind(), ErrorKind::Authorization);

    // 4 released at 201.
    let err = engine.withdraw_from_stream(&at(bob(), 201), id, 5).unwrap_err();
    assert_eq!(err.to_string(), "amount exceeds the available balance");
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    assert_eq!(engine.balance_of(id, &bob(), 210).unwrap(), 40);
    engine.withdraw_from_stream(&at(bob(), 210), id, 20).unwrap();
    assert_eq!(engine.ledger().balance_of(&token(), &bob()), 20);
    assert_eq!(engine.balance_of(id, &bob(), 211).unwrap(), 24);
    assert_eq!(engine.get_stream(id).unwrap().remaining_balance, 80);

    engine.withdraw_from_stream(&at(bob(), 250), id, 80).unwrap();
    let stream = engine.get_stream(id).unwrap();
    assert_eq!(stream.remaining_balance, 0);
    assert_eq!(stream.recipient_withdrawn, 100);
    assert_eq!(engine.ledger().balance_of(&token(), &bob()), 100);
    assert_eq!(engine.stream_status(id, 250).unwrap(), StreamStatus::Exhausted);

    assert_eq!(
        engine.withdraw_from_stream(&at(bob(), 251), id, 1),
        Err(StreamError::StreamSettled(id))
    );
}

#[test]
fn cancel_scenario() {
    let mut engine = StreamEngine::linear(engine_addr(), alice_ledger(2_000)).unwrap();

    let err = engine.cancel_stream(&at(alice(), 300), 10).unwrap_err();
    assert_eq!(err.to_string(), "stream does not exist");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let id = engine
        .create_stream(&at(alice(), 300), token(), bob(), 300, 350, 400)
        .unwrap();
    assert_eq!(engine.ledger().balance_of(&token(), &alice()), 1_700);
    assert_eq!(engine.custody_balance(&token()), 300);

    let shares = engine.cancel_stream(&at(bob(), 360), id).unwrap();
    assert_eq!(shares, Balances { sender: 240, recipient: 60 });
    assert_eq!(engine.ledger().balance_of(&token(), &bob()), 60);
    assert_eq!(engine.ledger().balance_of(&token(), &alice()), 1_940);
    assert_eq!(engine.custody_balance(&token()), 0);

    let stream = engine.get_stream(id).unwrap();
    assert_eq!(stream.remaining_balance, 0);
    assert_eq!(stream.canceled_at, Some(360));
    assert_eq!(stream.deposit_amount, 300);
}

// ---------------------------------------------------------------------------
// Cross-cutting
// ---------------------------------------------------------------------------

#[test]
fn events_emitted_once_per_mutation() {
    let mut engine = StreamEngine::linear(engine_addr(), alice_ledger(2_000)).unwrap();
    let id = engine
        .create_stream(&at(alice(), 300), token(), bob(), 300, 350, 400)
        .unwrap();
    assert_eq!(
        engine.withdraw_from_stream(&at(carol(), 355), id, 1),
        Err(StreamError::Unauthorized)
    );
    engine.withdraw_from_stream(&at(bob(), 355), id, 30).unwrap();
    engine.cancel_stream(&at(alice(), 360), id).unwrap();

    assert_eq!(
        engine.take_events(),
        vec![
            StreamEvent::StreamCreated {
                stream_id: id,
                token: token(),
                sender: alice(),
                recipient: bob(),
                deposit_amount: 300,
                start_height: 350,
                stop_height: 400,
            },
            StreamEvent::WithdrawFromStream {
                stream_id: id,
                principal: bob(),
                amount: 30,
            },
            StreamEvent::StreamCanceled {
                stream_id: id,
                sender_share: 240,
                recipient_share: 30,
            },
        ]
    );
}

#[test]
fn custody_tracks_remaining_across_streams() {
    let mut engine = StreamEngine::linear(engine_addr(), alice_ledger(1_000)).unwrap();
    let a = engine
        .create_stream(&at(alice(), 0), token(), bob(), 100, 10, 20)
        .unwrap();
    let b = engine
        .create_stream(&at(alice(), 0), token(), carol(), 400, 10, 50)
        .unwrap();
    assert_eq!((a, b), (1, 2));
    assert_eq!(engine.next_stream_id(), 3);

    engine.withdraw_from_stream(&at(bob(), 15), a, 50).unwrap();
    engine.cancel_stream(&at(alice(), 30), b).unwrap();

    let held = engine.custody_balance(&token());
    assert_eq!(held, engine.registry().custody_total(&token()));
    assert_eq!(held, 50);
}
