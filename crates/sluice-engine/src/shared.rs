//! Thread-safe handle over a [`StreamEngine`].
//!
//! Mutations take the write lock, so calls from any number of threads are
//! applied one at a time. Queries take a read lock and may run concurrently.

use std::sync::Arc;

use parking_lot::RwLock;

use sluice_core::error::StreamError;
use sluice_core::event::StreamEvent;
use sluice_core::traits::TokenLedger;
use sluice_core::types::{Address, CallContext, Stream, StreamId};

use crate::accounting::Balances;
use crate::engine::StreamEngine;

/// Cloneable handle sharing one engine between threads.
pub struct SharedEngine<L: TokenLedger> {
    inner: Arc<RwLock<StreamEngine<L>>>,
}

impl<L: TokenLedger> Clone for SharedEngine<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: TokenLedger + Sync> SharedEngine<L> {
    /// Wrap an engine.
    pub fn new(engine: StreamEngine<L>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// See [`StreamEngine::create_stream`].
    pub fn create_stream(
        &self,
        ctx: &CallContext,
        token: Address,
        recipient: Address,
        deposit: u128,
        start_height: u64,
        stop_height: u64,
    ) -> Result<StreamId, StreamError> {
        self.inner
            .write()
            .create_stream(ctx, token, recipient, deposit, start_height, stop_height)
    }

    /// See [`StreamEngine::withdraw_from_stream`].
    pub fn withdraw_from_stream(
        &self,
        ctx: &CallContext,
        id: StreamId,
        amount: u128,
    ) -> Result<(), StreamError> {
        self.inner.write().withdraw_from_stream(ctx, id, amount)
    }

    /// See [`StreamEngine::cancel_stream`].
    pub fn cancel_stream(&self, ctx: &CallContext, id: StreamId) -> Result<Balances, StreamError> {
        self.inner.write().cancel_stream(ctx, id)
    }

    /// A copy of the stream record.
    pub fn get_stream(&self, id: StreamId) -> Result<Stream, StreamError> {
        self.inner.read().get_stream(id).cloned()
    }

    /// See [`StreamEngine::balance_of`].
    pub fn balance_of(&self, id: StreamId, who: &Address, height: u64) -> Result<u128, StreamError> {
        self.inner.read().balance_of(id, who, height)
    }

    /// See [`StreamEngine::next_stream_id`].
    pub fn next_stream_id(&self) -> StreamId {
        self.inner.read().next_stream_id()
    }

    /// See [`StreamEngine::custody_balance`].
    pub fn custody_balance(&self, token: &Address) -> u128 {
        self.inner.read().custody_balance(token)
    }

    /// See [`StreamEngine::take_events`].
    pub fn take_events(&self) -> Vec<StreamEvent> {
        self.inner.write().take_events()
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut StreamEngine<L>) -> R) -> R {
        f(&mut self.inner.write())
    }
}
