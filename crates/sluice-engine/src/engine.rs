//! Lifecycle controller: create, withdraw and cancel over the registry.
//!
//! Every mutating call follows the same shape:
//!
//! 1. Validate arguments, authorization and funds against the current state.
//! 2. Build the new record and check its invariants.
//! 3. Move tokens through the ledger (the only fallible side effect).
//! 4. Commit the record, advance the height, emit exactly one event.
//!
//! A failure in steps 1-3 returns before the registry is touched, and the
//! ledger contract guarantees a failed transfer changed nothing, so every
//! call is all-or-nothing.

use tracing::{debug, info, warn};

use sluice_core::error::{SluiceError, StreamError};
use sluice_core::event::StreamEvent;
use sluice_core::traits::{ReleaseCurve, TokenLedger};
use sluice_core::types::{Address, CallContext, Stream, StreamId, StreamStatus};
use sluice_curve::Curve;

use crate::accounting::{self, check_record, invariant, Balances};
use crate::config::EngineConfig;
use crate::registry::StreamRegistry;

/// A payment-stream engine over a token ledger.
#[derive(Debug)]
pub struct StreamEngine<L: TokenLedger> {
    config: EngineConfig,
    curve: Curve,
    registry: StreamRegistry,
    ledger: L,
    events: Vec<StreamEvent>,
}

impl<L: TokenLedger> StreamEngine<L> {
    /// Create an engine with an empty registry.
    pub fn new(config: EngineConfig, ledger: L) -> Result<Self, SluiceError> {
        Self::with_registry(config, ledger, StreamRegistry::new())
    }

    /// Linear engine accepting any token.
    pub fn linear(engine_address: Address, ledger: L) -> Result<Self, SluiceError> {
        Self::new(EngineConfig::linear(engine_address), ledger)
    }

    /// Half-life engine bound to `token`.
    pub fn half_life(engine_address: Address, token: Address, ledger: L) -> Result<Self, SluiceError> {
        Self::new(EngineConfig::half_life(engine_address, token), ledger)
    }

    /// Restore an engine from a snapshot written by [`snapshot`](Self::snapshot).
    pub fn from_snapshot(config: EngineConfig, ledger: L, bytes: &[u8]) -> Result<Self, SluiceError> {
        Self::with_registry(config, ledger, StreamRegistry::decode(bytes)?)
    }

    /// Create an engine over an existing registry.
    pub fn with_registry(
        config: EngineConfig,
        ledger: L,
        registry: StreamRegistry,
    ) -> Result<Self, SluiceError> {
        let curve = config.validate()?;
        info!(
            engine = %config.engine_address,
            curve = ?curve.params(),
            streams = registry.len(),
            "stream engine ready"
        );
        Ok(Self {
            config,
            curve,
            registry,
            ledger,
            events: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a stream funded by the caller.
    ///
    /// The caller must have approved the engine for at least `deposit` of
    /// `token`. On success the deposit sits in the engine's custody account
    /// and the new stream's id is returned.
    ///
    /// # Errors
    ///
    /// Validation errors for bad arguments, [`StreamError::InsufficientAllowance`]
    /// or [`StreamError::InsufficientFunds`] if the caller cannot fund the
    /// deposit, [`StreamError::IdExhausted`] if no id is left.
    pub fn create_stream(
        &mut self,
        ctx: &CallContext,
        token: Address,
        recipient: Address,
        deposit: u128,
        start_height: u64,
        stop_height: u64,
    ) -> Result<StreamId, StreamError> {
        self.registry.check_height(ctx.height)?;
        let custody = self.config.engine_address;
        let sender = ctx.caller;

        if !self.config.accepts(&token) {
            return Err(StreamError::TokenNotAccepted(token.to_string()));
        }
        if sender == custody {
            return Err(StreamError::Unauthorized);
        }
        if deposit == 0 {
            return Err(StreamError::ZeroDeposit);
        }
        if recipient.is_zero() {
            return Err(StreamError::RecipientIsZero);
        }
        if recipient == custody {
            return Err(StreamError::RecipientIsEngine);
        }
        if recipient == sender {
            return Err(StreamError::RecipientIsSender);
        }
        if start_height >= stop_height {
            return Err(StreamError::InvalidInterval {
                start: start_height,
                stop: stop_height,
            });
        }
        if !self.config.start_policy.permits(start_height, ctx.height) {
            return Err(StreamError::StartInPast {
                start: start_height,
                current: ctx.height,
            });
        }
        let max = self.curve.max_deposit(start_height, stop_height);
        if deposit > max {
            return Err(StreamError::DepositTooLarge { deposit, max });
        }

        let allowance = self.ledger.allowance(&token, &sender, &custody);
        if allowance < deposit {
            return Err(StreamError::InsufficientAllowance {
                have: allowance,
                need: deposit,
            });
        }
        let funds = self.ledger.balance_of(&token, &sender);
        if funds < deposit {
            return Err(StreamError::InsufficientFunds {
                have: funds,
                need: deposit,
            });
        }

        let id = self.registry.reserve_id()?;
        let stream = Stream {
            id,
            token,
            sender,
            recipient,
            deposit_amount: deposit,
            start_height,
            stop_height,
            remaining_balance: deposit,
            sender_withdrawn: 0,
            recipient_withdrawn: 0,
            curve: self.curve.params(),
            canceled_at: None,
            last_updated: ctx.height,
        };
        check_record(&stream)?;

        self.ledger.transfer_into(&token, &custody, &sender, deposit)?;

        self.registry.append(stream);
        self.registry.advance_height(ctx.height);
        self.events.push(StreamEvent::StreamCreated {
            stream_id: id,
            token,
            sender,
            recipient,
            deposit_amount: deposit,
            start_height,
            stop_height,
        });
        info!(
            stream_id = id,
            %sender,
            %recipient,
            deposit,
            start_height,
            stop_height,
            "stream created"
        );
        Ok(id)
    }

    /// Withdraw `amount` of the caller's balance from a stream.
    ///
    /// # Errors
    ///
    /// - [`StreamError::StreamNotFound`] / [`StreamError::StreamSettled`]
    /// - [`StreamError::Unauthorized`] if the caller is not a party
    /// - [`StreamError::ZeroAmount`]
    /// - [`StreamError::AmountExceedsBalance`] if `amount` is above the caller's balance
    pub fn withdraw_from_stream(
        &mut self,
        ctx: &CallContext,
        id: StreamId,
        amount: u128,
    ) -> Result<(), StreamError> {
        self.registry.check_height(ctx.height)?;
        let stream = self.active_stream(ctx, id)?;
        if amount == 0 {
            return Err(StreamError::ZeroAmount);
        }

        let available = accounting::balance_of(stream, &ctx.caller, ctx.height)?;
        if amount > available {
            return Err(StreamError::AmountExceedsBalance {
                requested: amount,
                available,
            });
        }

        let mut updated = stream.clone();
        let counter = if ctx.caller == updated.recipient {
            &mut updated.recipient_withdrawn
        } else {
            &mut updated.sender_withdrawn
        };
        *counter = counter
            .checked_add(amount)
            .ok_or_else(|| invariant(stream, "withdrawal counter overflow"))?;
        updated.remaining_balance = updated
            .remaining_balance
            .checked_sub(amount)
            .ok_or_else(|| invariant(stream, "withdrawal exceeds the remaining balance"))?;
        updated.last_updated = ctx.height;
        check_record(&updated)?;

        self.ledger
            .transfer_out(&updated.token, &self.config.engine_address, &ctx.caller, amount)?;

        let remaining = updated.remaining_balance;
        self.registry.update(updated);
        self.registry.advance_height(ctx.height);
        self.events.push(StreamEvent::WithdrawFromStream {
            stream_id: id,
            principal: ctx.caller,
            amount,
        });
        debug!(stream_id = id, principal = %ctx.caller, amount, remaining, "withdrew from stream");
        Ok(())
    }

    /// Cancel a stream, paying each party its balance at the current height.
    ///
    /// Returns the two shares that were paid out.
    ///
    /// # Errors
    ///
    /// - [`StreamError::StreamNotFound`] / [`StreamError::StreamSettled`]
    /// - [`StreamError::Unauthorized`] if the caller is not a party
    /// - [`StreamError::InsufficientFunds`] if custody cannot cover the remaining balance
    /// - [`StreamError::Ledger`] if the ledger refuses either payout; nobody is paid
    pub fn cancel_stream(&mut self, ctx: &CallContext, id: StreamId) -> Result<Balances, StreamError> {
        self.registry.check_height(ctx.height)?;
        let stream = self.active_stream(ctx, id)?;
        let shares = accounting::balances(stream, ctx.height)?;

        let mut updated = stream.clone();
        updated.sender_withdrawn = updated
            .sender_withdrawn
            .checked_add(shares.sender)
            .ok_or_else(|| invariant(stream, "sender counter overflow"))?;
        updated.recipient_withdrawn = updated
            .recipient_withdrawn
            .checked_add(shares.recipient)
            .ok_or_else(|| invariant(stream, "recipient counter overflow"))?;
        updated.remaining_balance = 0;
        updated.canceled_at = Some(ctx.height);
        updated.last_updated = ctx.height;
        check_record(&updated)?;

        let custody = self.config.engine_address;
        let held = self.ledger.balance_of(&updated.token, &custody);
        if held < shares.total() {
            return Err(StreamError::InsufficientFunds {
                have: held,
                need: shares.total(),
            });
        }
        // Both shares in one ledger call: a refused credit pays nobody.
        let payouts: Vec<(Address, u128)> = [
            (updated.recipient, shares.recipient),
            (updated.sender, shares.sender),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
        .collect();
        self.ledger.settle(&updated.token, &custody, &payouts)?;

        self.registry.update(updated);
        self.registry.advance_height(ctx.height);
        self.events.push(StreamEvent::StreamCanceled {
            stream_id: id,
            sender_share: shares.sender,
            recipient_share: shares.recipient,
        });
        info!(
            stream_id = id,
            canceled_by = %ctx.caller,
            sender_share = shares.sender,
            recipient_share = shares.recipient,
            "stream canceled"
        );
        Ok(shares)
    }

    /// Existing, non-terminal stream the caller is a party to.
    fn active_stream(&self, ctx: &CallContext, id: StreamId) -> Result<&Stream, StreamError> {
        let stream = self.registry.get(id)?;
        if stream.is_terminal() {
            return Err(StreamError::StreamSettled(id));
        }
        if !stream.is_party(&ctx.caller) {
            warn!(stream_id = id, caller = %ctx.caller, "rejected call from non-party");
            return Err(StreamError::Unauthorized);
        }
        Ok(stream)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The full record of a stream, terminal or not.
    pub fn get_stream(&self, id: StreamId) -> Result<&Stream, StreamError> {
        self.registry.get(id)
    }

    /// Balance of `who` in stream `id` at `height`. Zero for non-parties.
    pub fn balance_of(&self, id: StreamId, who: &Address, height: u64) -> Result<u128, StreamError> {
        accounting::balance_of(self.registry.get(id)?, who, height)
    }

    /// Both parties' balances in stream `id` at `height`.
    pub fn balances(&self, id: StreamId, height: u64) -> Result<Balances, StreamError> {
        accounting::balances(self.registry.get(id)?, height)
    }

    /// Lifecycle status of stream `id` at `height`.
    pub fn stream_status(&self, id: StreamId, height: u64) -> Result<StreamStatus, StreamError> {
        Ok(self.registry.get(id)?.status(height))
    }

    /// The id the next created stream will receive.
    pub fn next_stream_id(&self) -> StreamId {
        self.registry.next_id()
    }

    /// What the engine holds in custody for `token`, per the ledger.
    pub fn custody_balance(&self, token: &Address) -> u128 {
        self.ledger.balance_of(token, &self.config.engine_address)
    }

    /// Highest height a mutation was processed at.
    pub fn last_height(&self) -> u64 {
        self.registry.last_height()
    }

    /// The engine's own address.
    pub fn address(&self) -> Address {
        self.config.engine_address
    }

    /// The token this engine is bound to, if any.
    pub fn bound_token(&self) -> Option<Address> {
        self.config.accepted_token
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stream registry.
    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable access to the ledger, for hosts that fund and approve through it.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Events emitted since the last [`take_events`](Self::take_events), oldest first.
    ///
    /// The log is not bounded: it grows by one event per successful mutation
    /// until the host drains it.
    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    /// Drain the event log. Long-running hosts should call this after every
    /// batch of calls, or the log keeps every event in memory.
    pub fn take_events(&mut self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.events)
    }

    /// Encode the registry for persistence.
    pub fn snapshot(&self) -> Result<Vec<u8>, SluiceError> {
        self.registry.encode()
    }
}
