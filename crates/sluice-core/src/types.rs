//! Core stream types: principals, stream records, call context.
//!
//! All amounts are `u128` in the smallest token unit. All heights are `u64`
//! block heights supplied by the caller; nothing here reads a clock.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_CDF_SPREAD_PPB;
use crate::error::AddressError;

/// Stream identifier. Assigned sequentially by the registry, never reused.
pub type StreamId = u64;

/// A 20-byte principal identifier (account, token or engine address).
///
/// Serde uses the `0x`-prefixed hex form; bincode uses the raw bytes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Never a valid recipient.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an Address from a byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != 40 {
            return Err(AddressError::InvalidLength(digits.len()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Release-curve parameters recorded on a stream at creation.
///
/// Pure data; the curve implementations live in `sluice-curve`.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default,
    bincode::Encode, bincode::Decode,
)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveParams {
    /// Constant-rate release over the interval.
    #[default]
    Linear,
    /// Normal-CDF release over `[-spread, +spread]` standard deviations.
    HalfLife {
        /// Curve spread in ppb of one standard deviation.
        spread_ppb: u64,
    },
}

impl CurveParams {
    /// Half-life parameters with the default spread.
    pub fn half_life() -> Self {
        Self::HalfLife {
            spread_ppb: DEFAULT_CDF_SPREAD_PPB,
        }
    }
}

/// A single deposit-and-release commitment from sender to recipient.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Stream {
    /// Registry-assigned identifier.
    pub id: StreamId,
    /// Token the deposit is denominated in.
    pub token: Address,
    /// Principal that funded the stream.
    pub sender: Address,
    /// Principal the deposit releases to.
    pub recipient: Address,
    /// Total value committed at creation. Immutable.
    pub deposit_amount: u128,
    /// First height of the release interval.
    pub start_height: u64,
    /// Height at which the whole deposit has been released.
    pub stop_height: u64,
    /// Deposit minus everything withdrawn or settled. Zero means terminal.
    pub remaining_balance: u128,
    /// Total withdrawn by the sender.
    pub sender_withdrawn: u128,
    /// Total withdrawn by the recipient.
    pub recipient_withdrawn: u128,
    /// Release curve fixed at creation.
    pub curve: CurveParams,
    /// Height of cancellation, if the stream was canceled.
    pub canceled_at: Option<u64>,
    /// Height of the last mutation (creation, withdrawal or cancellation).
    pub last_updated: u64,
}

impl Stream {
    /// Whether the stream is settled and can no longer be mutated.
    pub fn is_terminal(&self) -> bool {
        self.remaining_balance == 0
    }

    /// Whether `who` is the sender or the recipient.
    pub fn is_party(&self, who: &Address) -> bool {
        *who == self.sender || *who == self.recipient
    }

    /// Length of the release interval in blocks.
    pub fn duration(&self) -> u64 {
        self.stop_height.saturating_sub(self.start_height)
    }

    /// Sum of both parties' withdrawals.
    pub fn total_withdrawn(&self) -> u128 {
        self.sender_withdrawn.saturating_add(self.recipient_withdrawn)
    }

    /// Lifecycle status as observed at `height`.
    pub fn status(&self, height: u64) -> StreamStatus {
        if self.canceled_at.is_some() {
            StreamStatus::Canceled
        } else if self.is_terminal() {
            StreamStatus::Exhausted
        } else if height < self.start_height {
            StreamStatus::Pending
        } else if height < self.stop_height {
            StreamStatus::Streaming
        } else {
            StreamStatus::Completed
        }
    }
}

/// Derived lifecycle view of a stream at a given height.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamStatus {
    /// Active, release has not started yet.
    Pending,
    /// Active, inside the release interval.
    Streaming,
    /// Active, fully released but not yet fully withdrawn.
    Completed,
    /// Terminal: settled by cancellation.
    Canceled,
    /// Terminal: withdrawn to zero.
    Exhausted,
}

impl StreamStatus {
    /// Whether the status is a persisted terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Exhausted)
    }
}

/// Ambient context of a call: who is calling and at which block height.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// The calling principal.
    pub caller: Address,
    /// The current block height.
    pub height: u64,
}

impl CallContext {
    /// Context for `caller` at `height`.
    pub fn new(caller: Address, height: u64) -> Self {
        Self { caller, height }
    }
}
