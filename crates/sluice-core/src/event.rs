//! Events emitted by the lifecycle controller for indexers and auditors.
//!
//! Exactly one event is emitted per successful mutating call.

use serde::{Deserialize, Serialize};

use crate::types::{Address, StreamId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum StreamEvent {
    /// A stream was created and its deposit moved into custody.
    StreamCreated {
        stream_id: StreamId,
        token: Address,
        sender: Address,
        recipient: Address,
        deposit_amount: u128,
        start_height: u64,
        stop_height: u64,
    },
    /// A party withdrew part of its balance.
    WithdrawFromStream {
        stream_id: StreamId,
        principal: Address,
        amount: u128,
    },
    /// The stream was canceled and both shares paid out.
    StreamCanceled {
        stream_id: StreamId,
        sender_share: u128,
        recipient_share: u128,
    },
}

impl StreamEvent {
    /// Stream the event refers to.
    pub fn stream_id(&self) -> StreamId {
        match self {
            Self::StreamCreated { stream_id, .. }
            | Self::WithdrawFromStream { stream_id, .. }
            | Self::StreamCanceled { stream_id, .. } => *stream_id,
        }
    }

    /// Event name as indexers know it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StreamCreated { .. } => "StreamCreated",
            Self::WithdrawFromStream { .. } => "WithdrawFromStream",
            Self::StreamCanceled { .. } => "StreamCanceled",
        }
    }
}
