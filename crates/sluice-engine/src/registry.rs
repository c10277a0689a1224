//! Stream registry: id assignment, record storage, snapshots.
//!
//! The registry is the engine's only persistent state. Ids are assigned
//! sequentially from [`FIRST_STREAM_ID`] and never reused; records are never
//! removed, terminal streams stay queryable.
//!
//! Snapshots are bincode-encoded [`RegistrySnapshot`]s. Decoding re-checks
//! every record, so a snapshot that would violate an accounting invariant
//! is rejected instead of loaded.

use std::collections::BTreeMap;

use sluice_core::constants::FIRST_STREAM_ID;
use sluice_core::error::{SluiceError, StreamError};
use sluice_core::types::{Address, Stream, StreamId};

use crate::accounting::check_record;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a registry.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RegistrySnapshot {
    /// Format version, [`SNAPSHOT_VERSION`] when written by this crate.
    pub version: u32,
    /// Next id to assign.
    pub next_id: StreamId,
    /// Highest height any mutation was processed at.
    pub last_height: u64,
    /// All records in id order.
    pub streams: Vec<Stream>,
}

/// All streams of one engine, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRegistry {
    streams: BTreeMap<StreamId, Stream>,
    next_id: StreamId,
    last_height: u64,
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            streams: BTreeMap::new(),
            next_id: FIRST_STREAM_ID,
            last_height: 0,
        }
    }

    /// Look up a stream.
    ///
    /// # Errors
    ///
    /// [`StreamError::StreamNotFound`] if no stream has this id.
    pub fn get(&self, id: StreamId) -> Result<&Stream, StreamError> {
        self.streams.get(&id).ok_or(StreamError::StreamNotFound(id))
    }

    /// Whether a stream with this id exists.
    pub fn contains(&self, id: StreamId) -> bool {
        self.streams.contains_key(&id)
    }

    /// The id the next created stream will receive.
    pub fn next_id(&self) -> StreamId {
        self.next_id
    }

    /// Check that an id is available without consuming it.
    pub fn reserve_id(&self) -> Result<StreamId, StreamError> {
        if self.next_id == StreamId::MAX {
            return Err(StreamError::IdExhausted);
        }
        Ok(self.next_id)
    }

    /// Store a new stream under the id returned by [`reserve_id`](Self::reserve_id).
    pub fn append(&mut self, stream: Stream) {
        debug_assert_eq!(stream.id, self.next_id);
        self.next_id = stream.id + 1;
        self.streams.insert(stream.id, stream);
    }

    /// Overwrite an existing record.
    pub fn update(&mut self, stream: Stream) {
        debug_assert!(self.streams.contains_key(&stream.id));
        self.streams.insert(stream.id, stream);
    }

    /// Highest height a mutation was processed at.
    pub fn last_height(&self) -> u64 {
        self.last_height
    }

    /// Reject a mutation at a height below the last processed one.
    pub fn check_height(&self, height: u64) -> Result<(), StreamError> {
        if height < self.last_height {
            return Err(StreamError::HeightRegression {
                last: self.last_height,
                got: height,
            });
        }
        Ok(())
    }

    /// Record that a mutation was processed at `height`.
    pub fn advance_height(&mut self, height: u64) {
        self.last_height = self.last_height.max(height);
    }

    /// Number of streams ever created.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no stream was ever created.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// All streams in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Stream> {
        self.streams.values()
    }

    /// Sum of remaining balances over all streams in `token`.
    ///
    /// Equals the engine's custody holding of `token` when every transfer
    /// into and out of custody went through the engine.
    pub fn custody_total(&self, token: &Address) -> u128 {
        self.streams
            .values()
            .filter(|s| s.token == *token)
            .fold(0u128, |acc, s| acc.saturating_add(s.remaining_balance))
    }

    /// Capture the registry as a snapshot value.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            version: SNAPSHOT_VERSION,
            next_id: self.next_id,
            last_height: self.last_height,
            streams: self.streams.values().cloned().collect(),
        }
    }

    /// Encode the registry with bincode.
    pub fn encode(&self) -> Result<Vec<u8>, SluiceError> {
        bincode::encode_to_vec(self.snapshot(), bincode::config::standard())
            .map_err(|e| SluiceError::Snapshot(e.to_string()))
    }

    /// Decode a registry written by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, SluiceError> {
        let (snapshot, read): (RegistrySnapshot, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| SluiceError::Snapshot(e.to_string()))?;
        if read != bytes.len() {
            return Err(SluiceError::Snapshot(format!(
                "{} trailing bytes",
                bytes.len() - read
            )));
        }
        Self::from_snapshot(snapshot)
    }

    /// Rebuild a registry from a snapshot value, checking every record.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self, SluiceError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SluiceError::Snapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }
        if snapshot.next_id < FIRST_STREAM_ID {
            return Err(SluiceError::Snapshot(format!("invalid next id {}", snapshot.next_id)));
        }

        let mut streams = BTreeMap::new();
        for stream in snapshot.streams {
            if stream.id < FIRST_STREAM_ID || stream.id >= snapshot.next_id {
                return Err(SluiceError::Snapshot(format!(
                    "stream id {} outside assigned range",
                    stream.id
                )));
            }
            check_record(&stream)?;
            if let Some(prev) = streams.insert(stream.id, stream) {
                return Err(SluiceError::Snapshot(format!("duplicate stream id {}", prev.id)));
            }
        }

        Ok(Self {
            streams,
            next_id: snapshot.next_id,
            last_height: snapshot.last_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::types::CurveParams;

    fn token() -> Address {
        Address([0x70; 20])
    }

    fn stream(id: StreamId, deposit: u128) -> Stream {
        Stream {
            id,
            token: token(),
            sender: Address([0xA1; 20]),
            recipient: Address([0xB0; 20]),
            deposit_amount: deposit,
            start_height: 100,
            stop_height: 200,
            remaining_balance: deposit,
            sender_withdrawn: 0,
            recipient_withdrawn: 0,
            curve: CurveParams::Linear,
            canceled_at: None,
            last_updated: 90,
        }
    }

    fn populated() -> StreamRegistry {
        let mut r = StreamRegistry::new();
        for deposit in [60, 300] {
            let id = r.reserve_id().unwrap();
            r.append(stream(id, deposit));
        }
        r.advance_height(90);
        r
    }

    #[test]
    fn ids_start_at_one() {
        let mut r = StreamRegistry::new();
        assert_eq!(r.next_id(), 1);
        let id = r.reserve_id().unwrap();
        assert_eq!(id, 1);
        // Reserving alone does not consume.
        assert_eq!(r.reserve_id().unwrap(), 1);
        r.append(stream(id, 60));
        assert_eq!(r.next_id(), 2);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let r = populated();
        assert_eq!(r.get(10), Err(StreamError::StreamNotFound(10)));
        assert_eq!(r.get(0), Err(StreamError::StreamNotFound(0)));
        assert_eq!(r.get(2).unwrap().deposit_amount, 300);
    }

    #[test]
    fn id_exhaustion() {
        let mut snap = populated().snapshot();
        snap.next_id = StreamId::MAX;
        let r = StreamRegistry::from_snapshot(snap).unwrap();
        assert_eq!(r.reserve_id(), Err(StreamError::IdExhausted));
    }

    #[test]
    fn update_replaces_record() {
        let mut r = populated();
        let mut s = r.get(1).unwrap().clone();
        s.remaining_balance = 0;
        s.recipient_withdrawn = 60;
        r.update(s.clone());
        assert_eq!(r.get(1).unwrap(), &s);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn height_regression_detected() {
        let mut r = populated();
        r.advance_height(150);
        assert!(r.check_height(150).is_ok());
        assert_eq!(
            r.check_height(149),
            Err(StreamError::HeightRegression { last: 150, got: 149 })
        );
        r.advance_height(120);
        assert_eq!(r.last_height(), 150);
    }

    #[test]
    fn custody_total_per_token() {
        let mut r = populated();
        let other = Address([0x71; 20]);
        let id = r.reserve_id().unwrap();
        let mut s = stream(id, 1000);
        s.token = other;
        r.append(s);
        assert_eq!(r.custody_total(&token()), 360);
        assert_eq!(r.custody_total(&other), 1000);
    }

    #[test]
    fn snapshot_roundtrip() {
        let r = populated();
        let bytes = r.encode().unwrap();
        let back = StreamRegistry::decode(&bytes).unwrap();
        assert_eq!(back, r);
        assert_eq!(back.next_id(), 3);
        assert_eq!(back.last_height(), 90);
    }

    #[test]
    fn snapshot_rejects_trailing_bytes() {
        let mut bytes = populated().encode().unwrap();
        bytes.push(0);
        assert!(matches!(StreamRegistry::decode(&bytes), Err(SluiceError::Snapshot(_))));
    }

    #[test]
    fn snapshot_rejects_bad_version() {
        let mut snap = populated().snapshot();
        snap.version = 99;
        assert!(matches!(
            StreamRegistry::from_snapshot(snap),
            Err(SluiceError::Snapshot(_))
        ));
    }

    #[test]
    fn snapshot_rejects_inconsistent_record() {
        let mut snap = populated().snapshot();
        snap.streams[0].remaining_balance = 10;
        assert!(matches!(
            StreamRegistry::from_snapshot(snap),
            Err(SluiceError::Stream(StreamError::AccountingInvariant(_)))
        ));
    }

    #[test]
    fn snapshot_rejects_unassigned_ids() {
        let mut snap = populated().snapshot();
        snap.streams[1].id = 7;
        assert!(StreamRegistry::from_snapshot(snap).is_err());

        let mut snap = populated().snapshot();
        snap.streams[1].id = 1;
        assert!(StreamRegistry::from_snapshot(snap).is_err());
    }
}
