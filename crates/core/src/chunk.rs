//! Chunk: ordered batch returned by a single upstream fetch
//!
//! The upstream returns the newest records of the requested window in an
//! unspecified order (newest-first in practice, but never relied on). A
//! chunk therefore keeps the received order and resolves orientation by
//! comparing the ids of its first and last records.
//!
//! Filters return sub-chunks in the original order; the engine applies them
//! to cut a chunk at the anchor id and at the target bounds before insert.

use crate::{SeriesInfo, Timestamp, TradeId, TradeRecord};

/// Ordered in-memory batch of trades from one upstream fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    records: Vec<TradeRecord>,
}

impl Chunk {
    /// Create a chunk from records in received order
    pub fn new(records: Vec<TradeRecord>) -> Self {
        Chunk { records }
    }

    /// An empty chunk (the upstream's "nothing in this window" answer)
    pub fn empty() -> Self {
        Chunk::default()
    }

    /// Whether the chunk holds no records
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// The records in received order
    #[inline]
    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    /// Consume the chunk, yielding its records in received order
    pub fn into_records(self) -> Vec<TradeRecord> {
        self.records
    }

    /// Approximate in-memory size in bytes
    pub fn memory(&self) -> u64 {
        (self.records.len() * TradeRecord::MEMORY) as u64
    }

    // =========================================================================
    // Orientation and bounds
    // =========================================================================

    /// Bounds/density snapshot, or `None` for an empty chunk
    ///
    /// Orientation is resolved by comparing the first and last records' ids;
    /// the received order is never assumed.
    pub fn info(&self) -> Option<SeriesInfo> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        let (oldest, newest) = if first.id <= last.id {
            (first, last)
        } else {
            (last, first)
        };
        Some(SeriesInfo {
            from_ts: oldest.ts,
            from_id: oldest.id,
            to_ts: newest.ts,
            to_id: newest.id,
            count: self.records.len() as u64,
            memory: self.memory(),
        })
    }

    /// Density gate: `count == to_id - from_id + 1`
    ///
    /// An empty chunk fails the gate (there is nothing to commit).
    pub fn verify(&self) -> bool {
        self.info().map(|info| info.is_dense()).unwrap_or(false)
    }

    // =========================================================================
    // Membership predicates
    // =========================================================================

    /// Whether any record has exactly this id
    pub fn contains_id(&self, id: TradeId) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    /// Whether any record has `id <= bound`
    pub fn any_id_le(&self, bound: TradeId) -> bool {
        self.records.iter().any(|r| r.id <= bound)
    }

    /// Whether any record has `id >= bound`
    pub fn any_id_ge(&self, bound: TradeId) -> bool {
        self.records.iter().any(|r| r.id >= bound)
    }

    /// Whether any record has `ts <= bound`
    pub fn any_ts_le(&self, bound: Timestamp) -> bool {
        self.records.iter().any(|r| r.ts <= bound)
    }

    // =========================================================================
    // Filters (original order preserved)
    // =========================================================================

    /// Keep records with `id < bound`
    pub fn retain_id_lt(&mut self, bound: TradeId) {
        self.records.retain(|r| r.id < bound);
    }

    /// Keep records with `id > bound`
    pub fn retain_id_gt(&mut self, bound: TradeId) {
        self.records.retain(|r| r.id > bound);
    }

    /// Keep records with `ts >= bound`
    pub fn retain_ts_ge(&mut self, bound: Timestamp) {
        self.records.retain(|r| r.ts >= bound);
    }

    /// Keep records with `ts <= bound`
    pub fn retain_ts_le(&mut self, bound: Timestamp) {
        self.records.retain(|r| r.ts <= bound);
    }

    /// Drop records whose id already occurred earlier in the received order
    ///
    /// Rows with unparsable fields never reach a chunk (the upstream gateway
    /// drops them at decode time), so id duplicates are the only impurity
    /// left to clean before the density gate.
    pub fn dedup_by_id(&mut self) {
        let mut seen = std::collections::HashSet::with_capacity(self.records.len());
        self.records.retain(|r| seen.insert(r.id));
    }
}

impl From<Vec<TradeRecord>> for Chunk {
    fn from(records: Vec<TradeRecord>) -> Self {
        Chunk::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GlobalTradeId, Side};
    use rust_decimal::Decimal;

    fn record(id: u64, ts: u64) -> TradeRecord {
        TradeRecord {
            id: TradeId::new(id),
            ts: Timestamp::from_secs(ts),
            global_id: GlobalTradeId::new(id),
            amount: Decimal::ONE,
            rate: Decimal::TEN,
            total: Decimal::TEN,
            side: Side::Sell,
        }
    }

    /// Newest-first, as the upstream answers in practice
    fn descending(ids: std::ops::RangeInclusive<u64>) -> Chunk {
        Chunk::new(ids.rev().map(|id| record(id, id + 1000)).collect())
    }

    #[test]
    fn test_empty_chunk() {
        let c = Chunk::empty();
        assert!(c.is_empty());
        assert!(c.info().is_none());
        assert!(!c.verify());
    }

    #[test]
    fn test_info_orientation_descending() {
        let c = descending(100..=149);
        let info = c.info().unwrap();
        assert_eq!(info.from_id, TradeId::new(100));
        assert_eq!(info.to_id, TradeId::new(149));
        assert_eq!(info.from_ts, Timestamp::from_secs(1100));
        assert_eq!(info.to_ts, Timestamp::from_secs(1149));
        assert_eq!(info.count, 50);
    }

    #[test]
    fn test_info_orientation_ascending() {
        let c = Chunk::new((100..=149).map(|id| record(id, id + 1000)).collect());
        let info = c.info().unwrap();
        assert_eq!(info.from_id, TradeId::new(100));
        assert_eq!(info.to_id, TradeId::new(149));
    }

    #[test]
    fn test_info_single_record() {
        let c = Chunk::new(vec![record(7, 70)]);
        let info = c.info().unwrap();
        assert_eq!(info.from_id, info.to_id);
        assert_eq!(info.count, 1);
        assert!(c.verify());
    }

    #[test]
    fn test_verify_dense_and_gapped() {
        assert!(descending(100..=149).verify());

        let mut records: Vec<_> = (100..=149).rev().map(|id| record(id, id)).collect();
        records.retain(|r| r.id != TradeId::new(120));
        assert!(!Chunk::new(records).verify());
    }

    #[test]
    fn test_retain_id_lt_preserves_order() {
        let mut c = descending(100..=149);
        c.retain_id_lt(TradeId::new(120));
        assert_eq!(c.len(), 20);
        let ids: Vec<u64> = c.records().iter().map(|r| r.id.as_u64()).collect();
        let expected: Vec<u64> = (100..=119).rev().collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_retain_id_gt() {
        let mut c = descending(100..=149);
        c.retain_id_gt(TradeId::new(140));
        assert_eq!(c.len(), 9);
        assert!(!c.contains_id(TradeId::new(140)));
        assert!(c.contains_id(TradeId::new(141)));
    }

    #[test]
    fn test_retain_ts_bounds() {
        let mut c = descending(100..=149);
        c.retain_ts_ge(Timestamp::from_secs(1110));
        c.retain_ts_le(Timestamp::from_secs(1120));
        assert_eq!(c.len(), 11);
        assert!(c.verify());
    }

    #[test]
    fn test_membership_predicates() {
        let c = descending(100..=149);
        assert!(c.contains_id(TradeId::new(100)));
        assert!(!c.contains_id(TradeId::new(99)));
        assert!(c.any_id_le(TradeId::new(100)));
        assert!(!c.any_id_le(TradeId::new(99)));
        assert!(c.any_id_ge(TradeId::new(149)));
        assert!(!c.any_id_ge(TradeId::new(150)));
        assert!(c.any_ts_le(Timestamp::from_secs(1100)));
        assert!(!c.any_ts_le(Timestamp::from_secs(1099)));
    }

    #[test]
    fn test_dedup_by_id_keeps_first() {
        let mut records = vec![record(3, 30), record(2, 20), record(3, 31), record(1, 10)];
        let mut c = Chunk::new(records.clone());
        c.dedup_by_id();
        assert_eq!(c.len(), 3);
        // First occurrence of id 3 (ts 30) survives
        assert_eq!(c.records()[0].ts, Timestamp::from_secs(30));

        records.truncate(2);
        let mut clean = Chunk::new(records);
        clean.dedup_by_id();
        assert_eq!(clean.len(), 2);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any permutation of a dense id run yields the same bounds and
            /// passes the density gate.
            #[test]
            fn info_is_order_independent(start in 0u64..10_000, len in 1usize..200, seed in any::<u64>()) {
                let mut records: Vec<_> = (start..start + len as u64)
                    .map(|id| record(id, id))
                    .collect();
                // Cheap deterministic shuffle
                let n = records.len();
                for i in 0..n {
                    let j = (seed.wrapping_mul(i as u64 + 1) % n as u64) as usize;
                    records.swap(i, j);
                }
                let c = Chunk::new(records);
                let info = c.info().unwrap();
                prop_assert_eq!(info.from_id, TradeId::new(start));
                prop_assert_eq!(info.to_id, TradeId::new(start + len as u64 - 1));
                prop_assert!(info.is_dense());
            }

            /// Filtering below a bound never leaves an id at or above it.
            #[test]
            fn retain_lt_respects_bound(bound in 0u64..300, len in 1usize..100) {
                let mut c = Chunk::new((0..len as u64).map(|id| record(id, id)).collect());
                c.retain_id_lt(TradeId::new(bound));
                prop_assert!(c.records().iter().all(|r| r.id < TradeId::new(bound)));
            }
        }
    }
}
