//! Series bounds and density snapshot
//!
//! `SeriesInfo` is the derived summary of a run of trades, whether held in
//! memory as a chunk or stored as an archive series: its oldest and newest
//! records, its row count and approximate size.
//!
//! The core consistency invariant of the whole system is **density**:
//!
//! ```text
//! count == to_id - from_id + 1
//! ```
//!
//! A positive deviation means duplicate ids, a negative one means gaps.
//! Every chunk is gated on density before insert, and the whole series is
//! re-checked after a run that inserted anything.

use crate::fmt::{readable_bytes, readable_duration};
use crate::{Timestamp, TradeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounds and density snapshot of a chunk or stored series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesInfo {
    /// Timestamp of the oldest record
    pub from_ts: Timestamp,
    /// Id of the oldest record
    pub from_id: TradeId,
    /// Timestamp of the newest record
    pub to_ts: Timestamp,
    /// Id of the newest record
    pub to_id: TradeId,
    /// Number of records
    pub count: u64,
    /// Approximate size in bytes
    pub memory: u64,
}

impl SeriesInfo {
    /// Record count a dense run between the bounds would have
    #[inline]
    pub fn expected_count(&self) -> u64 {
        self.from_id.span_len(self.to_id)
    }

    /// `count - (to_id - from_id + 1)`
    ///
    /// Zero for a dense run; positive counts duplicates, negative counts
    /// gaps.
    pub fn density_diff(&self) -> i64 {
        self.count as i64 - self.expected_count() as i64
    }

    /// Whether the run is dense
    #[inline]
    pub fn is_dense(&self) -> bool {
        self.density_diff() == 0
    }

    /// Time span covered by the run
    pub fn span(&self) -> std::time::Duration {
        self.to_ts.span(self.from_ts)
    }
}

impl fmt::Display for SeriesInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ {} : {}, {} : {}, {}, {} rows, {} }}",
            self.from_ts,
            self.from_id,
            self.to_ts,
            self.to_id,
            readable_duration(self.span()),
            self.count,
            readable_bytes(self.memory)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(from_id: u64, to_id: u64, count: u64) -> SeriesInfo {
        SeriesInfo {
            from_ts: Timestamp::from_secs(1000),
            from_id: TradeId::new(from_id),
            to_ts: Timestamp::from_secs(2000),
            to_id: TradeId::new(to_id),
            count,
            memory: 4096,
        }
    }

    #[test]
    fn test_dense_run() {
        let i = info(100, 149, 50);
        assert_eq!(i.expected_count(), 50);
        assert_eq!(i.density_diff(), 0);
        assert!(i.is_dense());
    }

    #[test]
    fn test_duplicates_positive_diff() {
        let i = info(100, 149, 52);
        assert_eq!(i.density_diff(), 2);
        assert!(!i.is_dense());
    }

    #[test]
    fn test_gaps_negative_diff() {
        let i = info(100, 149, 47);
        assert_eq!(i.density_diff(), -3);
        assert!(!i.is_dense());
    }

    #[test]
    fn test_single_record_run() {
        let mut i = info(42, 42, 1);
        i.to_ts = i.from_ts;
        assert!(i.is_dense());
        assert_eq!(i.span(), std::time::Duration::ZERO);
    }

    #[test]
    fn test_display_contains_bounds() {
        let i = info(100, 149, 50);
        let s = format!("{}", i);
        assert!(s.contains(": 100"));
        assert!(s.contains(": 149"));
        assert!(s.contains("50 rows"));
        assert!(s.contains("4.0 KB"));
    }
}
