//! In-memory archive
//!
//! DashMap shards the symbol space; each series is a `RwLock` over its
//! record maps. Reads on different symbols never contend, and the engine's
//! sequential per-symbol writes only lock the series they touch.
//!
//! Two maps per series:
//! - `by_id`: primary key order, gives O(log n) bounds and uniqueness
//! - `by_ts`: the timestamp index backing inclusive range scans
//!
//! The store never suspends, so the real operations are plain sync methods;
//! the [`ArchiveStore`] impl delegates. [`FileArchive`](crate::FileArchive)
//! replays into the same sync surface during its synchronous open.

use crate::store::{ArchiveStore, UpsertReport};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tickvault_core::{Error, Result, SeriesInfo, Symbol, Timestamp, TradeId, TradeRecord};

#[derive(Debug, Default)]
struct Series {
    by_id: BTreeMap<TradeId, TradeRecord>,
    by_ts: BTreeMap<(Timestamp, TradeId), ()>,
}

impl Series {
    fn info(&self) -> Option<SeriesInfo> {
        let (_, oldest) = self.by_id.first_key_value()?;
        let (_, newest) = self.by_id.last_key_value()?;
        let count = self.by_id.len() as u64;
        Some(SeriesInfo {
            from_ts: oldest.ts,
            from_id: oldest.id,
            to_ts: newest.ts,
            to_id: newest.id,
            count,
            memory: count * TradeRecord::MEMORY as u64,
        })
    }

    fn insert(&mut self, record: TradeRecord) {
        self.by_ts.insert((record.ts, record.id), ());
        self.by_id.insert(record.id, record);
    }
}

/// Sharded in-memory archive
///
/// Cloning shares the underlying store (the handle is an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    series: Arc<DashMap<Symbol, Arc<RwLock<Series>>>>,
}

impl MemoryArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        MemoryArchive::default()
    }

    fn series(&self, symbol: &Symbol) -> Option<Arc<RwLock<Series>>> {
        self.series.get(symbol).map(|s| Arc::clone(s.value()))
    }

    pub(crate) fn list_series_sync(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.series.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    pub(crate) fn create_series_sync(&self, symbol: &Symbol) {
        self.series
            .entry(symbol.clone())
            .or_insert_with(|| Arc::new(RwLock::new(Series::default())));
    }

    pub(crate) fn drop_series_sync(&self, symbol: &Symbol) {
        self.series.remove(symbol);
    }

    pub(crate) fn is_non_empty_sync(&self, symbol: &Symbol) -> bool {
        self.series(symbol)
            .map(|s| !s.read().by_id.is_empty())
            .unwrap_or(false)
    }

    pub(crate) fn bounds_sync(&self, symbol: &Symbol) -> Result<SeriesInfo> {
        self.series(symbol)
            .and_then(|s| s.read().info())
            .ok_or_else(|| Error::empty_series(symbol.clone()))
    }

    pub(crate) fn insert_many_sync(&self, symbol: &Symbol, records: &[TradeRecord]) -> Result<u64> {
        let series = self
            .series(symbol)
            .ok_or_else(|| Error::archive(format!("{}: series does not exist", symbol)))?;
        let mut series = series.write();
        if let Some(existing) = records.iter().find(|r| series.by_id.contains_key(&r.id)) {
            return Err(Error::duplicate(symbol.clone(), existing.id));
        }
        for record in records {
            series.insert(record.clone());
        }
        Ok(records.len() as u64)
    }

    pub(crate) fn upsert_many_sync(
        &self,
        symbol: &Symbol,
        records: &[TradeRecord],
    ) -> Result<UpsertReport> {
        let series = self
            .series(symbol)
            .ok_or_else(|| Error::archive(format!("{}: series does not exist", symbol)))?;
        let mut series = series.write();
        let mut report = UpsertReport::default();
        for record in records {
            if series.by_id.contains_key(&record.id) {
                report.skipped += 1;
            } else {
                series.insert(record.clone());
                report.inserted += 1;
            }
        }
        Ok(report)
    }

    pub(crate) fn range_sync(
        &self,
        symbol: &Symbol,
        from_ts: Timestamp,
        to_ts: Timestamp,
    ) -> Vec<TradeRecord> {
        let Some(series) = self.series(symbol) else {
            return Vec::new();
        };
        let series = series.read();
        let lo = (from_ts, TradeId::new(0));
        let hi = (to_ts, TradeId::new(u64::MAX));
        series
            .by_ts
            .range(lo..=hi)
            .filter_map(|((_, id), _)| series.by_id.get(id).cloned())
            .collect()
    }

    pub(crate) fn verify_sync(&self, symbol: &Symbol) -> bool {
        match self.series(symbol).and_then(|s| s.read().info()) {
            Some(info) => info.is_dense(),
            None => true,
        }
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchive {
    async fn list_series(&self) -> Result<Vec<Symbol>> {
        Ok(self.list_series_sync())
    }

    async fn create_series(&self, symbol: &Symbol) -> Result<()> {
        self.create_series_sync(symbol);
        Ok(())
    }

    async fn drop_series(&self, symbol: &Symbol) -> Result<()> {
        self.drop_series_sync(symbol);
        Ok(())
    }

    async fn is_non_empty(&self, symbol: &Symbol) -> Result<bool> {
        Ok(self.is_non_empty_sync(symbol))
    }

    async fn bounds(&self, symbol: &Symbol) -> Result<SeriesInfo> {
        self.bounds_sync(symbol)
    }

    async fn insert_many(&self, symbol: &Symbol, records: &[TradeRecord]) -> Result<u64> {
        self.insert_many_sync(symbol, records)
    }

    async fn upsert_many(&self, symbol: &Symbol, records: &[TradeRecord]) -> Result<UpsertReport> {
        self.upsert_many_sync(symbol, records)
    }

    async fn range(
        &self,
        symbol: &Symbol,
        from_ts: Timestamp,
        to_ts: Timestamp,
    ) -> Result<Vec<TradeRecord>> {
        Ok(self.range_sync(symbol, from_ts, to_ts))
    }

    async fn verify(&self, symbol: &Symbol) -> Result<bool> {
        Ok(self.verify_sync(symbol))
    }
}
