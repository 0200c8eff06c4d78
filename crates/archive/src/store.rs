//! Archive gateway contract
//!
//! This trait is the only surface the engine sees of the persistent store.
//! Implementations must uphold two invariants the engine relies on:
//!
//! - **Per-symbol id uniqueness**: `insert_many` refuses a batch containing
//!   any already-stored id, atomically (nothing from the batch lands).
//! - **Cheap bounds**: `bounds` derives the oldest/newest record in
//!   O(log n), not by scanning.

use async_trait::async_trait;
use tickvault_core::{Result, SeriesInfo, Symbol, Timestamp, TradeRecord};

/// Outcome of an [`ArchiveStore::upsert_many`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertReport {
    /// Records inserted because their id was absent
    pub inserted: u64,
    /// Records skipped because their id was already stored
    pub skipped: u64,
}

/// Per-series line of an archive summary
#[derive(Debug, Clone)]
pub struct SeriesSummary {
    /// The series' symbol
    pub symbol: Symbol,
    /// Bounds/density snapshot, `None` for an empty series
    pub info: Option<SeriesInfo>,
}

/// Abstract read/write gateway over the per-symbol trade store
///
/// All methods are async: implementations may sit on a network driver.
/// Callers treat every error as archive unavailability except the typed
/// refusals (`Duplicate`, `EmptySeries`).
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Symbols that currently have a series (possibly empty), sorted
    async fn list_series(&self) -> Result<Vec<Symbol>>;

    /// Create a series for the symbol
    ///
    /// Idempotent. Ensures the timestamp index exists. Must be called
    /// before the first insert of a new symbol.
    async fn create_series(&self, symbol: &Symbol) -> Result<()>;

    /// Drop a series wholesale
    ///
    /// Dropping an absent series is a no-op.
    async fn drop_series(&self, symbol: &Symbol) -> Result<()>;

    /// Whether the symbol has a series with at least one record
    async fn is_non_empty(&self, symbol: &Symbol) -> Result<bool>;

    /// Bounds/density snapshot of a series
    ///
    /// # Errors
    ///
    /// `EmptySeries` if the series is absent or empty.
    async fn bounds(&self, symbol: &Symbol) -> Result<SeriesInfo>;

    /// Insert a batch of records, all-or-nothing
    ///
    /// Returns the number of records inserted (the batch length).
    ///
    /// # Errors
    ///
    /// `Duplicate` if any record's id is already stored; in that case
    /// nothing from the batch is inserted.
    async fn insert_many(&self, symbol: &Symbol, records: &[TradeRecord]) -> Result<u64>;

    /// Insert only the records whose id is absent
    ///
    /// Slow path for manual repair; the engine's hot path uses
    /// [`insert_many`](ArchiveStore::insert_many).
    async fn upsert_many(&self, symbol: &Symbol, records: &[TradeRecord]) -> Result<UpsertReport>;

    /// Records with `from_ts <= ts <= to_ts`, ascending `(ts, id)`
    async fn range(
        &self,
        symbol: &Symbol,
        from_ts: Timestamp,
        to_ts: Timestamp,
    ) -> Result<Vec<TradeRecord>>;

    /// Whole-series density check
    ///
    /// `true` iff `count == to_id - from_id + 1`. An absent or empty series
    /// verifies trivially.
    async fn verify(&self, symbol: &Symbol) -> Result<bool>;

    /// Per-series summary of the whole archive, sorted by symbol
    async fn summary(&self) -> Result<Vec<SeriesSummary>> {
        let mut lines = Vec::new();
        for symbol in self.list_series().await? {
            let info = if self.is_non_empty(&symbol).await? {
                Some(self.bounds(&symbol).await?)
            } else {
                None
            };
            lines.push(SeriesSummary { symbol, info });
        }
        Ok(lines)
    }
}
