//! The chunked backfill state machine
//!
//! One [`Grabber::grab`] call fills one target interval of one symbol's
//! series by fetching windows backwards in time. The loop per iteration:
//!
//! 1. fetch the current window
//! 2. on an empty chunk: done if anything was committed or the window
//!    already sits on the floor, otherwise slide a window older (the
//!    upstream suspends pairs for weeks at a time)
//! 3. while the exclusive upper id bound has not been located: either find
//!    it in this chunk and start recording below it, or move the window
//!    under the chunk and keep seeking
//! 4. once recording, require the chunk to overlap the previous commit's
//!    oldest id (the anchor) and cut it below that id
//! 5. if the chunk crosses the lower bound (id, or timestamp when no id was
//!    given), cut it at the bound, commit the remainder, and stop
//! 6. otherwise drop duplicate ids, refuse the chunk unless it is dense,
//!    commit it
//! 7. advance the window under the committed chunk and re-anchor
//!
//! Commits run strictly newest-to-oldest; the bounds given by the caller
//! are inclusive by timestamp and exclusive by id (id bounds name records
//! that already exist and must not be re-inserted).

use crate::cancel::CancelFlag;
use crate::window::FetchWindow;
use std::time::Duration;
use tickvault_archive::ArchiveStore;
use tickvault_core::{Chunk, Error, Result, SeriesInfo, Symbol, Timestamp, TradeId};
use tickvault_upstream::TradeSource;
use tracing::{debug, warn};

/// Default largest window passed to the upstream: 30 days
///
/// The upstream caps every response at a fixed record count; 30 days keeps
/// most single fetches of typical symbols below that cap while still making
/// progress on sparse ones.
pub const DEFAULT_MAX_WINDOW: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Engine configuration
#[derive(Debug, Clone)]
pub struct GrabberConfig {
    /// Largest window passed to the upstream
    pub max_window: Duration,
}

impl Default for GrabberConfig {
    fn default() -> Self {
        GrabberConfig {
            max_window: DEFAULT_MAX_WINDOW,
        }
    }
}

/// Target interval of one grab
///
/// Timestamp bounds are inclusive; id bounds are exclusive and take
/// priority over the timestamps for termination (the window arithmetic
/// always uses the timestamps).
#[derive(Debug, Clone, Copy)]
pub struct TargetRange {
    /// Inclusive lower timestamp bound (window floor)
    pub from_ts: Timestamp,
    /// Inclusive upper timestamp bound (first window end)
    pub to_ts: Timestamp,
    /// Exclusive lower id bound: a record already stored below the target
    pub from_id: Option<TradeId>,
    /// Exclusive upper id bound: a record already stored above the target
    pub to_id: Option<TradeId>,
}

impl TargetRange {
    /// Target the timestamp interval `[from_ts, to_ts]`
    pub fn between(from_ts: Timestamp, to_ts: Timestamp) -> Self {
        TargetRange {
            from_ts,
            to_ts,
            from_id: None,
            to_id: None,
        }
    }

    /// Stop before this already-stored id (tail extension)
    pub fn with_to_id(mut self, to_id: TradeId) -> Self {
        self.to_id = Some(to_id);
        self
    }

    /// Start above this already-stored id (head extension)
    pub fn with_from_id(mut self, from_id: TradeId) -> Self {
        self.from_id = Some(from_id);
        self
    }
}

/// Why a grab stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOutcome {
    /// The upstream ran out of records for the target
    Exhausted,
    /// A chunk crossed the lower timestamp bound
    FloorReached,
    /// A chunk crossed the exclusive lower id bound
    StartIdReached,
    /// The next older chunk did not overlap the previous commit
    ///
    /// The gap between them cannot be bridged, so the series was left
    /// consistent but incomplete. Warned, not an error.
    AnchorMissing,
    /// A fetched chunk failed the density gate and was not committed
    BrokenChunk,
    /// Cooperative cancellation interrupted the walk
    Cancelled,
}

/// What a grab did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabReport {
    /// Records inserted into the archive
    pub inserted: u64,
    /// Chunks committed
    pub chunks: u32,
    /// Why the walk stopped
    pub outcome: GrabOutcome,
}

impl GrabReport {
    fn stopped(outcome: GrabOutcome) -> Self {
        GrabReport {
            inserted: 0,
            chunks: 0,
            outcome,
        }
    }
}

/// The backfill engine
///
/// Owns its two gateways and a cancellation flag. One grabber drives one
/// symbol at a time; per-symbol serialization is the caller's contract
/// (the batch driver iterates sequentially).
pub struct Grabber<S, A> {
    source: S,
    archive: A,
    config: GrabberConfig,
    cancel: CancelFlag,
}

impl<S: TradeSource, A: ArchiveStore> Grabber<S, A> {
    /// Build an engine with the default configuration
    pub fn new(source: S, archive: A) -> Self {
        Grabber::with_config(source, archive, GrabberConfig::default())
    }

    /// Build an engine with an explicit configuration
    pub fn with_config(source: S, archive: A, config: GrabberConfig) -> Self {
        Grabber {
            source,
            archive,
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// The archive gateway this engine commits into
    pub fn archive(&self) -> &A {
        &self.archive
    }

    /// The upstream gateway this engine fetches from
    pub fn source(&self) -> &S {
        &self.source
    }

    /// A handle that cancels this engine's walks when triggered
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Fill the target interval of one symbol's series
    ///
    /// Returns how much was committed and why the walk stopped. Termination
    /// at a bound, an exhausted upstream, a missing anchor and a broken
    /// chunk are all normal returns; the report tells them apart.
    ///
    /// # Errors
    ///
    /// - `BadRange` / `BadIdRange` on an empty or inverted target
    /// - `Duplicate` if a commit collides with stored ids (bound arithmetic
    ///   bug)
    /// - `ConsistencyBroken` if the whole-series density check fails after
    ///   a run that inserted records
    /// - upstream schema and archive errors propagate
    pub async fn grab(&self, symbol: &Symbol, range: TargetRange) -> Result<GrabReport> {
        let TargetRange {
            from_ts,
            to_ts,
            from_id,
            to_id,
        } = range;

        if to_ts <= from_ts {
            return Err(Error::bad_range(symbol.clone(), from_ts, to_ts));
        }
        if let (Some(from_id), Some(to_id)) = (from_id, to_id) {
            if to_id <= from_id {
                return Err(Error::bad_id_range(symbol.clone(), from_id, to_id));
            }
        }

        self.archive.create_series(symbol).await?;
        match self.archive.bounds(symbol).await {
            Ok(stored) => debug!(symbol = %symbol, stored = %stored, "series before grab"),
            Err(_) => debug!(symbol = %symbol, "series empty before grab"),
        }

        let mut window = FetchWindow::opening(from_ts, to_ts, self.config.max_window);
        // While set, the exclusive upper bound has not been located yet and
        // nothing may be committed
        let mut seek_target = to_id;
        let mut report = GrabReport::stopped(GrabOutcome::Exhausted);

        let outcome = loop {
            if self.cancel.is_cancelled() {
                debug!(symbol = %symbol, "grab cancelled");
                break GrabOutcome::Cancelled;
            }

            debug!(
                symbol = %symbol,
                from = %window.from_ts,
                to = %window.to_ts,
                "fetch_started"
            );
            let mut chunk = self.source.fetch(symbol, window.from_ts, window.to_ts).await?;

            // Empty chunk: finished, or shift older and retry
            if chunk.is_empty() {
                if report.chunks > 0 || window.at_floor() {
                    debug!(symbol = %symbol, "bounds_reached");
                    break GrabOutcome::Exhausted;
                }
                debug!(symbol = %symbol, "nothing returned, shifting window older");
                window.slide_older();
                continue;
            }

            // Seek phase: locate the exclusive upper id bound
            if let Some(end_id) = seek_target {
                if chunk.contains_id(end_id) {
                    debug!(symbol = %symbol, end_id = %end_id, "end id located");
                    seek_target = None;
                    chunk.retain_id_lt(end_id);
                    if chunk.is_empty() {
                        break GrabOutcome::Exhausted;
                    }
                } else {
                    if let Some(start_id) = from_id {
                        if chunk.any_id_le(start_id) {
                            debug!(symbol = %symbol, start_id = %start_id, "bounds_reached");
                            break GrabOutcome::StartIdReached;
                        }
                    }
                    if chunk.any_ts_le(from_ts) {
                        debug!(symbol = %symbol, floor = %from_ts, "bounds_reached");
                        break GrabOutcome::FloorReached;
                    }
                    if let Some(info) = chunk.info() {
                        debug!(
                            symbol = %symbol,
                            end_id = %end_id,
                            seen = %info,
                            "end id not in chunk, seeking older"
                        );
                        window.advance_to(info.from_ts);
                    }
                    continue;
                }
            }

            // Anchor synchronization with the previous commit
            if let Some(anchor_id) = window.anchor_id {
                if chunk.any_id_ge(anchor_id) {
                    chunk.retain_id_lt(anchor_id);
                    if chunk.is_empty() {
                        break GrabOutcome::Exhausted;
                    }
                } else {
                    warn!(symbol = %symbol, anchor_id = %anchor_id, "anchor_missing");
                    break GrabOutcome::AnchorMissing;
                }
            }

            // Lower bound: the id bound takes priority over the timestamp
            if let Some(start_id) = from_id {
                if chunk.any_id_le(start_id) {
                    chunk.retain_id_gt(start_id);
                    self.commit_final(symbol, chunk, &mut report).await?;
                    debug!(symbol = %symbol, start_id = %start_id, "bounds_reached");
                    break GrabOutcome::StartIdReached;
                }
            } else if chunk.any_ts_le(from_ts) {
                chunk.retain_ts_ge(from_ts);
                self.commit_final(symbol, chunk, &mut report).await?;
                debug!(symbol = %symbol, floor = %from_ts, "bounds_reached");
                break GrabOutcome::FloorReached;
            }

            // Interior chunk: clean, gate on density, commit
            chunk.dedup_by_id();
            if chunk.is_empty() {
                break GrabOutcome::Exhausted;
            }
            if !chunk.verify() {
                self.warn_broken(symbol, &chunk);
                break GrabOutcome::BrokenChunk;
            }
            let committed = self.commit(symbol, &chunk, &mut report).await?;

            window.advance_anchored(committed.from_ts, committed.from_id);
        };

        report.outcome = outcome;

        if report.chunks > 0 {
            if !self.archive.verify(symbol).await? {
                let diff = self.archive.bounds(symbol).await?.density_diff();
                return Err(Error::consistency_broken(symbol.clone(), diff));
            }
            if let Ok(stored) = self.archive.bounds(symbol).await {
                debug!(symbol = %symbol, stored = %stored, "series after grab");
            }
        } else {
            debug!(symbol = %symbol, "nothing recorded");
        }
        Ok(report)
    }

    /// Commit an interior chunk and return its bounds
    async fn commit(
        &self,
        symbol: &Symbol,
        chunk: &Chunk,
        report: &mut GrabReport,
    ) -> Result<SeriesInfo> {
        let info = chunk
            .info()
            .ok_or_else(|| Error::archive("attempted to commit an empty chunk"))?;
        let inserted = self.archive.insert_many(symbol, chunk.records()).await?;
        report.inserted += inserted;
        report.chunks += 1;
        debug!(symbol = %symbol, chunk = %info, "chunk_committed");
        Ok(info)
    }

    /// Commit the last chunk of a walk if it survived its bound cut and is
    /// dense; always returns (the caller terminates either way)
    async fn commit_final(
        &self,
        symbol: &Symbol,
        chunk: Chunk,
        report: &mut GrabReport,
    ) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        if !chunk.verify() {
            self.warn_broken(symbol, &chunk);
            return Ok(());
        }
        self.commit(symbol, &chunk, report).await?;
        Ok(())
    }

    fn warn_broken(&self, symbol: &Symbol, chunk: &Chunk) {
        if let Some(info) = chunk.info() {
            warn!(
                symbol = %symbol,
                diff = info.density_diff(),
                chunk = %info,
                "verify_failed"
            );
        }
    }
}
