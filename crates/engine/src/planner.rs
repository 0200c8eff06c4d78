//! Range planner
//!
//! [`Grabber::extend`] reconciles a requested interval against the bounds
//! already stored for the symbol and issues zero, one or two grabs:
//!
//! - empty series: one full grab over the interval
//! - request starts before the stored oldest record: a **tail** grab that
//!   walks down from the stored oldest record (its id becomes the exclusive
//!   upper bound)
//! - request ends after the stored newest record: a **head** grab that walks
//!   down from the requested end until it meets the stored newest record
//!   (its id becomes the exclusive lower bound)
//! - interval already covered: no-op
//!
//! Bounds arrive as [`TimeBound`]s and are resolved here, once; the grab
//! itself only ever sees concrete timestamps.

use crate::grabber::{GrabReport, Grabber, TargetRange};
use tickvault_archive::ArchiveStore;
use tickvault_core::{Error, Result, Symbol, Timestamp};
use tickvault_upstream::TradeSource;
use tracing::{debug, info};

/// One end of a requested interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    /// A concrete instant
    At(Timestamp),
    /// The stored series' oldest timestamp
    Oldest,
    /// The stored series' newest timestamp
    Newest,
    /// No preference: epoch as a start, now as an end
    Unbounded,
}

/// What an extend call did
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendReport {
    /// The series was dropped before grabbing
    pub dropped: bool,
    /// Full grab into a previously empty series
    pub full: Option<GrabReport>,
    /// Backwards extension below the stored oldest record
    pub tail: Option<GrabReport>,
    /// Forwards extension above the stored newest record
    pub head: Option<GrabReport>,
}

impl ExtendReport {
    /// Total records inserted across the issued grabs
    pub fn inserted(&self) -> u64 {
        [self.full, self.tail, self.head]
            .iter()
            .flatten()
            .map(|r| r.inserted)
            .sum()
    }
}

impl<S: TradeSource, A: ArchiveStore> Grabber<S, A> {
    /// Extend one symbol's series to cover the requested interval
    ///
    /// `drop` clears the series first; `Oldest`/`Newest` bounds resolve
    /// against the bounds as they were *before* the drop.
    ///
    /// # Errors
    ///
    /// - `EmptySeries` when `Oldest`/`Newest` is requested for a series
    ///   with no records
    /// - `BadRange` when the resolved interval is empty or inverted
    /// - everything [`Grabber::grab`] surfaces
    pub async fn extend(
        &self,
        symbol: &Symbol,
        from: TimeBound,
        to: TimeBound,
        drop: bool,
    ) -> Result<ExtendReport> {
        info!(symbol = %symbol, ?from, ?to, drop, "extend requested");

        let stored = if self.archive().is_non_empty(symbol).await? {
            Some(self.archive().bounds(symbol).await?)
        } else {
            None
        };

        let from_ts = resolve(symbol, from, stored.map(|b| (b.from_ts, b.to_ts)), Timestamp::EPOCH)?;
        let to_ts = resolve(symbol, to, stored.map(|b| (b.from_ts, b.to_ts)), Timestamp::now())?;
        if from_ts >= to_ts {
            return Err(Error::bad_range(symbol.clone(), from_ts, to_ts));
        }

        let mut report = ExtendReport::default();
        let stored = if drop && stored.is_some() {
            self.archive().drop_series(symbol).await?;
            report.dropped = true;
            None
        } else {
            stored
        };

        match stored {
            None => {
                debug!(symbol = %symbol, "grabbing full");
                report.full = Some(
                    self.grab(symbol, TargetRange::between(from_ts, to_ts))
                        .await?,
                );
            }
            Some(bounds) => {
                if from_ts < bounds.from_ts {
                    debug!(symbol = %symbol, "grabbing tail");
                    report.tail = Some(
                        self.grab(
                            symbol,
                            TargetRange::between(from_ts, bounds.from_ts)
                                .with_to_id(bounds.from_id),
                        )
                        .await?,
                    );
                }
                if to_ts > bounds.to_ts {
                    debug!(symbol = %symbol, "grabbing head");
                    report.head = Some(
                        self.grab(
                            symbol,
                            TargetRange::between(bounds.to_ts, to_ts)
                                .with_from_id(bounds.to_id),
                        )
                        .await?,
                    );
                }
                if report.tail.is_none() && report.head.is_none() {
                    debug!(symbol = %symbol, "interval already covered");
                }
            }
        }
        Ok(report)
    }
}

/// Resolve one bound against the stored `(oldest_ts, newest_ts)`
fn resolve(
    symbol: &Symbol,
    bound: TimeBound,
    stored: Option<(Timestamp, Timestamp)>,
    default: Timestamp,
) -> Result<Timestamp> {
    match bound {
        TimeBound::At(ts) => Ok(ts),
        TimeBound::Unbounded => Ok(default),
        TimeBound::Oldest => stored
            .map(|(oldest, _)| oldest)
            .ok_or_else(|| Error::empty_series(symbol.clone())),
        TimeBound::Newest => stored
            .map(|(_, newest)| newest)
            .ok_or_else(|| Error::empty_series(symbol.clone())),
    }
}
