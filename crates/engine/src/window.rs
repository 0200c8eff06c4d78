//! Sliding fetch window
//!
//! Engine-private state of one grab: the `[from_ts, to_ts]` interval passed
//! to the next upstream fetch, clamped to the target's lower bound (the
//! floor), plus the anchor id of the most recently committed chunk.
//!
//! The window only ever moves older. Each movement pins `to_ts` to a known
//! point (the previous window's start, or the oldest timestamp the upstream
//! just returned) and opens at most `span` seconds below it.

use std::time::Duration;
use tickvault_core::{Timestamp, TradeId};

#[derive(Debug, Clone)]
pub(crate) struct FetchWindow {
    pub from_ts: Timestamp,
    pub to_ts: Timestamp,
    /// Oldest id of the most recently committed chunk
    pub anchor_id: Option<TradeId>,
    floor: Timestamp,
    span: Duration,
}

impl FetchWindow {
    /// Open the first window: `[max(to_ts - span, floor), to_ts]`
    pub fn opening(floor: Timestamp, to_ts: Timestamp, span: Duration) -> Self {
        FetchWindow {
            from_ts: to_ts.saturating_sub(span).max(floor),
            to_ts,
            anchor_id: None,
            floor,
            span,
        }
    }

    /// Whether the window start already sits on the target's lower bound
    pub fn at_floor(&self) -> bool {
        self.from_ts == self.floor
    }

    /// Slide one span older after an empty response
    ///
    /// Handles suspended trading and sparse symbols: nothing was returned,
    /// so the only known point is the window's own start.
    pub fn slide_older(&mut self) {
        self.to_ts = self.from_ts;
        self.from_ts = self.from_ts.saturating_sub(self.span).max(self.floor);
    }

    /// Move the window below the oldest returned timestamp
    ///
    /// Used while seeking the upper id bound; the anchor stays unset because
    /// nothing has been committed yet.
    pub fn advance_to(&mut self, oldest_ts: Timestamp) {
        self.to_ts = oldest_ts;
        self.from_ts = oldest_ts.saturating_sub(self.span).max(self.floor);
    }

    /// Move below the just-committed chunk and remember its oldest id
    ///
    /// The overlap at exactly `oldest_ts` is intended: the next fetch must
    /// intersect the committed chunk so the anchor check can prove
    /// contiguity.
    pub fn advance_anchored(&mut self, oldest_ts: Timestamp, oldest_id: TradeId) {
        self.advance_to(oldest_ts);
        self.anchor_id = Some(oldest_id);
    }
}
