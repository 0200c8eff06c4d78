//! Second-precision timestamp type
//!
//! The upstream reports trade times at second resolution, so seconds since
//! Unix epoch are the canonical time representation at every internal
//! boundary. `chrono` datetimes are a view concern: parsing wire dates and
//! rendering log output happen at the edges, never inside the engine.
//!
//! ## Usage
//!
//! Never expose raw arithmetic. Use explicit constructors:
//!
//! ```
//! use tickvault_core::Timestamp;
//!
//! let now = Timestamp::now();
//! let from_secs = Timestamp::from_secs(1_500_000_000);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Second-precision timestamp
///
/// Represents a point in time as whole seconds since Unix epoch.
///
/// ## Invariants
///
/// - Timestamps are always non-negative (u64)
/// - Timestamps are always in seconds
/// - Timestamps are comparable and orderable
/// - The zero timestamp represents Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Maximum representable timestamp
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a timestamp for the current moment
    ///
    /// Uses system time. Returns epoch (0) if the system clock is before Unix
    /// epoch (e.g., clock went backwards due to NTP adjustment).
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_secs())
    }

    /// Create a timestamp from seconds since epoch
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs)
    }

    /// Create a timestamp from a UTC datetime
    ///
    /// Sub-second precision is truncated. Datetimes before the epoch clamp
    /// to `Timestamp::EPOCH`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp().max(0) as u64)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get seconds since Unix epoch
    #[inline]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Convert to a UTC datetime for display
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.0.min(i64::MAX as u64) as i64, 0)
            .single()
            .unwrap_or_default()
    }

    // =========================================================================
    // Duration Operations
    // =========================================================================

    /// Compute the absolute span between two timestamps
    pub fn span(&self, other: Timestamp) -> Duration {
        Duration::from_secs(self.0.abs_diff(other.0))
    }

    /// Add a duration to this timestamp
    ///
    /// Saturates at `Timestamp::MAX` on overflow. Sub-second parts of the
    /// duration are truncated.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.as_secs()))
    }

    /// Subtract a duration from this timestamp
    ///
    /// Saturates at `Timestamp::EPOCH` on underflow.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_sub(duration.as_secs()))
    }

    /// Check if this timestamp is before another
    #[inline]
    pub fn is_before(&self, other: Timestamp) -> bool {
        self.0 < other.0
    }

    /// Check if this timestamp is after another
    #[inline]
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_datetime().format("%a %d/%m/%Y %H:%M:%S"))
    }
}

// ============================================================================
// From Implementations
// ============================================================================

impl From<u64> for Timestamp {
    /// Create from raw seconds
    fn from(secs: u64) -> Self {
        Timestamp::from_secs(secs)
    }
}

impl From<Timestamp> for u64 {
    /// Extract raw seconds
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ============================================================================
// Tests
// ============================================================================
