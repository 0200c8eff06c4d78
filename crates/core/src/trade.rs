//! Trade record and identifier types
//!
//! A trade carries two upstream-assigned identifiers:
//! - **TradeId**: monotonically increasing within a symbol's series; the
//!   primary key of the archive. Monotonic but NOT dense per symbol: the
//!   upstream interleaves all symbols in one sequence in some epochs and
//!   per-symbol sequences in others, so only ordering may be relied on.
//! - **GlobalTradeId**: the exchange-wide sequence number. Stored for
//!   reference, never used for arithmetic.
//!
//! Records are immutable: the archive inserts them exactly once or refuses
//! them by id uniqueness.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-symbol monotonic trade identifier (primary key)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TradeId(u64);

impl TradeId {
    /// Create a trade id from its raw value
    #[inline]
    pub const fn new(id: u64) -> Self {
        TradeId(id)
    }

    /// Get the raw id value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Number of ids in the inclusive span `[self, to]`
    ///
    /// Returns 0 if `to < self`. This is the expected record count of a
    /// dense run between the two ids.
    pub fn span_len(&self, to: TradeId) -> u64 {
        if to.0 < self.0 {
            0
        } else {
            to.0 - self.0 + 1
        }
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TradeId {
    fn from(id: u64) -> Self {
        TradeId(id)
    }
}

/// Exchange-wide trade sequence number
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct GlobalTradeId(u64);

impl GlobalTradeId {
    /// Create a global trade id from its raw value
    #[inline]
    pub const fn new(id: u64) -> Self {
        GlobalTradeId(id)
    }

    /// Get the raw id value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GlobalTradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Taker side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Taker bought the base asset
    Buy,
    /// Taker sold the base asset
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// One immutable trade
///
/// `amount` is in the base asset, `rate` in quote per base, `total` in the
/// quote asset (`total = amount * rate` as reported by the upstream; not
/// recomputed here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Per-symbol monotonic identifier (primary key)
    pub id: TradeId,
    /// Trade time, second resolution UTC
    pub ts: crate::Timestamp,
    /// Exchange-wide sequence number
    pub global_id: GlobalTradeId,
    /// Traded amount in the base asset
    pub amount: Decimal,
    /// Price in quote per base
    pub rate: Decimal,
    /// Value in the quote asset
    pub total: Decimal,
    /// Taker side
    pub side: Side,
}

impl TradeRecord {
    /// Approximate in-memory size of one record in bytes
    ///
    /// Records are fixed-size (Decimal is a 16-byte value type), so a plain
    /// `size_of` is an honest estimate for chunk accounting.
    pub const MEMORY: usize = std::mem::size_of::<TradeRecord>();
}
