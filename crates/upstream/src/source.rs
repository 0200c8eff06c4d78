//! Upstream gateway contract

use async_trait::async_trait;
use tickvault_core::{Chunk, Result, Symbol, Timestamp};

/// Maximum records the upstream returns for one windowed fetch
///
/// Documented upstream cap. When a window holds more trades than this, the
/// response is saturated with the MOST RECENT ones; the engine's backwards
/// walk is built around that behavior but never assumes the exact value.
pub const FETCH_CAP: usize = 50_000;

/// Abstract windowed fetch over the upstream trade endpoint
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Fetch at most [`FETCH_CAP`] of the most recent trades with
    /// `from_ts <= ts <= to_ts`
    ///
    /// `from_ts == to_ts` is permitted. There is no cursor, no offset and no
    /// total count; a saturated response can only be continued by asking for
    /// an older window.
    ///
    /// An empty chunk is a legitimate result and may mean no trades in the
    /// window, suspended trading, or a transient upstream failure; the
    /// caller cannot tell which.
    ///
    /// # Errors
    ///
    /// Only a schema mismatch (a response that decodes but contradicts the
    /// documented contract) is an error; transient failures are translated
    /// into an empty chunk.
    async fn fetch(&self, symbol: &Symbol, from_ts: Timestamp, to_ts: Timestamp) -> Result<Chunk>;

    /// Symbols currently listed on the upstream ticker
    ///
    /// Returns an empty list when the ticker is transiently unreachable
    /// (callers treat an empty selection as input error).
    async fn ticker_symbols(&self) -> Result<Vec<Symbol>>;
}
