//! Error types for tickvault
//!
//! One unified error type for all crates, built with `thiserror`.
//!
//! ## Error Categories
//!
//! - **Caller errors**: empty or inverted ranges, empty symbol selections.
//!   Fatal to the current operation, never to a batch run.
//! - **Consistency errors**: duplicate inserts and failed whole-series
//!   density checks. These indicate a bug in bound arithmetic or a corrupted
//!   series and stop the run.
//! - **Gateway errors**: an upstream response whose shape does not match the
//!   documented contract, or an unreachable/corrupt archive.
//!
//! Two conditions that look like errors are deliberately NOT errors:
//! upstream transients are swallowed at the gateway boundary (they become an
//! empty chunk the engine recovers from), and a missing anchor terminates a
//! grab early as a warning outcome, leaving a consistent but incomplete
//! series.

use crate::{Symbol, Timestamp, TradeId};
use std::io;
use thiserror::Error;

/// Result type alias for tickvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tickvault operations
#[derive(Debug, Error)]
pub enum Error {
    /// Requested time interval is empty or inverted
    #[error("{symbol}: start {from} is not before end {to}")]
    BadRange {
        /// Symbol the request addressed
        symbol: Symbol,
        /// Requested start
        from: Timestamp,
        /// Requested end
        to: Timestamp,
    },

    /// Requested id interval is empty or inverted
    #[error("{symbol}: start id {from_id} is not below end id {to_id}")]
    BadIdRange {
        /// Symbol the request addressed
        symbol: Symbol,
        /// Requested start id (exclusive)
        from_id: TradeId,
        /// Requested end id (exclusive)
        to_id: TradeId,
    },

    /// Bounds were requested for a series that has no records
    #[error("{symbol}: series is empty")]
    EmptySeries {
        /// Symbol whose series is empty
        symbol: Symbol,
    },

    /// A symbol selection resolved to no symbols
    #[error("symbol selection resolved to nothing")]
    EmptySelection,

    /// Insert attempted to re-use an existing trade id
    ///
    /// The engine's bound arithmetic guarantees disjoint commits; hitting
    /// this means the guarantee was violated.
    #[error("{symbol}: duplicate trade id {id}")]
    Duplicate {
        /// Symbol whose series refused the insert
        symbol: Symbol,
        /// The offending id
        id: TradeId,
    },

    /// Whole-series density check failed after a run that inserted records
    #[error("{symbol}: series density broken ({diff:+} records vs id span)")]
    ConsistencyBroken {
        /// Symbol whose series failed the check
        symbol: Symbol,
        /// `count - (to_id - from_id + 1)`: positive duplicates, negative gaps
        diff: i64,
    },

    /// Upstream response decoded, but its shape contradicts the contract
    ///
    /// Transient upstream failures never surface here; only a schema
    /// mismatch does, because silently treating it as "no data" would turn a
    /// contract change into silent data loss.
    #[error("upstream schema mismatch: {detail}")]
    UpstreamSchema {
        /// What did not match
        detail: String,
    },

    /// Archive unreachable or corrupt
    #[error("archive error: {message}")]
    Archive {
        /// Error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a BadRange error
    pub fn bad_range(symbol: Symbol, from: Timestamp, to: Timestamp) -> Self {
        Error::BadRange { symbol, from, to }
    }

    /// Create a BadIdRange error
    pub fn bad_id_range(symbol: Symbol, from_id: TradeId, to_id: TradeId) -> Self {
        Error::BadIdRange {
            symbol,
            from_id,
            to_id,
        }
    }

    /// Create an EmptySeries error
    pub fn empty_series(symbol: Symbol) -> Self {
        Error::EmptySeries { symbol }
    }

    /// Create a Duplicate error
    pub fn duplicate(symbol: Symbol, id: TradeId) -> Self {
        Error::Duplicate { symbol, id }
    }

    /// Create a ConsistencyBroken error
    pub fn consistency_broken(symbol: Symbol, diff: i64) -> Self {
        Error::ConsistencyBroken { symbol, diff }
    }

    /// Create an UpstreamSchema error
    pub fn upstream_schema(detail: impl Into<String>) -> Self {
        Error::UpstreamSchema {
            detail: detail.into(),
        }
    }

    /// Create an Archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Error::Archive {
            message: message.into(),
            source: None,
        }
    }

    /// Create an Archive error with an underlying cause
    pub fn archive_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Archive {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Caller-supplied input was unusable; retrying the same call cannot help
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::BadRange { .. }
                | Error::BadIdRange { .. }
                | Error::EmptySeries { .. }
                | Error::EmptySelection
        )
    }

    /// Fatal to the whole run, not just the current symbol
    ///
    /// A batch driver must stop processing further symbols: a broken series
    /// needs operator attention, and an unreachable archive will fail every
    /// symbol the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConsistencyBroken { .. } | Error::Archive { .. }
        )
    }

    /// Bound arithmetic or stored data violated the density model
    pub fn is_consistency_error(&self) -> bool {
        matches!(
            self,
            Error::Duplicate { .. } | Error::ConsistencyBroken { .. }
        )
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Archive {
            message: format!("I/O error: {}", e),
            source: Some(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym() -> Symbol {
        Symbol::new("USDT_BTC").unwrap()
    }

    #[test]
    fn test_bad_range_display() {
        let e = Error::bad_range(
            sym(),
            Timestamp::from_secs(2000),
            Timestamp::from_secs(1000),
        );
        assert!(e.to_string().contains("USDT_BTC"));
        assert!(e.is_caller_error());
        assert!(!e.is_fatal());
    }

    #[test]
    fn test_bad_id_range_display() {
        let e = Error::bad_id_range(sym(), TradeId::new(10), TradeId::new(5));
        assert!(e.to_string().contains("10"));
        assert!(e.to_string().contains('5'));
        assert!(e.is_caller_error());
    }

    #[test]
    fn test_empty_series() {
        let e = Error::empty_series(sym());
        assert!(e.is_caller_error());
        assert!(!e.is_consistency_error());
    }

    #[test]
    fn test_duplicate_classification() {
        let e = Error::duplicate(sym(), TradeId::new(42));
        assert!(e.is_consistency_error());
        assert!(!e.is_fatal());
        assert!(e.to_string().contains("42"));
    }

    #[test]
    fn test_consistency_broken_is_fatal() {
        let e = Error::consistency_broken(sym(), -3);
        assert!(e.is_fatal());
        assert!(e.is_consistency_error());
        assert!(e.to_string().contains("-3"));
    }

    #[test]
    fn test_archive_is_fatal() {
        let e = Error::archive("connection refused");
        assert!(e.is_fatal());
        assert!(!e.is_caller_error());
    }

    #[test]
    fn test_archive_with_source() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let e = Error::archive_with_source("store unreachable", io_err);
        match e {
            Error::Archive { source, .. } => assert!(source.is_some()),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: Error = io_err.into();
        assert!(e.is_fatal());
        assert!(e.to_string().contains("I/O error"));
    }

    #[test]
    fn test_upstream_schema_not_fatal_to_run() {
        let e = Error::upstream_schema("amount is not a string");
        assert!(!e.is_fatal());
        assert!(!e.is_caller_error());
    }
}
