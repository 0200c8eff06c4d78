//! Batch driver
//!
//! Drives the planner over a set of symbols, strictly sequentially: the
//! upstream rate-limits by source, and one in-flight request at a time is
//! the politest schedule that still makes progress. Sequential iteration
//! also guarantees per-symbol serialization, which the anchor protocol
//! requires.
//!
//! [`Grabber::extend_ring`] repeats the row forever (or for a capped number
//! of iterations), pulling the series' heads up to "now" each pass.

use crate::grabber::Grabber;
use crate::planner::{ExtendReport, TimeBound};
use regex::Regex;
use std::str::FromStr;
use std::time::Duration;
use tickvault_archive::ArchiveStore;
use tickvault_core::{Error, Result, Symbol, Timestamp};
use tickvault_upstream::TradeSource;
use tracing::{info, warn};

/// Which symbols a batch run addresses
#[derive(Debug, Clone)]
pub enum SymbolSelector {
    /// An explicit list
    List(Vec<Symbol>),
    /// Every series currently stored in the archive
    Stored,
    /// Every symbol on the upstream ticker
    Ticker,
    /// Ticker symbols matching a regular expression
    Pattern(Regex),
}

impl FromStr for SymbolSelector {
    type Err = regex::Error;

    /// `db` and `ticker` are keywords; a comma-separated list of valid
    /// symbols is a [`List`](SymbolSelector::List); anything else is
    /// compiled as a regex over the ticker
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "db" => return Ok(SymbolSelector::Stored),
            "ticker" => return Ok(SymbolSelector::Ticker),
            _ => {}
        }
        let parts: std::result::Result<Vec<Symbol>, _> =
            s.split(',').map(Symbol::new).collect();
        match parts {
            Ok(symbols) => Ok(SymbolSelector::List(symbols)),
            Err(_) => Ok(SymbolSelector::Pattern(Regex::new(s)?)),
        }
    }
}

/// Outcome of one row over a symbol set
#[derive(Debug, Default)]
pub struct RowReport {
    /// Symbols extended, in processing order
    pub completed: Vec<(Symbol, ExtendReport)>,
    /// Symbols skipped on a non-fatal error
    pub skipped: Vec<(Symbol, Error)>,
}

/// Configuration of the periodic driver
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Pause between rows
    pub every: Duration,
    /// Stop after this many rows; `None` runs until cancelled
    pub iterations: Option<u64>,
}

impl Default for RingConfig {
    fn default() -> Self {
        RingConfig {
            every: Duration::from_secs(300),
            iterations: None,
        }
    }
}

impl<S: TradeSource, A: ArchiveStore> Grabber<S, A> {
    /// Resolve a selector into concrete symbols
    ///
    /// # Errors
    ///
    /// `EmptySelection` when nothing matches (including an unreachable
    /// ticker, which resolves to no symbols).
    pub async fn resolve_symbols(&self, selector: &SymbolSelector) -> Result<Vec<Symbol>> {
        let symbols = match selector {
            SymbolSelector::List(symbols) => symbols.clone(),
            SymbolSelector::Stored => self.archive().list_series().await?,
            SymbolSelector::Ticker => self.source().ticker_symbols().await?,
            SymbolSelector::Pattern(regex) => self
                .source()
                .ticker_symbols()
                .await?
                .into_iter()
                .filter(|s| regex.is_match(s.as_str()))
                .collect(),
        };
        if symbols.is_empty() {
            return Err(Error::EmptySelection);
        }
        Ok(symbols)
    }

    /// Extend every selected symbol, sequentially
    ///
    /// Caller errors on one symbol (bad resolved range, empty series for an
    /// `Oldest`/`Newest` bound) skip that symbol and continue; fatal errors
    /// (broken consistency, unreachable archive) stop the row immediately.
    ///
    /// # Errors
    ///
    /// `EmptySelection`, plus whatever fatal error stopped the row.
    pub async fn extend_row(
        &self,
        selector: &SymbolSelector,
        from: TimeBound,
        to: TimeBound,
        drop: bool,
    ) -> Result<RowReport> {
        let symbols = self.resolve_symbols(selector).await?;
        info!(count = symbols.len(), "row started");
        let mut report = RowReport::default();
        for symbol in symbols {
            if self.cancel_flag().is_cancelled() {
                break;
            }
            match self.extend(&symbol, from, to, drop).await {
                Ok(extended) => {
                    info!(
                        symbol = %symbol,
                        inserted = extended.inserted(),
                        "symbol finished"
                    );
                    report.completed.push((symbol, extended));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "symbol skipped");
                    report.skipped.push((symbol, e));
                }
            }
        }
        Ok(report)
    }

    /// Repeat [`extend_row`](Grabber::extend_row) with the end bound pinned
    /// to "now", pausing between rows
    ///
    /// Returns the number of completed rows. Stops on the iteration cap, on
    /// cancellation (also during the pause), or on the first fatal error.
    pub async fn extend_ring(
        &self,
        selector: &SymbolSelector,
        config: RingConfig,
    ) -> Result<u64> {
        let cancel = self.cancel_flag();
        let mut rows = 0u64;
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.extend_row(
                selector,
                TimeBound::Unbounded,
                TimeBound::At(Timestamp::now()),
                false,
            )
            .await?;
            rows += 1;
            info!(rows, "ring iteration finished");
            if let Some(cap) = config.iterations {
                if rows >= cap {
                    break;
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(config.every) => {}
                _ = cancel.cancelled() => break,
            }
        }
        Ok(rows)
    }
}
