//! Shared test doubles for the engine tests
//!
//! `SimulatedExchange` honors the real upstream's contract: it filters its
//! book to the requested window, keeps only the newest `cap` records when
//! the window saturates, and answers newest-first. `ScriptedSource` ignores
//! the window entirely and replays canned chunks, for walks that need an
//! upstream misbehaving in a precise way.

// Each test binary compiles its own copy and uses a different subset.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use tickvault_core::{
    Chunk, GlobalTradeId, Result, Side, Symbol, Timestamp, TradeId, TradeRecord,
};
use tickvault_upstream::TradeSource;

pub fn sym(name: &str) -> Symbol {
    Symbol::new(name).unwrap()
}

pub fn record(id: u64, ts: u64) -> TradeRecord {
    TradeRecord {
        id: TradeId::new(id),
        ts: Timestamp::from_secs(ts),
        global_id: GlobalTradeId::new(id),
        amount: Decimal::ONE,
        rate: Decimal::TEN,
        total: Decimal::TEN,
        side: Side::Buy,
    }
}

/// Dense run of trades with `ts = ts_of(id)`
pub fn run(ids: std::ops::RangeInclusive<u64>, ts_of: impl Fn(u64) -> u64) -> Vec<TradeRecord> {
    ids.map(|id| record(id, ts_of(id))).collect()
}

/// Window-honoring mock upstream
pub struct SimulatedExchange {
    books: HashMap<Symbol, Vec<TradeRecord>>,
    cap: usize,
    fetches: Mutex<Vec<(Symbol, u64, u64)>>,
}

impl SimulatedExchange {
    pub fn new(cap: usize) -> Self {
        SimulatedExchange {
            books: HashMap::new(),
            cap,
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// Single-book convenience constructor
    pub fn with_book(symbol: &Symbol, trades: Vec<TradeRecord>, cap: usize) -> Self {
        let mut exchange = SimulatedExchange::new(cap);
        exchange.add_book(symbol, trades);
        exchange
    }

    pub fn add_book(&mut self, symbol: &Symbol, mut trades: Vec<TradeRecord>) {
        trades.sort_by_key(|r| r.id);
        self.books.insert(symbol.clone(), trades);
    }

    /// Windows fetched so far, in order, as `(from_secs, to_secs)`
    pub fn fetched_windows(&self) -> Vec<(u64, u64)> {
        self.fetches.lock().iter().map(|(_, f, t)| (*f, *t)).collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }
}

#[async_trait]
impl TradeSource for SimulatedExchange {
    async fn fetch(&self, symbol: &Symbol, from_ts: Timestamp, to_ts: Timestamp) -> Result<Chunk> {
        self.fetches
            .lock()
            .push((symbol.clone(), from_ts.as_secs(), to_ts.as_secs()));
        let Some(book) = self.books.get(symbol) else {
            return Ok(Chunk::empty());
        };
        let mut hits: Vec<TradeRecord> = book
            .iter()
            .filter(|r| r.ts >= from_ts && r.ts <= to_ts)
            .cloned()
            .collect();
        // Saturated window: only the newest `cap` records survive
        if hits.len() > self.cap {
            hits = hits.split_off(hits.len() - self.cap);
        }
        // The live endpoint answers newest-first
        hits.reverse();
        Ok(Chunk::new(hits))
    }

    async fn ticker_symbols(&self) -> Result<Vec<Symbol>> {
        let mut symbols: Vec<Symbol> = self.books.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Mock upstream replaying canned chunks regardless of the window
pub struct ScriptedSource {
    chunks: Mutex<VecDeque<Chunk>>,
}

impl ScriptedSource {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        ScriptedSource {
            chunks: Mutex::new(chunks.into()),
        }
    }

    /// Chunk answering newest-first like the live endpoint
    pub fn chunk(ids: std::ops::RangeInclusive<u64>, ts_of: impl Fn(u64) -> u64) -> Chunk {
        let mut records = run(ids, ts_of);
        records.reverse();
        Chunk::new(records)
    }
}

#[async_trait]
impl TradeSource for ScriptedSource {
    async fn fetch(
        &self,
        _symbol: &Symbol,
        _from_ts: Timestamp,
        _to_ts: Timestamp,
    ) -> Result<Chunk> {
        Ok(self.chunks.lock().pop_front().unwrap_or_default())
    }

    async fn ticker_symbols(&self) -> Result<Vec<Symbol>> {
        Ok(Vec::new())
    }
}
