//! Upstream gateway for tickvault
//!
//! The upstream is the exchange's public HTTP endpoint. This crate fixes its
//! contract as the [`TradeSource`] trait and implements it over reqwest as
//! [`HttpTradeSource`].
//!
//! The gateway owns every wire concern so nothing upstream-shaped leaks into
//! the engine: field renaming (`date`→`ts`, `tradeID`→`id`,
//! `globalTradeID`→`global_id`), type coercion from the wire's decimal and
//! date strings, and failure classification. Transient failures become an
//! empty chunk (the engine distinguishes "no trades" from "endpoint hiccup"
//! only by retrying with an older window), while a response whose shape
//! contradicts the documented contract surfaces as a schema error.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod http;
mod raw;
mod source;

pub use http::{HttpConfig, HttpTradeSource};
pub use source::{TradeSource, FETCH_CAP};
