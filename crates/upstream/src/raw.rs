//! Wire representation of upstream trades
//!
//! The upstream reports decimals and dates as strings:
//!
//! ```json
//! {
//!   "globalTradeID": 394700861,
//!   "tradeID": 45210354,
//!   "date": "2018-10-18 23:03:21",
//!   "type": "buy",
//!   "rate": "0.03117266",
//!   "amount": "0.34153118",
//!   "total": "0.01064633"
//! }
//! ```
//!
//! Shape is checked strictly (a type change in the feed must surface, not
//! vanish as "no data"), values leniently: a row whose decimal or date
//! *content* fails to parse is dropped on its own.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tickvault_core::{GlobalTradeId, Side, Timestamp, TradeId, TradeRecord};
use tracing::debug;

/// Wire date format, UTC
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One trade as the upstream serializes it
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTrade {
    #[serde(rename = "globalTradeID")]
    pub global_trade_id: u64,
    #[serde(rename = "tradeID")]
    pub trade_id: u64,
    pub date: String,
    #[serde(rename = "type")]
    pub side: String,
    pub rate: String,
    pub amount: String,
    pub total: String,
}

impl RawTrade {
    /// Coerce into a typed record; `None` drops the row
    pub(crate) fn normalize(self) -> Option<TradeRecord> {
        let ts = match NaiveDateTime::parse_from_str(&self.date, DATE_FORMAT) {
            Ok(dt) => Timestamp::from_secs(dt.and_utc().timestamp().max(0) as u64),
            Err(_) => {
                debug!(trade_id = self.trade_id, date = %self.date, "dropping row: bad date");
                return None;
            }
        };
        let side = match self.side.as_str() {
            "buy" => Side::Buy,
            "sell" => Side::Sell,
            other => {
                debug!(trade_id = self.trade_id, side = %other, "dropping row: bad side");
                return None;
            }
        };
        let parse = |field: &str, value: &str| -> Option<Decimal> {
            match Decimal::from_str(value) {
                Ok(d) => Some(d),
                Err(_) => {
                    debug!(trade_id = self.trade_id, field, value, "dropping row: bad decimal");
                    None
                }
            }
        };
        Some(TradeRecord {
            id: TradeId::new(self.trade_id),
            ts,
            global_id: GlobalTradeId::new(self.global_trade_id),
            rate: parse("rate", &self.rate)?,
            amount: parse("amount", &self.amount)?,
            total: parse("total", &self.total)?,
            side,
        })
    }
}
