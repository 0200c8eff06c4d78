//! HTTP implementation of the upstream gateway
//!
//! Failure classification, in order of checks:
//!
//! - request error, timeout, non-success status, unreadable or non-JSON
//!   body → transient, logged at debug, returned as an **empty chunk**;
//! - JSON object with an `error` field → the upstream's own refusal
//!   (unknown pair, suspended market), same transient treatment;
//! - JSON array whose rows do not match the documented row shape → a
//!   **schema error**; silencing it would turn a feed change into silent
//!   data loss;
//! - rows with well-shaped but unparsable values → dropped individually.

use crate::raw::RawTrade;
use crate::source::TradeSource;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tickvault_core::{Chunk, Error, Result, Symbol, Timestamp};
use tracing::{debug, warn};

const TRADE_HISTORY_COMMAND: &str = "returnTradeHistory";
const TICKER_COMMAND: &str = "returnTicker";

/// Configuration for [`HttpTradeSource`]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the public endpoint, e.g. `https://poloniex.com/public`
    pub base_url: String,
    /// Per-call timeout
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            base_url: "https://poloniex.com/public".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// reqwest-backed [`TradeSource`]
#[derive(Debug, Clone)]
pub struct HttpTradeSource {
    client: Client,
    base_url: String,
}

impl HttpTradeSource {
    /// Build a source from configuration
    ///
    /// # Errors
    ///
    /// Fails if the underlying client cannot be constructed.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::upstream_schema(format!("client construction failed: {}", e)))?;
        Ok(HttpTradeSource {
            client,
            base_url: config.base_url,
        })
    }

    /// GET the endpoint and return the parsed JSON body, or `None` for any
    /// transient failure
    async fn get_json(&self, query: &[(&str, String)]) -> Option<serde_json::Value> {
        let response = match self.client.get(&self.base_url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "upstream request failed");
                return None;
            }
        };
        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "upstream returned non-success status");
            return None;
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "upstream body unreadable");
                return None;
            }
        };
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "upstream body is not JSON");
                None
            }
        }
    }
}

#[async_trait]
impl TradeSource for HttpTradeSource {
    async fn fetch(&self, symbol: &Symbol, from_ts: Timestamp, to_ts: Timestamp) -> Result<Chunk> {
        let query = [
            ("command", TRADE_HISTORY_COMMAND.to_string()),
            ("currencyPair", symbol.to_string()),
            ("start", from_ts.as_secs().to_string()),
            ("end", to_ts.as_secs().to_string()),
        ];
        let Some(value) = self.get_json(&query).await else {
            return Ok(Chunk::empty());
        };

        let rows = match value {
            serde_json::Value::Array(rows) => rows,
            serde_json::Value::Object(map) if map.contains_key("error") => {
                debug!(
                    symbol = %symbol,
                    error = %map["error"],
                    "upstream refused trade history request"
                );
                return Ok(Chunk::empty());
            }
            other => {
                return Err(Error::upstream_schema(format!(
                    "expected trade array, got {}",
                    json_kind(&other)
                )));
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: RawTrade = serde_json::from_value(row)
                .map_err(|e| Error::upstream_schema(format!("bad trade row: {}", e)))?;
            if let Some(record) = raw.normalize() {
                records.push(record);
            }
        }
        Ok(Chunk::new(records))
    }

    async fn ticker_symbols(&self) -> Result<Vec<Symbol>> {
        let query = [("command", TICKER_COMMAND.to_string())];
        let Some(value) = self.get_json(&query).await else {
            warn!("ticker unreachable, returning no symbols");
            return Ok(Vec::new());
        };
        let serde_json::Value::Object(map) = value else {
            return Err(Error::upstream_schema(format!(
                "expected ticker object, got {}",
                json_kind(&value)
            )));
        };
        if map.contains_key("error") {
            warn!(error = %map["error"], "ticker request refused, returning no symbols");
            return Ok(Vec::new());
        }
        let mut symbols = Vec::with_capacity(map.len());
        for key in map.keys() {
            match Symbol::new(key) {
                Ok(symbol) => symbols.push(symbol),
                Err(e) => debug!(key = %key, error = %e, "skipping unparsable ticker key"),
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickvault_core::TradeId;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sym() -> Symbol {
        Symbol::new("USDT_BTC").unwrap()
    }

    async fn source_for(server: &MockServer) -> HttpTradeSource {
        HttpTradeSource::new(HttpConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(200),
        })
        .unwrap()
    }

    fn trade_row(id: u64, date: &str) -> serde_json::Value {
        serde_json::json!({
            "globalTradeID": id * 9,
            "tradeID": id,
            "date": date,
            "type": "sell",
            "rate": "0.5",
            "amount": "2",
            "total": "1"
        })
    }

    #[tokio::test]
    async fn test_fetch_renames_and_orients() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("command", TRADE_HISTORY_COMMAND))
            .and(query_param("currencyPair", "USDT_BTC"))
            .and(query_param("start", "100"))
            .and(query_param("end", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                trade_row(12, "1970-01-01 00:02:30"),
                trade_row(11, "1970-01-01 00:02:00"),
                trade_row(10, "1970-01-01 00:01:40"),
            ])))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let chunk = source
            .fetch(&sym(), Timestamp::from_secs(100), Timestamp::from_secs(200))
            .await
            .unwrap();
        assert_eq!(chunk.len(), 3);
        let info = chunk.info().unwrap();
        assert_eq!(info.from_id, TradeId::new(10));
        assert_eq!(info.to_id, TradeId::new(12));
        assert_eq!(info.from_ts, Timestamp::from_secs(100));
        assert_eq!(info.to_ts, Timestamp::from_secs(150));
    }

    #[tokio::test]
    async fn test_fetch_drops_unparsable_row() {
        let server = MockServer::start().await;
        let mut bad = trade_row(11, "1970-01-01 00:02:00");
        bad["rate"] = serde_json::Value::String("not-a-number".into());
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                trade_row(12, "1970-01-01 00:02:30"),
                bad,
            ])))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let chunk = source
            .fetch(&sym(), Timestamp::EPOCH, Timestamp::from_secs(200))
            .await
            .unwrap();
        assert_eq!(chunk.len(), 1);
        assert!(chunk.contains_id(TradeId::new(12)));
    }

    #[tokio::test]
    async fn test_fetch_schema_mismatch_is_an_error() {
        let server = MockServer::start().await;
        // tradeID as a string contradicts the documented row shape
        let mut bad = trade_row(11, "1970-01-01 00:02:00");
        bad["tradeID"] = serde_json::Value::String("11".into());
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([bad])))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let err = source
            .fetch(&sym(), Timestamp::EPOCH, Timestamp::from_secs(200))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamSchema { .. }));
    }

    #[tokio::test]
    async fn test_fetch_non_array_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(42)))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        assert!(source
            .fetch(&sym(), Timestamp::EPOCH, Timestamp::from_secs(200))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_fetch_upstream_error_object_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"error": "Invalid currency pair."})),
            )
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let chunk = source
            .fetch(&sym(), Timestamp::EPOCH, Timestamp::from_secs(200))
            .await
            .unwrap();
        assert!(chunk.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let chunk = source
            .fetch(&sym(), Timestamp::EPOCH, Timestamp::from_secs(200))
            .await
            .unwrap();
        assert!(chunk.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let chunk = source
            .fetch(&sym(), Timestamp::EPOCH, Timestamp::from_secs(200))
            .await
            .unwrap();
        assert!(chunk.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_empty() {
        let source = HttpTradeSource::new(HttpConfig {
            // Reserved port with nothing listening
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        let chunk = source
            .fetch(&sym(), Timestamp::EPOCH, Timestamp::from_secs(200))
            .await
            .unwrap();
        assert!(chunk.is_empty());
    }

    #[tokio::test]
    async fn test_ticker_symbols() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("command", TICKER_COMMAND))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "USDT_BTC": {"last": "1"},
                "btc_eth": {"last": "2"},
                "BAD PAIR": {"last": "3"}
            })))
            .mount(&server)
            .await;

        let source = source_for(&server).await;
        let symbols = source.ticker_symbols().await.unwrap();
        assert_eq!(
            symbols,
            vec![Symbol::new("BTC_ETH").unwrap(), Symbol::new("USDT_BTC").unwrap()]
        );
    }

    #[tokio::test]
    async fn test_ticker_unreachable_is_empty() {
        let source = HttpTradeSource::new(HttpConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        assert!(source.ticker_symbols().await.unwrap().is_empty());
    }
}
