//! Human-readable rendering of archive summaries

use tickvault_archive::SeriesSummary;
use tickvault_core::readable_bytes;

/// Render the per-series lines plus a totals footer
pub fn format_summary(summary: &[SeriesSummary]) -> String {
    let mut out = String::new();
    let mut total_rows = 0u64;
    let mut total_memory = 0u64;
    for line in summary {
        match &line.info {
            Some(info) => {
                out.push_str(&format!("{} - {}\n", line.symbol, info));
                total_rows += info.count;
                total_memory += info.memory;
            }
            None => out.push_str(&format!("{} - empty\n", line.symbol)),
        }
    }
    out.push_str(&format!(
        "{} series, {} rows, {}",
        summary.len(),
        total_rows,
        readable_bytes(total_memory)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickvault_core::{SeriesInfo, Symbol, Timestamp, TradeId};

    #[test]
    fn test_format_summary() {
        let summary = vec![
            SeriesSummary {
                symbol: Symbol::new("BTC_ETH").unwrap(),
                info: None,
            },
            SeriesSummary {
                symbol: Symbol::new("USDT_BTC").unwrap(),
                info: Some(SeriesInfo {
                    from_ts: Timestamp::from_secs(1000),
                    from_id: TradeId::new(1),
                    to_ts: Timestamp::from_secs(2000),
                    to_id: TradeId::new(50),
                    count: 50,
                    memory: 2048,
                }),
            },
        ];
        let rendered = format_summary(&summary);
        assert!(rendered.contains("BTC_ETH - empty"));
        assert!(rendered.contains("USDT_BTC - {"));
        assert!(rendered.ends_with("2 series, 50 rows, 2.0 KB"));
    }

    #[test]
    fn test_format_summary_empty_archive() {
        assert_eq!(format_summary(&[]), "0 series, 0 rows, 0.0 B");
    }
}
