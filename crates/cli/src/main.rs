//! tickvault CLI
//!
//! Three subcommands over one engine:
//! - `sync SYMBOLS [--from ..] [--to ..] [--drop]`: one row over the
//!   selected symbols
//! - `watch SYMBOLS [--every SECS] [--iterations N]`: repeated rows with
//!   the end bound pinned to now
//! - `info`: archive summary
//!
//! Exit codes: 0 on clean termination, 1 on unusable input (bad ranges,
//! empty selections, nothing but skipped symbols), 2 on a fatal error
//! (broken series consistency, unreachable archive).

mod commands;
mod format;

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime};
use std::process;
use std::time::Duration;
use tickvault_archive::{ArchiveStore, FileArchive, MemoryArchive};
use tickvault_core::Timestamp;
use tickvault_engine::{Grabber, RingConfig, SymbolSelector, TimeBound};
use tickvault_upstream::{HttpConfig, HttpTradeSource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ARCHIVE_DIR_ENV: &str = "TICKVAULT_ARCHIVE_DIR";
const UPSTREAM_URL_ENV: &str = "TICKVAULT_UPSTREAM_URL";

enum Action {
    Sync {
        selector: SymbolSelector,
        from: TimeBound,
        to: TimeBound,
        drop: bool,
    },
    Watch {
        selector: SymbolSelector,
        config: RingConfig,
    },
    Info,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tickvault=info")),
        )
        .init();

    let matches = commands::build_cli().get_matches();

    let action = match parse_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(1);
        }
    };

    let upstream_url = matches
        .get_one::<String>("upstream-url")
        .cloned()
        .or_else(|| std::env::var(UPSTREAM_URL_ENV).ok());
    let archive_dir = matches
        .get_one::<String>("archive-dir")
        .cloned()
        .or_else(|| std::env::var(ARCHIVE_DIR_ENV).ok());

    let mut http = HttpConfig::default();
    if let Some(url) = upstream_url {
        http.base_url = url;
    }
    let source = match HttpTradeSource::new(http) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let code = match archive_dir {
        Some(dir) => match FileArchive::open(&dir) {
            Ok(archive) => {
                info!(dir = %dir, "archive opened");
                run(Grabber::new(source, archive), action).await
            }
            Err(e) => {
                eprintln!("{}", e);
                2
            }
        },
        None => {
            warn!("no archive directory configured, running in memory");
            run(Grabber::new(source, MemoryArchive::new()), action).await
        }
    };
    process::exit(code);
}

fn parse_action(matches: &clap::ArgMatches) -> anyhow::Result<Action> {
    let (name, sub) = matches
        .subcommand()
        .context("a subcommand is required")?;
    let selector = |sub: &clap::ArgMatches| -> anyhow::Result<SymbolSelector> {
        let raw = sub
            .get_one::<String>("symbols")
            .context("SYMBOLS is required")?;
        raw.parse()
            .with_context(|| format!("'{}' is not a symbol list, keyword or regex", raw))
    };
    match name {
        "sync" => Ok(Action::Sync {
            selector: selector(sub)?,
            from: parse_time_bound(sub.get_one::<String>("from"))?,
            to: parse_time_bound(sub.get_one::<String>("to"))?,
            drop: sub.get_flag("drop"),
        }),
        "watch" => {
            let mut config = RingConfig::default();
            if let Some(every) = sub.get_one::<u64>("every") {
                config.every = Duration::from_secs(*every);
            }
            config.iterations = sub.get_one::<u64>("iterations").copied();
            Ok(Action::Watch {
                selector: selector(sub)?,
                config,
            })
        }
        "info" => Ok(Action::Info),
        other => bail!("unknown subcommand '{}'", other),
    }
}

/// Parse a bound: epoch seconds, a date, a datetime, or a stored-bound
/// keyword; absent means unbounded
fn parse_time_bound(raw: Option<&String>) -> anyhow::Result<TimeBound> {
    let Some(raw) = raw else {
        return Ok(TimeBound::Unbounded);
    };
    match raw.as_str() {
        "oldest" => return Ok(TimeBound::Oldest),
        "newest" => return Ok(TimeBound::Newest),
        _ => {}
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(TimeBound::At(Timestamp::from_secs(secs)));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(TimeBound::At(Timestamp::from_secs(
            dt.and_utc().timestamp().max(0) as u64,
        )));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let dt = date.and_hms_opt(0, 0, 0).context("invalid date")?;
        return Ok(TimeBound::At(Timestamp::from_secs(
            dt.and_utc().timestamp().max(0) as u64,
        )));
    }
    bail!(
        "'{}' is not epoch seconds, 'YYYY-MM-DD[ HH:MM:SS]', 'oldest' or 'newest'",
        raw
    )
}

async fn run<A: ArchiveStore>(grabber: Grabber<HttpTradeSource, A>, action: Action) -> i32 {
    // Ctrl-C requests cooperative cancellation; the engine stops between
    // iterations and leaves every touched series consistent
    let cancel = grabber.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing the current chunk");
            cancel.cancel();
        }
    });

    let result = match action {
        Action::Sync {
            selector,
            from,
            to,
            drop,
        } => grabber
            .extend_row(&selector, from, to, drop)
            .await
            .map(|report| {
                info!(
                    completed = report.completed.len(),
                    skipped = report.skipped.len(),
                    "sync finished"
                );
                // A row that only skipped is a usage problem, not success
                report.completed.is_empty() && !report.skipped.is_empty()
            }),
        Action::Watch { selector, config } => grabber
            .extend_ring(&selector, config)
            .await
            .map(|rows| {
                info!(rows, "watch finished");
                false
            }),
        Action::Info => match grabber.archive().summary().await {
            Ok(summary) => {
                println!("{}", format::format_summary(&summary));
                Ok(false)
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(false) => 0,
        Ok(true) => 1,
        Err(e) => {
            eprintln!("{}", e);
            if e.is_fatal() {
                2
            } else {
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_bound_keywords() {
        assert_eq!(parse_time_bound(None).unwrap(), TimeBound::Unbounded);
        assert_eq!(
            parse_time_bound(Some(&"oldest".to_string())).unwrap(),
            TimeBound::Oldest
        );
        assert_eq!(
            parse_time_bound(Some(&"newest".to_string())).unwrap(),
            TimeBound::Newest
        );
    }

    #[test]
    fn test_parse_time_bound_epoch() {
        assert_eq!(
            parse_time_bound(Some(&"1500000000".to_string())).unwrap(),
            TimeBound::At(Timestamp::from_secs(1_500_000_000))
        );
    }

    #[test]
    fn test_parse_time_bound_dates() {
        assert_eq!(
            parse_time_bound(Some(&"2017-07-14".to_string())).unwrap(),
            TimeBound::At(Timestamp::from_secs(1_499_990_400))
        );
        assert_eq!(
            parse_time_bound(Some(&"2017-07-14 02:40:00".to_string())).unwrap(),
            TimeBound::At(Timestamp::from_secs(1_500_000_000))
        );
    }

    #[test]
    fn test_parse_time_bound_rejects_junk() {
        assert!(parse_time_bound(Some(&"next tuesday".to_string())).is_err());
    }
}
