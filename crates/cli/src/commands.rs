//! Clap command tree definition

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree
pub fn build_cli() -> Command {
    Command::new("tickvault")
        .about("Trade-history archiver for a windowed exchange endpoint")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("archive-dir")
                .long("archive-dir")
                .help("Archive directory (default: $TICKVAULT_ARCHIVE_DIR; unset runs in memory)")
                .global(true),
        )
        .arg(
            Arg::new("upstream-url")
                .long("upstream-url")
                .help("Upstream base URL (default: $TICKVAULT_UPSTREAM_URL or the public endpoint)")
                .global(true),
        )
        .subcommand(build_sync())
        .subcommand(build_watch())
        .subcommand(build_info())
}

fn symbols_arg() -> Arg {
    Arg::new("symbols")
        .required(true)
        .help("Comma-separated symbols, 'db' (stored series), 'ticker', or a regex over the ticker")
}

fn build_sync() -> Command {
    Command::new("sync")
        .about("Extend the selected series to cover a time interval")
        .arg(symbols_arg())
        .arg(
            Arg::new("from")
                .long("from")
                .help("Start bound: epoch seconds, 'YYYY-MM-DD[ HH:MM:SS]', 'oldest' or 'newest'"),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .help("End bound: epoch seconds, 'YYYY-MM-DD[ HH:MM:SS]', 'oldest' or 'newest'"),
        )
        .arg(
            Arg::new("drop")
                .long("drop")
                .help("Drop each series before grabbing")
                .action(ArgAction::SetTrue),
        )
}

fn build_watch() -> Command {
    Command::new("watch")
        .about("Repeatedly pull the selected series up to now")
        .arg(symbols_arg())
        .arg(
            Arg::new("every")
                .long("every")
                .help("Seconds between rows (default: 300)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("iterations")
                .long("iterations")
                .help("Stop after this many rows (default: run until interrupted)")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn build_info() -> Command {
    Command::new("info").about("Summarize the archive's series")
}
