//! Logging setup for the command line.
//!
//! Events go to stderr so stdout carries nothing but addresses.

use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// `LOG_FILE=1` and `LOG_LINE_NUM=1` add the source location to each event.
pub(crate) fn init(whoami: &str) {
    let filt = tracing_subscriber::EnvFilter::from_default_env();

    let log_file = std::env::var("LOG_FILE").is_ok_and(|v| v == "1");
    let log_line_num = std::env::var("LOG_LINE_NUM").is_ok_and(|v| v == "1");

    let stderr_sub = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(
            tracing_subscriber::fmt::format()
                .compact()
                .with_file(log_file)
                .with_line_number(log_line_num),
        )
        .with_filter(filt);

    tracing_subscriber::registry().with(stderr_sub).init();

    debug!(%whoami, "logging started");
}
