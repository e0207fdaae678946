use std::fs::File;
use std::io::{self, IsTerminal, stdout};
use std::path::Path;

use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn setup_logging_file(level: tracing::Level, path: &Path) -> io::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(File::create(path)?)
        .log_internal_errors(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(logging_targets(level))
        .init();
    Ok(())
}

pub fn setup_logging_stdio(level: tracing::Level) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .with_line_number(false)
        .with_level(false)
        .without_time();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(stdout().is_terminal())
        .event_format(format)
        .log_internal_errors(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(logging_targets(level))
        .init();
}

fn logging_targets(level: tracing::Level) -> Targets {
    // One hsync trace per scanline drowns everything else out.
    let monitor_level = LevelFilter::from_level(level).min(LevelFilter::DEBUG);
    Targets::new()
        .with_target("tt_vga::host::monitor", monitor_level)
        .with_default(LevelFilter::from_level(level))
}
