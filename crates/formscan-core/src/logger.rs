//! Stderr logger for the scanning pipeline.
//!
//! Records from `formscan*` targets are shown down to the chosen level while
//! other crates stay at `warn`, so a `debug` run traces alignment and
//! barcode attempts without drowning in dependency output. Lines look like
//! `[   0.042s DEBUG formscan_align::session] scan described with 12 features`.
//!
//! With the `tracing` feature, [`init_tracing`] installs a `tracing-subscriber`
//! instead.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_TARGET: &str = "formscan";
const FOREIGN_LEVEL: LevelFilter = LevelFilter::Warn;

struct ScanLogger {
    level: LevelFilter,
    started: Instant,
}

impl ScanLogger {
    fn limit_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET) {
            self.level
        } else {
            self.level.min(FOREIGN_LEVEL)
        }
    }
}

impl Log for ScanLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.limit_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = match record.level() {
            Level::Error | Level::Warn => writeln!(
                stderr,
                "[{:8.3}s {:>5} {}] {} ({}:{})",
                elapsed,
                record.level(),
                record.target(),
                record.args(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0)
            ),
            _ => writeln!(
                stderr,
                "[{:8.3}s {:>5} {}] {}",
                elapsed,
                record.level(),
                record.target(),
                record.args()
            ),
        };
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<ScanLogger> = OnceLock::new();

/// Install the stderr logger; `level` applies to the `formscan*` crates.
///
/// Only the first call installs anything; later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| ScanLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Without `RUST_LOG` the `formscan*` crates log at `info` and everything
/// else at `warn`. `json` switches to flattened JSON events.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives()));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(feature = "tracing")]
fn default_directives() -> String {
    [
        "formscan",
        "formscan_core",
        "formscan_align",
        "formscan_barcode",
    ]
    .iter()
    .map(|t| format!("{t}=info"))
    .chain(std::iter::once(FOREIGN_LEVEL.to_string().to_lowercase()))
    .collect::<Vec<_>>()
    .join(",")
}
