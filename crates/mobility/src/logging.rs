//! Logging setup.
//!
//! Store mutations, decode fallbacks and backend activity are reported through
//! `tracing`; this module installs the subscriber that renders them.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How chatty the binary should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above, including every store change (`-v`).
    Verbose,
    /// Everything (`-vv`).
    Trace,
}

impl Verbosity {
    /// The most detailed level that is still emitted.
    #[must_use]
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::ERROR,
            Self::Normal => LevelFilter::INFO,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Filter directive scoping `self` to this crate's targets.
    fn directive(self) -> String {
        format!("{}={}", env!("CARGO_CRATE_NAME"), self.level_filter())
    }
}

/// The filter for `verbosity`, unless `rust_log` holds directives, in which
/// case those win outright.
fn build_filter(verbosity: Verbosity, rust_log: Option<&str>) -> EnvFilter {
    match rust_log.map(str::trim).filter(|spec| !spec.is_empty()) {
        Some(spec) => EnvFilter::builder().parse_lossy(spec),
        None => EnvFilter::new(verbosity.directive()),
    }
}

/// Install the global subscriber, writing to stderr.
///
/// A non-empty `RUST_LOG` takes precedence over `verbosity`. Only the first
/// call in a process installs anything.
///
/// ```no_run
/// use mobility::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbosity, rust_log.as_deref());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// Subscriber for unit tests; output is captured per test.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::WARN)
        .with_test_writer()
        .try_init();
}
