//! Tracing setup for the `inpsyght` binary.
//!
//! Log lines go to stderr. Reports and prompts own stdout, so the default
//! level stays at WARN unless `-v` is given.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "INPSYGHT_LOG";

/// How much the binary logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings, such as unparseable cached timestamps.
    #[default]
    Normal,
    /// CMS requests, cache writes and scoring notes.
    Verbose,
    /// Everything, including dependencies' spans.
    Trace,
}

impl Verbosity {
    /// Map the `-q` flag and the `-v` count to a verbosity. `-q` wins.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Level for events from this crate.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// `EnvFilter` directive used when no environment override is set.
    ///
    /// Only `Trace` lets dependency events (reqwest, rusqlite) through.
    #[must_use]
    pub fn filter_directive(&self) -> String {
        let own = format!("inpsyght={}", self.to_level_filter());
        match self {
            Self::Trace => format!("{own},debug"),
            _ => own,
        }
    }
}

/// Install the global subscriber.
///
/// [`LOG_ENV`] and then `RUST_LOG` override `verbosity` when set. Calling
/// this more than once is harmless.
///
/// ```no_run
/// use inpsyght::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(matches!(verbosity, Verbosity::Trace))
                .without_time(),
        )
        .try_init();
}
