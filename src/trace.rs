//! Optional `tracing` output for the channel's state changes.
//!
//! Off by default. Building with `--features tracing` routes the crate's
//! `debug!`/`trace!` calls to `tracing`; otherwise they compile away.

/// Print channel events to stderr, filtered by `RUST_LOG`.
///
/// With no `RUST_LOG` set, everything from `handoff` down to `trace` level is
/// shown. Returns `false` when another global subscriber is already in place
/// or the `tracing` feature is off, so repeated calls are harmless.
#[cfg(feature = "tracing")]
pub fn init_tracing() -> bool {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("handoff=trace"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true)
                .with_thread_ids(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init()
        .is_ok()
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() -> bool {
    false
}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! discard {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use discard as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use discard as trace;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        init_tracing();
        assert!(!init_tracing());
    }
}
