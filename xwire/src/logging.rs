//! Tracing setup for binaries built on xwire.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "xwire=info,xwire_container=info";

/// Installs a `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug output
/// for the xwire crates. Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("xwire=debug,xwire_container=debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
