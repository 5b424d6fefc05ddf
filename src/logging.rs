//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogLevel;

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies. Output
/// goes to stderr so command output on stdout stays machine-readable.
/// Returns false if a subscriber was already installed.
pub fn init_tracing(level: LogLevel) -> bool {
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing(LogLevel::Quiet);
        assert!(!init_tracing(LogLevel::Debug));
    }
}
