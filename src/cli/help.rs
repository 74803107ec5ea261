//! Logging setup for the command-line front end

use tracing_subscriber::EnvFilter;

/// Map the `-v` count to a filter directive.
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` wins over everything. Otherwise `-v` wins over the configured
/// level, which wins over `info`.
pub fn init_tracing(verbose: u8, configured: Option<&str>) {
    let level = match (verbose, configured) {
        (0, Some(level)) => level,
        _ => get_log_level(verbose),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 2)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels() {
        assert_eq!(get_log_level(0), "info");
        assert_eq!(get_log_level(1), "debug");
        assert_eq!(get_log_level(2), "trace");
        assert_eq!(get_log_level(7), "trace");
    }
}
