use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI log-level name (`DEBUG`, `INFO`, `WARNING`, `ERROR`) to the
/// lowercase directive `tracing` understands.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `log_level`. Unrecognised
/// levels fall back to `"info"`. Output goes to stderr so the console
/// message on stdout stays clean.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_known_levels() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("INFO"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("ERROR"), "error");
    }

    #[test]
    fn test_filter_directive_is_case_insensitive() {
        assert_eq!(filter_directive("warning"), "warn");
        assert_eq!(filter_directive("Info"), "info");
    }

    #[test]
    fn test_filter_directive_passes_unknown_through() {
        assert_eq!(filter_directive("TRACE"), "trace");
    }

    #[test]
    fn test_setup_logging_twice_errors_instead_of_panicking() {
        // The first call may or may not win against other tests in this
        // binary; the second one is guaranteed to find a subscriber installed.
        let _ = setup_logging("INFO");
        assert!(setup_logging("DEBUG").is_err());
    }
}
