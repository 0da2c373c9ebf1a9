//! Utilities: logging setup (level from -v/-q, `RUST_LOG` override).
//!
//! Logs go to stderr; stdout is reserved for answers and JSON documents.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Map `-v` count and `--quiet` onto a level.
pub fn derive_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, takes precedence.
pub fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={}",
            env!("CARGO_CRATE_NAME"),
            level.as_str().to_ascii_lowercase()
        ))
    });
    // try_init: a second installation is ignored.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(derive_level(3, true), Level::ERROR);
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(derive_level(0, false), Level::WARN);
        assert_eq!(derive_level(1, false), Level::INFO);
        assert_eq!(derive_level(2, false), Level::DEBUG);
        assert_eq!(derive_level(9, false), Level::TRACE);
    }
}
