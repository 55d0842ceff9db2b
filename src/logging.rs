//! Process-wide tracing setup: an optional stderr sink and an append-only log file.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
            file: Some(PathBuf::from("main.log")),
        }
    }
}

impl LoggingConfig {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Whether the stderr layer should be installed.
///
/// The overlay owns the terminal once it runs, but a process that is about to
/// exit before starting it still reports to the console.
pub fn wants_stderr(overlay_enabled: bool, exiting_early: bool) -> bool {
    !overlay_enabled || exiting_early
}

/// Install the global subscriber.
///
/// Pass `stderr = false` while a full-screen terminal view owns the screen.
pub fn init(config: &LoggingConfig, stderr: bool) -> io::Result<()> {
    let file_layer = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = stderr.then(|| fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(config.filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_and_file() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.file.as_deref(), Some(std::path::Path::new("main.log")));
    }

    #[test]
    fn test_bad_level_falls_back() {
        let config = LoggingConfig {
            level: "not a [valid filter".into(),
            file: None,
        };
        // Must not panic regardless of RUST_LOG.
        let _ = config.filter();
    }

    #[test]
    fn test_stderr_off_only_while_overlay_runs() {
        assert!(!wants_stderr(true, false));
        assert!(wants_stderr(true, true));
        assert!(wants_stderr(false, false));
    }

    #[test]
    fn test_partial_toml() {
        let config: LoggingConfig = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(config.level, "debug");
        assert!(config.file.is_some());
    }
}
