//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging. Settings come
//! from the repository's `[logging]` config section, with the `-v` flags
//! and `RUST_LOG` taking precedence over the configured level.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use pic_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Peek at the repository's logging configuration without loading the
/// repo. Remote repos and repos that cannot be read yet get defaults.
pub fn peek(repo: &str) -> LoggingConfig {
    let Ok(url) = pic_core::PicUrl::parse(repo) else {
        return LoggingConfig::default();
    };
    if !url.is_local {
        return LoggingConfig::default();
    }

    let config_path = Path::new(&url.path).join(pic_core::repo::CONFIG_FILE);
    let Ok(mut file) = std::fs::File::open(config_path) else {
        return LoggingConfig::default();
    };
    match pic_core::RepoConfig::read_from(&mut file) {
        Ok(config) => {
            let mut logging = config.logging;
            // The log file path is repo-relative.
            if !logging.file.is_empty() {
                logging.file = Path::new(&url.path)
                    .join(&logging.file)
                    .to_string_lossy()
                    .into_owned();
            }
            logging
        }
        Err(_) => LoggingConfig::default(),
    }
}

/// Initialize the logging subsystem.
///
/// Log output goes to stderr (stdout is reserved for command output), or
/// to the configured log file. `RUST_LOG` overrides everything.
pub fn init(config: &LoggingConfig, verbosity: u8) {
    let level = match verbosity {
        0 => config.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = config.format == "json";

    let file = if config.file.is_empty() {
        None
    } else {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)
            .ok()
    };

    match (file, json) {
        (Some(file), true) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(Arc::new(file)))
                .init();
        }
        (Some(file), false) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Arc::new(file)),
                )
                .init();
        }
        (None, true) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        (None, false) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr)
                        .with_ansi(true),
                )
                .init();
        }
    }
}
