//! Structured logging and tracing for the Bender driver
//!
//! Installs a `tracing-subscriber` registry with a console layer and an
//! optional daily-rolling file layer, and provides a small component-scoped
//! logger used by the transport, prober and operation code.

use crate::config::LoggingConfig;
use crate::error::{DriverError, Result};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;
mod state;
mod structured;

pub use level::parse_log_level;
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use level::min_level;
use state::{INIT_ERROR, INIT_ONCE, LOG_GUARD};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Initialize logging system based on configuration
///
/// Only the first call installs a subscriber; later calls return the outcome
/// of that first attempt.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let base_level = parse_log_level(&config.level)?;
            let console_level = config
                .console_level
                .as_ref()
                .and_then(|s| parse_log_level(s).ok())
                .unwrap_or(base_level);
            let file_level = config
                .file_level
                .as_ref()
                .and_then(|s| parse_log_level(s).ok())
                .unwrap_or(base_level);

            let mut layers: Vec<BoxedLayer> = Vec::new();

            if config.console_output {
                layers.push(console_layer(config.json_format, console_level));
            }

            let use_file = config.file_output && !should_use_console_only();
            if use_file {
                layers.push(file_layer(config, file_level)?);
            }

            let most_verbose = if use_file {
                min_level(console_level, file_level)
            } else {
                console_level
            };

            tracing_subscriber::registry()
                .with(layers)
                .with(build_env_filter(most_verbose))
                .try_init()
                .map_err(|e| DriverError::config(format!("Failed to install subscriber: {}", e)))?;

            info!(
                "Logging initialized - console_level: {:?}, file_level: {:?}, file: {}",
                console_level,
                file_level,
                if use_file { config.file.as_str() } else { "-" }
            );
            Ok(())
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(DriverError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bender_cc={},tokio_modbus=warn", level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("BENDER_DISABLE_FILE_LOG").is_some()
}

fn console_layer(json_format: bool, level: Level) -> BoxedLayer {
    let base = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json_format {
        base.json()
            .with_filter(LevelFilter::from_level(level))
            .boxed()
    } else {
        base.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn file_layer(config: &LoggingConfig, level: Level) -> Result<BoxedLayer> {
    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("bender-cc")
        .filename_suffix("log")
        .max_log_files(config.backup_count as usize)
        .build({
            // If config.file is a file path, use its parent dir; otherwise treat as dir
            let p = Path::new(&config.file);
            if p.extension().is_some() {
                p.parent().unwrap_or(p)
            } else {
                p
            }
        })
        .map_err(|e| DriverError::io(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let base = fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    Ok(if config.json_format {
        base.json()
            .with_filter(LevelFilter::from_level(level))
            .boxed()
    } else {
        base.with_filter(LevelFilter::from_level(level)).boxed()
    })
}
