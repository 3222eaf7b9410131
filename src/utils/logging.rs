//! Subscriber setup driven by [`LoggingConfig`].
//!
//! `RUST_LOG` wins over the configured level when it is set. Console and file
//! outputs are independent layers; JSON formatting applies to both.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing::{info, Subscriber};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::constants::ERR_LOGGING_ALREADY_INIT;
use crate::error::{ProtocolError, Result};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy()
}

fn output_layer<S, W>(json: bool, ansi: bool, writer: W) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed()
    }
}

/// Build the configured layers without installing them.
pub fn build_layers<S>(config: &LoggingConfig) -> Result<Vec<BoxedLayer<S>>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ProtocolError::ConfigError(errors.join("; ")));
    }

    let mut layers = Vec::new();
    if config.log_to_console {
        layers.push(output_layer(config.json_format, true, std::io::stderr));
    }
    if config.log_to_file {
        let path = config.log_file_path.as_deref().ok_or_else(|| {
            ProtocolError::ConfigError("log_file_path must be specified".to_string())
        })?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open log file: {e}")))?;
        layers.push(output_layer(config.json_format, false, Mutex::new(file)));
    }
    Ok(layers)
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let layers = build_layers(config)?;
    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(config))
        .try_init()
        .map_err(|_| ProtocolError::ConfigError(ERR_LOGGING_ALREADY_INIT.to_string()))?;

    info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(())
}
