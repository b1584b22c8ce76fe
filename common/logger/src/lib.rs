use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, EnvFilter, Registry};

pub mod appender;
pub mod clock;
pub mod config;
pub mod filter;
pub mod format;
pub mod level;
pub mod logger;
pub mod record;
pub mod subscriber;

pub use config::{LoggerConfig, LoggerContext, SinkConfig};
pub use level::Level;
pub use logger::Logger;
pub use record::LogRecord;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("LoggerConfigurationError: [{message}]")]
    LoggerConfigurationError { message: String },
    #[error("LoggerWriteError: [{message}]")]
    LoggerWriteError { message: String },
    #[error("LoggerRuntimeError: [{message}]")]
    LoggerRuntimeError { message: String },
}

impl From<log::SetLoggerError> for LoggerError {
    fn from(error: log::SetLoggerError) -> Self {
        LoggerError::LoggerConfigurationError { message: format!("{}", error) }
    }
}

impl From<std::io::Error> for LoggerError {
    fn from(error: std::io::Error) -> Self {
        LoggerError::LoggerConfigurationError { message: format!("{}", error) }
    }
}

/// Receives the errors that happen while writing the logs.
/// These errors are never returned to the code that emits the log records.
#[derive(Clone)]
pub struct ErrorHandler {
    handler: Arc<dyn Fn(&LoggerError) + Send + Sync>,
}

impl ErrorHandler {
    pub fn new<F: 'static + Fn(&LoggerError) + Send + Sync>(handler: F) -> Self {
        Self { handler: Arc::new(handler) }
    }

    /// Prints the errors to the standard error.
    /// The logs themselves are the failing component, so they cannot be used here.
    pub fn stderr() -> Self {
        Self::new(|err| eprintln!("{}", err))
    }

    pub fn handle(&self, error: &LoggerError) {
        (self.handler)(error)
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        ErrorHandler::stderr()
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ErrorHandler")
    }
}

/// Defines how the `tracing` and `log` events of the whole process are forwarded
/// to a [`Logger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Sets the [`EnvFilter`] applied before the events reach the Logger.
    /// Example of a valid filter: "warn,my_crate=info,my_crate::my_mod=debug,[my_span]=trace"
    pub level: String,

    /// Determines whether the events should also be printed to standard output.
    /// Valid values: true, false
    pub stdout_output: bool,
}

pub struct LogWorkerGuard {
    #[allow(dead_code)]
    stdout_guard: Option<WorkerGuard>,

    reload_handle: tracing_subscriber::reload::Handle<EnvFilter, Registry>,
}

impl LogWorkerGuard {
    pub fn reload(&self, env_filter_str: &str) -> Result<(), LoggerError> {
        let env_filter = parse_env_filter(env_filter_str)?;
        self.reload_handle.reload(env_filter).map_err(|err| LoggerError::LoggerRuntimeError {
            message: format!("Cannot reload the logger configuration. err: {:?}", err),
        })
    }
}

/// Installs the global `tracing` subscriber that forwards every event to the `logger`.
/// The `log` records are captured too.
/// It can be called only once per process.
pub fn setup_logger(
    tracing_config: &TracingConfig,
    logger: Arc<Logger>,
) -> Result<LogWorkerGuard, LoggerError> {
    let env_filter = parse_env_filter(&tracing_config.level)?;

    let (reloadable_env_filter, reloadable_env_filter_handle) =
        tracing_subscriber::reload::Layer::new(env_filter);

    let (stdout_subscriber, stdout_guard) = if tracing_config.stdout_output {
        let (non_blocking, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
        (Some(Layer::new().with_ansi(false).with_writer(non_blocking)), Some(stdout_guard))
    } else {
        (None, None)
    };

    let subscriber = tracing_subscriber::registry()
        .with(reloadable_env_filter)
        .with(subscriber::LoggerLayer::new(logger))
        .with(stdout_subscriber);

    set_global_logger(subscriber)?;

    Ok(LogWorkerGuard { stdout_guard, reload_handle: reloadable_env_filter_handle })
}

fn parse_env_filter(env_filter_str: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::from_str(env_filter_str).map_err(|err| LoggerError::LoggerConfigurationError {
        message: format!("Cannot parse the logger level: [{}]. err: {:?}", env_filter_str, err),
    })
}

fn set_global_logger<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    tracing_log::LogTracer::init().map_err(|err| LoggerError::LoggerConfigurationError {
        message: format!("Cannot start the logger LogTracer. err: {:?}", err),
    })?;
    set_global_default(subscriber).map_err(|err| LoggerError::LoggerConfigurationError {
        message: format!("Cannot start the logger. err: {:?}", err),
    })
}
