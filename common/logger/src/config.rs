use crate::appender::file::never_rotated;
use crate::appender::rolling::{parse_size, Retention, RollingFileAppender, Rotation};
use crate::appender::{Sink, WriteMode};
use crate::clock::{Clock, SystemClock};
use crate::filter::OnlyLevel;
use crate::format::LineFormatter;
use crate::{ErrorHandler, LoggerError};
use log::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Defines a Logger: its minimum level and its sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// The minimum level of the records accepted by the Logger.
    /// Valid values: fatal, error, warn, info, debug, trace
    pub level: String,

    /// Whether the sinks write from a background worker thread.
    #[serde(default = "default_non_blocking")]
    pub non_blocking: bool,

    pub sinks: Vec<SinkConfig>,
}

fn default_non_blocking() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// A single file that is never rotated.
    File {
        /// The file path; relative paths are resolved against the log folder.
        path: String,
        /// If present, only the records of this level are written.
        #[serde(default)]
        filter: Option<String>,
        /// Whether the error stacks are appended to the message.
        #[serde(default)]
        include_stack: bool,
    },
    /// A file rotated by time and size, named `<prefix>-<YYYY-MM-DD HH-mm>.log`.
    RollingFile {
        prefix: String,
        /// `<N>d` deletes files older than N days; `<N>` keeps the newest N files.
        max_files: String,
        /// `<N>m`, `<N>h` or `daily`. Default: daily.
        #[serde(default)]
        frequency: Option<String>,
        /// E.g. `20m`. Default: unbounded.
        #[serde(default)]
        max_size: Option<String>,
        #[serde(default)]
        filter: Option<String>,
        #[serde(default)]
        include_stack: bool,
    },
}

/// The resources shared by all the sinks built from configuration.
#[derive(Clone)]
pub struct LoggerContext {
    pub log_dir: PathBuf,
    pub clock: Arc<dyn Clock>,
    pub error_handler: ErrorHandler,
}

impl LoggerContext {
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Self {
        Self {
            log_dir: log_dir.as_ref().to_path_buf(),
            clock: Arc::new(SystemClock),
            error_handler: ErrorHandler::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_error_handler(mut self, error_handler: ErrorHandler) -> Self {
        self.error_handler = error_handler;
        self
    }
}

impl SinkConfig {
    /// Validates the configuration and opens the sink.
    pub fn build(&self, context: &LoggerContext, mode: WriteMode) -> Result<Sink, LoggerError> {
        match self {
            SinkConfig::File { path, filter, include_stack } => {
                let filter = parse_filter(filter)?;
                let file_path = context.log_dir.join(path);
                debug!(
                    "SinkConfig - opening the log file [{}] in {:?} mode",
                    file_path.display(),
                    mode
                );
                let appender = never_rotated(&file_path)?;
                let sink =
                    Sink::new(path.clone(), appender, mode, context.error_handler.clone());
                Ok(finish_sink(sink, filter, *include_stack))
            }
            SinkConfig::RollingFile {
                prefix,
                max_files,
                frequency,
                max_size,
                filter,
                include_stack,
            } => {
                let filter = parse_filter(filter)?;
                let retention = Retention::from_str(max_files)?;
                let rotation = match frequency {
                    Some(frequency) => Rotation::from_str(frequency)?,
                    None => Rotation::DAILY,
                };
                let mut builder = RollingFileAppender::builder(&context.log_dir, prefix.clone())
                    .rotation(rotation)
                    .retention(retention)
                    .clock(context.clock.clone())
                    .error_handler(context.error_handler.clone());
                if let Some(max_size) = max_size {
                    builder = builder.max_size(parse_size(max_size)?);
                }
                debug!(
                    "SinkConfig - opening the rolling files [{}] in folder [{}] with {:?}, {:?}",
                    prefix,
                    context.log_dir.display(),
                    rotation,
                    retention
                );
                let sink = Sink::new(
                    format!("{}-<date>.log", prefix),
                    builder.build()?,
                    mode,
                    context.error_handler.clone(),
                );
                Ok(finish_sink(sink, filter, *include_stack))
            }
        }
    }
}

fn parse_filter(filter: &Option<String>) -> Result<Option<OnlyLevel>, LoggerError> {
    filter.as_deref().map(OnlyLevel::from_str).transpose()
}

fn finish_sink(sink: Sink, filter: Option<OnlyLevel>, include_stack: bool) -> Sink {
    let sink = sink.with_formatter(LineFormatter::new().with_stack(include_stack));
    match filter {
        Some(filter) => sink.with_filter(filter),
        None => sink,
    }
}
