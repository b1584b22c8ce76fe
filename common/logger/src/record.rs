use crate::level::Level;
use chrono::{DateTime, Local};
use std::error::Error;

/// A single log event. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    timestamp: DateTime<Local>,
    level: Level,
    message: String,
    stack: Option<String>,
}

impl LogRecord {
    pub fn new<M: Into<String>>(timestamp: DateTime<Local>, level: Level, message: M) -> Self {
        Self { timestamp, level, message: message.into(), stack: None }
    }

    pub fn with_stack<S: Into<String>>(mut self, stack: S) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

/// Renders an error and its chain of sources, one per line.
pub fn error_stack(error: &dyn Error) -> String {
    let mut stack = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        stack.push_str("\n    caused by: ");
        stack.push_str(&cause.to_string());
        source = cause.source();
    }
    stack
}
