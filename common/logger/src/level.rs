use crate::LoggerError;
use std::fmt;
use std::str::FromStr;

/// The severity of a log record.
/// The declaration order is the rank: a lower rank means a more severe level,
/// so `Level::Fatal < Level::Trace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Fatal = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl Level {
    pub const ALL: [Level; 6] =
        [Level::Fatal, Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Fatal => "fatal",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    /// Returns true if a record with this level passes a `threshold` minimum level,
    /// that is, if it is at least as severe as the threshold.
    pub fn is_enabled_for(self, threshold: Level) -> bool {
        self.rank() <= threshold.rank()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Level::ALL.iter().copied().find(|level| level.name() == name).ok_or_else(|| {
            LoggerError::LoggerConfigurationError {
                message: format!(
                    "Unknown log level: [{}]. Valid values: fatal, error, warn, info, debug, trace",
                    s
                ),
            }
        })
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Trace,
        }
    }
}
