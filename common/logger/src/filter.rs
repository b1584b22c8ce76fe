use crate::level::Level;
use crate::record::LogRecord;
use crate::LoggerError;
use std::str::FromStr;

/// A predicate that further restricts which records a sink accepts,
/// independently of the minimum level of the logger.
pub trait RecordFilter: Send + Sync {
    fn accept(&self, record: &LogRecord) -> bool;
}

impl<F> RecordFilter for F
where
    F: 'static + Fn(&LogRecord) -> bool + Send + Sync,
{
    fn accept(&self, record: &LogRecord) -> bool {
        (self)(record)
    }
}

/// Accepts only the records of exactly one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnlyLevel(pub Level);

impl RecordFilter for OnlyLevel {
    fn accept(&self, record: &LogRecord) -> bool {
        record.level() == self.0
    }
}

impl FromStr for OnlyLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(OnlyLevel(Level::from_str(s)?))
    }
}

pub fn is_error() -> OnlyLevel {
    OnlyLevel(Level::Error)
}

pub fn is_info() -> OnlyLevel {
    OnlyLevel(Level::Info)
}

pub fn is_debug() -> OnlyLevel {
    OnlyLevel(Level::Debug)
}
