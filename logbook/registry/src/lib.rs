use logbook_common_logger::LoggerError;
use std::fmt;
use std::str::FromStr;

pub mod config;
pub mod handlers;
pub mod registry;

pub use crate::config::{build_config, RegistryConfig};
pub use crate::registry::LoggerRegistry;

/// The names under which the registry exposes its loggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggerName {
    Fatal,
    General,
    RequestResponse,
    Login,
}

impl LoggerName {
    pub const ALL: [LoggerName; 4] =
        [LoggerName::Fatal, LoggerName::General, LoggerName::RequestResponse, LoggerName::Login];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoggerName::Fatal => "fatal",
            LoggerName::General => "general",
            LoggerName::RequestResponse => "request_response",
            LoggerName::Login => "login",
        }
    }
}

impl fmt::Display for LoggerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggerName {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoggerName::ALL.iter().copied().find(|name| name.as_str() == s).ok_or_else(|| {
            LoggerError::LoggerConfigurationError { message: format!("Unknown logger: [{}]", s) }
        })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn should_parse_the_logger_names() {
        for name in LoggerName::ALL.iter() {
            assert_eq!(*name, LoggerName::from_str(name.as_str()).unwrap());
        }
        assert!(LoggerName::from_str("access").is_err());
    }
}
