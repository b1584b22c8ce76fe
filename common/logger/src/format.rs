use crate::record::LogRecord;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a record as `<timestamp> <level>: <message>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineFormatter {
    include_stack: bool,
}

impl LineFormatter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends the record stack, if any, on the lines following the message.
    pub fn with_stack(mut self, include_stack: bool) -> Self {
        self.include_stack = include_stack;
        self
    }

    pub fn format(&self, record: &LogRecord) -> String {
        let mut line = format!(
            "{} {}: {}",
            record.timestamp().format(TIMESTAMP_FORMAT),
            record.level(),
            record.message()
        );
        if self.include_stack {
            if let Some(stack) = record.stack() {
                line.push('\n');
                line.push_str(stack);
            }
        }
        line
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::level::Level;
    use chrono::{Local, TimeZone};

    fn record(level: Level, message: &str) -> LogRecord {
        LogRecord::new(Local.with_ymd_and_hms(2021, 7, 15, 9, 5, 3).unwrap(), level, message)
    }

    #[test]
    fn should_format_timestamp_level_and_message() {
        let formatter = LineFormatter::new();
        assert_eq!(
            "2021-07-15 09:05:03 info: user logged in",
            formatter.format(&record(Level::Info, "user logged in"))
        );
        assert_eq!("2021-07-15 09:05:03 fatal: ", formatter.format(&record(Level::Fatal, "")));
    }

    #[test]
    fn should_append_the_stack_only_if_enabled() {
        let record = record(Level::Error, "boom").with_stack("boom\n    caused by: io");

        assert_eq!("2021-07-15 09:05:03 error: boom", LineFormatter::new().format(&record));
        assert_eq!(
            "2021-07-15 09:05:03 error: boom\nboom\n    caused by: io",
            LineFormatter::new().with_stack(true).format(&record)
        );
    }

    #[test]
    fn should_ignore_missing_stack() {
        let formatter = LineFormatter::new().with_stack(true);
        assert_eq!(
            "2021-07-15 09:05:03 warn: careful",
            formatter.format(&record(Level::Warn, "careful"))
        );
    }
}
