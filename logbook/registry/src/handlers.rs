//! Builds the records of the process level failures: panics and unhandled rejections.
use chrono::{DateTime, Local};
use logbook_common_logger::record::error_stack;
use logbook_common_logger::{Level, LogRecord};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;

pub const UNCAUGHT_EXCEPTION_PREFIX: &str = "uncaughtException";
pub const UNHANDLED_REJECTION_PREFIX: &str = "unhandledRejection";

/// Extracts the message of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

pub fn uncaught_exception_record(
    timestamp: DateTime<Local>,
    message: &str,
    location: Option<&str>,
    backtrace: &Backtrace,
) -> LogRecord {
    let mut stack = match location {
        Some(location) => format!("panicked at {}", location),
        None => "panicked at an unknown location".to_owned(),
    };
    if backtrace.status() == BacktraceStatus::Captured {
        stack.push('\n');
        stack.push_str(&backtrace.to_string());
    }
    LogRecord::new(timestamp, Level::Error, format!("{}: {}", UNCAUGHT_EXCEPTION_PREFIX, message))
        .with_stack(stack)
}

pub fn unhandled_rejection_record(timestamp: DateTime<Local>, error: &dyn Error) -> LogRecord {
    LogRecord::new(timestamp, Level::Error, format!("{}: {}", UNHANDLED_REJECTION_PREFIX, error))
        .with_stack(error_stack(error))
}

#[cfg(test)]
mod test {

    use super::*;
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn should_extract_the_panic_message() {
        let static_payload: Box<dyn Any + Send> = Box::new("boom");
        let owned_payload: Box<dyn Any + Send> = Box::new(format!("boom {}", 42));
        let other_payload: Box<dyn Any + Send> = Box::new(42u32);

        assert_eq!("boom", panic_message(static_payload.as_ref()));
        assert_eq!("boom 42", panic_message(owned_payload.as_ref()));
        assert_eq!("Box<dyn Any>", panic_message(other_payload.as_ref()));
    }

    #[test]
    fn should_build_the_uncaught_exception_record() {
        let record = uncaught_exception_record(
            timestamp(),
            "boom",
            Some("src/main.rs:10:5"),
            &Backtrace::disabled(),
        );

        assert_eq!(Level::Error, record.level());
        assert_eq!("uncaughtException: boom", record.message());
        assert_eq!(Some("panicked at src/main.rs:10:5"), record.stack());
    }

    #[test]
    fn should_build_the_unhandled_rejection_record() {
        let error = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timeout");

        let record = unhandled_rejection_record(timestamp(), &error);

        assert_eq!(Level::Error, record.level());
        assert_eq!("unhandledRejection: upstream timeout", record.message());
        assert_eq!(Some("upstream timeout"), record.stack());
    }
}
