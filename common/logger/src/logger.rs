use crate::appender::{Sink, WriteMode};
use crate::clock::{Clock, SystemClock};
use crate::config::{LoggerConfig, LoggerContext};
use crate::level::Level;
use crate::record::{error_stack, LogRecord};
use crate::LoggerError;
use std::error::Error;
use std::str::FromStr;
use std::sync::Arc;

/// A named logger with a minimum level and an ordered list of sinks.
///
/// A record is written to a sink only if its level is at least as severe as the
/// minimum level of the logger and the sink filter, if any, accepts it.
/// Logging never fails: sink errors are sent to the error handler of the sink.
pub struct Logger {
    name: String,
    min_level: Level,
    sinks: Vec<Sink>,
    clock: Arc<dyn Clock>,
}

impl Logger {
    pub fn new<N: Into<String>>(name: N, min_level: Level) -> Self {
        Self { name: name.into(), min_level, sinks: vec![], clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Sink) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn from_config<N: Into<String>>(
        name: N,
        config: &LoggerConfig,
        context: &LoggerContext,
    ) -> Result<Self, LoggerError> {
        let name = name.into();
        let min_level = Level::from_str(&config.level).map_err(|err| {
            LoggerError::LoggerConfigurationError {
                message: format!("Wrong configuration of logger [{}]. Err: {}", name, err),
            }
        })?;
        let mode = if config.non_blocking { WriteMode::NonBlocking } else { WriteMode::Blocking };

        let mut logger = Logger::new(name, min_level).with_clock(context.clock.clone());
        for sink_config in &config.sinks {
            let sink = sink_config.build(context, mode).map_err(|err| {
                LoggerError::LoggerConfigurationError {
                    message: format!(
                        "Wrong configuration of logger [{}]. Err: {}",
                        logger.name, err
                    ),
                }
            })?;
            logger = logger.with_sink(sink);
        }
        Ok(logger)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level.is_enabled_for(self.min_level)
    }

    pub fn log<M: Into<String>>(&self, level: Level, message: M) {
        if self.is_enabled(level) {
            self.dispatch(&LogRecord::new(self.clock.now(), level, message));
        }
    }

    /// Logs the message with the error chain as stack.
    pub fn log_error<M: Into<String>>(&self, level: Level, message: M, error: &dyn Error) {
        if self.is_enabled(level) {
            let record =
                LogRecord::new(self.clock.now(), level, message).with_stack(error_stack(error));
            self.dispatch(&record);
        }
    }

    /// Logs a record built by the caller, keeping its timestamp.
    pub fn log_record(&self, record: &LogRecord) {
        if self.is_enabled(record.level()) {
            self.dispatch(record);
        }
    }

    pub fn fatal<M: Into<String>>(&self, message: M) {
        self.log(Level::Fatal, message)
    }

    pub fn error<M: Into<String>>(&self, message: M) {
        self.log(Level::Error, message)
    }

    pub fn warn<M: Into<String>>(&self, message: M) {
        self.log(Level::Warn, message)
    }

    pub fn info<M: Into<String>>(&self, message: M) {
        self.log(Level::Info, message)
    }

    pub fn debug<M: Into<String>>(&self, message: M) {
        self.log(Level::Debug, message)
    }

    pub fn trace<M: Into<String>>(&self, message: M) {
        self.log(Level::Trace, message)
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Local> {
        self.clock.now()
    }

    fn dispatch(&self, record: &LogRecord) {
        for sink in &self.sinks {
            if sink.accepts(record) {
                sink.write(record);
            }
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .field("sinks", &self.sinks)
            .finish()
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::appender::test::SharedBuffer;
    use crate::clock::ManualClock;
    use crate::config::SinkConfig;
    use crate::filter::{is_debug, is_error, is_info};
    use crate::format::LineFormatter;
    use crate::ErrorHandler;
    use chrono::{Local, TimeZone};
    use std::fmt;

    fn blocking_sink(buffer: &SharedBuffer) -> Sink {
        Sink::new("buffer", buffer.clone(), WriteMode::Blocking, ErrorHandler::default())
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()))
    }

    #[derive(Debug)]
    struct ConnectionError;

    impl fmt::Display for ConnectionError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl Error for ConnectionError {}

    #[test]
    fn should_write_only_levels_enabled_by_the_min_level() {
        for min_level in Level::ALL.iter().copied() {
            // Arrange
            let first = SharedBuffer::default();
            let second = SharedBuffer::default();
            let logger = Logger::new("test", min_level)
                .with_clock(clock())
                .with_sink(blocking_sink(&first))
                .with_sink(blocking_sink(&second));

            // Act
            for level in Level::ALL.iter().copied() {
                logger.log(level, format!("message at {}", level));
            }

            // Assert
            for level in Level::ALL.iter().copied() {
                let expected_line =
                    format!("2024-03-01 10:00:00 {}: message at {}\n", level, level);
                let enabled = level.rank() <= min_level.rank();
                assert_eq!(enabled, first.content().contains(&expected_line));
                assert_eq!(enabled, second.content().contains(&expected_line));
            }
        }
    }

    #[test]
    fn should_route_records_through_the_sink_filters() {
        // Arrange
        let error = SharedBuffer::default();
        let info = SharedBuffer::default();
        let debug = SharedBuffer::default();
        let logger = Logger::new("general", Level::Debug)
            .with_clock(clock())
            .with_sink(blocking_sink(&error).with_filter(is_error()))
            .with_sink(blocking_sink(&info).with_filter(is_info()))
            .with_sink(blocking_sink(&debug).with_filter(is_debug()));

        // Act
        logger.debug("trace me");
        logger.warn("nobody listens to warnings");
        logger.fatal("nor to fatal records");

        // Assert
        assert_eq!("", error.content());
        assert_eq!("", info.content());
        assert_eq!("2024-03-01 10:00:00 debug: trace me\n", debug.content());
    }

    #[test]
    fn should_log_the_error_chain_only_where_stacks_are_enabled() {
        let with_stack = SharedBuffer::default();
        let without_stack = SharedBuffer::default();
        let logger = Logger::new("fatal", Level::Error)
            .with_clock(clock())
            .with_sink(
                blocking_sink(&with_stack).with_formatter(LineFormatter::new().with_stack(true)),
            )
            .with_sink(blocking_sink(&without_stack));

        logger.log_error(Level::Error, "cannot save user", &ConnectionError);

        assert_eq!(
            "2024-03-01 10:00:00 error: cannot save user\nconnection refused\n",
            with_stack.content()
        );
        assert_eq!("2024-03-01 10:00:00 error: cannot save user\n", without_stack.content());
    }

    #[test]
    fn should_build_the_logger_from_config() {
        // Arrange
        let tempdir = tempfile::tempdir().unwrap();
        let context = LoggerContext::new(tempdir.path()).with_clock(clock());
        let config = LoggerConfig {
            level: "info".to_owned(),
            non_blocking: false,
            sinks: vec![SinkConfig::RollingFile {
                prefix: "login".to_owned(),
                max_files: "30d".to_owned(),
                frequency: None,
                max_size: Some("20m".to_owned()),
                filter: None,
                include_stack: false,
            }],
        };

        // Act
        let logger = Logger::from_config("login", &config, &context).unwrap();
        logger.info("user [admin] logged in");
        logger.debug("not written");

        // Assert
        assert_eq!("login", logger.name());
        assert_eq!(Level::Info, logger.min_level());
        assert_eq!(1, logger.sinks().len());
        let content =
            std::fs::read_to_string(tempdir.path().join("login-2024-03-01 00-00.log")).unwrap();
        assert_eq!("2024-03-01 10:00:00 info: user [admin] logged in\n", content);
    }

    #[test]
    fn should_fail_building_the_logger_with_an_unknown_level() {
        let tempdir = tempfile::tempdir().unwrap();
        let context = LoggerContext::new(tempdir.path());
        let config =
            LoggerConfig { level: "verbose".to_owned(), non_blocking: true, sinks: vec![] };

        let result = Logger::from_config("general", &config, &context);

        match result {
            Err(LoggerError::LoggerConfigurationError { message }) => {
                assert!(message.contains("general"));
                assert!(message.contains("verbose"));
            }
            _ => panic!("Expected a configuration error"),
        }
    }
}
