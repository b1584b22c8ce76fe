use crate::config::RegistryConfig;
use crate::handlers::{
    panic_message, uncaught_exception_record, unhandled_rejection_record,
};
use crate::LoggerName;
use log::*;
use logbook_common_logger::clock::{Clock, SystemClock};
use logbook_common_logger::{
    setup_logger, ErrorHandler, LogWorkerGuard, Logger, LoggerConfig, LoggerContext, LoggerError,
    TracingConfig,
};
use std::backtrace::Backtrace;
use std::error::Error;
use std::future::Future;
use std::panic;
use std::sync::Arc;

/// The named loggers of the application.
///
/// It is built once at startup and passed to the components that need to log.
/// Dropping it flushes the records still buffered by the non-blocking sinks.
pub struct LoggerRegistry {
    fatal: Arc<Logger>,
    exception: Arc<Logger>,
    rejection: Arc<Logger>,
    general: Arc<Logger>,
    request_response: Arc<Logger>,
    login: Arc<Logger>,
}

impl LoggerRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, LoggerError> {
        LoggerRegistry::with_context(config, Arc::new(SystemClock), ErrorHandler::default())
    }

    pub fn with_context(
        config: &RegistryConfig,
        clock: Arc<dyn Clock>,
        error_handler: ErrorHandler,
    ) -> Result<Self, LoggerError> {
        info!("LoggerRegistry - creating the loggers in folder [{}]", config.log_dir);
        let context = LoggerContext::new(&config.log_dir)
            .with_clock(clock)
            .with_error_handler(error_handler);
        let build = |name: &str, logger_config: &LoggerConfig| {
            debug!("LoggerRegistry - building logger [{}]: {:?}", name, logger_config);
            Logger::from_config(name, logger_config, &context).map(Arc::new)
        };

        Ok(Self {
            fatal: build(LoggerName::Fatal.as_str(), &config.fatal)?,
            exception: build("exception", &config.exception)?,
            rejection: build("rejection", &config.rejection)?,
            general: build(LoggerName::General.as_str(), &config.general)?,
            request_response: build(
                LoggerName::RequestResponse.as_str(),
                &config.request_response,
            )?,
            login: build(LoggerName::Login.as_str(), &config.login)?,
        })
    }

    pub fn fatal(&self) -> &Arc<Logger> {
        &self.fatal
    }

    pub fn general(&self) -> &Arc<Logger> {
        &self.general
    }

    pub fn request_response(&self) -> &Arc<Logger> {
        &self.request_response
    }

    pub fn login(&self) -> &Arc<Logger> {
        &self.login
    }

    pub fn get(&self, name: LoggerName) -> &Arc<Logger> {
        match name {
            LoggerName::Fatal => &self.fatal,
            LoggerName::General => &self.general,
            LoggerName::RequestResponse => &self.request_response,
            LoggerName::Login => &self.login,
        }
    }

    /// Registers a process-wide panic hook that writes every panic to the exception log
    /// before delegating to the previously registered hook.
    pub fn install_panic_hook(&self) {
        let exception = self.exception.clone();
        let previous_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let message = panic_message(panic_info.payload());
            let location = panic_info.location().map(|location| {
                format!("{}:{}:{}", location.file(), location.line(), location.column())
            });
            let record = uncaught_exception_record(
                exception.now(),
                &message,
                location.as_deref(),
                &Backtrace::capture(),
            );
            exception.log_record(&record);
            previous_hook(panic_info);
        }));
        debug!("LoggerRegistry - panic hook installed");
    }

    /// Writes to the rejection log the failure of a background work nobody awaits.
    pub fn report_rejection(&self, error: &dyn Error) {
        self.rejection.log_record(&unhandled_rejection_record(self.rejection.now(), error));
    }

    /// Awaits the future; if it fails, the error is reported as an unhandled rejection.
    pub async fn watch<F, T, E>(&self, future: F) -> Option<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Error,
    {
        match future.await {
            Ok(value) => Some(value),
            Err(err) => {
                self.report_rejection(&err);
                None
            }
        }
    }

    /// Forwards the `tracing` and `log` events of the whole process to the general logger.
    pub fn setup_tracing(
        &self,
        tracing_config: &TracingConfig,
    ) -> Result<LogWorkerGuard, LoggerError> {
        setup_logger(tracing_config, self.general.clone())
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("fatal", &self.fatal)
            .field("general", &self.general)
            .field("request_response", &self.request_response)
            .field("login", &self.login)
            .finish()
    }
}
