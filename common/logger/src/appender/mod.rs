use crate::filter::RecordFilter;
use crate::format::LineFormatter;
use crate::record::LogRecord;
use crate::{ErrorHandler, LoggerError};
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

pub mod file;
pub mod rolling;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// The caller writes to the file and waits for the write to complete.
    Blocking,
    /// A dedicated worker thread writes to the file.
    /// Buffered lines are flushed when the sink is dropped.
    NonBlocking,
}

enum SinkOutput {
    Blocking(Mutex<Box<dyn Write + Send>>),
    NonBlocking {
        writer: NonBlocking,
        #[allow(dead_code)]
        guard: WorkerGuard,
    },
}

/// A destination for the records of a logger: a writer, the format of its lines and
/// an optional filter.
pub struct Sink {
    name: String,
    formatter: LineFormatter,
    filter: Option<Box<dyn RecordFilter>>,
    output: SinkOutput,
    error_handler: ErrorHandler,
}

impl Sink {
    pub fn new<N: Into<String>, W: Write + Send + 'static>(
        name: N,
        writer: W,
        mode: WriteMode,
        error_handler: ErrorHandler,
    ) -> Self {
        let name = name.into();
        let output = match mode {
            WriteMode::Blocking => SinkOutput::Blocking(Mutex::new(Box::new(writer))),
            WriteMode::NonBlocking => {
                let reporting_writer = ReportingWriter {
                    sink_name: name.clone(),
                    writer,
                    error_handler: error_handler.clone(),
                };
                let (writer, guard) = NonBlockingBuilder::default()
                    .lossy(false)
                    .thread_name(&format!("logbook-{}", name))
                    .finish(reporting_writer);
                SinkOutput::NonBlocking { writer, guard }
            }
        };
        Self { name, formatter: LineFormatter::default(), filter: None, output, error_handler }
    }

    pub fn with_formatter(mut self, formatter: LineFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_filter<F: RecordFilter + 'static>(mut self, filter: F) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts(&self, record: &LogRecord) -> bool {
        match &self.filter {
            Some(filter) => filter.accept(record),
            None => true,
        }
    }

    /// Formats and writes the record.
    /// Failures are sent to the error handler; they never reach the caller.
    pub fn write(&self, record: &LogRecord) {
        let mut line = self.formatter.format(record);
        line.push('\n');

        match &self.output {
            SinkOutput::Blocking(writer) => {
                let mut writer = match writer.lock() {
                    Ok(writer) => writer,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if let Err(err) = writer.write_all(line.as_bytes()).and_then(|_| writer.flush()) {
                    self.report(&err);
                }
            }
            SinkOutput::NonBlocking { writer, .. } => {
                let mut writer = writer.clone();
                if let Err(err) = writer.write_all(line.as_bytes()) {
                    self.report(&err);
                }
            }
        }
    }

    fn report(&self, err: &io::Error) {
        self.error_handler.handle(&write_error(&self.name, err));
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.name)
            .field("formatter", &self.formatter)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

fn write_error(sink_name: &str, err: &io::Error) -> LoggerError {
    LoggerError::LoggerWriteError {
        message: format!("Cannot write to the log sink [{}]. Err: {}", sink_name, err),
    }
}

/// Reports the failures of the wrapped writer.
/// The worker thread of the non-blocking output discards them otherwise.
struct ReportingWriter<W: Write> {
    sink_name: String,
    writer: W,
    error_handler: ErrorHandler,
}

impl<W: Write> Write for ReportingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf).map_err(|err| {
            self.error_handler.handle(&write_error(&self.sink_name, &err));
            err
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().map_err(|err| {
            self.error_handler.handle(&write_error(&self.sink_name, &err));
            err
        })
    }
}
