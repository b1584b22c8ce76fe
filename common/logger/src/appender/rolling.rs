//! A file appender that rolls over to a new file when the rotation period changes
//! or when the current file reaches its maximum size.
//!
//! Files are named `<prefix>-<YYYY-MM-DD HH-mm>.log`, where the date is the start of the
//! rotation period. A size based rollover inside the same period adds a counter:
//! `<prefix>-<YYYY-MM-DD HH-mm>.<n>.log`.
//!
//! Every time a new file is opened, the old files of the same prefix are pruned according
//! to the [`Retention`] policy.
use crate::clock::{Clock, SystemClock};
use crate::{ErrorHandler, LoggerError};
use chrono::{Duration, NaiveDateTime, Timelike};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

pub const FILENAME_DATE_FORMAT: &str = "%Y-%m-%d %H-%M";
const LOG_FILE_EXTENSION: &str = ".log";
const MINUTES_PER_DAY: u32 = 24 * 60;
const MAX_RETENTION_DAYS: u32 = 1000 * 366;

/// How often a new file is started.
/// Periods are aligned to the local midnight, so a new day always starts a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    minutes: u32,
}

impl Rotation {
    pub const DAILY: Rotation = Rotation { minutes: MINUTES_PER_DAY };

    pub fn minutes(minutes: u32) -> Result<Self, LoggerError> {
        if minutes == 0 || minutes > MINUTES_PER_DAY {
            return Err(LoggerError::LoggerConfigurationError {
                message: format!(
                    "The rotation frequency must be between 1 minute and 1 day. Found: [{}]m",
                    minutes
                ),
            });
        }
        Ok(Rotation { minutes })
    }

    pub fn hours(hours: u32) -> Result<Self, LoggerError> {
        Rotation::minutes(hours.saturating_mul(60))
    }

    /// Returns the start of the rotation period that contains `now`.
    pub fn period_start(&self, now: NaiveDateTime) -> NaiveDateTime {
        let minute_of_day = now.hour() * 60 + now.minute();
        let start = minute_of_day / self.minutes * self.minutes;
        now.date().and_hms_opt(start / 60, start % 60, 0).unwrap_or(now)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::DAILY
    }
}

impl FromStr for Rotation {
    type Err = LoggerError;

    /// Accepts `daily`, `<N>m` and `<N>h`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if value == "daily" || value == "1d" {
            return Ok(Rotation::DAILY);
        }
        if let Some(minutes) = value.strip_suffix('m') {
            return Rotation::minutes(parse_number(minutes, s, "rotation frequency")?);
        }
        if let Some(hours) = value.strip_suffix('h') {
            return Rotation::hours(parse_number(hours, s, "rotation frequency")?);
        }
        Err(LoggerError::LoggerConfigurationError {
            message: format!(
                "Wrong rotation frequency: [{}]. Valid values are 'daily', '<N>m' and '<N>h'",
                s
            ),
        })
    }
}

/// Which of the rotated files are kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Deletes the files whose period started before `now - max_age`.
    MaxAge(Duration),
    /// Keeps only the newest files, the active one included.
    MaxFiles(usize),
}

impl FromStr for Retention {
    type Err = LoggerError;

    /// Accepts `<N>d` for an age based retention and `<N>` for a count based one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if let Some(days) = value.strip_suffix('d') {
            let days = parse_number(days, s, "retention")?;
            if days == 0 || days > MAX_RETENTION_DAYS {
                return Err(LoggerError::LoggerConfigurationError {
                    message: format!(
                        "The retention must be between 1 and {} days. Found: [{}]",
                        MAX_RETENTION_DAYS, s
                    ),
                });
            }
            return Ok(Retention::MaxAge(Duration::days(i64::from(days))));
        }
        match parse_number(&value, s, "retention")? {
            0 => Err(LoggerError::LoggerConfigurationError {
                message: format!("The retention must keep at least one file. Found: [{}]", s),
            }),
            max_files => Ok(Retention::MaxFiles(max_files as usize)),
        }
    }
}

/// Parses a size such as `20m`, `512k`, `1g` or a plain number of bytes.
pub fn parse_size(s: &str) -> Result<u64, LoggerError> {
    let value = s.trim().to_lowercase();
    let (number, multiplier) = match value.chars().last() {
        Some('k') => (&value[..value.len() - 1], 1024),
        Some('m') => (&value[..value.len() - 1], 1024 * 1024),
        Some('g') => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        _ => (value.as_str(), 1),
    };
    let size = parse_number(number, s, "file size")? as u64 * multiplier;
    if size == 0 {
        return Err(LoggerError::LoggerConfigurationError {
            message: format!("The max file size must be greater than zero. Found: [{}]", s),
        });
    }
    Ok(size)
}

fn parse_number(number: &str, original: &str, what: &str) -> Result<u32, LoggerError> {
    number.trim().parse::<u32>().map_err(|err| LoggerError::LoggerConfigurationError {
        message: format!("Wrong {}: [{}]. Err: {}", what, original, err),
    })
}

pub struct RollingFileAppenderBuilder {
    directory: PathBuf,
    prefix: String,
    rotation: Rotation,
    max_size: Option<u64>,
    retention: Option<Retention>,
    clock: Arc<dyn Clock>,
    error_handler: ErrorHandler,
}

impl RollingFileAppenderBuilder {
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn retention(mut self, retention: Retention) -> Self {
        self.retention = Some(retention);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Receives the errors raised while pruning old files.
    pub fn error_handler(mut self, error_handler: ErrorHandler) -> Self {
        self.error_handler = error_handler;
        self
    }

    pub fn build(self) -> Result<RollingFileAppender, LoggerError> {
        if self.prefix.is_empty() || self.prefix.contains('/') || self.prefix.contains('\\') {
            return Err(LoggerError::LoggerConfigurationError {
                message: format!("Wrong rolling file prefix: [{}]", self.prefix),
            });
        }
        fs::create_dir_all(&self.directory).map_err(|err| LoggerError::LoggerConfigurationError {
            message: format!(
                "Cannot create the log folder [{}]. Err: {}",
                self.directory.display(),
                err
            ),
        })?;
        Ok(RollingFileAppender {
            directory: self.directory,
            prefix: self.prefix,
            rotation: self.rotation,
            max_size: self.max_size,
            retention: self.retention,
            clock: self.clock,
            error_handler: self.error_handler,
            current: None,
        })
    }
}

struct ActiveFile {
    file: File,
    period_start: NaiveDateTime,
    index: u32,
    size: u64,
}

pub struct RollingFileAppender {
    directory: PathBuf,
    prefix: String,
    rotation: Rotation,
    max_size: Option<u64>,
    retention: Option<Retention>,
    clock: Arc<dyn Clock>,
    error_handler: ErrorHandler,
    current: Option<ActiveFile>,
}

impl RollingFileAppender {
    pub fn builder<P: AsRef<Path>, S: Into<String>>(
        directory: P,
        prefix: S,
    ) -> RollingFileAppenderBuilder {
        RollingFileAppenderBuilder {
            directory: directory.as_ref().to_path_buf(),
            prefix: prefix.into(),
            rotation: Rotation::default(),
            max_size: None,
            retention: None,
            clock: Arc::new(SystemClock),
            error_handler: ErrorHandler::default(),
        }
    }

    /// The path of the file currently receiving writes, if any was opened.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current.as_ref().map(|current| {
            self.directory.join(self.file_name(current.period_start, current.index))
        })
    }

    fn file_name(&self, period_start: NaiveDateTime, index: u32) -> String {
        let date = period_start.format(FILENAME_DATE_FORMAT);
        if index == 0 {
            format!("{}-{}{}", self.prefix, date, LOG_FILE_EXTENSION)
        } else {
            format!("{}-{}.{}{}", self.prefix, date, index, LOG_FILE_EXTENSION)
        }
    }

    fn parse_file_name(&self, file_name: &str) -> Option<(NaiveDateTime, u32)> {
        let stem = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')?
            .strip_suffix(LOG_FILE_EXTENSION)?;
        let (date, index) = match stem.rsplit_once('.') {
            Some((date, index)) => (date, index.parse::<u32>().ok()?),
            None => (stem, 0),
        };
        let date = NaiveDateTime::parse_from_str(date, FILENAME_DATE_FORMAT).ok()?;
        Some((date, index))
    }

    fn should_rollover(&self, now: NaiveDateTime, len: usize) -> bool {
        match &self.current {
            None => true,
            Some(current) => {
                current.period_start != self.rotation.period_start(now)
                    || self
                        .max_size
                        .map(|max_size| current.size > 0 && current.size + len as u64 > max_size)
                        .unwrap_or(false)
            }
        }
    }

    fn rollover(&mut self, now: NaiveDateTime) -> io::Result<()> {
        let period_start = self.rotation.period_start(now);
        let mut index = match &self.current {
            Some(current) if current.period_start == period_start => current.index + 1,
            _ => 0,
        };

        fs::create_dir_all(&self.directory)?;

        loop {
            let path = self.directory.join(self.file_name(period_start, index));
            let size = fs::metadata(&path).map(|metadata| metadata.len()).unwrap_or(0);
            if let Some(max_size) = self.max_size {
                if size >= max_size {
                    index += 1;
                    continue;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            self.current = Some(ActiveFile { file, period_start, index, size });
            break;
        }

        self.prune(now);
        Ok(())
    }

    fn prune(&self, now: NaiveDateTime) {
        let retention = match self.retention {
            Some(retention) => retention,
            None => return,
        };

        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(err) => {
                self.error_handler.handle(&LoggerError::LoggerWriteError {
                    message: format!(
                        "Cannot read the log folder [{}] to prune old files. Err: {}",
                        self.directory.display(),
                        err
                    ),
                });
                return;
            }
        };

        let active_path = self.current_path();
        let mut files: Vec<(NaiveDateTime, u32, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let (date, index) = self.parse_file_name(file_name.to_str()?)?;
                Some((date, index, entry.path()))
            })
            .collect();
        files.sort();

        let expired: Vec<&PathBuf> = match retention {
            Retention::MaxAge(max_age) => match now.checked_sub_signed(max_age) {
                Some(oldest_allowed) => files
                    .iter()
                    .filter(|(date, _, _)| *date < oldest_allowed)
                    .map(|(_, _, path)| path)
                    .collect(),
                None => {
                    self.error_handler.handle(&LoggerError::LoggerWriteError {
                        message: format!(
                            "Cannot prune the old files of [{}]. Retention out of range: {} days",
                            self.prefix,
                            max_age.num_days()
                        ),
                    });
                    return;
                }
            },
            Retention::MaxFiles(max_files) => {
                let exceeding = files.len().saturating_sub(max_files);
                files.iter().take(exceeding).map(|(_, _, path)| path).collect()
            }
        };

        for path in expired {
            if active_path.as_ref() == Some(path) {
                continue;
            }
            if let Err(err) = fs::remove_file(path) {
                self.error_handler.handle(&LoggerError::LoggerWriteError {
                    message: format!(
                        "Cannot delete the old log file [{}]. Err: {}",
                        path.display(),
                        err
                    ),
                });
            }
        }
    }
}

impl Write for RollingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let now = self.clock.now().naive_local();
        if self.should_rollover(now, buf.len()) {
            self.rollover(now)?;
        }
        match self.current.as_mut() {
            Some(current) => {
                current.file.write_all(buf)?;
                current.size += buf.len() as u64;
                Ok(buf.len())
            }
            None => Err(io::Error::new(io::ErrorKind::Other, "No log file is open")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.current.as_mut() {
            Some(current) => current.file.flush(),
            None => Ok(()),
        }
    }
}
