use config_rs::{Config, ConfigError, File};
use log::*;
use logbook_common_logger::{LoggerConfig, SinkConfig, TracingConfig};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "logbook.toml";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// The configuration of all the named loggers.
/// The default value is the standard layout of the application logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The folder of the log files; relative file paths are resolved against it.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_fatal")]
    pub fatal: LoggerConfig,

    /// Receives the panics once the panic hook is installed.
    #[serde(default = "default_exception")]
    pub exception: LoggerConfig,

    /// Receives the failures of the background work that nobody awaits.
    #[serde(default = "default_rejection")]
    pub rejection: LoggerConfig,

    #[serde(default = "default_general")]
    pub general: LoggerConfig,

    #[serde(default = "default_request_response")]
    pub request_response: LoggerConfig,

    #[serde(default = "default_login")]
    pub login: LoggerConfig,

    /// If present, the `tracing` and `log` events of the process are forwarded to the
    /// general logger.
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            fatal: default_fatal(),
            exception: default_exception(),
            rejection: default_rejection(),
            general: default_general(),
            request_response: default_request_response(),
            login: default_login(),
            tracing: None,
        }
    }
}

fn default_log_dir() -> String {
    DEFAULT_LOG_DIR.to_owned()
}

fn file(path: &str, filter: Option<&str>, include_stack: bool) -> SinkConfig {
    SinkConfig::File {
        path: path.to_owned(),
        filter: filter.map(|filter| filter.to_owned()),
        include_stack,
    }
}

fn rolling_file(prefix: &str, frequency: Option<&str>) -> SinkConfig {
    SinkConfig::RollingFile {
        prefix: prefix.to_owned(),
        max_files: "30d".to_owned(),
        frequency: frequency.map(|frequency| frequency.to_owned()),
        max_size: Some("20m".to_owned()),
        filter: None,
        include_stack: false,
    }
}

fn default_fatal() -> LoggerConfig {
    LoggerConfig {
        level: "error".to_owned(),
        non_blocking: true,
        sinks: vec![file("fatal.log", None, true)],
    }
}

fn default_exception() -> LoggerConfig {
    LoggerConfig {
        level: "error".to_owned(),
        non_blocking: false,
        sinks: vec![file("exception.log", None, true)],
    }
}

fn default_rejection() -> LoggerConfig {
    LoggerConfig {
        level: "error".to_owned(),
        non_blocking: false,
        sinks: vec![file("rejection.log", None, true)],
    }
}

fn default_general() -> LoggerConfig {
    LoggerConfig {
        level: "debug".to_owned(),
        non_blocking: true,
        sinks: vec![
            file("error.log", Some("error"), true),
            file("info.log", Some("info"), false),
            file("null.log", Some("debug"), false),
        ],
    }
}

fn default_request_response() -> LoggerConfig {
    LoggerConfig {
        level: "info".to_owned(),
        non_blocking: true,
        sinks: vec![rolling_file("resreq", Some("30m"))],
    }
}

fn default_login() -> LoggerConfig {
    LoggerConfig {
        level: "info".to_owned(),
        non_blocking: true,
        sinks: vec![rolling_file("login", None)],
    }
}

/// Reads the `logbook.toml` file from the `config_dir` folder.
/// The loggers missing from the file keep their default configuration.
pub fn build_config(config_dir: &str) -> Result<RegistryConfig, ConfigError> {
    let config_file_path = format!("{}/{}", config_dir, CONFIG_FILE_NAME);
    info!("Loading the logger configuration from file: [{}]", config_file_path);
    let mut s = Config::new();
    s.merge(File::with_name(&config_file_path))?;
    s.try_into()
}
