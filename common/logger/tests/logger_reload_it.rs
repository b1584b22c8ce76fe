use log::{debug, warn};
use logbook_common_logger::appender::file::never_rotated;
use logbook_common_logger::appender::{Sink, WriteMode};
use logbook_common_logger::{setup_logger, ErrorHandler, Level, Logger, TracingConfig};
use std::sync::Arc;
use tracing::info;

mod inner {
    use super::*;

    #[tracing::instrument(fields(yak))]
    pub async fn log_smt(yak: u32) {
        debug!("inner - yak: {} - this is debug", yak);
        info!("inner - yak: {} - this is info", yak);
        warn!("inner - yak: {} - this is warn", yak);
    }
}

#[tokio::test]
async fn should_reload_the_env_filter() -> Result<(), std::io::Error> {
    let tempdir = tempfile::tempdir()?;
    let log_path = tempdir.path().join(format!("filename_{}.log", rand::random::<u64>()));
    let logger = Logger::new("general", Level::Trace).with_sink(Sink::new(
        "file",
        never_rotated(&log_path).unwrap(),
        WriteMode::Blocking,
        ErrorHandler::default(),
    ));
    let config = TracingConfig {
        stdout_output: false,
        level: "debug,logger_reload_it::inner=warn".to_owned(),
    };

    let guard = setup_logger(&config, Arc::new(logger)).unwrap();

    debug!("level debug - this is debug");
    info!("level debug - this is info");
    warn!("level debug - this is warn");
    inner::log_smt(11111).await;

    guard.reload("warn,logger_reload_it::inner=info").unwrap();

    debug!("level warn - this is debug");
    info!("level warn - this is info");
    warn!("level warn - this is warn");
    inner::log_smt(22222).await;

    assert!(guard.reload("warn,logger_reload_it::inner=superverbose").is_err());

    let log_content = std::fs::read_to_string(&log_path)?;
    assert!(log_content.contains("level debug - this is debug"));
    assert!(log_content.contains("level debug - this is info"));
    assert!(!log_content.contains("inner - yak: 11111 - this is info"));
    assert!(log_content.contains("inner - yak: 11111 - this is warn"));

    assert!(!log_content.contains("level warn - this is debug"));
    assert!(!log_content.contains("level warn - this is info"));
    assert!(log_content.contains("level warn - this is warn"));
    assert!(log_content.contains("inner - yak: 22222 - this is info"));
    assert!(!log_content.contains("inner - yak: 22222 - this is debug"));

    Ok(())
}
