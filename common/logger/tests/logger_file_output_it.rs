use log::{debug, warn};
use logbook_common_logger::appender::file::never_rotated;
use logbook_common_logger::appender::{Sink, WriteMode};
use logbook_common_logger::{setup_logger, ErrorHandler, Level, Logger, TracingConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[test]
fn should_setup_logger_with_env_filter() -> Result<(), std::io::Error> {
    let tempdir = tempfile::tempdir().unwrap();
    let log_filename = format!(
        "{}/filename_{}.log",
        tempdir.path().to_str().unwrap().to_owned(),
        rand::random::<u64>()
    );
    let logger = Logger::new("general", Level::Trace).with_sink(Sink::new(
        "file",
        never_rotated(&log_filename).unwrap(),
        WriteMode::Blocking,
        ErrorHandler::default(),
    ));
    let config = TracingConfig {
        stdout_output: true,
        level: "debug,logger_file_output_it=info".to_owned(),
    };

    let _guard = setup_logger(&config, Arc::new(logger)).unwrap();

    debug!("main - this is debug");
    info!("main - this is info");
    warn!("main - this is warn");

    let path = Path::new(&log_filename);
    assert!(path.exists());

    let log_content = std::fs::read_to_string(path).unwrap();
    assert!(log_content.contains(" info: main - this is info"));
    assert!(log_content.contains(" warn: main - this is warn"));
    assert!(!log_content.contains("main - this is debug"));

    Ok(())
}
