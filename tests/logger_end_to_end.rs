//! End-to-end tests of the record logger against a real directory.

use sd_logger::config::LoggerConfig;
use sd_logger::{HostVolume, LoggerError, LoggerOptions, RecordLogger};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

fn headers() -> Option<Vec<String>> {
    Some(vec!["date".to_string(), "value".to_string()])
}

#[test]
fn test_sensor_scenario() {
    let mount = tempdir().unwrap();
    let path = mount.path().join("sensor.csv");
    let mut logger =
        RecordLogger::new(HostVolume::new(), "sensor.csv", mount.path(), 3, headers()).unwrap();

    logger.write_buffered("2024-01-01;10").unwrap();
    logger.write_buffered("2024-01-01;20").unwrap();
    assert_eq!(read_lines(&path), ["date;value"]);

    logger.write_buffered("2024-01-01;30").unwrap();
    assert_eq!(
        read_lines(&path),
        ["date;value", "2024-01-01;10", "2024-01-01;20", "2024-01-01;30"]
    );

    logger.write_immediate("2024-01-01;99").unwrap();
    assert_eq!(logger.pending_len(), 0);
    assert_eq!(
        read_lines(&path),
        [
            "date;value",
            "2024-01-01;10",
            "2024-01-01;20",
            "2024-01-01;30",
            "2024-01-01;99"
        ]
    );
    logger.close().unwrap();
}

#[test]
fn test_close_appends_partial_buffer() {
    let mount = tempdir().unwrap();
    let path = mount.path().join("sensor.csv");
    let mut logger =
        RecordLogger::new(HostVolume::new(), "sensor.csv", mount.path(), 3, headers()).unwrap();

    logger.write_buffered("a;1").unwrap();
    logger.write_buffered("b;2").unwrap();
    assert_eq!(read_lines(&path), ["date;value"]);

    logger.close().unwrap();
    assert_eq!(read_lines(&path), ["date;value", "a;1", "b;2"]);

    logger.close().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "date;value\na;1\nb;2\n");
}

#[test]
fn test_second_logger_never_rewrites_header() {
    let mount = tempdir().unwrap();
    let path = mount.path().join("sensor.csv");

    let mut first =
        RecordLogger::new(HostVolume::new(), "sensor.csv", mount.path(), 2, headers()).unwrap();
    first.write_immediate("x;1").unwrap();
    first.close().unwrap();

    let other_headers = Some(vec!["time".to_string(), "reading".to_string()]);
    let mut second =
        RecordLogger::new(HostVolume::new(), "sensor.csv", mount.path(), 2, other_headers)
            .unwrap();
    second.write_immediate("x;2").unwrap();
    second.close().unwrap();

    assert_eq!(read_lines(&path), ["date;value", "x;1", "x;2"]);
}

#[test]
fn test_missing_mount_creates_nothing() {
    let root = tempdir().unwrap();
    let mount = root.path().join("sd");

    let err = RecordLogger::new(HostVolume::new(), "sensor.csv", &mount, 3, headers())
        .unwrap_err();
    assert!(matches!(err, LoggerError::MountNotFound { .. }));
    assert!(!mount.exists());
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn test_rejected_records_leave_file_untouched() {
    let mount = tempdir().unwrap();
    let path = mount.path().join("sensor.csv");
    let mut logger =
        RecordLogger::new(HostVolume::new(), "sensor.csv", mount.path(), 3, headers()).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    assert!(matches!(
        logger.write_buffered("a\nb"),
        Err(LoggerError::InvalidRecord { .. })
    ));
    assert!(matches!(
        logger.write_immediate("a\nb"),
        Err(LoggerError::InvalidRecord { .. })
    ));
    assert_eq!(logger.pending_len(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_mount_removed_mid_session_keeps_buffer() {
    let root = tempdir().unwrap();
    let mount = root.path().join("sd");
    fs::create_dir(&mount).unwrap();

    let mut logger =
        RecordLogger::new(HostVolume::without_sync(), "sensor.csv", &mount, 2, None).unwrap();
    logger.write_buffered("r1").unwrap();

    // Card pulled: the directory disappears under the logger
    fs::remove_dir_all(&mount).unwrap();
    let err = logger.write_buffered("r2").unwrap_err();
    assert!(matches!(err, LoggerError::Io(_)));
    assert_eq!(logger.pending(), ["r1", "r2"]);

    fs::create_dir(&mount).unwrap();
    logger.close().unwrap();
    assert_eq!(read_lines(&mount.join("sensor.csv")), ["r1", "r2"]);
}

#[test]
fn test_logger_from_config_file() {
    let mount = tempdir().unwrap();
    let mut config = LoggerConfig::default();
    config.storage.mount_point = mount.path().to_path_buf();
    config.storage.file_name = "climate.csv".to_string();
    config.storage.buffer_capacity = 2;
    config.storage.delimiter = ',';
    config.storage.header_columns = Some(vec!["date".to_string(), "temp".to_string()]);

    let config_dir = tempdir().unwrap();
    let config_path = config_dir.path().join("sd_logger.toml");
    fs::write(&config_path, toml::to_string(&config).unwrap()).unwrap();

    let loaded = LoggerConfig::load_validated(&config_path).unwrap();
    assert_eq!(loaded.storage, config.storage);

    let mut logger =
        RecordLogger::with_options(HostVolume::new(), loaded.storage.to_options()).unwrap();
    logger.write_buffered("2024-01-01,21.5").unwrap();
    logger.write_buffered("2024-01-02,22.0").unwrap();
    logger.close().unwrap();

    assert_eq!(
        read_lines(&mount.path().join("climate.csv")),
        ["date,temp", "2024-01-01,21.5", "2024-01-02,22.0"]
    );
}

#[test]
fn test_options_builder_matches_positional_constructor() {
    let mount = tempdir().unwrap();
    let options = LoggerOptions::new("a.csv", mount.path())
        .with_capacity(5)
        .with_headers(["date", "value"]);
    let logger = RecordLogger::with_options(HostVolume::new(), options).unwrap();

    assert_eq!(logger.capacity(), 5);
    assert_eq!(logger.delimiter(), ';');
    assert_eq!(
        logger.header_columns(),
        Some(&["date".to_string(), "value".to_string()][..])
    );
    assert_eq!(logger.target_path(), mount.path().join("a.csv"));
}
