//! Line framing for records and header columns.
//!
//! Records are caller-formatted strings. The logger never splits or escapes fields
//! inside a record; it only guarantees that one record occupies exactly one line.

use std::path::Path;

use crate::error::{LoggerError, LoggerResult};

const LINE_BREAKS: [char; 2] = ['\n', '\r'];

/// Reject records that would span more than one line in the log file.
pub fn validate_record(record: &str) -> LoggerResult<()> {
    if record.contains(LINE_BREAKS) {
        return Err(LoggerError::InvalidRecord {
            reason: "record cannot contain line breaks",
        });
    }
    Ok(())
}

/// Reject header columns that would break the header line or its column split.
pub fn validate_header(columns: &[String], delimiter: char) -> LoggerResult<()> {
    for column in columns {
        if column.contains(LINE_BREAKS) {
            return Err(LoggerError::InvalidHeader {
                column: column.clone(),
                reason: "column cannot contain line breaks",
            });
        }
        if column.contains(delimiter) {
            return Err(LoggerError::InvalidHeader {
                column: column.clone(),
                reason: "column cannot contain the field delimiter",
            });
        }
    }
    Ok(())
}

/// The delimiter joins header columns on one line, so it cannot itself end a line.
pub fn validate_delimiter(delimiter: char) -> LoggerResult<()> {
    if LINE_BREAKS.contains(&delimiter) {
        return Err(LoggerError::Configuration(
            "delimiter cannot be a line break".to_string(),
        ));
    }
    Ok(())
}

/// The log file must sit directly in the mount point: a bare name, no separators.
pub fn validate_file_name(file_name: &str) -> LoggerResult<()> {
    if file_name.is_empty() {
        return Err(LoggerError::Configuration(
            "file name cannot be empty".to_string(),
        ));
    }
    if file_name.contains(['/', '\\', '\0'])
        || Path::new(file_name).is_absolute()
        || matches!(file_name, "." | "..")
    {
        return Err(LoggerError::Configuration(format!(
            "invalid file name '{}': must be a bare name inside the mount point",
            file_name
        )));
    }
    Ok(())
}

/// Header columns joined by `delimiter`, newline-terminated.
pub fn header_line(columns: &[String], delimiter: char) -> String {
    let mut sep = [0u8; 4];
    let sep = delimiter.encode_utf8(&mut sep);
    let mut line = columns.join(sep);
    line.push('\n');
    line
}

/// Serialize a batch of pending records into one appendable block.
///
/// Every record ends with a newline, so consecutive blocks concatenate into
/// the same lines a single large block would have produced.
pub fn frame_block(records: &[String]) -> String {
    let len = records.iter().map(|r| r.len() + 1).sum();
    let mut block = String::with_capacity(len);
    for record in records {
        block.push_str(record);
        block.push('\n');
    }
    block
}

/// One record as a newline-terminated line.
pub fn frame_record(record: &str) -> String {
    let mut line = String::with_capacity(record.len() + 1);
    line.push_str(record);
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_record() {
        assert!(validate_record("2024-01-01;10").is_ok());
        assert!(validate_record("").is_ok());
        assert!(matches!(
            validate_record("a\nb"),
            Err(LoggerError::InvalidRecord { .. })
        ));
        assert!(matches!(
            validate_record("trailing\n"),
            Err(LoggerError::InvalidRecord { .. })
        ));
        assert!(validate_record("a\rb").is_err());
    }

    #[test]
    fn test_validate_header() {
        assert!(validate_header(&cols(&["date", "value"]), ';').is_ok());

        let err = validate_header(&cols(&["date", "va;lue"]), ';').unwrap_err();
        match err {
            LoggerError::InvalidHeader { column, .. } => assert_eq!(column, "va;lue"),
            other => panic!("unexpected error: {:?}", other),
        }

        // A comma is only a problem when it is the delimiter
        assert!(validate_header(&cols(&["a,b"]), ';').is_ok());
        assert!(validate_header(&cols(&["a,b"]), ',').is_err());
        assert!(validate_header(&cols(&["a\nb"]), ';').is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert!(validate_delimiter(';').is_ok());
        assert!(validate_delimiter('\t').is_ok());
        assert!(matches!(
            validate_delimiter('\n'),
            Err(LoggerError::Configuration(_))
        ));
        assert!(validate_delimiter('\r').is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("sensor.csv").is_ok());
        assert!(validate_file_name("LOG_0001.TXT").is_ok());

        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("/tmp/escaped.csv").is_err());
        assert!(validate_file_name("nested/log.csv").is_err());
        assert!(validate_file_name("..\\log.csv").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(matches!(
            validate_file_name("a\0b"),
            Err(LoggerError::Configuration(_))
        ));
    }

    #[test]
    fn test_header_line() {
        assert_eq!(header_line(&cols(&["date", "value"]), ';'), "date;value\n");
        assert_eq!(header_line(&cols(&["only"]), ';'), "only\n");
        assert_eq!(header_line(&cols(&["a", "b", "c"]), '\t'), "a\tb\tc\n");
    }

    #[test]
    fn test_frame_block() {
        let records = cols(&["r1", "r2", "r3"]);
        assert_eq!(frame_block(&records), "r1\nr2\nr3\n");
        assert_eq!(frame_block(&[]), "");
    }

    #[test]
    fn test_frame_record() {
        assert_eq!(frame_record("2024-01-01;99"), "2024-01-01;99\n");
    }
}
