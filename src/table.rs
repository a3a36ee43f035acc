use crate::error::TableError;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// One row of the logger table: a timestamp and one reading per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    /// `currents[0]` is channel 1 (table column 1).
    pub currents: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    pub delimiter: char,
    /// Skip the first line of the file.
    pub header: bool,
    /// Read exactly this many data rows.
    pub rows: Option<usize>,
    /// Every row must have exactly this many columns, time included.
    pub columns: Option<usize>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            header: false,
            rows: None,
            columns: None,
        }
    }
}

/// Number of current channels in a loaded table.
pub fn channel_count(samples: &[Sample]) -> usize {
    samples.first().map_or(0, |s| s.currents.len())
}

pub fn load_table<P: AsRef<Path>>(path: P, options: &TableOptions) -> Result<Vec<Sample>, TableError> {
    let path = path.as_ref();
    info!("Loading current table from {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let samples = parse_table(&text, options)?;
    info!(
        "Loaded {} rows with {} channels",
        samples.len(),
        channel_count(&samples)
    );
    Ok(samples)
}

pub fn parse_table(text: &str, options: &TableOptions) -> Result<Vec<Sample>, TableError> {
    let mut samples = Vec::new();
    let mut width = options.columns;
    let mut ignored = 0usize;

    let lines = text
        .lines()
        .enumerate()
        .skip(if options.header { 1 } else { 0 })
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    for (line_no, line) in lines {
        if options.rows.is_some_and(|rows| samples.len() >= rows) {
            ignored += 1;
            continue;
        }

        let fields: Vec<&str> = line.split(options.delimiter).map(str::trim).collect();

        match width {
            Some(expected) if fields.len() != expected => {
                return Err(TableError::ColumnCount {
                    line: line_no,
                    expected,
                    found: fields.len(),
                });
            }
            Some(_) => {}
            None => {
                debug!("Table width taken from line {}: {} columns", line_no, fields.len());
                width = Some(fields.len());
            }
        }

        samples.push(parse_row(line_no, &fields)?);
    }

    if let Some(expected) = options.rows {
        if samples.len() < expected {
            return Err(TableError::RowCount {
                expected,
                found: samples.len(),
            });
        }
        if ignored > 0 {
            warn!("Ignoring {} rows past the expected {}", ignored, expected);
        }
    }

    Ok(samples)
}

fn parse_row(line: usize, fields: &[&str]) -> Result<Sample, TableError> {
    let (time, currents) = match fields.split_first() {
        Some((time, currents)) if !currents.is_empty() => (time, currents),
        _ => return Err(TableError::TooNarrow { line }),
    };

    // Time is logged as a number and read back as whole seconds.
    let timestamp = parse_number(line, 0, time)?.trunc() as i64;
    let currents = currents
        .iter()
        .enumerate()
        .map(|(i, field)| parse_number(line, i + 1, field))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Sample { timestamp, currents })
}

fn parse_number(line: usize, column: usize, field: &str) -> Result<f64, TableError> {
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TableError::Parse {
            line,
            column,
            value: field.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let text = "0,0.5,1.5\n1,2.0,0.0\r\n2,9.25,3\n";
        let samples = parse_table(text, &TableOptions::default()).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(channel_count(&samples), 2);
        assert_eq!(
            samples[2],
            Sample {
                timestamp: 2,
                currents: vec![9.25, 3.0],
            }
        );
    }

    #[test]
    fn test_timestamp_truncated() {
        let samples = parse_table("4.0,1.0\n5.9,1.0\n", &TableOptions::default()).unwrap();
        assert_eq!(samples[0].timestamp, 4);
        assert_eq!(samples[1].timestamp, 5);
    }

    #[test]
    fn test_header_and_blank_lines_skipped() {
        let text = "time,m1\n\n1,2.0\n   \n2,0.0\n";
        let options = TableOptions {
            header: true,
            ..Default::default()
        };
        let samples = parse_table(text, &options).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, 1);
    }

    #[test]
    fn test_custom_delimiter() {
        let options = TableOptions {
            delimiter: '\t',
            ..Default::default()
        };
        let samples = parse_table("1\t2.5\t0.0\n", &options).unwrap();
        assert_eq!(samples[0].currents, vec![2.5, 0.0]);
    }

    #[test]
    fn test_malformed_number() {
        let err = parse_table("0,1.0\n1,abc\n", &TableOptions::default()).unwrap_err();
        match err {
            TableError::Parse { line, column, value } => {
                assert_eq!((line, column), (2, 1));
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_table("0,NaN\n", &TableOptions::default()).is_err());
        assert!(parse_table("x,1.0\n", &TableOptions::default()).is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = parse_table("0,1.0,2.0\n1,1.0\n", &TableOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            TableError::ColumnCount {
                line: 2,
                expected: 3,
                found: 2,
            }
        ));
    }

    #[test]
    fn test_expected_columns() {
        let options = TableOptions {
            columns: Some(8),
            ..Default::default()
        };
        let err = parse_table("0,1.0,2.0\n", &options).unwrap_err();
        assert!(matches!(err, TableError::ColumnCount { expected: 8, found: 3, .. }));
    }

    #[test]
    fn test_time_only_row_rejected() {
        let err = parse_table("0\n1\n", &TableOptions::default()).unwrap_err();
        assert!(matches!(err, TableError::TooNarrow { line: 1 }));
    }

    #[test]
    fn test_expected_rows() {
        let text = "0,1.0\n1,2.0\n2,3.0\n";
        let options = TableOptions {
            rows: Some(2),
            ..Default::default()
        };
        let samples = parse_table(text, &options).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].timestamp, 1);

        let options = TableOptions {
            rows: Some(5),
            ..Default::default()
        };
        let err = parse_table(text, &options).unwrap_err();
        assert!(matches!(err, TableError::RowCount { expected: 5, found: 3 }));
    }

    #[test]
    fn test_rows_past_expected_not_parsed() {
        let options = TableOptions {
            rows: Some(1),
            ..Default::default()
        };
        let samples = parse_table("0,1.0\ngarbage\n", &options).unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_empty_table() {
        let samples = parse_table("", &TableOptions::default()).unwrap();
        assert!(samples.is_empty());
        assert_eq!(channel_count(&samples), 0);
    }

    #[test]
    fn test_missing_file() {
        let err = load_table("/nonexistent/motorlog/Logger.csv", &TableOptions::default()).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
        assert!(err.to_string().contains("Logger.csv"));
    }
}
