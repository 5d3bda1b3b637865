//! Logger CSV parser
//!
//! The expected layout is a header row followed by one row per sample:
//!
//! ```text
//! Date,Time,FT1_Flow,LT1_Level,Pump_On
//! 03-10-2024,17:00:00,4.02,1.21,True
//! 03-10-2024,17:00:01,3.98,1.21,True
//! ```
//!
//! `Date` and `Time` are kept as text. Every other column becomes a channel if
//! all of its non-empty cells are numbers or booleans (`True`/`False` map to
//! 1.0/0.0). Empty cells become NaN. Columns holding anything else are dropped.

use crate::types::{AlignerError, Result, SampleSeries, Stamp};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Header of the date column
pub const DATE_COLUMN: &str = "Date";
/// Header of the time column
pub const TIME_COLUMN: &str = "Time";

/// Read a logger CSV file into a sample series
pub fn read_sample_csv(path: &Path) -> Result<SampleSeries> {
    log::info!("Reading sample CSV: {:?}", path);

    let file = File::open(path)?;
    let series = parse_sample_csv(BufReader::new(file))?;

    log::info!(
        "Loaded {} samples across {} channels from {:?}",
        series.len(),
        series.channels().len(),
        path
    );
    Ok(series)
}

/// Parse logger CSV text from any buffered reader
pub fn parse_sample_csv<R: BufRead>(reader: R) -> Result<SampleSeries> {
    let mut lines = reader.lines().enumerate();

    let header: Vec<String> = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break split_row(&line).map(str::to_string).collect();
                }
            }
            None => {
                return Err(AlignerError::CsvError {
                    line: 1,
                    reason: "missing header row".to_string(),
                })
            }
        }
    };

    let date_idx = column_index(&header, DATE_COLUMN)?;
    let time_idx = column_index(&header, TIME_COLUMN)?;

    let mut stamps = Vec::new();
    let mut columns: Vec<Column> = header
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != date_idx && *idx != time_idx)
        .map(|(idx, name)| Column::new(idx, name))
        .collect();

    for (idx, line) in lines {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = split_row(&line).collect();
        if fields.len() != header.len() {
            return Err(AlignerError::CsvError {
                line: line_no,
                reason: format!("expected {} fields, found {}", header.len(), fields.len()),
            });
        }

        stamps.push(Stamp::new(fields[date_idx], fields[time_idx]));
        for column in columns.iter_mut() {
            let cell = fields[column.index];
            column.push(cell, line_no);
        }
    }

    let mut series = SampleSeries::new(stamps);
    for column in columns {
        match column.rejected_at {
            Some(line) => log::warn!(
                "Dropping non-numeric column '{}' (first offending value on line {})",
                column.name,
                line
            ),
            None => series.add_channel(column.name, column.values)?,
        }
    }
    Ok(series)
}

/// Accumulates one candidate channel
struct Column {
    index: usize,
    name: String,
    values: Vec<f64>,
    rejected_at: Option<usize>,
}

impl Column {
    fn new(index: usize, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            values: Vec::new(),
            rejected_at: None,
        }
    }

    fn push(&mut self, cell: &str, line_no: usize) {
        if self.rejected_at.is_some() {
            return;
        }
        match parse_cell(cell) {
            Some(value) => self.values.push(value),
            None => {
                self.rejected_at = Some(line_no);
                self.values.clear();
            }
        }
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    if cell.eq_ignore_ascii_case("true") {
        return Some(1.0);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Some(0.0);
    }
    cell.parse().ok()
}

fn split_row(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(|f| f.trim().trim_matches('"'))
}

fn column_index(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| AlignerError::CsvError {
            line: 1,
            reason: format!("missing required column '{}'", name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
Date,Time,FT1_Flow,LT1_Level,Pump_On,Status
03-10-2024,17:00:00,4.02,1.21,True,ok
03-10-2024,17:00:01,,1.22,False,ok
03-10-2024,17:00:02,1.98,1.20,true,fault
";

    #[test]
    fn test_parse_sample_csv() {
        let series = parse_sample_csv(Cursor::new(SAMPLE)).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.stamps()[1], Stamp::new("03-10-2024", "17:00:01"));
        assert_eq!(
            series.channel_names().collect::<Vec<_>>(),
            vec!["FT1_Flow", "LT1_Level", "Pump_On"]
        );
        assert_eq!(series.channel("LT1_Level"), Some(&[1.21, 1.22, 1.20][..]));
        assert_eq!(series.channel("Pump_On"), Some(&[1.0, 0.0, 1.0][..]));

        let flow = series.channel("FT1_Flow").unwrap();
        assert_eq!(flow[0], 4.02);
        assert!(flow[1].is_nan());
        assert!(series.channel("Status").is_none());
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let text = "FT1_Flow,Time,Date\n2.0,17:00:00,03-10-2024\n";
        let series = parse_sample_csv(Cursor::new(text)).unwrap();
        assert_eq!(series.stamps()[0], Stamp::new("03-10-2024", "17:00:00"));
        assert_eq!(series.channel("FT1_Flow"), Some(&[2.0][..]));
    }

    #[test]
    fn test_missing_time_column() {
        let text = "Date,FT1_Flow\n03-10-2024,2.0\n";
        assert!(matches!(
            parse_sample_csv(Cursor::new(text)),
            Err(AlignerError::CsvError { line: 1, .. })
        ));
    }

    #[test]
    fn test_ragged_row_reports_line() {
        let text = "Date,Time,FT1_Flow\n03-10-2024,17:00:00,2.0\n03-10-2024,17:00:01\n";
        assert!(matches!(
            parse_sample_csv(Cursor::new(text)),
            Err(AlignerError::CsvError { line: 3, .. })
        ));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let text = "\nDate,Time,FT1_Flow\n03-10-2024,17:00:00,2.0\n\n03-10-2024,17:00:01,2.5\n";
        let series = parse_sample_csv(Cursor::new(text)).unwrap();
        assert_eq!(series.channel("FT1_Flow"), Some(&[2.0, 2.5][..]));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_sample_csv(Cursor::new("")).is_err());
    }
}
