//! Line-oriented event log persistence
//!
//! The log has no header and one event per line:
//!
//! ```text
//! 17:05:00,03-10-2024,
//! 18:00:00,03-10-2024,valve closed
//! ```
//!
//! Saving writes `time,date,` and never a label; the trailing comma is kept so
//! existing logs stay byte-compatible. Loading reads an optional third field as
//! the label, which is how hand-curated annotations get into a plot. The two
//! functions are therefore not inverses: a saved list loads back with empty
//! labels.

use crate::types::{AlignerError, Event, EventList, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Default event log file name
pub const DEFAULT_EVENT_LOG: &str = "logging.txt";

/// Write events to `path`, replacing any previous contents
pub fn save<'a, I>(events: I, path: &Path) -> Result<()>
where
    I: IntoIterator<Item = &'a Event>,
{
    log::info!("Writing event log: {:?}", path);

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let count = write_events(events, &mut writer)?;
    writer.flush()?;

    log::info!("Wrote {} events to {:?}", count, path);
    Ok(())
}

/// Read an event log from `path`
pub fn load(path: &Path) -> Result<EventList> {
    log::info!("Reading event log: {:?}", path);

    let file = File::open(path)?;
    let events = read_events(BufReader::new(file))?;

    log::info!("Read {} events from {:?}", events.len(), path);
    Ok(events)
}

/// Serialize events as `time,date,` lines, returning how many were written
pub fn write_events<'a, I, W>(events: I, writer: &mut W) -> Result<usize>
where
    I: IntoIterator<Item = &'a Event>,
    W: Write,
{
    let mut count = 0;
    for event in events {
        writeln!(writer, "{},{},", event.time, event.date)?;
        count += 1;
    }
    Ok(count)
}

/// Parse event log lines
///
/// Each line must contain at least `time,date`. Anything after the second comma
/// is the label; a missing or blank label becomes an empty string.
pub fn read_events<R: BufRead>(reader: R) -> Result<EventList> {
    let mut events = EventList::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        events.push(parse_line(line.trim_end(), line_no)?);
    }

    Ok(events)
}

fn parse_line(line: &str, line_no: usize) -> Result<Event> {
    let mut fields = line.splitn(3, ',');
    let time = fields.next().unwrap_or_default().trim();
    let date = match fields.next() {
        Some(date) => date.trim(),
        None => {
            return Err(AlignerError::FormatError {
                line: line_no,
                reason: format!("expected \"time,date,\" but found {:?}", line),
            })
        }
    };
    if time.is_empty() || date.is_empty() {
        return Err(AlignerError::FormatError {
            line: line_no,
            reason: format!("empty time or date field in {:?}", line),
        });
    }
    let label = fields.next().unwrap_or_default().trim();

    Ok(Event::new(time, date, label))
}
