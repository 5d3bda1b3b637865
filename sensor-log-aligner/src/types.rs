//! Core types for the sensor log aligner library
//!
//! This module defines the data model shared by every stage of the pipeline:
//! raw date/time stamps, the multi-channel sample series, the numeric timeline
//! derived from it, and the event records read from or written to the event log.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for aligner operations
pub type Result<T> = std::result::Result<T, AlignerError>;

/// Errors that can occur while parsing, detecting or aligning
#[derive(Debug, thiserror::Error)]
pub enum AlignerError {
    #[error("Failed to parse timestamp '{input}': {reason}")]
    ParseError { input: String, reason: String },

    #[error("Malformed event log line {line}: {reason}")]
    FormatError { line: usize, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Malformed CSV line {line}: {reason}")]
    CsvError { line: usize, reason: String },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A raw acquisition instant as recorded by the logger
///
/// `date` is `DD-MM-YYYY` and `time` is `HH:MM:SS`. The pair is kept as text
/// so detections can be written back to the event log verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub date: String,
    pub time: String,
}

impl Stamp {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    /// Parse the `"HH:MM:SS DD-MM-YYYY"` form used on the command line and in
    /// plot annotations.
    pub fn parse_time_date(text: &str) -> Result<Self> {
        let mut parts = text.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(time), Some(date), None) => Ok(Self::new(date, time)),
            _ => Err(AlignerError::ParseError {
                input: text.to_string(),
                reason: "expected \"HH:MM:SS DD-MM-YYYY\"".to_string(),
            }),
        }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time, self.date)
    }
}

/// One named measurement channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub name: String,
    pub values: Vec<f64>,
}

/// Multi-channel samples sharing a single acquisition axis
///
/// Index `i` in every channel refers to `stamps[i]`. Channels keep their
/// insertion order, which is the column order of the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    stamps: Vec<Stamp>,
    channels: Vec<Channel>,
}

impl SampleSeries {
    /// Create an empty series over the given acquisition instants
    pub fn new(stamps: Vec<Stamp>) -> Self {
        Self {
            stamps,
            channels: Vec::new(),
        }
    }

    /// Add a channel, enforcing equal length and unique names
    pub fn add_channel(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.stamps.len() {
            return Err(AlignerError::InvalidArgument(format!(
                "channel '{}' has {} samples, series has {}",
                name,
                values.len(),
                self.stamps.len()
            )));
        }
        if self.channel(&name).is_some() {
            return Err(AlignerError::InvalidArgument(format!(
                "duplicate channel '{}'",
                name
            )));
        }
        self.channels.push(Channel { name, values });
        Ok(())
    }

    /// Builder form of [`SampleSeries::add_channel`]
    pub fn with_channel(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.add_channel(name, values)?;
        Ok(self)
    }

    pub fn stamps(&self) -> &[Stamp] {
        &self.stamps
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`SampleSeries::channel`] but reports a missing channel as an error
    pub fn require_channel(&self, name: &str) -> Result<&[f64]> {
        self.channel(name)
            .ok_or_else(|| AlignerError::ChannelNotFound(name.to_string()))
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    /// Number of samples per channel
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

/// Elapsed seconds for each sample, paired with the stamp it came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub(crate) seconds: Vec<i64>,
    pub(crate) stamps: Vec<Stamp>,
}

impl Timeline {
    pub fn seconds(&self) -> &[i64] {
        &self.seconds
    }

    pub fn stamps(&self) -> &[Stamp] {
        &self.stamps
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }
}

/// A timeline position selected by the edge detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Sample index in the scanned signal
    pub index: usize,
    /// Elapsed seconds at that index
    pub elapsed: i64,
    /// Raw stamp at that index
    pub stamp: Stamp,
}

/// A single marker in the event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub time: String,
    pub date: String,
    /// Free-form annotation; empty for automatic detections
    #[serde(default)]
    pub label: String,
}

impl Event {
    pub fn new(time: impl Into<String>, date: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            date: date.into(),
            label: label.into(),
        }
    }
}

impl From<TimelineEntry> for Event {
    fn from(entry: TimelineEntry) -> Self {
        Self {
            time: entry.stamp.time,
            date: entry.stamp.date,
            label: String::new(),
        }
    }
}

/// Events in detection/insertion order (not necessarily chronological)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn times(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.time.as_str())
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.date.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<Event> for EventList {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Event>> for EventList {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a EventList {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Inclusive time range requested for a plot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Stamp,
    pub end: Stamp,
}

impl Window {
    pub fn new(start: Stamp, end: Stamp) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_rejects_length_mismatch() {
        let mut series = SampleSeries::new(vec![Stamp::new("03-10-2024", "17:00:00")]);
        let err = series.add_channel("FT1_Flow", vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AlignerError::InvalidArgument(_)));
    }

    #[test]
    fn test_series_rejects_duplicate_channel() {
        let stamps = vec![Stamp::new("03-10-2024", "17:00:00")];
        let mut series = SampleSeries::new(stamps).with_channel("FT1_Flow", vec![1.0]).unwrap();
        assert!(series.add_channel("FT1_Flow", vec![2.0]).is_err());
        assert_eq!(series.channel("FT1_Flow"), Some(&[1.0][..]));
        assert!(matches!(
            series.require_channel("LT1_Level"),
            Err(AlignerError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_stamp_parse_time_date() {
        let stamp = Stamp::parse_time_date("17:30:00 03-10-2024").unwrap();
        assert_eq!(stamp, Stamp::new("03-10-2024", "17:30:00"));
        assert_eq!(stamp.to_string(), "17:30:00 03-10-2024");
        assert!(Stamp::parse_time_date("17:30:00").is_err());
        assert!(Stamp::parse_time_date("17:30:00 03-10-2024 extra").is_err());
    }

    #[test]
    fn test_event_list_columns_stay_paired() {
        let events: EventList = vec![
            Event::new("17:05:00", "03-10-2024", "valve closed"),
            Event::new("18:00:00", "04-10-2024", ""),
        ]
        .into();
        let pairs: Vec<_> = events.times().zip(events.dates()).collect();
        assert_eq!(
            pairs,
            vec![("17:05:00", "03-10-2024"), ("18:00:00", "04-10-2024")]
        );
        assert_eq!(events.labels().collect::<Vec<_>>(), vec!["valve closed", ""]);
    }
}
