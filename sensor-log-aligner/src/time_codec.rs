//! Conversion of logger date/time strings into elapsed seconds
//!
//! Both the sensor samples and the event log carry separate `DD-MM-YYYY` and
//! `HH:MM:SS` columns. Every stamp is mapped to a signed number of seconds
//! relative to one reference instant so the two sources share an axis.

use crate::types::{AlignerError, Result, Stamp, Timeline};
use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// Format of a joined `"date time"` string
pub const STAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Zero point of the elapsed-seconds axis
pub const REFERENCE_INSTANT: &str = "03-10-2024 17:00:00";

/// Maps naive local stamps to seconds since a fixed reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCodec {
    reference: NaiveDateTime,
}

impl Default for TimeCodec {
    fn default() -> Self {
        let reference = NaiveDate::from_ymd_opt(2024, 10, 3)
            .and_then(|d| d.and_hms_opt(17, 0, 0))
            .expect("reference instant is a valid date");
        Self { reference }
    }
}

impl TimeCodec {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self { reference }
    }

    /// Build a codec from a reference written as `"DD-MM-YYYY HH:MM:SS"`
    pub fn from_reference_str(reference: &str) -> Result<Self> {
        Ok(Self::new(parse_joined(reference)?))
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    /// Seconds between `date time` and the reference, truncated toward zero
    pub fn elapsed_seconds(&self, date: &str, time: &str) -> Result<i64> {
        let instant = parse_joined(&format!("{} {}", date, time))?;
        Ok((instant - self.reference).num_seconds())
    }

    /// Element-wise [`TimeCodec::elapsed_seconds`], pairing `dates[i]` with `times[i]`
    pub fn elapsed_seconds_batch<D, T>(&self, dates: &[D], times: &[T]) -> Result<Vec<i64>>
    where
        D: AsRef<str>,
        T: AsRef<str>,
    {
        if dates.len() != times.len() {
            return Err(AlignerError::InvalidArgument(format!(
                "{} dates but {} times",
                dates.len(),
                times.len()
            )));
        }
        dates
            .iter()
            .zip(times)
            .map(|(date, time)| self.elapsed_seconds(date.as_ref(), time.as_ref()))
            .collect()
    }

    pub fn stamp_seconds(&self, stamp: &Stamp) -> Result<i64> {
        self.elapsed_seconds(&stamp.date, &stamp.time)
    }

    /// Convert a full column of stamps into a [`Timeline`]
    pub fn timeline(&self, stamps: &[Stamp]) -> Result<Timeline> {
        let seconds = stamps
            .iter()
            .map(|s| self.stamp_seconds(s))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Built timeline of {} samples", seconds.len());
        Ok(Timeline {
            seconds,
            stamps: stamps.to_vec(),
        })
    }
}

fn parse_joined(text: &str) -> Result<NaiveDateTime> {
    let instant =
        NaiveDateTime::parse_from_str(text, STAMP_FORMAT).map_err(|e| AlignerError::ParseError {
            input: text.to_string(),
            reason: e.to_string(),
        })?;
    // chrono reads second 60 as a leap second, which would tie with the next minute
    if instant.nanosecond() >= 1_000_000_000 {
        return Err(AlignerError::ParseError {
            input: text.to_string(),
            reason: "second out of range".to_string(),
        });
    }
    Ok(instant)
}
