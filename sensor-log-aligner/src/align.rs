//! Window alignment of sensor samples and event markers
//!
//! Samples and events come from two different logs with two different clocks
//! written as text. Both are converted through the same [`TimeCodec`], masked
//! against one inclusive window and re-expressed in hours from the window start,
//! which is the x axis every plot panel shares.

use crate::time_codec::TimeCodec;
use crate::types::{
    AlignerError, Channel, Event, EventList, Result, SampleSeries, Timeline, Window,
};
use serde::Serialize;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Samples and events restricted to one window
///
/// All filtered vectors are positionally consistent with the masks they were
/// selected by: `hours[k]` belongs to the k-th `true` entry of `sample_mask`,
/// and `event_hours[k]` / `events[k]` to the k-th `true` entry of `event_mask`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedView {
    /// Elapsed seconds of the window start
    pub start_seconds: i64,
    /// Elapsed seconds of the window end
    pub end_seconds: i64,
    pub sample_mask: Vec<bool>,
    pub event_mask: Vec<bool>,
    /// Hours from the window start for each selected sample
    pub hours: Vec<f64>,
    /// Selected values per channel, in series order
    pub channels: Vec<Channel>,
    /// Hours from the window start for each selected event
    pub event_hours: Vec<f64>,
    pub events: Vec<Event>,
}

impl AlignedView {
    fn empty(
        start_seconds: i64,
        end_seconds: i64,
        samples: usize,
        events: usize,
        series: &SampleSeries,
    ) -> Self {
        Self {
            start_seconds,
            end_seconds,
            sample_mask: vec![false; samples],
            event_mask: vec![false; events],
            hours: Vec::new(),
            channels: series
                .channels()
                .iter()
                .map(|c| Channel {
                    name: c.name.clone(),
                    values: Vec::new(),
                })
                .collect(),
            event_hours: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Width of the window in hours; zero for an inverted window
    pub fn span_hours(&self) -> f64 {
        (self.end_seconds - self.start_seconds).max(0) as f64 / SECONDS_PER_HOUR
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn sample_count(&self) -> usize {
        self.hours.len()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Computes [`AlignedView`]s for requested windows
#[derive(Debug, Clone, Copy, Default)]
pub struct Aligner {
    codec: TimeCodec,
}

impl Aligner {
    pub fn new(codec: TimeCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TimeCodec {
        &self.codec
    }

    /// Elapsed-second bounds of a window
    ///
    /// A bound that does not parse is reported as [`AlignerError::InvalidWindow`].
    pub fn window_bounds(&self, window: &Window) -> Result<(i64, i64)> {
        let bound = |stamp| {
            self.codec
                .stamp_seconds(stamp)
                .map_err(|e| AlignerError::InvalidWindow(e.to_string()))
        };
        Ok((bound(&window.start)?, bound(&window.end)?))
    }

    /// Restrict the series and the event list to `window`
    ///
    /// An inverted window is not an error: it yields a view with all-false
    /// masks and nothing selected. Malformed event stamps are an error.
    pub fn align(
        &self,
        timeline: &Timeline,
        series: &SampleSeries,
        events: &EventList,
        window: &Window,
    ) -> Result<AlignedView> {
        if timeline.len() != series.len() {
            return Err(AlignerError::InvalidArgument(format!(
                "timeline has {} samples but series has {}",
                timeline.len(),
                series.len()
            )));
        }

        let (start, end) = self.window_bounds(window)?;
        let event_dates: Vec<&str> = events.dates().collect();
        let event_times: Vec<&str> = events.times().collect();
        let event_seconds = self.codec.elapsed_seconds_batch(&event_dates, &event_times)?;

        if end < start {
            log::warn!(
                "Window {} -> {} ends before it starts; nothing to align",
                window.start,
                window.end
            );
            return Ok(AlignedView::empty(start, end, timeline.len(), events.len(), series));
        }

        let within = |t: i64| start <= t && t <= end;
        let to_hours = |t: i64| (t - start) as f64 / SECONDS_PER_HOUR;

        let sample_mask: Vec<bool> = timeline.seconds().iter().map(|&t| within(t)).collect();
        let event_mask: Vec<bool> = event_seconds.iter().map(|&t| within(t)).collect();

        let hours = select(timeline.seconds(), &sample_mask)
            .map(|&t| to_hours(t))
            .collect();
        let channels = series
            .channels()
            .iter()
            .map(|c| Channel {
                name: c.name.clone(),
                values: select(&c.values, &sample_mask).copied().collect(),
            })
            .collect();
        let event_hours = select(&event_seconds, &event_mask)
            .map(|&t| to_hours(t))
            .collect();
        let selected_events: Vec<Event> = select(events.as_slice(), &event_mask).cloned().collect();

        let view = AlignedView {
            start_seconds: start,
            end_seconds: end,
            sample_mask,
            event_mask,
            hours,
            channels,
            event_hours,
            events: selected_events,
        };
        log::debug!(
            "Aligned window [{}, {}]: {} of {} samples, {} of {} events",
            start,
            end,
            view.sample_count(),
            timeline.len(),
            view.events.len(),
            events.len()
        );
        Ok(view)
    }
}

fn select<'a, T>(items: &'a [T], mask: &'a [bool]) -> impl Iterator<Item = &'a T> + 'a {
    items
        .iter()
        .zip(mask)
        .filter_map(|(item, &keep)| keep.then_some(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stamp;

    fn stamp(time: &str) -> Stamp {
        Stamp::new("03-10-2024", time)
    }

    fn fixture() -> (Timeline, SampleSeries) {
        let stamps: Vec<Stamp> = ["16:55:00", "17:00:00", "17:10:00", "17:30:00", "17:45:00"]
            .iter()
            .map(|t| stamp(t))
            .collect();
        let series = SampleSeries::new(stamps.clone())
            .with_channel("FT1_Flow", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
            .with_channel("LT1_Level", vec![0.1, 0.2, 0.3, 0.4, 0.5])
            .unwrap();
        let timeline = TimeCodec::default().timeline(&stamps).unwrap();
        (timeline, series)
    }

    fn events() -> EventList {
        vec![
            Event::new("17:05:00", "03-10-2024", ""),
            Event::new("18:00:00", "03-10-2024", ""),
        ]
        .into()
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let (timeline, series) = fixture();
        let window = Window::new(stamp("17:00:00"), stamp("17:30:00"));
        let view = Aligner::default()
            .align(&timeline, &series, &EventList::new(), &window)
            .unwrap();

        assert_eq!(view.sample_mask, vec![false, true, true, true, false]);
        assert_eq!(view.hours, vec![0.0, 10.0 / 60.0, 0.5]);
        assert_eq!(view.channel("FT1_Flow"), Some(&[2.0, 3.0, 4.0][..]));
        assert_eq!(view.channel("LT1_Level"), Some(&[0.2, 0.3, 0.4][..]));
        assert_eq!(view.span_hours(), 0.5);
    }

    #[test]
    fn test_events_are_masked_and_normalized() {
        let (timeline, series) = fixture();
        let window = Window::new(stamp("17:00:00"), stamp("17:30:00"));
        let view = Aligner::default()
            .align(&timeline, &series, &events(), &window)
            .unwrap();

        assert_eq!(view.event_mask, vec![true, false]);
        assert_eq!(view.events, vec![Event::new("17:05:00", "03-10-2024", "")]);
        assert_eq!(view.event_hours.len(), 1);
        assert!((view.event_hours[0] - 5.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_width_window_selects_exact_matches() {
        let (timeline, series) = fixture();
        let window = Window::new(stamp("17:10:00"), stamp("17:10:00"));
        let view = Aligner::default()
            .align(&timeline, &series, &events(), &window)
            .unwrap();

        assert_eq!(view.sample_mask, vec![false, false, true, false, false]);
        assert_eq!(view.hours, vec![0.0]);
        assert!(!view.has_events());
        assert_eq!(view.span_hours(), 0.0);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let (timeline, series) = fixture();
        let window = Window::new(stamp("17:30:00"), stamp("17:00:00"));
        let view = Aligner::default()
            .align(&timeline, &series, &events(), &window)
            .unwrap();

        assert_eq!(view.sample_mask, vec![false; 5]);
        assert_eq!(view.event_mask, vec![false; 2]);
        assert!(view.hours.is_empty());
        assert!(view.event_hours.is_empty());
        assert!(view.events.is_empty());
        assert_eq!(view.channel("FT1_Flow"), Some(&[][..]));
        assert_eq!(view.span_hours(), 0.0);
    }

    #[test]
    fn test_window_outside_data() {
        let (timeline, series) = fixture();
        let window = Window::new(
            Stamp::new("05-10-2024", "00:00:00"),
            Stamp::new("06-10-2024", "00:00:00"),
        );
        let view = Aligner::default()
            .align(&timeline, &series, &events(), &window)
            .unwrap();
        assert_eq!(view.sample_count(), 0);
        assert!(!view.has_events());
        assert_eq!(view.span_hours(), 24.0);
    }

    #[test]
    fn test_unparseable_window_is_rejected() {
        let (timeline, series) = fixture();
        let window = Window::new(stamp("17:00"), stamp("17:30:00"));
        let result = Aligner::default().align(&timeline, &series, &events(), &window);
        assert!(matches!(result, Err(AlignerError::InvalidWindow(_))));
    }

    #[test]
    fn test_malformed_event_is_rejected() {
        let (timeline, series) = fixture();
        let window = Window::new(stamp("17:00:00"), stamp("17:30:00"));
        let events: EventList = vec![Event::new("5pm", "03-10-2024", "")].into();
        let result = Aligner::default().align(&timeline, &series, &events, &window);
        assert!(matches!(result, Err(AlignerError::ParseError { .. })));
    }

    #[test]
    fn test_events_before_window_start_are_dropped() {
        let (timeline, series) = fixture();
        let window = Window::new(stamp("17:06:00"), stamp("19:00:00"));
        let view = Aligner::default()
            .align(&timeline, &series, &events(), &window)
            .unwrap();
        assert_eq!(view.event_mask, vec![false, true]);
        assert!((view.event_hours[0] - 54.0 / 60.0).abs() < 1e-12);
    }
}
