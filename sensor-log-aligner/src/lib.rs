//! Sensor Log Aligner Library
//!
//! A stateless library for putting multi-channel sensor logs and a timestamped
//! event log on one time axis.
//!
//! # Architecture
//!
//! - [`TimeCodec`] turns `DD-MM-YYYY` / `HH:MM:SS` pairs into signed seconds
//!   from a fixed reference instant
//! - [`EdgeDetector`] finds falling edges in a flow channel, with a refractory
//!   window so one transition yields one event
//! - [`event_store`] reads and writes the `time,date,` event log
//! - [`Aligner`] restricts samples and events to a window and expresses both in
//!   hours from the window start
//! - [`formats`] loads logger CSV exports into a [`SampleSeries`]
//!
//! The library does NOT render plots or print reports. Those live in the
//! application layer (sensor-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use sensor_log_aligner::{
//!     event_store, formats, Aligner, EdgeConfig, EdgeDetector, Event, Stamp, TimeCodec, Window,
//! };
//! use std::path::Path;
//!
//! let codec = TimeCodec::default();
//! let series = formats::read_sample_csv(Path::new("data.csv")).unwrap();
//! let timeline = codec.timeline(series.stamps()).unwrap();
//!
//! // Regenerate the event log from the flow channel
//! let detector = EdgeDetector::new(EdgeConfig::new().with_target_value(2.0));
//! let edges = detector
//!     .detect_falling_edges(&timeline, series.require_channel("FT1_Flow").unwrap())
//!     .unwrap();
//! let events: Vec<Event> = edges.into_iter().map(Event::from).collect();
//! event_store::save(&events, Path::new("logging.txt")).unwrap();
//!
//! // Align both sources to a half-hour window
//! let events = event_store::load(Path::new("logging.txt")).unwrap();
//! let window = Window::new(
//!     Stamp::new("03-10-2024", "17:00:00"),
//!     Stamp::new("03-10-2024", "17:30:00"),
//! );
//! let view = Aligner::new(codec)
//!     .align(&timeline, &series, &events, &window)
//!     .unwrap();
//! println!("{} samples, {} events", view.sample_count(), view.events.len());
//! ```

// Public modules
pub mod align;
pub mod config;
pub mod edge_detector;
pub mod event_store;
pub mod formats;
pub mod time_codec;
pub mod types;

// Re-export main types for convenience
pub use align::{AlignedView, Aligner};
pub use config::EdgeConfig;
pub use edge_detector::EdgeDetector;
pub use time_codec::{TimeCodec, REFERENCE_INSTANT};
pub use types::{
    AlignerError, Channel, Event, EventList, Result, SampleSeries, Stamp, Timeline,
    TimelineEntry, Window,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
