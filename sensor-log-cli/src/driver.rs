//! Command drivers
//!
//! Glue between the config/CLI layer and the library: load the sample CSV and
//! its timeline once, then run detection or alignment on top of them.

use crate::config::{
    check_unique_file_names, DetectionConfig, OutputConfig, PanelConfig, WindowConfig,
};
use crate::render::{render_png, PlotStyle};
use anyhow::{Context, Result};
use rayon::prelude::*;
use sensor_log_aligner::{
    event_store, formats, AlignedView, Aligner, EdgeDetector, Event, EventList, SampleSeries,
    TimeCodec, Timeline, Window,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Sample data loaded once per run
pub struct Samples {
    pub series: SampleSeries,
    pub timeline: Timeline,
}

impl Samples {
    pub fn load(path: &Path, codec: &TimeCodec) -> Result<Self> {
        let series = formats::read_sample_csv(path)
            .with_context(|| format!("Failed to read sample data: {:?}", path))?;
        let timeline = codec
            .timeline(series.stamps())
            .with_context(|| format!("Invalid timestamp in sample data: {:?}", path))?;
        Ok(Self { series, timeline })
    }
}

/// Detect edges on the configured channel and rewrite the event log
///
/// Returns the detected events in sample order.
pub fn detect(samples: &Samples, detection: &DetectionConfig, output: &Path) -> Result<Vec<Event>> {
    let signal = samples
        .series
        .require_channel(&detection.channel)
        .context("Cannot run edge detection")?;

    let detector = EdgeDetector::new(detection.edge_config());
    let edges = detector
        .detect_falling_edges(&samples.timeline, signal)
        .context("Edge detection failed")?;
    log::info!(
        "Detected {} edges on channel '{}'",
        edges.len(),
        detection.channel
    );

    let events: Vec<Event> = edges.into_iter().map(Event::from).collect();
    event_store::save(&events, output)
        .with_context(|| format!("Failed to write event log: {:?}", output))?;
    Ok(events)
}

pub fn load_events(path: &Path) -> Result<EventList> {
    event_store::load(path).with_context(|| format!("Failed to read event log: {:?}", path))
}

/// Align one window, naming it in any error
pub fn align_window(
    aligner: &Aligner,
    samples: &Samples,
    events: &EventList,
    window: &Window,
) -> Result<AlignedView> {
    aligner
        .align(&samples.timeline, &samples.series, events, window)
        .with_context(|| format!("Failed to align window {} -> {}", window.start, window.end))
}

/// Render every configured window to its own PNG, in parallel
///
/// Returns the written paths in window order.
pub fn plot_windows(
    aligner: &Aligner,
    samples: &Samples,
    events: &EventList,
    windows: &[WindowConfig],
    panels: &[PanelConfig],
    output: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    check_unique_file_names(windows)?;
    fs::create_dir_all(&output.dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output.dir))?;
    let style = PlotStyle::with_size(output.width, output.height);

    windows
        .par_iter()
        .enumerate()
        .map(|(idx, config)| {
            let window = config.window();
            let view = align_window(aligner, samples, events, &window)?;
            let png = render_png(&view, &window, panels, &style)
                .with_context(|| format!("Failed to render window {} -> {}", window.start, window.end))?;

            let path = output.dir.join(config.file_name(idx));
            fs::write(&path, png).with_context(|| format!("Failed to write plot: {:?}", path))?;
            log::info!(
                "Wrote {:?} ({} samples, {} events)",
                path,
                view.sample_count(),
                view.events.len()
            );
            Ok(path)
        })
        .collect()
}
