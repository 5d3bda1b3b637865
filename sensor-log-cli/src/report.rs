//! Report generation for aligned windows
//!
//! Produces either a plain-text summary or the full aligned view as JSON.

use anyhow::{Context, Result};
use clap::ValueEnum;
use sensor_log_aligner::{AlignedView, Window};
use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Txt,
    Json,
}

/// Render a report for one window in the requested format
pub fn render(view: &AlignedView, window: &Window, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Txt => render_txt(view, window),
        ReportFormat::Json => {
            serde_json::to_string_pretty(view).context("Failed to serialize aligned view")
        }
    }
}

/// Plain-text summary: window, sample counts, per-channel ranges, events
pub fn render_txt(view: &AlignedView, window: &Window) -> Result<String> {
    let mut out = String::new();
    write_txt(&mut out, view, window).context("Failed to format text report")?;
    Ok(out)
}

fn write_txt(out: &mut String, view: &AlignedView, window: &Window) -> fmt::Result {
    writeln!(
        out,
        "Window:  {} -> {} ({:.2} h)",
        window.start,
        window.end,
        view.span_hours()
    )?;
    writeln!(
        out,
        "Samples: {} of {}",
        view.sample_count(),
        view.sample_mask.len()
    )?;

    if !view.channels.is_empty() {
        writeln!(out, "\nChannels:")?;
        for channel in &view.channels {
            match ChannelSummary::of(&channel.values) {
                Some(s) => writeln!(
                    out,
                    "  {:<24} min {:>10.3}  max {:>10.3}  mean {:>10.3}",
                    channel.name, s.min, s.max, s.mean
                )?,
                None => writeln!(out, "  {:<24} no data", channel.name)?,
            }
        }
    }

    writeln!(
        out,
        "\nEvents: {} of {}",
        view.events.len(),
        view.event_mask.len()
    )?;
    for (hour, event) in view.event_hours.iter().zip(&view.events) {
        write!(out, "  +{:>7.3} h  {} {}", hour, event.time, event.date)?;
        if !event.label.is_empty() {
            write!(out, "  {}", event.label)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Range of the finite values in a channel
#[derive(Debug, Clone, Copy, PartialEq)]
struct ChannelSummary {
    min: f64,
    max: f64,
    mean: f64,
}

impl ChannelSummary {
    fn of(values: &[f64]) -> Option<Self> {
        let mut finite = values.iter().copied().filter(|v| v.is_finite());
        let first = finite.next()?;
        let (min, max, sum, count) = finite.fold((first, first, first, 1usize), |acc, v| {
            (acc.0.min(v), acc.1.max(v), acc.2 + v, acc.3 + 1)
        });
        Some(Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}
