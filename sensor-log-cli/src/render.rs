//! Multi-panel PNG rendering of an aligned window
//!
//! Panels are stacked vertically and share the x axis (hours from the window
//! start). Events are drawn as red dashed verticals across every panel, with
//! their time/date written below the figure and their labels above it.

use crate::config::PanelConfig;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use plotters::style::FontTransform;
use sensor_log_aligner::{AlignedView, Window};
use std::io::Cursor;
use thiserror::Error;

/// Height of the strip above the panels holding event labels
const TOP_STRIP: u32 = 120;
/// Height of the strip below the panels holding window and event stamps
const BOTTOM_STRIP: u32 = 150;
/// Narrowest x axis drawn, so zero-width windows still get a valid range
const MIN_SPAN_HOURS: f64 = 1.0 / 3600.0;
/// Number of dash/gap pairs in an event marker
const MARKER_DASHES: usize = 24;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("figure of {width}x{height} px is too small")]
    TooSmall { width: u32, height: u32 },
    #[error("no panels to render")]
    NoPanels,
    #[error("failed to render plot: {0}")]
    Plot(String),
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for RenderError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        RenderError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for RenderError {
    fn from(value: image::ImageError) -> Self {
        RenderError::Plot(value.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 1500,
            background: WHITE,
            palette: vec![BLUE, GREEN, MAGENTA, CYAN, BLACK, YELLOW],
        }
    }
}

impl PlotStyle {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

/// Draw `view` into an in-memory PNG
pub fn render_png(
    view: &AlignedView,
    window: &Window,
    panels: &[PanelConfig],
    style: &PlotStyle,
) -> Result<Vec<u8>, RenderError> {
    if panels.is_empty() {
        return Err(RenderError::NoPanels);
    }
    let min_height = TOP_STRIP + BOTTOM_STRIP + 60 * panels.len() as u32;
    if style.width < 300 || style.height < min_height {
        return Err(RenderError::TooSmall {
            width: style.width,
            height: style.height,
        });
    }

    let x_max = x_extent(view);
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;

        let (top, rest) = root.split_vertically(TOP_STRIP);
        let (body, bottom) = rest.split_vertically(style.height - TOP_STRIP - BOTTOM_STRIP);
        let rows = body.split_evenly((panels.len(), 1));

        // Pixel columns of the window bounds and of each event, from the last panel
        let mut start_x = 0;
        let mut end_x = 0;
        let mut event_xs = Vec::new();

        for (idx, (panel, area)) in panels.iter().zip(rows.iter()).enumerate() {
            let [y_min, y_max] = panel.y_range;
            let mut chart = ChartBuilder::on(area)
                .margin(5)
                .set_label_area_size(LabelAreaPosition::Left, 90)
                .set_label_area_size(LabelAreaPosition::Bottom, 30)
                .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

            let title = panel.title.replace('\n', " ");
            let mut mesh = chart.configure_mesh();
            mesh.y_desc(title.trim()).light_line_style(&BLACK.mix(0.05));
            if idx + 1 == panels.len() {
                mesh.x_desc("Time (h)");
            }
            mesh.draw()?;

            let mut drawn = 0;
            for (channel_idx, name) in panel.channels.iter().enumerate() {
                let Some(values) = view.channel(name) else {
                    log::warn!("Channel '{}' not in data, skipping in panel {:?}", name, title);
                    continue;
                };
                let color = style.palette[channel_idx % style.palette.len()];
                chart
                    .draw_series(LineSeries::new(finite_points(&view.hours, values), &color))?
                    .label(name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
                drawn += 1;
            }

            if view.has_events() {
                for &hour in &view.event_hours {
                    let dashes = dash_spans(y_min, y_max, MARKER_DASHES);
                    chart.draw_series(dashes.into_iter().map(|(a, b)| {
                        PathElement::new(vec![(hour, a), (hour, b)], RED.stroke_width(1))
                    }))?;
                }
            }

            if drawn > 0 {
                chart
                    .configure_series_labels()
                    .border_style(&BLACK.mix(0.3))
                    .background_style(&style.background.mix(0.8))
                    .draw()?;
            }

            start_x = chart.backend_coord(&(0.0, y_min)).0;
            end_x = chart.backend_coord(&(x_max, y_min)).0;
            event_xs = view
                .event_hours
                .iter()
                .map(|&h| chart.backend_coord(&(h, y_min)).0)
                .collect();
        }

        let stamp_font = ("sans-serif", 13)
            .into_font()
            .transform(FontTransform::Rotate270)
            .color(&BLACK);
        let label_y = BOTTOM_STRIP as i32 - 5;
        for (x, stamp) in [(start_x, &window.start), (end_x, &window.end)] {
            bottom.draw(&Text::new(stamp.to_string(), (x, label_y), stamp_font.clone()))?;
        }

        for (x, event) in event_xs.iter().zip(&view.events) {
            bottom.draw(&Text::new(
                format!("{} {}", event.time, event.date),
                (*x, label_y),
                stamp_font.clone(),
            ))?;
            if !event.label.is_empty() {
                top.draw(&Text::new(
                    event.label.clone(),
                    (*x, TOP_STRIP as i32 - 5),
                    stamp_font.clone(),
                ))?;
            }
        }

        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

/// Right edge of the x axis in hours
pub fn x_extent(view: &AlignedView) -> f64 {
    view.span_hours().max(MIN_SPAN_HOURS)
}

/// Plot points with NaN/infinite samples left out
pub fn finite_points(hours: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
    hours
        .iter()
        .copied()
        .zip(values.iter().copied())
        .filter(|(_, v)| v.is_finite())
        .collect()
}

/// Alternating dash segments covering `[low, high]`
pub fn dash_spans(low: f64, high: f64, dashes: usize) -> Vec<(f64, f64)> {
    if dashes == 0 || high <= low {
        return Vec::new();
    }
    let step = (high - low) / dashes as f64;
    (0..dashes)
        .map(|i| {
            let a = low + step * i as f64;
            (a, a + step * 0.6)
        })
        .collect()
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| RenderError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_log_aligner::{Aligner, Event, EventList, SampleSeries, Stamp, TimeCodec};

    const PNG_SIGNATURE: &[u8] = b"\x89PNG";

    fn render_window(start: &str, end: &str) -> Vec<u8> {
        let stamps: Vec<Stamp> = ["17:00:00", "17:10:00", "17:20:00", "17:30:00"]
            .iter()
            .map(|t| Stamp::new("03-10-2024", *t))
            .collect();
        let series = SampleSeries::new(stamps.clone())
            .with_channel("FT1_Flow", vec![4.0, 2.0, f64::NAN, 0.0])
            .unwrap()
            .with_channel("LT1_Level", vec![1.0, 1.5, 2.0, 2.5])
            .unwrap();
        let timeline = TimeCodec::default().timeline(&stamps).unwrap();
        let events: EventList = vec![Event::new("17:10:00", "03-10-2024", "valve closed")].into();
        let window = Window::new(
            Stamp::new("03-10-2024", start),
            Stamp::new("03-10-2024", end),
        );
        let view = Aligner::default()
            .align(&timeline, &series, &events, &window)
            .unwrap();
        let panels = crate::config::AppConfig::default().panels;
        render_png(&view, &window, &panels, &PlotStyle::default()).unwrap()
    }

    #[test]
    fn test_render_window_with_event() {
        assert!(render_window("17:00:00", "17:30:00").starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn test_render_inverted_window() {
        assert!(render_window("17:30:00", "17:00:00").starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn test_render_zero_width_window() {
        assert!(render_window("17:10:00", "17:10:00").starts_with(PNG_SIGNATURE));
    }

    #[test]
    fn test_finite_points_drop_gaps() {
        let points = finite_points(&[0.0, 0.5, 1.0], &[1.0, f64::NAN, 3.0]);
        assert_eq!(points, vec![(0.0, 1.0), (1.0, 3.0)]);
    }

    #[test]
    fn test_dash_spans_stay_inside_range() {
        let spans = dash_spans(-1.0, 1.0, 4);
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].0, -1.0);
        assert!(spans.iter().all(|(a, b)| -1.0 <= *a && a < b && *b <= 1.0));
        assert!(dash_spans(1.0, 1.0, 4).is_empty());
        assert!(dash_spans(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_render_rejects_degenerate_requests() {
        let window = Window::new(
            Stamp::new("03-10-2024", "17:00:00"),
            Stamp::new("03-10-2024", "17:00:00"),
        );
        let view = Aligner::default()
            .align(
                &Default::default(),
                &Default::default(),
                &Default::default(),
                &window,
            )
            .unwrap();
        assert!(x_extent(&view) > 0.0);
        assert!(matches!(
            render_png(&view, &window, &[], &PlotStyle::default()),
            Err(RenderError::NoPanels)
        ));
        let panels = crate::config::AppConfig::default().panels;
        assert!(matches!(
            render_png(&view, &window, &panels, &PlotStyle::with_size(200, 200)),
            Err(RenderError::TooSmall { .. })
        ));
    }
}
