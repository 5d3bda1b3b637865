//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use sensor_log_aligner::event_store::DEFAULT_EVENT_LOG;
use sensor_log_aligner::{EdgeConfig, Stamp, TimeCodec, Window};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of stacked panels in a rendered figure
pub const MAX_PANELS: usize = 7;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub windows: Vec<WindowConfig>,
    #[serde(default = "default_panels")]
    pub panels: Vec<PanelConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            time: TimeConfig::default(),
            detection: DetectionConfig::default(),
            windows: Vec::new(),
            panels: default_panels(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Logger CSV export
    pub data: Option<PathBuf>,
    #[serde(default = "default_event_log")]
    pub event_log: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data: None,
            event_log: default_event_log(),
        }
    }
}

fn default_event_log() -> PathBuf {
    PathBuf::from(DEFAULT_EVENT_LOG)
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimeConfig {
    /// Zero point of the time axis as `"DD-MM-YYYY HH:MM:SS"`
    pub reference: Option<String>,
}

impl TimeConfig {
    pub fn codec(&self) -> Result<TimeCodec> {
        match &self.reference {
            Some(reference) => TimeCodec::from_reference_str(reference)
                .with_context(|| format!("Invalid time reference: {:?}", reference)),
            None => Ok(TimeCodec::default()),
        }
    }
}

/// Settings for the `detect` command
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_target_value")]
    pub target_value: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_refractory")]
    pub refractory: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            target_value: default_target_value(),
            tolerance: default_tolerance(),
            refractory: default_refractory(),
        }
    }
}

impl DetectionConfig {
    pub fn edge_config(&self) -> EdgeConfig {
        EdgeConfig::new()
            .with_target_value(self.target_value)
            .with_tolerance(self.tolerance)
            .with_refractory(self.refractory)
    }
}

fn default_channel() -> String {
    "FT1_Flow".to_string()
}

// The flow meter reads 2 t/h mid-closure; the library default stays at 1.5
fn default_target_value() -> f64 {
    2.0
}

fn default_tolerance() -> f64 {
    EdgeConfig::default().tolerance
}

fn default_refractory() -> usize {
    EdgeConfig::default().refractory
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    /// Used in the output file name
    pub name: Option<String>,
    pub start: Stamp,
    pub end: Stamp,
}

impl WindowConfig {
    pub fn window(&self) -> Window {
        Window::new(self.start.clone(), self.end.clone())
    }

    /// Output file name for this window at position `idx`
    pub fn file_name(&self, idx: usize) -> String {
        match self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => {
                let safe: String = name
                    .trim()
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                    .collect();
                format!("{}.png", safe)
            }
            None => format!("window_{:02}.png", idx + 1),
        }
    }
}

/// Fail if two windows would be written to the same file
pub fn check_unique_file_names(windows: &[WindowConfig]) -> Result<()> {
    let mut seen = HashSet::new();
    for (idx, window) in windows.iter().enumerate() {
        let file_name = window.file_name(idx);
        if !seen.insert(file_name.clone()) {
            bail!(
                "window {} ({:?}) maps to the same file as an earlier window: {}",
                idx + 1,
                window.name.as_deref().unwrap_or_default(),
                file_name
            );
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelConfig {
    pub title: String,
    #[serde(default)]
    pub channels: Vec<String>,
    pub y_range: [f64; 2],
}

impl PanelConfig {
    fn new(title: &str, y_range: [f64; 2]) -> Self {
        Self {
            title: title.to_string(),
            channels: Vec::new(),
            y_range,
        }
    }
}

fn default_panels() -> Vec<PanelConfig> {
    vec![
        PanelConfig::new("PT3 level (m) or True/False", [0.0, 5.0]),
        PanelConfig::new("True/False", [-0.1, 1.1]),
        PanelConfig::new("Flow (t/h) or Pressure (bar)", [0.0, 10.0]),
        PanelConfig::new("Conductivity (uS/cm)", [0.0, 2000.0]),
        PanelConfig::new("Level (m)", [0.0, 5.0]),
        PanelConfig::new(
            "Conductivity (uS/cm)\n or TDS (mg/L)\n or Salinity (PSU)",
            [0.0, 2000.0],
        ),
        PanelConfig::new("Temperature (°C)", [0.0, 50.0]),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("plots")
}

fn default_width() -> u32 {
    1500
}

fn default_height() -> u32 {
    1500
}

impl AppConfig {
    /// Check the settings serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.panels.is_empty() || self.panels.len() > MAX_PANELS {
            bail!(
                "expected between 1 and {} panels, found {}",
                MAX_PANELS,
                self.panels.len()
            );
        }
        for panel in &self.panels {
            let [min, max] = panel.y_range;
            if !(min.is_finite() && max.is_finite() && min < max) {
                bail!(
                    "panel {:?} has invalid y_range [{}, {}]",
                    panel.title,
                    min,
                    max
                );
            }
        }
        check_unique_file_names(&self.windows)?;
        if self.output.width == 0 || self.output.height == 0 {
            bail!("output size must be non-zero");
        }
        self.detection
            .edge_config()
            .validate()
            .context("Invalid detection settings")?;
        self.time.codec()?;
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            data = "tank_test.csv"

            [detection]
            refractory = 120

            [[windows]]
            name = "first_fill"
            start = { date = "03-10-2024", time = "17:00:00" }
            end = { date = "03-10-2024", time = "19:30:00" }

            [[panels]]
            title = "Flow (t/h)"
            channels = ["FT1_Flow", "FT2_Flow"]
            y_range = [0.0, 8.0]
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.data, Some(PathBuf::from("tank_test.csv")));
        assert_eq!(config.input.event_log, PathBuf::from("logging.txt"));
        assert_eq!(config.detection.channel, "FT1_Flow");
        assert_eq!(config.detection.target_value, 2.0);
        assert_eq!(config.detection.refractory, 120);
        assert_eq!(config.windows.len(), 1);
        assert_eq!(
            config.windows[0].window().end,
            Stamp::new("03-10-2024", "19:30:00")
        );
        assert_eq!(config.panels.len(), 1);
        assert_eq!(config.panels[0].channels, vec!["FT1_Flow", "FT2_Flow"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_have_seven_panels() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.panels.len(), MAX_PANELS);
        assert_eq!(config.output.dir, PathBuf::from("plots"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_y_range() {
        let toml_content = r#"
            [[panels]]
            title = "Level (m)"
            y_range = [5.0, 0.0]
        "#;
        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_too_many_panels() {
        let mut config = AppConfig::default();
        config.panels.push(PanelConfig::new("Extra", [0.0, 1.0]));
        assert!(config.validate().is_err());
    }

    fn named_window(name: Option<&str>) -> WindowConfig {
        WindowConfig {
            name: name.map(str::to_string),
            start: Stamp::new("03-10-2024", "17:00:00"),
            end: Stamp::new("03-10-2024", "17:30:00"),
        }
    }

    #[test]
    fn test_window_file_names() {
        assert_eq!(named_window(None).file_name(0), "window_01.png");
        assert_eq!(named_window(Some("  ")).file_name(11), "window_12.png");
        assert_eq!(named_window(Some("fill 2/3")).file_name(0), "fill_2_3.png");
    }

    #[test]
    fn test_rejects_colliding_window_names() {
        let mut config = AppConfig::default();
        config.windows = vec![named_window(Some("a b")), named_window(Some("a/b"))];
        assert!(config.validate().is_err());

        config.windows = vec![named_window(Some("fill")), named_window(Some("fill"))];
        assert!(config.validate().is_err());

        config.windows = vec![named_window(Some("fill")), named_window(None)];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_reference() {
        let config: AppConfig = toml::from_str(
            r#"
            [time]
            reference = "01-10-2024 00:00:00"
            "#,
        )
        .unwrap();
        let codec = config.time.codec().unwrap();
        assert_eq!(codec.elapsed_seconds("01-10-2024", "00:01:00").unwrap(), 60);
    }
}
