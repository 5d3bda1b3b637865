//! Sensor Log CLI Application
//!
//! This is the command-line interface for the sensor log aligner.
//! It uses the sensor-log-aligner library and adds:
//! - TOML configuration (inputs, detection settings, windows, panels)
//! - Event log generation from a flow channel
//! - Text/JSON reports of an aligned window
//! - Multi-panel PNG rendering of configured windows

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sensor_log_aligner::{Aligner, Stamp, Window};
use std::path::PathBuf;

mod config;
mod driver;
mod render;
mod report;

use config::{AppConfig, WindowConfig};
use driver::Samples;
use report::ReportFormat;

/// Sensor Log Aligner - Detect events and plot sensor logs on one time axis
#[derive(Parser, Debug)]
#[command(name = "sensor-log-cli")]
#[command(about = "Align sensor logs with an event log and plot them", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect falling edges in a flow channel and rewrite the event log
    Detect {
        /// Logger CSV export
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Channel to scan
        #[arg(long)]
        channel: Option<String>,

        /// Value the signal passes through during a transition
        #[arg(long)]
        target: Option<f64>,

        /// Maximum distance from the target for a match
        #[arg(long)]
        tolerance: Option<f64>,

        /// Samples ignored after each detection
        #[arg(long)]
        refractory: Option<usize>,

        /// Event log to write (default: logging.txt)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Report the samples and events inside one window
    Align {
        /// Logger CSV export
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Event log to read (default: logging.txt)
        #[arg(short, long, value_name = "FILE")]
        events: Option<PathBuf>,

        /// Window start as "HH:MM:SS DD-MM-YYYY"
        #[arg(long)]
        start: String,

        /// Window end as "HH:MM:SS DD-MM-YYYY"
        #[arg(long)]
        end: String,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Txt)]
        format: ReportFormat,
    },

    /// Render windows to multi-panel PNG files
    Plot {
        /// Logger CSV export
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Event log to read (default: logging.txt)
        #[arg(short, long, value_name = "FILE")]
        events: Option<PathBuf>,

        /// Plot only this window start instead of the configured windows
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Plot only this window end instead of the configured windows
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// Directory for the PNG files
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Sensor Log CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using aligner library v{}", sensor_log_aligner::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    let codec = config.time.codec()?;

    match args.command {
        Command::Detect {
            data,
            channel,
            target,
            tolerance,
            refractory,
            output,
        } => {
            let detection = &mut config.detection;
            if let Some(channel) = channel {
                detection.channel = channel;
            }
            if let Some(target) = target {
                detection.target_value = target;
            }
            if let Some(tolerance) = tolerance {
                detection.tolerance = tolerance;
            }
            if let Some(refractory) = refractory {
                detection.refractory = refractory;
            }
            let data = data_path(data, &config)?;
            let output = output.unwrap_or_else(|| config.input.event_log.clone());

            let samples = Samples::load(&data, &codec)?;
            let events = driver::detect(&samples, &config.detection, &output)?;
            if !args.quiet {
                println!("Wrote {} events to {}", events.len(), output.display());
            }
        }

        Command::Align {
            data,
            events,
            start,
            end,
            format,
        } => {
            let window = parse_window(&start, &end)?;
            let data = data_path(data, &config)?;
            let events = events.unwrap_or_else(|| config.input.event_log.clone());

            let samples = Samples::load(&data, &codec)?;
            let events = driver::load_events(&events)?;
            let view = driver::align_window(&Aligner::new(codec), &samples, &events, &window)?;
            print!("{}", report::render(&view, &window, format)?);
        }

        Command::Plot {
            data,
            events,
            start,
            end,
            output_dir,
        } => {
            if let (Some(start), Some(end)) = (start, end) {
                let window = parse_window(&start, &end)?;
                config.windows = vec![WindowConfig {
                    name: None,
                    start: window.start,
                    end: window.end,
                }];
            }
            if config.windows.is_empty() {
                bail!("No windows to plot: pass --start/--end or add [[windows]] to the config");
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            let data = data_path(data, &config)?;
            let events = events.unwrap_or_else(|| config.input.event_log.clone());

            let samples = Samples::load(&data, &codec)?;
            let events = driver::load_events(&events)?;
            let written = driver::plot_windows(
                &Aligner::new(codec),
                &samples,
                &events,
                &config.windows,
                &config.panels,
                &config.output,
            )?;
            if !args.quiet {
                for path in written {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

/// Data file from the command line, falling back to the config
fn data_path(flag: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    flag.or_else(|| config.input.data.clone())
        .context("No sample data given: pass --data or set [input] data in the config")
}

fn parse_window(start: &str, end: &str) -> Result<Window> {
    let start = Stamp::parse_time_date(start).context("Invalid --start")?;
    let end = Stamp::parse_time_date(end).context("Invalid --end")?;
    Ok(Window::new(start, end))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
