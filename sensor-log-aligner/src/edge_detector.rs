//! Falling-edge detection on a single flow channel
//!
//! A valve closure shows up in the flow meter as a short stretch of samples
//! resting near a mid-scale value. The detector accepts the first sample within
//! `tolerance` of the target and then ignores the following `refractory`
//! samples, so one physical transition produces one event.

use crate::config::EdgeConfig;
use crate::types::{AlignerError, Result, Timeline, TimelineEntry};

/// Scans signals for samples resting at the target value
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    config: EdgeConfig,
}

impl EdgeDetector {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Indices of accepted edges, in ascending order
    ///
    /// The first and last samples are never scanned, and signals shorter than
    /// three samples yield no edges.
    pub fn detect_indices(&self, signal: &[f64]) -> Result<Vec<usize>> {
        self.config.validate()?;

        if signal.len() < 3 {
            log::debug!("Signal has {} samples, nothing to scan", signal.len());
            return Ok(Vec::new());
        }

        let mut scan = Scan::new(&self.config);
        let indices: Vec<usize> = (1..signal.len() - 1)
            .filter(|&i| scan.accept(signal[i]))
            .collect();

        log::debug!(
            "Detected {} edges in {} samples (target {}, tolerance {}, refractory {})",
            indices.len(),
            signal.len(),
            self.config.target_value,
            self.config.tolerance,
            self.config.refractory
        );
        Ok(indices)
    }

    /// Accepted edges mapped back onto the timeline they were sampled on
    pub fn detect_falling_edges(
        &self,
        timeline: &Timeline,
        signal: &[f64],
    ) -> Result<Vec<TimelineEntry>> {
        if timeline.len() != signal.len() {
            return Err(AlignerError::InvalidArgument(format!(
                "timeline has {} samples but signal has {}",
                timeline.len(),
                signal.len()
            )));
        }

        let entries = self
            .detect_indices(signal)?
            .into_iter()
            .map(|index| {
                let entry = TimelineEntry {
                    index,
                    elapsed: timeline.seconds[index],
                    stamp: timeline.stamps[index].clone(),
                };
                log::trace!("Edge at index {} ({})", index, entry.stamp);
                entry
            })
            .collect();
        Ok(entries)
    }
}

/// Cooldown state carried across one pass over a signal
struct Scan {
    target_value: f64,
    tolerance: f64,
    refractory: usize,
    cooldown: usize,
}

impl Scan {
    fn new(config: &EdgeConfig) -> Self {
        Self {
            target_value: config.target_value,
            tolerance: config.tolerance,
            refractory: config.refractory,
            cooldown: 0,
        }
    }

    fn accept(&mut self, sample: f64) -> bool {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return false;
        }
        // NaN compares false here, so gaps in the log never match
        if (sample - self.target_value).abs() < self.tolerance {
            self.cooldown = self.refractory;
            return true;
        }
        false
    }
}
