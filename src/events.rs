use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::clock::minutes_between;
use crate::models::{LowEvent, Reading, SpikeEvent};

/// Thresholds controlling spike and low detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    /// Minimum rise in mg/dL between consecutive readings (default: 30)
    pub spike_threshold: i32,

    /// Readings strictly below this value are lows (default: 70)
    pub low_threshold: i32,

    /// Longest gap in minutes over which a rise still counts as a spike (default: 90)
    pub max_minutes: u32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        DetectionThresholds {
            spike_threshold: 30,
            low_threshold: 70,
            max_minutes: 90,
        }
    }
}

/// Spikes and lows found in one reading sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlycemicEvents {
    pub spikes: Vec<SpikeEvent>,
    pub lows: Vec<LowEvent>,
}

impl GlycemicEvents {
    pub fn spike_count(&self) -> usize {
        self.spikes.len()
    }

    pub fn low_count(&self) -> usize {
        self.lows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty() && self.lows.is_empty()
    }
}

/// Pairwise spike and low detector
///
/// Each adjacent pair of readings is judged on its own: a spike needs the
/// pair's rise to reach the threshold within `max_minutes`, and a low is
/// reported for the later reading of the pair. There is no accumulation
/// across pairs and no deduplication, so the first reading of a sequence is
/// never reported as a low.
#[derive(Debug, Clone, Default)]
pub struct EventDetector {
    thresholds: DetectionThresholds,
}

impl EventDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: DetectionThresholds) -> Self {
        EventDetector { thresholds }
    }

    pub fn thresholds(&self) -> &DetectionThresholds {
        &self.thresholds
    }

    /// Scan a chronologically ordered sequence for spikes and lows
    pub fn detect(&self, readings: &[Reading]) -> GlycemicEvents {
        let mut events = GlycemicEvents::default();

        for pair in readings.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            // Saturates on extreme input instead of wrapping
            let delta = curr.glucose.saturating_sub(prev.glucose);
            let minutes = minutes_between(prev.time, curr.time);

            if delta >= self.thresholds.spike_threshold && minutes <= self.thresholds.max_minutes {
                debug!(
                    start = %prev.time,
                    end = %curr.time,
                    delta,
                    minutes,
                    "Spike detected"
                );
                events.spikes.push(SpikeEvent {
                    start_time: prev.time,
                    end_time: curr.time,
                    glucose_start: prev.glucose,
                    glucose_peak: curr.glucose,
                    delta,
                    duration_minutes: minutes,
                });
            }

            if curr.glucose < self.thresholds.low_threshold {
                debug!(time = %curr.time, glucose = curr.glucose, "Low detected");
                events.lows.push(LowEvent {
                    time: curr.time,
                    glucose: curr.glucose,
                });
            }
        }

        trace!(
            readings = readings.len(),
            spikes = events.spike_count(),
            lows = events.low_count(),
            "Event detection finished"
        );

        events
    }
}

/// Detect events with the given thresholds
pub fn detect_events(readings: &[Reading], thresholds: DetectionThresholds) -> GlycemicEvents {
    EventDetector::with_thresholds(thresholds).detect(readings)
}
