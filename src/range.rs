use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{CalculationError, Result};
use crate::models::Reading;

/// Closed glucose band `[low, high]` in mg/dL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeBand {
    pub low: i32,
    pub high: i32,
}

impl Default for RangeBand {
    fn default() -> Self {
        RangeBand { low: 70, high: 140 }
    }
}

impl RangeBand {
    pub fn new(low: i32, high: i32) -> Self {
        RangeBand { low, high }
    }

    pub fn contains(&self, glucose: i32) -> bool {
        self.low <= glucose && glucose <= self.high
    }
}

/// Reading counts on each side of the band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub below: usize,
    pub within: usize,
    pub above: usize,

    /// Percentage of readings within the band, one decimal
    #[serde(with = "rust_decimal::serde::float")]
    pub time_in_range: Decimal,
}

impl RangeSummary {
    pub fn total(&self) -> usize {
        self.below + self.within + self.above
    }
}

/// Percentage of readings inside `band`, rounded half-to-even to one decimal
pub fn time_in_range(readings: &[Reading], band: RangeBand) -> Result<Decimal> {
    let within = readings.iter().filter(|r| band.contains(r.glucose)).count();
    percentage(within, readings.len())
}

/// Count readings below, within and above `band`
pub fn summarize(readings: &[Reading], band: RangeBand) -> Result<RangeSummary> {
    let (mut below, mut within, mut above) = (0, 0, 0);
    for reading in readings {
        if reading.glucose < band.low {
            below += 1;
        } else if reading.glucose > band.high {
            above += 1;
        } else {
            within += 1;
        }
    }

    Ok(RangeSummary {
        below,
        within,
        above,
        time_in_range: percentage(within, readings.len())?,
    })
}

fn percentage(count: usize, total: usize) -> Result<Decimal> {
    if total == 0 {
        return Err(CalculationError::InsufficientData {
            calculation: "time in range".to_string(),
            reason: "no readings supplied".to_string(),
        }
        .into());
    }

    let ratio = Decimal::from(count as u64) * dec!(100) / Decimal::from(total as u64);
    Ok(ratio.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven))
}
