use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Overall reading of the day, used to pick headline and advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceCategory {
    VeryUnstable,
    LowsDetected,
    SomeInstability,
    StableNotOptimal,
    StableWithSpikes,
    Stable,
}

impl GuidanceCategory {
    /// Below 60% everything else is moot. Between 60% and 80% lows take
    /// precedence over spikes. At 80% and above only spikes matter.
    pub fn classify(tir: Decimal, spike_count: usize, low_count: usize) -> Self {
        if tir < dec!(60) {
            GuidanceCategory::VeryUnstable
        } else if tir < dec!(80) {
            if low_count > 0 {
                GuidanceCategory::LowsDetected
            } else if spike_count > 0 {
                GuidanceCategory::SomeInstability
            } else {
                GuidanceCategory::StableNotOptimal
            }
        } else if spike_count > 0 {
            GuidanceCategory::StableWithSpikes
        } else {
            GuidanceCategory::Stable
        }
    }

    fn status(&self) -> &'static str {
        match self {
            GuidanceCategory::VeryUnstable => "Glucose very unstable.",
            GuidanceCategory::LowsDetected => "Low glucose events detected.",
            GuidanceCategory::SomeInstability => "Some instability detected.",
            GuidanceCategory::StableNotOptimal => "Stable but not optimal.",
            GuidanceCategory::StableWithSpikes => "But glucose spikes were seen.",
            GuidanceCategory::Stable => "Glucose is stable.",
        }
    }

    fn advice(&self) -> &'static str {
        match self {
            GuidanceCategory::VeryUnstable => {
                "Follow a strict low-glycemic diet. Eliminate sugar and refined carbs."
            }
            GuidanceCategory::LowsDetected => "Eat smaller, more frequent meals. Avoid skipping meals.",
            GuidanceCategory::SomeInstability => "Reduce fast carbs. Add protein and fiber to each meal.",
            GuidanceCategory::StableNotOptimal => "Stick to balanced meals and avoid late eating.",
            GuidanceCategory::StableWithSpikes => {
                "Minimize processed carbs, add more fiber and healthy fats."
            }
            GuidanceCategory::Stable => "Balanced nutrition is appropriate today.",
        }
    }
}

/// Day-level nutrition guidance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGuidance {
    pub category: GuidanceCategory,
    pub headline: String,
    pub advice: String,
}

pub fn daily_guidance(tir: Decimal, spike_count: usize, low_count: usize) -> DailyGuidance {
    let category = GuidanceCategory::classify(tir, spike_count, low_count);
    DailyGuidance {
        category,
        headline: format!("Time in range: {:.1}%. {}", tir, category.status()),
        advice: category.advice().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(GuidanceCategory::classify(dec!(59.9), 0, 0), GuidanceCategory::VeryUnstable);
        assert_eq!(GuidanceCategory::classify(dec!(62.5), 2, 1), GuidanceCategory::LowsDetected);
        assert_eq!(GuidanceCategory::classify(dec!(70), 1, 0), GuidanceCategory::SomeInstability);
        assert_eq!(GuidanceCategory::classify(dec!(79.9), 0, 0), GuidanceCategory::StableNotOptimal);
        assert_eq!(GuidanceCategory::classify(dec!(80), 1, 3), GuidanceCategory::StableWithSpikes);
        assert_eq!(GuidanceCategory::classify(dec!(95), 0, 2), GuidanceCategory::Stable);
    }

    #[test]
    fn test_reference_day_guidance() {
        let guidance = daily_guidance(dec!(62.5), 3, 1);
        assert_eq!(guidance.headline, "Time in range: 62.5%. Low glucose events detected.");
        assert_eq!(guidance.advice, "Eat smaller, more frequent meals. Avoid skipping meals.");
    }

    #[test]
    fn test_serialized_category() {
        let guidance = daily_guidance(dec!(100), 0, 0);
        let json = serde_json::to_value(&guidance).unwrap();
        assert_eq!(json["category"], "stable");
        assert_eq!(json["headline"], "Time in range: 100.0%. Glucose is stable.");
    }
}
