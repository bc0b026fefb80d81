use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock::{parse_clock_time, ClockTime};
use crate::error::{FormatError, NutriRsError};

/// A single CGM sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Wall-clock time of the sample
    pub time: ClockTime,

    /// Blood glucose in mg/dL
    pub glucose: i32,
}

impl Reading {
    pub fn new(time: ClockTime, glucose: i32) -> Self {
        Reading { time, glucose }
    }

    /// Build a reading from a raw `HH:MM` string
    pub fn parse(time: &str, glucose: i32) -> Result<Self, FormatError> {
        Ok(Reading {
            time: parse_clock_time(time)?,
            glucose,
        })
    }
}

/// A rise of at least the spike threshold between two consecutive readings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeEvent {
    /// Time of the earlier reading
    pub start_time: ClockTime,

    /// Time of the reading where the rise was observed
    pub end_time: ClockTime,

    pub glucose_start: i32,
    pub glucose_peak: i32,

    /// `glucose_peak - glucose_start`, saturating at the `i32` bounds
    pub delta: i32,

    /// Minutes between the two readings
    pub duration_minutes: u32,
}

/// A single reading below the hypoglycemia threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowEvent {
    pub time: ClockTime,
    pub glucose: i32,
}

/// Body-composition goal driving the calorie target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    /// Fat loss
    Cut,
    Maintain,
    /// Muscle gain
    Gain,
}

impl Goal {
    /// Default calories per kilogram of bodyweight
    pub fn default_calories_per_kg(&self) -> Decimal {
        match self {
            Goal::Cut => dec!(26),
            Goal::Maintain => dec!(30),
            Goal::Gain => dec!(33),
        }
    }
}

impl FromStr for Goal {
    type Err = NutriRsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cut" => Ok(Goal::Cut),
            "maintain" => Ok(Goal::Maintain),
            "gain" => Ok(Goal::Gain),
            _ => Err(NutriRsError::InvalidGoal(s.to_string())),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Cut => write!(f, "cut"),
            Goal::Maintain => write!(f, "maintain"),
            Goal::Gain => write!(f, "gain"),
        }
    }
}

/// Daily calorie and macronutrient prescription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroPlan {
    pub calories: i64,
    pub protein_g: i64,
    pub carbs_g: i64,

    /// Fat fills the remaining energy and can go negative when protein and
    /// carbohydrate alone exceed the calorie target
    pub fat_g: i64,
}

impl MacroPlan {
    /// Energy implied by the gram amounts (4/4/9 kcal per gram)
    pub fn energy_from_macros(&self) -> i64 {
        self.protein_g * 4 + self.carbs_g * 4 + self.fat_g * 9
    }

    /// False when any macro amount came out negative
    pub fn is_plausible(&self) -> bool {
        self.protein_g >= 0 && self.carbs_g >= 0 && self.fat_g >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_parse() {
        let reading = Reading::parse("08:15", 112).unwrap();
        assert_eq!(reading.time.to_string(), "08:15");
        assert_eq!(reading.glucose, 112);

        assert!(Reading::parse("8:15", 112).is_err());
    }

    #[test]
    fn test_reading_json_shape() {
        let reading: Reading = serde_json::from_str(r#"{"time": "09:00", "glucose": 145}"#).unwrap();
        assert_eq!(reading, Reading::parse("09:00", 145).unwrap());

        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(json["time"], "09:00");
        assert_eq!(json["glucose"], 145);
    }

    #[test]
    fn test_goal_parsing_is_strict() {
        assert_eq!("cut".parse::<Goal>().unwrap(), Goal::Cut);
        assert_eq!("maintain".parse::<Goal>().unwrap(), Goal::Maintain);
        assert_eq!("gain".parse::<Goal>().unwrap(), Goal::Gain);

        assert!(matches!("Cut".parse::<Goal>(), Err(NutriRsError::InvalidGoal(_))));
        assert!(matches!("bulk".parse::<Goal>(), Err(NutriRsError::InvalidGoal(_))));
    }

    #[test]
    fn test_goal_calorie_multipliers() {
        assert_eq!(Goal::Cut.default_calories_per_kg(), dec!(26));
        assert_eq!(Goal::Maintain.default_calories_per_kg(), dec!(30));
        assert_eq!(Goal::Gain.default_calories_per_kg(), dec!(33));
    }

    #[test]
    fn test_macro_plan_energy() {
        let plan = MacroPlan {
            calories: 2250,
            protein_g: 165,
            carbs_g: 150,
            fat_g: 110,
        };
        assert_eq!(plan.energy_from_macros(), 2250);
        assert!(plan.is_plausible());

        let negative = MacroPlan { fat_g: -4, ..plan };
        assert!(!negative.is_plausible());
    }
}
