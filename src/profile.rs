//! Energy-needs planner built from a personal profile
//!
//! Resting energy uses the Mifflin-St Jeor equation:
//! - male:   10 x kg + 6.25 x cm - 5 x age + 5
//! - female: 10 x kg + 6.25 x cm - 5 x age - 161
//!
//! Daily expenditure multiplies that by an activity factor, and the goal
//! scales it (cut 0.85, maintain 1.0, gain 1.15). Protein follows bodyweight,
//! carbohydrates follow the diet type, and fat takes the remainder.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::error::{CalculationError, Result};
use crate::models::{Goal, MacroPlan};
use crate::nutrition::{checked_product, remaining_fat_g, round_grams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(format!("Invalid sex: {}", s)),
        }
    }
}

/// Activity level for TDEE calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// 1-3 days/week
    LightlyActive,
    /// 3-5 days/week
    ModeratelyActive,
    /// 6-7 days/week
    VeryActive,
    /// Athlete or twice a day
    ExtraActive,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> Decimal {
        match self {
            ActivityLevel::Sedentary => dec!(1.2),
            ActivityLevel::LightlyActive => dec!(1.375),
            ActivityLevel::ModeratelyActive => dec!(1.55),
            ActivityLevel::VeryActive => dec!(1.725),
            ActivityLevel::ExtraActive => dec!(1.9),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightly-active" | "light" => Ok(ActivityLevel::LightlyActive),
            "moderately-active" | "moderate" => Ok(ActivityLevel::ModeratelyActive),
            "very-active" | "very" => Ok(ActivityLevel::VeryActive),
            "extra-active" | "extra" => Ok(ActivityLevel::ExtraActive),
            _ => Err(format!("Invalid activity level: {}", s)),
        }
    }
}

/// Diet style, which sets the carbohydrate allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietType {
    Balanced,
    LowCarb,
    Keto,
    HighCarb,
    Carnivore,
    Vegetarian,
    Vegan,
    Paleo,
    Mediterranean,
}

impl DietType {
    /// Carbohydrate grams per kilogram of bodyweight
    pub fn carbs_g_per_kg(&self) -> Decimal {
        match self {
            DietType::Keto => dec!(0.5),
            DietType::LowCarb => dec!(1.0),
            DietType::HighCarb => dec!(3.0),
            DietType::Carnivore => Decimal::ZERO,
            _ => dec!(2.0),
        }
    }
}

impl FromStr for DietType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "balanced" => Ok(DietType::Balanced),
            "low-carb" => Ok(DietType::LowCarb),
            "keto" => Ok(DietType::Keto),
            "high-carb" => Ok(DietType::HighCarb),
            "carnivore" => Ok(DietType::Carnivore),
            "vegetarian" => Ok(DietType::Vegetarian),
            "vegan" => Ok(DietType::Vegan),
            "paleo" => Ok(DietType::Paleo),
            "mediterranean" => Ok(DietType::Mediterranean),
            _ => Err(format!("Invalid diet type: {}", s)),
        }
    }
}

/// Personal data needed to estimate energy needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyProfile {
    pub sex: Sex,
    pub age: u32,
    pub height_cm: Decimal,
    pub weight_kg: Decimal,
    pub activity: ActivityLevel,
    pub goal: Goal,
    pub diet: DietType,
}

/// Estimated needs and the resulting prescription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPlan {
    #[serde(with = "rust_decimal::serde::float")]
    pub bmr: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tdee: Decimal,
    pub macros: MacroPlan,
}

impl EnergyProfile {
    /// Reject values outside the ranges the planner is meant for
    pub fn validate(&self) -> Result<()> {
        const CALC: &str = "energy profile";

        if !(10..=100).contains(&self.age) {
            return Err(CalculationError::invalid_parameter(CALC, "age", self.age).into());
        }
        if self.height_cm < dec!(120) || self.height_cm > dec!(250) {
            return Err(CalculationError::invalid_parameter(CALC, "height_cm", self.height_cm).into());
        }
        if self.weight_kg < dec!(30) || self.weight_kg > dec!(200) {
            return Err(CalculationError::invalid_parameter(CALC, "weight_kg", self.weight_kg).into());
        }
        Ok(())
    }

    /// Basal metabolic rate in kcal/day
    pub fn bmr(&self) -> Result<Decimal> {
        let base = checked_product(dec!(10), self.weight_kg)?
            .checked_add(checked_product(dec!(6.25), self.height_cm)?)
            .and_then(|sum| sum.checked_sub(dec!(5) * Decimal::from(self.age)))
            .and_then(|base| match self.sex {
                Sex::Male => base.checked_add(dec!(5)),
                Sex::Female => base.checked_sub(dec!(161)),
            });
        base.ok_or_else(|| CalculationError::overflow("energy profile").into())
    }

    /// Total daily energy expenditure in kcal/day
    pub fn tdee(&self) -> Result<Decimal> {
        checked_product(self.bmr()?, self.activity.multiplier())
    }

    /// Calorie target after the goal adjustment
    pub fn target_calories(&self) -> Result<Decimal> {
        let tdee = self.tdee()?;
        match self.goal {
            Goal::Cut => checked_product(tdee, dec!(0.85)),
            Goal::Maintain => Ok(tdee),
            Goal::Gain => checked_product(tdee, dec!(1.15)),
        }
    }

    pub fn plan(&self) -> Result<EnergyPlan> {
        self.validate()?;

        let bmr = self.bmr()?;
        let tdee = self.tdee()?;
        let calories = self.target_calories()?;

        let protein_g = round_grams(checked_product(dec!(2.2), self.weight_kg)?)?;
        let carbs_g = round_grams(checked_product(self.diet.carbs_g_per_kg(), self.weight_kg)?)?;
        let fat_g = round_grams(remaining_fat_g(calories, protein_g, carbs_g)?)?;

        let macros = MacroPlan {
            calories: round_grams(calories)?,
            protein_g,
            carbs_g,
            fat_g,
        };

        debug!(
            %bmr,
            %tdee,
            calories = macros.calories,
            diet = ?self.diet,
            "Energy plan computed"
        );

        Ok(EnergyPlan {
            bmr,
            tdee,
            macros,
        })
    }
}
