use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::models::MacroPlan;
use crate::profile::DietType;

/// Meals in a sample day
pub const MEALS_PER_DAY: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MealPlanError {
    #[error("Not enough allergy-safe meals: {available} available, {required} required")]
    NotEnoughMeals { available: usize, required: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Allergen {
    Gluten,
    Dairy,
    Eggs,
    Soy,
    Nuts,
    Shellfish,
}

impl Allergen {
    pub fn name(&self) -> &'static str {
        match self {
            Allergen::Gluten => "gluten",
            Allergen::Dairy => "dairy",
            Allergen::Eggs => "eggs",
            Allergen::Soy => "soy",
            Allergen::Nuts => "nuts",
            Allergen::Shellfish => "shellfish",
        }
    }

    /// Matches when the allergen name appears anywhere in the description
    pub fn found_in(&self, description: &str) -> bool {
        description.to_lowercase().contains(self.name())
    }
}

impl FromStr for Allergen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gluten" => Ok(Allergen::Gluten),
            "dairy" => Ok(Allergen::Dairy),
            "eggs" | "egg" => Ok(Allergen::Eggs),
            "soy" => Ok(Allergen::Soy),
            "nuts" | "nut" => Ok(Allergen::Nuts),
            "shellfish" => Ok(Allergen::Shellfish),
            _ => Err(format!("Invalid allergen: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub const ALL: [MealSlot; MEALS_PER_DAY] =
        [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner, MealSlot::Snack];

    /// Share of the daily (protein, carbs, fat) assigned to this slot
    pub fn shares(&self) -> (Decimal, Decimal, Decimal) {
        match self {
            MealSlot::Breakfast => (dec!(0.3), dec!(0.25), dec!(0.3)),
            MealSlot::Lunch | MealSlot::Dinner => (dec!(0.3), dec!(0.3), dec!(0.3)),
            MealSlot::Snack => (dec!(0.1), dec!(0.15), dec!(0.1)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snack => "Snack",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMeal {
    pub slot: MealSlot,
    pub description: String,
    pub protein_g: i64,
    pub carbs_g: i64,
    pub fat_g: i64,
}

/// Candidate meals for a diet; diets without their own menu use the balanced one
pub fn menu_for(diet: DietType) -> &'static [&'static str] {
    match diet {
        DietType::Keto => &[
            "Eggs cooked in butter with spinach and avocado",
            "Grilled salmon with olive oil, zucchini, and cauliflower mash",
            "Lamb chops with asparagus and creamy mushrooms",
            "Almond butter protein shake",
        ],
        DietType::Vegetarian => &[
            "Tofu scramble with sweet potato and spinach",
            "Chickpea salad with olive oil and roasted peppers",
            "Lentil curry with rice and steamed greens",
            "Greek yogurt with berries and seeds",
        ],
        DietType::Carnivore => &[
            "Steak and eggs",
            "Chicken thighs with bone broth",
            "Pork belly with hard boiled eggs",
            "Whey protein shake with beef collagen",
        ],
        _ => &[
            "Scrambled eggs with spinach and avocado",
            "Grilled chicken breast, quinoa, and roasted vegetables",
            "Salmon filet with asparagus and olive oil",
            "Protein shake with almond butter",
        ],
    }
}

/// Build a four-meal day from the menu, skipping meals that mention an allergen
pub fn sample_day(
    diet: DietType,
    allergies: &[Allergen],
    plan: &MacroPlan,
) -> Result<Vec<PlannedMeal>, MealPlanError> {
    let safe: Vec<&str> = menu_for(diet)
        .iter()
        .copied()
        .filter(|meal| !allergies.iter().any(|allergen| allergen.found_in(meal)))
        .collect();

    if safe.len() < MEALS_PER_DAY {
        return Err(MealPlanError::NotEnoughMeals {
            available: safe.len(),
            required: MEALS_PER_DAY,
        });
    }

    Ok(MealSlot::ALL
        .iter()
        .zip(safe)
        .map(|(slot, description)| {
            let (protein, carbs, fat) = slot.shares();
            PlannedMeal {
                slot: *slot,
                description: description.to_string(),
                protein_g: portion(plan.protein_g, protein),
                carbs_g: portion(plan.carbs_g, carbs),
                fat_g: portion(plan.fat_g, fat),
            }
        })
        .collect())
}

fn portion(grams: i64, share: Decimal) -> i64 {
    (Decimal::from(grams) * share).trunc().to_i64().unwrap_or(0)
}

/// Macronutrient content of one food serving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodMacros {
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
}

/// How closely a food fits one of four equal meals, 0 to 100
///
/// Each macro contributes up to 33 points of penalty in proportion to its
/// relative miss against a quarter of the daily target. `None` when any
/// daily target is zero or negative.
pub fn match_score(food: &FoodMacros, plan: &MacroPlan) -> Option<u8> {
    let quarter = |grams: i64| Decimal::from(grams) / dec!(4);
    let targets = [
        (food.protein_g, quarter(plan.protein_g)),
        (food.carbs_g, quarter(plan.carbs_g)),
        (food.fat_g, quarter(plan.fat_g)),
    ];

    if targets.iter().any(|(_, target)| *target <= Decimal::ZERO) {
        return None;
    }

    let penalty: Decimal = targets
        .iter()
        .map(|(actual, target)| (*actual - *target).abs() / *target * dec!(33))
        .sum();

    let score = (dec!(100) - penalty)
        .max(Decimal::ZERO)
        .min(dec!(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);

    score.to_u8()
}
