//! Macronutrient prescription from bodyweight, goal and glycemic stability
//!
//! Calories come from a per-kilogram multiplier chosen by goal. Protein is a
//! fixed ratio of bodyweight. The carbohydrate ratio drops as glucose control
//! worsens:
//! - time in range below the floor, or any low: restricted ratio (2.0 g/kg)
//! - otherwise any spike: moderate ratio (2.5 g/kg)
//! - otherwise: full ratio (3.0 g/kg)
//!
//! Fat takes whatever energy is left. Every rounding step is half-to-even on
//! exact decimal values, and fat is rounded last so it absorbs the remainder.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CalculationError, NutriRsError, Result};
use crate::models::{Goal, MacroPlan};

/// How unrecognized goal strings are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPolicy {
    /// Reject anything other than cut, maintain or gain
    #[default]
    Strict,
    /// Price unknown goals as maintain
    Legacy,
}

impl Goal {
    /// Resolve a user-supplied goal string under `policy`
    pub fn resolve(input: &str, policy: GoalPolicy) -> Result<Goal> {
        match input.parse::<Goal>() {
            Ok(goal) => Ok(goal),
            Err(err) => match policy {
                GoalPolicy::Strict => Err(err),
                GoalPolicy::Legacy => {
                    warn!(goal = input, "Unknown goal, falling back to maintain");
                    Ok(Goal::Maintain)
                }
            },
        }
    }
}

/// Carbohydrate tier selected from glycemic stability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarbTier {
    Restricted,
    Moderate,
    Full,
}

/// Tunable factors for the macro calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroRules {
    pub cut_kcal_per_kg: Decimal,
    pub maintain_kcal_per_kg: Decimal,
    pub gain_kcal_per_kg: Decimal,

    /// Protein grams per kilogram of bodyweight
    pub protein_g_per_kg: Decimal,

    /// Carb grams per kilogram when control is poor (low TIR or any low)
    pub restricted_carbs_g_per_kg: Decimal,

    /// Carb grams per kilogram when spikes were seen
    pub moderate_carbs_g_per_kg: Decimal,

    /// Carb grams per kilogram when no events were seen
    pub full_carbs_g_per_kg: Decimal,

    /// Time in range below this percentage restricts carbohydrates
    pub tir_floor: Decimal,
}

impl Default for MacroRules {
    fn default() -> Self {
        MacroRules {
            cut_kcal_per_kg: Goal::Cut.default_calories_per_kg(),
            maintain_kcal_per_kg: Goal::Maintain.default_calories_per_kg(),
            gain_kcal_per_kg: Goal::Gain.default_calories_per_kg(),
            protein_g_per_kg: dec!(2.2),
            restricted_carbs_g_per_kg: dec!(2.0),
            moderate_carbs_g_per_kg: dec!(2.5),
            full_carbs_g_per_kg: dec!(3.0),
            tir_floor: dec!(60),
        }
    }
}

impl MacroRules {
    pub fn kcal_per_kg(&self, goal: Goal) -> Decimal {
        match goal {
            Goal::Cut => self.cut_kcal_per_kg,
            Goal::Maintain => self.maintain_kcal_per_kg,
            Goal::Gain => self.gain_kcal_per_kg,
        }
    }

    pub fn carb_tier(&self, tir: Decimal, spike_count: usize, low_count: usize) -> CarbTier {
        if tir < self.tir_floor || low_count > 0 {
            CarbTier::Restricted
        } else if spike_count > 0 {
            CarbTier::Moderate
        } else {
            CarbTier::Full
        }
    }

    pub fn carbs_g_per_kg(&self, tier: CarbTier) -> Decimal {
        match tier {
            CarbTier::Restricted => self.restricted_carbs_g_per_kg,
            CarbTier::Moderate => self.moderate_carbs_g_per_kg,
            CarbTier::Full => self.full_carbs_g_per_kg,
        }
    }
}

/// Rule-based macro calculator
#[derive(Debug, Clone, Default)]
pub struct MacroCalculator {
    rules: MacroRules,
}

impl MacroCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: MacroRules) -> Self {
        MacroCalculator { rules }
    }

    pub fn rules(&self) -> &MacroRules {
        &self.rules
    }

    /// Compute the daily prescription
    pub fn compute(
        &self,
        bodyweight_kg: Decimal,
        goal: Goal,
        tir: Decimal,
        spike_count: usize,
        low_count: usize,
    ) -> Result<MacroPlan> {
        if bodyweight_kg <= Decimal::ZERO {
            return Err(CalculationError::invalid_parameter("macros", "bodyweight_kg", bodyweight_kg).into());
        }

        let calories = checked_product(self.rules.kcal_per_kg(goal), bodyweight_kg)?;

        let protein_g = round_grams(checked_product(self.rules.protein_g_per_kg, bodyweight_kg)?)?;
        let tier = self.rules.carb_tier(tir, spike_count, low_count);
        let carbs_g = round_grams(checked_product(self.rules.carbs_g_per_kg(tier), bodyweight_kg)?)?;

        let fat_g = round_grams(remaining_fat_g(calories, protein_g, carbs_g)?)?;

        let plan = MacroPlan {
            calories: round_grams(calories)?,
            protein_g,
            carbs_g,
            fat_g,
        };

        debug!(
            %goal,
            ?tier,
            calories = plan.calories,
            protein_g,
            carbs_g,
            fat_g,
            "Macro plan computed"
        );

        Ok(plan)
    }
}

/// Compute macros with the default rules
pub fn compute_macros(
    bodyweight_kg: Decimal,
    goal: Goal,
    tir: Decimal,
    spike_count: usize,
    low_count: usize,
) -> Result<MacroPlan> {
    MacroCalculator::new().compute(bodyweight_kg, goal, tir, spike_count, low_count)
}

/// Warnings for prescriptions that cannot be eaten as written
pub fn plausibility_warnings(plan: &MacroPlan) -> Vec<String> {
    let mut warnings = Vec::new();

    if plan.fat_g < 0 {
        let overshoot = plan
            .protein_g
            .saturating_add(plan.carbs_g)
            .saturating_mul(4)
            .saturating_sub(plan.calories);
        warnings.push(format!(
            "Implausible macro split: protein and carbohydrate exceed the {} kcal target by {} kcal, leaving {} g fat",
            plan.calories, overshoot, plan.fat_g
        ));
    }

    warnings
}

pub(crate) fn checked_product(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_mul(rhs)
        .ok_or_else(|| NutriRsError::from(CalculationError::overflow("macros")))
}

/// Fat grams left once protein and carbohydrate energy are taken out
pub(crate) fn remaining_fat_g(calories: Decimal, protein_g: i64, carbs_g: i64) -> Result<Decimal> {
    let lean_kcal = protein_g
        .checked_add(carbs_g)
        .map(Decimal::from)
        .and_then(|grams| grams.checked_mul(dec!(4)))
        .and_then(|kcal| calories.checked_sub(kcal))
        .ok_or_else(|| NutriRsError::from(CalculationError::overflow("macros")))?;
    Ok(lean_kcal / dec!(9))
}

pub(crate) fn round_grams(value: Decimal) -> Result<i64> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .ok_or_else(|| NutriRsError::from(CalculationError::overflow("macros")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_reference_maintain_plan() {
        let plan = compute_macros(dec!(75), Goal::Maintain, dec!(62.5), 3, 1).unwrap();

        assert_eq!(plan.calories, 2250);
        assert_eq!(plan.protein_g, 165);
        assert_eq!(plan.carbs_g, 150);
        assert_eq!(plan.fat_g, 110);
        assert_eq!(plan.energy_from_macros(), 2250);
    }

    #[test]
    fn test_huge_bodyweight_overflows_cleanly() {
        let bodyweight = Decimal::from_str("10000000000000000000000000000").unwrap();

        for goal in [Goal::Cut, Goal::Maintain, Goal::Gain] {
            assert!(matches!(
                compute_macros(bodyweight, goal, dec!(90), 0, 0),
                Err(NutriRsError::Calculation(CalculationError::Overflow { .. }))
            ));
        }
    }

    #[test]
    fn test_goal_multipliers() {
        let cut = compute_macros(dec!(80), Goal::Cut, dec!(90), 0, 0).unwrap();
        assert_eq!(cut.calories, 2080);

        let gain = compute_macros(dec!(80), Goal::Gain, dec!(90), 0, 0).unwrap();
        assert_eq!(gain.calories, 2640);
    }

    #[test]
    fn test_carb_tier_priority() {
        let rules = MacroRules::default();

        // Low TIR wins over everything
        assert_eq!(rules.carb_tier(dec!(59.9), 3, 0), CarbTier::Restricted);
        // Any low wins over spikes
        assert_eq!(rules.carb_tier(dec!(95), 3, 1), CarbTier::Restricted);
        assert_eq!(rules.carb_tier(dec!(60), 1, 0), CarbTier::Moderate);
        assert_eq!(rules.carb_tier(dec!(60), 0, 0), CarbTier::Full);
    }

    #[test]
    fn test_carb_grams_by_tier() {
        let restricted = compute_macros(dec!(70), Goal::Maintain, dec!(50), 0, 0).unwrap();
        assert_eq!(restricted.carbs_g, 140);

        let moderate = compute_macros(dec!(70), Goal::Maintain, dec!(85), 1, 0).unwrap();
        assert_eq!(moderate.carbs_g, 175);

        let full = compute_macros(dec!(70), Goal::Maintain, dec!(85), 0, 0).unwrap();
        assert_eq!(full.carbs_g, 210);
    }

    #[test]
    fn test_fractional_bodyweight_rounds_half_even() {
        // 2.2 * 72.5 = 159.5 rounds to 160, 2.5 * 72.5 = 181.25 rounds to 181
        let plan = compute_macros(dec!(72.5), Goal::Maintain, dec!(90), 1, 0).unwrap();
        assert_eq!(plan.protein_g, 160);
        assert_eq!(plan.carbs_g, 181);
        assert_eq!(plan.calories, 2175);
    }

    #[test]
    fn test_negative_fat_is_reproduced() {
        let rules = MacroRules {
            cut_kcal_per_kg: dec!(15),
            ..MacroRules::default()
        };
        let plan = MacroCalculator::with_rules(rules)
            .compute(dec!(80), Goal::Cut, dec!(95), 0, 0)
            .unwrap();

        // 1200 kcal target, protein 176 g (704 kcal), carbs 240 g (960 kcal)
        assert_eq!(plan.calories, 1200);
        assert_eq!(plan.fat_g, -52);
        assert!(!plan.is_plausible());

        let warnings = plausibility_warnings(&plan);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Implausible macro split"));
        assert!(warnings[0].contains("464 kcal"));
    }

    #[test]
    fn test_non_positive_bodyweight_rejected() {
        let result = compute_macros(dec!(0), Goal::Maintain, dec!(90), 0, 0);
        assert!(matches!(
            result,
            Err(NutriRsError::Calculation(CalculationError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn test_goal_resolution_policies() {
        assert_eq!(Goal::resolve("gain", GoalPolicy::Strict).unwrap(), Goal::Gain);
        assert!(matches!(
            Goal::resolve("recomp", GoalPolicy::Strict),
            Err(NutriRsError::InvalidGoal(_))
        ));
        assert_eq!(Goal::resolve("recomp", GoalPolicy::Legacy).unwrap(), Goal::Maintain);
        assert_eq!(Goal::resolve("cut", GoalPolicy::Legacy).unwrap(), Goal::Cut);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_energy_invariant(
            tenths in 300i64..2000i64,
            goal_index in 0usize..3,
            tir_tenths in 0i64..=1000i64,
            spikes in 0usize..5,
            lows in 0usize..5
        ) {
            let bodyweight = Decimal::new(tenths, 1);
            let goal = [Goal::Cut, Goal::Maintain, Goal::Gain][goal_index];
            let tir = Decimal::new(tir_tenths, 1);

            let plan = compute_macros(bodyweight, goal, tir, spikes, lows).unwrap();

            // Fat rounding leaves at most 4.5 kcal, calorie rounding 0.5 kcal
            prop_assert!((plan.energy_from_macros() - plan.calories).abs() <= 5);
            prop_assert!(plan.protein_g > 0);
            prop_assert!(plan.carbs_g > 0);

            // Same inputs, same output
            prop_assert_eq!(plan, compute_macros(bodyweight, goal, tir, spikes, lows).unwrap());
        }
    }
}
