use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Goal, MacroPlan};

/// Template set used to phrase an explanation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationStyle {
    /// Full sentences, one per line
    #[default]
    Detailed,
    /// Terse sentences on a single line
    Brief,
}

impl ExplanationStyle {
    pub fn delimiter(&self) -> &'static str {
        match self {
            ExplanationStyle::Detailed => "\n",
            ExplanationStyle::Brief => " ",
        }
    }
}

impl std::str::FromStr for ExplanationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "detailed" => Ok(ExplanationStyle::Detailed),
            "brief" => Ok(ExplanationStyle::Brief),
            _ => Err(format!("Invalid explanation style: {}", s)),
        }
    }
}

/// Three-way reading of time in range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityBand {
    Stable,
    Moderate,
    Unstable,
}

impl StabilityBand {
    pub fn from_tir(tir: Decimal) -> Self {
        if tir >= dec!(80) {
            StabilityBand::Stable
        } else if tir >= dec!(60) {
            StabilityBand::Moderate
        } else {
            StabilityBand::Unstable
        }
    }
}

/// Closing piece of advice, chosen in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingAdvice {
    ReduceGlycemicLoad,
    EatConsistently,
    DoingWell,
}

impl ClosingAdvice {
    pub fn select(tir: Decimal, spike_count: usize, low_count: usize) -> Self {
        if tir < dec!(60) || spike_count > 1 {
            ClosingAdvice::ReduceGlycemicLoad
        } else if low_count > 0 {
            ClosingAdvice::EatConsistently
        } else {
            ClosingAdvice::DoingWell
        }
    }
}

/// Ordered sentences explaining a prescription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub sentences: Vec<String>,
    pub style: ExplanationStyle,
}

impl Explanation {
    /// Sentences joined with the style's delimiter
    pub fn text(&self) -> String {
        self.sentences.join(self.style.delimiter())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Deterministic template-driven explainer
#[derive(Debug, Clone)]
pub struct Explainer {
    style: ExplanationStyle,
    protein_g_per_kg: Decimal,
}

impl Default for Explainer {
    fn default() -> Self {
        Explainer {
            style: ExplanationStyle::default(),
            protein_g_per_kg: dec!(2.2),
        }
    }
}

impl Explainer {
    pub fn new(style: ExplanationStyle) -> Self {
        Explainer {
            style,
            ..Self::default()
        }
    }

    /// Protein ratio quoted in the macro sentence
    pub fn with_protein_ratio(mut self, protein_g_per_kg: Decimal) -> Self {
        self.protein_g_per_kg = protein_g_per_kg;
        self
    }

    pub fn explain(
        &self,
        tir: Decimal,
        spike_count: usize,
        low_count: usize,
        goal: Goal,
        plan: &MacroPlan,
        bodyweight_kg: Decimal,
    ) -> Explanation {
        let tir_text = format!("{:.1}", tir);
        let weight = bodyweight_kg.normalize();
        let ratio = self.protein_g_per_kg.normalize();
        let band = StabilityBand::from_tir(tir);
        let advice = ClosingAdvice::select(tir, spike_count, low_count);

        let mut sentences = Vec::with_capacity(6);

        match self.style {
            ExplanationStyle::Detailed => {
                sentences.push(match band {
                    StabilityBand::Stable => {
                        format!("Your glucose was stable today with {}% time in range.", tir_text)
                    }
                    StabilityBand::Moderate => {
                        format!("Your glucose stability was moderate, with {}% time in range.", tir_text)
                    }
                    StabilityBand::Unstable => {
                        format!("Your glucose was unstable today with only {}% in range.", tir_text)
                    }
                });

                if spike_count > 0 {
                    sentences.push(format!(
                        "{} spike(s) were detected, suggesting high post-meal blood sugar.",
                        spike_count
                    ));
                }
                if low_count > 0 {
                    sentences.push(format!(
                        "{} low glucose episode(s) were detected, indicating a risk of hypoglycemia.",
                        low_count
                    ));
                }
                if spike_count == 0 && low_count == 0 {
                    sentences.push(
                        "No glucose spikes or lows were recorded, indicating excellent control.".to_string(),
                    );
                }

                sentences.push(match goal {
                    Goal::Cut => format!(
                        "You're in a fat-loss phase. Calories are set to slightly below maintenance at ~{} kcal.",
                        plan.calories
                    ),
                    Goal::Gain => format!(
                        "You're in a muscle gain phase. Calories are slightly elevated to support lean mass growth (~{} kcal).",
                        plan.calories
                    ),
                    Goal::Maintain => format!(
                        "You're maintaining your current bodyweight. Calories are set around maintenance (~{} kcal).",
                        plan.calories
                    ),
                });

                sentences.push(format!(
                    "Protein is set at {}g ({}g/kg for {} kg), carbs at {}g (adjusted for stability), \
                     and fats at {}g to complete the energy balance.",
                    plan.protein_g, ratio, weight, plan.carbs_g, plan.fat_g
                ));

                sentences.push(
                    match advice {
                        ClosingAdvice::ReduceGlycemicLoad => {
                            "Focus on lower-glycemic carbs, increase vegetable fiber, and eat slower-digesting meals."
                        }
                        ClosingAdvice::EatConsistently => {
                            "Try to eat more consistently and avoid fasting for long periods."
                        }
                        ClosingAdvice::DoingWell => {
                            "Keep doing what you're doing, today's glucose profile looks good."
                        }
                    }
                    .to_string(),
                );
            }
            ExplanationStyle::Brief => {
                let label = match band {
                    StabilityBand::Stable => "stable",
                    StabilityBand::Moderate => "moderate",
                    StabilityBand::Unstable => "unstable",
                };
                sentences.push(format!("Your glucose was {} with {}% time in range.", label, tir_text));

                if spike_count > 0 {
                    sentences.push(format!("{} spike(s) detected.", spike_count));
                }
                if low_count > 0 {
                    sentences.push(format!("{} low(s) detected.", low_count));
                }
                if spike_count == 0 && low_count == 0 {
                    sentences.push("No spikes or lows recorded.".to_string());
                }

                sentences.push(match goal {
                    Goal::Cut => format!("Fat-loss goal: calories set to ~{} kcal.", plan.calories),
                    Goal::Gain => format!("Muscle gain goal: slight surplus ~{} kcal.", plan.calories),
                    Goal::Maintain => format!("Maintenance goal: ~{} kcal.", plan.calories),
                });

                sentences.push(format!(
                    "Protein: {}g ({}g/kg for {}kg), Carbs: {}g, Fat: {}g.",
                    plan.protein_g,
                    ratio,
                    float_text(weight),
                    plan.carbs_g,
                    plan.fat_g
                ));

                sentences.push(
                    match advice {
                        ClosingAdvice::ReduceGlycemicLoad => "Focus on low-glycemic carbs and higher fiber.",
                        ClosingAdvice::EatConsistently => "Eat more consistently, avoid skipping meals.",
                        ClosingAdvice::DoingWell => "Well done, glucose looks well controlled today.",
                    }
                    .to_string(),
                );
            }
        }

        Explanation {
            sentences,
            style: self.style,
        }
    }
}

/// Render a measured value the way a float prints: always with a fractional part
fn float_text(value: Decimal) -> String {
    let value = value.normalize();
    if value.scale() == 0 {
        format!("{}.0", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_plan() -> MacroPlan {
        MacroPlan {
            calories: 2250,
            protein_g: 165,
            carbs_g: 150,
            fat_g: 110,
        }
    }

    #[test]
    fn test_stability_bands() {
        assert_eq!(StabilityBand::from_tir(dec!(80)), StabilityBand::Stable);
        assert_eq!(StabilityBand::from_tir(dec!(79.9)), StabilityBand::Moderate);
        assert_eq!(StabilityBand::from_tir(dec!(60)), StabilityBand::Moderate);
        assert_eq!(StabilityBand::from_tir(dec!(59.9)), StabilityBand::Unstable);
    }

    #[test]
    fn test_closing_advice_priority() {
        assert_eq!(ClosingAdvice::select(dec!(50), 0, 0), ClosingAdvice::ReduceGlycemicLoad);
        assert_eq!(ClosingAdvice::select(dec!(90), 2, 1), ClosingAdvice::ReduceGlycemicLoad);
        assert_eq!(ClosingAdvice::select(dec!(90), 1, 1), ClosingAdvice::EatConsistently);
        assert_eq!(ClosingAdvice::select(dec!(90), 1, 0), ClosingAdvice::DoingWell);
    }

    #[test]
    fn test_detailed_reference_explanation() {
        let explanation =
            Explainer::default().explain(dec!(62.5), 3, 1, Goal::Maintain, &reference_plan(), dec!(75));

        assert_eq!(
            explanation.sentences,
            vec![
                "Your glucose stability was moderate, with 62.5% time in range.",
                "3 spike(s) were detected, suggesting high post-meal blood sugar.",
                "1 low glucose episode(s) were detected, indicating a risk of hypoglycemia.",
                "You're maintaining your current bodyweight. Calories are set around maintenance (~2250 kcal).",
                "Protein is set at 165g (2.2g/kg for 75 kg), carbs at 150g (adjusted for stability), \
                 and fats at 110g to complete the energy balance.",
                "Focus on lower-glycemic carbs, increase vegetable fiber, and eat slower-digesting meals.",
            ]
        );
        assert_eq!(explanation.text().lines().count(), 6);
    }

    #[test]
    fn test_brief_explanation_joined_by_space() {
        let plan = MacroPlan {
            calories: 2080,
            protein_g: 176,
            carbs_g: 240,
            fat_g: 28,
        };
        let explanation = Explainer::new(ExplanationStyle::Brief).explain(dec!(100), 0, 0, Goal::Cut, &plan, dec!(80));

        assert_eq!(
            explanation.text(),
            "Your glucose was stable with 100.0% time in range. No spikes or lows recorded. \
             Fat-loss goal: calories set to ~2080 kcal. \
             Protein: 176g (2.2g/kg for 80.0kg), Carbs: 240g, Fat: 28g. \
             Well done, glucose looks well controlled today."
        );
    }

    #[test]
    fn test_no_events_sentence_replaces_counts() {
        let explanation =
            Explainer::default().explain(dec!(85), 0, 0, Goal::Gain, &reference_plan(), dec!(75));

        assert!(explanation.sentences[0].contains("stable today with 85.0%"));
        assert!(explanation.sentences[1].starts_with("No glucose spikes or lows"));
        assert!(explanation.sentences[2].contains("muscle gain phase"));
        assert!(explanation.sentences[2].contains("~2250 kcal"));
        assert!(explanation.sentences.last().unwrap().starts_with("Keep doing"));
        assert_eq!(explanation.sentences.len(), 5);
    }

    #[test]
    fn test_unstable_with_lows_only() {
        let explanation =
            Explainer::new(ExplanationStyle::Brief).explain(dec!(45.5), 0, 3, Goal::Cut, &reference_plan(), dec!(72.5));

        assert_eq!(explanation.sentences[0], "Your glucose was unstable with 45.5% time in range.");
        assert_eq!(explanation.sentences[1], "3 low(s) detected.");
        assert!(explanation.sentences[3].contains("for 72.5kg"));
        assert_eq!(explanation.sentences[4], "Focus on low-glycemic carbs and higher fiber.");
    }

    #[test]
    fn test_brief_weight_keeps_fraction() {
        assert_eq!(float_text(dec!(75)), "75.0");
        assert_eq!(float_text(dec!(75.50)), "75.5");
        assert_eq!(float_text(dec!(82.25)), "82.25");
    }

    #[test]
    fn test_explanation_is_deterministic() {
        let explainer = Explainer::default();
        let a = explainer.explain(dec!(70), 1, 1, Goal::Maintain, &reference_plan(), dec!(75));
        let b = explainer.explain(dec!(70), 1, 1, Goal::Maintain, &reference_plan(), dec!(75));
        assert_eq!(a, b);
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("brief".parse::<ExplanationStyle>().unwrap(), ExplanationStyle::Brief);
        assert_eq!("Detailed".parse::<ExplanationStyle>().unwrap(), ExplanationStyle::Detailed);
        assert!("verbose".parse::<ExplanationStyle>().is_err());
    }
}
