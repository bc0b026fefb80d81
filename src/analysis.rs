//! End-to-end glucose analysis pipeline
//!
//! Readings flow through event detection and range scoring independently,
//! then into the macro calculator, and finally into the explainer and the
//! daily guidance. The analyzer holds configuration only; every call is a
//! pure function of its request.

use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::error::{NutriRsError, Result};
use crate::events::{DetectionThresholds, EventDetector};
use crate::explainer::{Explainer, ExplanationStyle};
use crate::guidance::{daily_guidance, DailyGuidance};
use crate::import::ReadingSet;
use crate::models::{Goal, LowEvent, MacroPlan, Reading, SpikeEvent};
use crate::nutrition::{plausibility_warnings, GoalPolicy, MacroCalculator, MacroRules};
use crate::range::{self, RangeBand, RangeSummary};

/// Fewest readings an analysis accepts
pub const MIN_READINGS: usize = 2;

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: DetectionThresholds,
    pub range: RangeBand,
    pub macros: MacroRules,
    pub goal_policy: GoalPolicy,
    pub explanation_style: ExplanationStyle,
}

impl AnalysisConfig {
    /// Reject settings under which detection or macro rules stop making sense
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> Result<()> { Err(NutriRsError::Configuration(message)) };

        if self.thresholds.spike_threshold <= 0 {
            return invalid(format!(
                "spike_threshold must be positive, got {}",
                self.thresholds.spike_threshold
            ));
        }
        if self.range.low > self.range.high {
            return invalid(format!(
                "range low {} is above range high {}",
                self.range.low, self.range.high
            ));
        }

        let rules = &self.macros;
        let ratios = [
            ("cut_kcal_per_kg", rules.cut_kcal_per_kg),
            ("maintain_kcal_per_kg", rules.maintain_kcal_per_kg),
            ("gain_kcal_per_kg", rules.gain_kcal_per_kg),
            ("protein_g_per_kg", rules.protein_g_per_kg),
            ("restricted_carbs_g_per_kg", rules.restricted_carbs_g_per_kg),
            ("moderate_carbs_g_per_kg", rules.moderate_carbs_g_per_kg),
            ("full_carbs_g_per_kg", rules.full_carbs_g_per_kg),
        ];
        if let Some((name, value)) = ratios.iter().find(|(_, value)| value.is_sign_negative()) {
            return invalid(format!("{} must not be negative, got {}", name, value));
        }
        if rules.tir_floor < Decimal::ZERO || rules.tir_floor > dec!(100) {
            return invalid(format!("tir_floor must be a percentage, got {}", rules.tir_floor));
        }

        Ok(())
    }
}

/// One day of readings plus the person they belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub glucose_readings: Vec<Reading>,

    #[serde(with = "rust_decimal::serde::float")]
    pub bodyweight_kg: Decimal,

    /// Raw goal string, resolved under the configured goal policy
    pub goal: String,
}

impl AnalysisRequest {
    pub fn new(glucose_readings: Vec<Reading>, bodyweight_kg: Decimal, goal: impl Into<String>) -> Self {
        AnalysisRequest {
            glucose_readings,
            bodyweight_kg,
            goal: goal.into(),
        }
    }
}

/// Everything derived from one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Time in range, percent with one decimal
    #[serde(with = "rust_decimal::serde::float")]
    pub tir: Decimal,

    pub spikes: Vec<SpikeEvent>,
    pub lows: Vec<LowEvent>,
    pub macros: MacroPlan,

    /// Explanation text joined for the configured style
    pub recommendation: String,

    pub guidance: DailyGuidance,
    pub range: RangeSummary,
    pub goal: Goal,

    #[serde(with = "rust_decimal::serde::float")]
    pub bodyweight_kg: Decimal,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// One file's outcome in a batch run
///
/// Serializes as `{"file", "report"}` on success and `{"file", "error"}` when
/// the file could not be imported or analyzed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub file: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AnalysisReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn analyzed(file: impl Into<String>, report: AnalysisReport) -> Self {
        BatchEntry {
            file: file.into(),
            report: Some(report),
            error: None,
        }
    }

    pub fn failed(file: impl Into<String>, error: impl Into<String>) -> Self {
        BatchEntry {
            file: file.into(),
            report: None,
            error: Some(error.into()),
        }
    }
}

/// Runs the full pipeline for a request
#[derive(Debug, Clone)]
pub struct GlucoseAnalyzer {
    config: AnalysisConfig,
    detector: EventDetector,
    calculator: MacroCalculator,
    explainer: Explainer,
}

impl Default for GlucoseAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl GlucoseAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        GlucoseAnalyzer {
            detector: EventDetector::with_thresholds(config.thresholds),
            calculator: MacroCalculator::with_rules(config.macros.clone()),
            explainer: Explainer::new(config.explanation_style)
                .with_protein_ratio(config.macros.protein_g_per_kg),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let readings = &request.glucose_readings;
        let span = info_span!("analyze", readings = readings.len(), goal = %request.goal);
        let _guard = span.enter();

        if readings.len() < MIN_READINGS {
            return Err(NutriRsError::InsufficientData {
                required: MIN_READINGS,
                actual: readings.len(),
            });
        }

        let goal = Goal::resolve(&request.goal, self.config.goal_policy)?;

        let events = self.detector.detect(readings);
        let range = range::summarize(readings, self.config.range)?;
        let tir = range.time_in_range;

        let macros = self.calculator.compute(
            request.bodyweight_kg,
            goal,
            tir,
            events.spike_count(),
            events.low_count(),
        )?;

        let explanation = self.explainer.explain(
            tir,
            events.spike_count(),
            events.low_count(),
            goal,
            &macros,
            request.bodyweight_kg,
        );
        let guidance = daily_guidance(tir, events.spike_count(), events.low_count());

        let mut warnings = Vec::new();
        if !is_chronological(readings) {
            warnings.push("Readings are not in chronological order; spikes are judged pair by pair as given".to_string());
        }
        warnings.extend(plausibility_warnings(&macros));
        for warning in &warnings {
            warn!("{}", warning);
        }

        info!(
            %tir,
            spikes = events.spike_count(),
            lows = events.low_count(),
            calories = macros.calories,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            tir,
            spikes: events.spikes,
            lows: events.lows,
            macros,
            recommendation: explanation.text(),
            guidance,
            range,
            goal,
            bodyweight_kg: request.bodyweight_kg,
            warnings,
        })
    }

    /// Analyze independent requests in parallel, preserving input order
    pub fn analyze_batch(&self, requests: &[AnalysisRequest]) -> Vec<Result<AnalysisReport>> {
        requests.par_iter().map(|request| self.analyze(request)).collect()
    }

    /// Analyze imported files, keeping import failures as entries, sorted by file
    pub fn analyze_imported(
        &self,
        imported: Vec<(String, anyhow::Result<ReadingSet>)>,
        default_bodyweight_kg: Decimal,
        default_goal: Goal,
    ) -> Vec<BatchEntry> {
        let mut entries = Vec::new();
        let mut names = Vec::new();
        let mut requests = Vec::new();

        for (file, result) in imported {
            match result {
                Ok(set) => {
                    names.push(file);
                    requests.push(set.into_request(default_bodyweight_kg, default_goal));
                }
                Err(err) => {
                    warn!(%file, "Import failed: {:#}", err);
                    entries.push(BatchEntry::failed(file, format!("{:#}", err)));
                }
            }
        }

        let results = self.analyze_batch(&requests);
        info!(files = names.len(), failed_imports = entries.len(), "Batch analysis complete");

        for (file, result) in names.into_iter().zip(results) {
            entries.push(match result {
                Ok(report) => BatchEntry::analyzed(file, report),
                Err(err) => BatchEntry::failed(file, err.user_message()),
            });
        }

        entries.sort_by(|a, b| a.file.cmp(&b.file));
        entries
    }
}

fn is_chronological(readings: &[Reading]) -> bool {
    readings.windows(2).all(|pair| pair[0].time <= pair[1].time)
}
