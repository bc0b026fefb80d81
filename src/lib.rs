// Library interface for NutriRS modules
// This allows integration tests and benches to access the core functionality

pub mod analysis;
pub mod assistant;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod explainer;
pub mod export;
pub mod guidance;
pub mod import;
pub mod logging;
pub mod meals;
pub mod models;
pub mod nutrition;
pub mod profile;
pub mod range;

// Re-export commonly used types for convenience
pub use analysis::{AnalysisConfig, AnalysisReport, AnalysisRequest, BatchEntry, GlucoseAnalyzer};
pub use assistant::{respond, Topic};
pub use clock::{minutes_between, parse_clock_time, ClockTime};
pub use error::{CalculationError, FormatError, NutriRsError, Result};
pub use events::{detect_events, DetectionThresholds, EventDetector, GlycemicEvents};
pub use explainer::{Explainer, Explanation, ExplanationStyle};
pub use guidance::{daily_guidance, DailyGuidance, GuidanceCategory};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use nutrition::{compute_macros, GoalPolicy, MacroCalculator, MacroRules};
pub use range::{time_in_range, RangeBand, RangeSummary};
