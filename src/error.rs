//! Unified error hierarchy for NutriRS
//!
//! Provides typed failures for every stage of the glucose analysis pipeline,
//! with severity levels that map onto the tracing system.

use thiserror::Error;

/// Top-level error type for all NutriRS operations
#[derive(Debug, Error)]
pub enum NutriRsError {
    /// Malformed clock time or glucose value
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Not enough readings to run an analysis
    #[error("Insufficient data: need at least {required} readings, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Goal string that is not one of cut, maintain or gain
    #[error("Invalid goal: {0:?} (expected cut, maintain or gain)")]
    InvalidGoal(String),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// Engine settings that cannot produce a meaningful analysis
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Input shape errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Clock time not shaped like HH:MM
    #[error("malformed clock time {input:?}: expected HH:MM")]
    MalformedTime { input: String },

    /// Clock time shaped correctly but outside 00:00..=23:59
    #[error("clock time {input:?} out of range: hour={hour}, minute={minute}")]
    TimeOutOfRange { input: String, hour: u32, minute: u32 },

    /// Glucose value that is not an integer
    #[error("malformed glucose value {input:?}: expected integer mg/dL")]
    MalformedGlucose { input: String },
}

/// Calculation errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Insufficient data for calculation
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },

    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// Numerical overflow
    #[error("Numerical overflow in {calculation}")]
    Overflow { calculation: String },
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Missing required data
    #[error("Missing required data: {field}")]
    MissingData { field: String },
}

/// Result type alias for NutriRS operations
pub type Result<T> = std::result::Result<T, NutriRsError>;

impl CalculationError {
    pub(crate) fn invalid_parameter(
        calculation: &str,
        parameter: &str,
        value: impl std::fmt::Display,
    ) -> Self {
        CalculationError::InvalidParameter {
            calculation: calculation.to_string(),
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn overflow(calculation: &str) -> Self {
        CalculationError::Overflow {
            calculation: calculation.to_string(),
        }
    }
}

impl NutriRsError {
    /// Whether the caller can fix the failure by correcting its input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            NutriRsError::Format(_)
                | NutriRsError::InsufficientData { .. }
                | NutriRsError::InvalidGoal(_)
                | NutriRsError::Calculation(CalculationError::InvalidParameter { .. })
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            NutriRsError::Format(_) => ErrorSeverity::Warning,
            NutriRsError::InsufficientData { .. } => ErrorSeverity::Warning,
            NutriRsError::InvalidGoal(_) => ErrorSeverity::Warning,
            NutriRsError::Calculation(CalculationError::Overflow { .. }) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            NutriRsError::Format(FormatError::MalformedTime { input }) => {
                format!("Times must be written as HH:MM (for example 09:00), got {:?}", input)
            }
            NutriRsError::Format(FormatError::TimeOutOfRange { input, .. }) => {
                format!("{:?} is not a valid time of day", input)
            }
            NutriRsError::InsufficientData { required, .. } => {
                format!("Not enough glucose data. Please provide at least {} readings.", required)
            }
            NutriRsError::InvalidGoal(goal) => {
                format!("Unknown goal {:?}. Choose one of: cut, maintain, gain.", goal)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Internal failure that should never happen with sane input
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Rejected input
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
