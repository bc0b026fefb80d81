use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use super::{has_extension, ReadingImporter, ReadingSet};
use crate::models::Reading;

/// Accepted JSON layouts: a bare array, or a request-shaped object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonReadings {
    Bare(Vec<Reading>),
    Request {
        glucose_readings: Vec<Reading>,
        #[serde(default, with = "rust_decimal::serde::float_option")]
        bodyweight_kg: Option<Decimal>,
        #[serde(default)]
        goal: Option<String>,
    },
}

/// JSON importer
#[derive(Debug, Default)]
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        JsonImporter
    }

    pub fn import_str(&self, content: &str) -> Result<ReadingSet> {
        let parsed: JsonReadings =
            serde_json::from_str(content).with_context(|| "Failed to parse JSON readings")?;

        Ok(match parsed {
            JsonReadings::Bare(readings) => ReadingSet::from_readings(readings),
            JsonReadings::Request {
                glucose_readings,
                bodyweight_kg,
                goal,
            } => ReadingSet {
                readings: glucose_readings,
                bodyweight_kg,
                goal,
            },
        })
    }
}

impl ReadingImporter for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<ReadingSet> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read JSON file: {}", file_path.display()))?;

        self.import_str(&content)
            .with_context(|| format!("Failed to import JSON file: {}", file_path.display()))
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}
