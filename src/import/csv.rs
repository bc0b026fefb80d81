use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use super::{has_extension, ReadingImporter, ReadingSet};
use crate::clock::parse_clock_time;
use crate::error::{FormatError, ImportExportError};
use crate::models::Reading;

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(&mut column_mapping, "time", &["time", "timestamp", "clock"]);
        Self::add_mapping(
            &mut column_mapping,
            "glucose",
            &["glucose", "value", "sgv", "bg", "glucose_mg_dl", "glucose_mgdl"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.to_lowercase().replace([' ', '-', '/'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn column_index(&self, headers: &StringRecord, standard: &str) -> Result<usize> {
        headers
            .iter()
            .position(|header| self.normalize_column_name(header) == standard)
            .ok_or_else(|| {
                ImportExportError::MissingData {
                    field: format!("{} column", standard),
                }
                .into()
            })
    }

    /// Read readings from any CSV source with a header row
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<Vec<Reading>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let time_idx = self.column_index(&headers, "time")?;
        let glucose_idx = self.column_index(&headers, "glucose")?;

        let mut readings = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            // Header is line 1
            let line = row + 2;
            let record = record.with_context(|| format!("Failed to read CSV line {}", line))?;

            let time = record.get(time_idx).unwrap_or_default();
            let glucose = record.get(glucose_idx).unwrap_or_default();

            let time = parse_clock_time(time).with_context(|| format!("Invalid time on CSV line {}", line))?;
            let glucose = glucose
                .parse::<i32>()
                .map_err(|_| FormatError::MalformedGlucose {
                    input: glucose.to_string(),
                })
                .with_context(|| format!("Invalid glucose on CSV line {}", line))?;

            readings.push(Reading::new(time, glucose));
        }

        Ok(readings)
    }
}

impl ReadingImporter for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<ReadingSet> {
        let file = std::fs::File::open(file_path)
            .with_context(|| format!("Failed to open CSV file: {}", file_path.display()))?;
        let readings = self
            .import_reader(file)
            .with_context(|| format!("Failed to import CSV file: {}", file_path.display()))?;

        Ok(ReadingSet::from_readings(readings))
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}
