use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analysis::AnalysisRequest;
use crate::models::{Goal, Reading};

pub mod csv;
pub mod inline;
pub mod json;

pub use inline::parse_inline_readings;

/// Readings loaded from one source, with any profile data the source carried
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSet {
    pub readings: Vec<Reading>,
    pub bodyweight_kg: Option<Decimal>,
    pub goal: Option<String>,
}

impl ReadingSet {
    pub fn from_readings(readings: Vec<Reading>) -> Self {
        ReadingSet {
            readings,
            bodyweight_kg: None,
            goal: None,
        }
    }

    /// Build a request, preferring values carried by the source over the defaults
    pub fn into_request(self, default_bodyweight_kg: Decimal, default_goal: Goal) -> AnalysisRequest {
        AnalysisRequest::new(
            self.readings,
            self.bodyweight_kg.unwrap_or(default_bodyweight_kg),
            self.goal.unwrap_or_else(|| default_goal.to_string()),
        )
    }
}

/// Trait for importing glucose readings from different file formats
pub trait ReadingImporter: Send + Sync {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import readings from the file
    fn import_file(&self, file_path: &Path) -> Result<ReadingSet>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

pub(crate) fn has_extension(file_path: &Path, extension: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Dispatches files to the importer that understands them
pub struct ImportManager {
    importers: Vec<Box<dyn ReadingImporter>>,
    show_progress: bool,
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportManager {
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ReadingImporter>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(json::JsonImporter::new()),
        ];

        Self {
            importers,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<ReadingSet> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .with_context(|| format!("No importer found for file: {}", file_path.display()))?;

        debug!(
            file = %file_path.display(),
            format = importer.format_name(),
            "Importing readings"
        );
        importer.import_file(file_path)
    }

    /// Import every supported file in a directory
    ///
    /// Failures are reported per file rather than aborting the scan.
    pub fn import_directory(&self, dir_path: &Path) -> Result<Vec<(PathBuf, Result<ReadingSet>)>> {
        let files = self.collect_importable_files(dir_path)?;
        info!(dir = %dir_path.display(), files = files.len(), "Importing reading files");

        let pb = if self.show_progress {
            let pb = ProgressBar::new(files.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            if let Some(pb) = &pb {
                pb.set_message(
                    file.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                );
            }
            let result = self.import_file(&file);
            results.push((file, result));
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        Ok(results)
    }

    /// Supported files in a directory, sorted by path
    pub fn collect_importable_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir_path)
            .with_context(|| format!("Failed to read directory: {}", dir_path.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.importers.iter().any(|importer| importer.can_import(&path)) {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_manager_dispatches_by_extension() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("day.csv");
        let json_path = dir.path().join("day.json");
        fs::write(&csv_path, "time,glucose\n08:00,95\n09:00,142\n").unwrap();
        fs::write(&json_path, r#"[{"time": "08:00", "glucose": 95}]"#).unwrap();

        let manager = ImportManager::new();
        assert_eq!(manager.import_file(&csv_path).unwrap().readings.len(), 2);
        assert_eq!(manager.import_file(&json_path).unwrap().readings.len(), 1);
        assert!(manager.import_file(&dir.path().join("notes.txt")).is_err());
    }

    #[test]
    fn test_import_directory_reports_each_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "time,glucose\n08:00,95\n09:00,142\n").unwrap();
        fs::write(dir.path().join("b.csv"), "time,glucose\n8:00,95\n").unwrap();
        fs::write(dir.path().join("readme.md"), "ignored").unwrap();

        let results = ImportManager::new().import_directory(dir.path()).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].0.ends_with("a.csv"));
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[test]
    fn test_reading_set_into_request() {
        let set = ReadingSet {
            readings: Vec::new(),
            bodyweight_kg: Some(dec!(68)),
            goal: None,
        };
        let request = set.into_request(dec!(75), Goal::Cut);

        assert_eq!(request.bodyweight_kg, dec!(68));
        assert_eq!(request.goal, "cut");
    }
}
