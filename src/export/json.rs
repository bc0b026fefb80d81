use super::ExportError;
use crate::analysis::AnalysisReport;
use std::io::Write;
use std::path::Path;

/// Export an analysis report to JSON format
pub fn export_report<P: AsRef<Path>>(report: &AnalysisReport, output_path: P) -> Result<(), ExportError> {
    export_json(report, output_path)
}

/// Export any serializable data structure to JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<(), ExportError>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let json_data =
        serde_json::to_string_pretty(data).map_err(|e| ExportError::SerializationError(e.to_string()))?;

    let mut file = std::fs::File::create(output_path)?;
    file.write_all(json_data.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisRequest, GlucoseAnalyzer};
    use crate::import::parse_inline_readings;
    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    #[test]
    fn test_export_report() {
        let readings = parse_inline_readings("08:00,95 09:00,142 10:00,135 11:00,66 12:00,102").unwrap();
        let report = GlucoseAnalyzer::default()
            .analyze(&AnalysisRequest::new(readings, dec!(75), "maintain"))
            .unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        export_report(&report, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"tir\": 60.0"));
        assert!(content.contains("\"start_time\": \"08:00\""));
        assert!(content.contains("\"calories\": 2250"));

        let back: AnalysisReport = serde_json::from_str(&content).unwrap();
        assert_eq!(back, report);
    }
}
