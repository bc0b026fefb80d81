use super::ExportError;
use crate::analysis::AnalysisReport;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One row per detected event
#[derive(Debug, Serialize)]
struct EventRow {
    kind: &'static str,
    start_time: String,
    end_time: String,
    glucose_start: i32,
    glucose_end: i32,
    delta: Option<i32>,
    duration_minutes: Option<u32>,
}

/// Export spikes and lows to CSV
pub fn export_events<P: AsRef<Path>>(report: &AnalysisReport, output_path: P) -> Result<(), ExportError> {
    let file = std::fs::File::create(output_path)?;
    write_events(report, file)
}

pub fn write_events<W: Write>(report: &AnalysisReport, writer: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(writer);

    for spike in &report.spikes {
        writer.serialize(EventRow {
            kind: "spike",
            start_time: spike.start_time.to_string(),
            end_time: spike.end_time.to_string(),
            glucose_start: spike.glucose_start,
            glucose_end: spike.glucose_peak,
            delta: Some(spike.delta),
            duration_minutes: Some(spike.duration_minutes),
        })?;
    }

    for low in &report.lows {
        writer.serialize(EventRow {
            kind: "low",
            start_time: low.time.to_string(),
            end_time: low.time.to_string(),
            glucose_start: low.glucose,
            glucose_end: low.glucose,
            delta: None,
            duration_minutes: None,
        })?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisRequest, GlucoseAnalyzer};
    use crate::import::parse_inline_readings;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_events() {
        let readings = parse_inline_readings("08:00,95 09:00,142 10:00,135 11:00,66 12:00,102").unwrap();
        let report = GlucoseAnalyzer::default()
            .analyze(&AnalysisRequest::new(readings, dec!(75), "maintain"))
            .unwrap();

        let mut buffer = Vec::new();
        write_events(&report, &mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(
            lines[0],
            "kind,start_time,end_time,glucose_start,glucose_end,delta,duration_minutes"
        );
        assert_eq!(lines[1], "spike,08:00,09:00,95,142,47,60");
        assert_eq!(lines[2], "spike,11:00,12:00,66,102,36,60");
        assert_eq!(lines[3], "low,11:00,11:00,66,66,,");
        assert_eq!(lines.len(), 4);
    }
}
