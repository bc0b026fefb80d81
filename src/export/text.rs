use super::ExportError;
use crate::analysis::AnalysisReport;
use chrono::Utc;
use std::io::{self, Write};
use std::path::Path;

/// Export an analysis report to human-readable text format
pub fn export_report<P: AsRef<Path>>(report: &AnalysisReport, output_path: P) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;
    writeln!(file, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    write_report(report, &mut file)?;
    Ok(())
}

/// Render a report into a string
pub fn render_report(report: &AnalysisReport) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_report(report, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn write_report<W: Write>(report: &AnalysisReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "GLUCOSE & MACRO REPORT")?;
    writeln!(out, "======================")?;
    writeln!(out)?;

    writeln!(out, "Goal: {}", report.goal)?;
    writeln!(out, "Bodyweight: {} kg", report.bodyweight_kg.normalize())?;
    writeln!(out)?;

    // Range
    writeln!(out, "TIME IN RANGE")?;
    writeln!(out, "-------------")?;
    writeln!(out, "Time in Range: {:.1}%", report.tir)?;
    writeln!(
        out,
        "Readings: {} total, {} below, {} within, {} above",
        report.range.total(),
        report.range.below,
        report.range.within,
        report.range.above
    )?;
    writeln!(out)?;

    // Events
    writeln!(out, "GLUCOSE EVENTS")?;
    writeln!(out, "--------------")?;
    if report.spikes.is_empty() {
        writeln!(out, "No spikes detected.")?;
    } else {
        writeln!(out, "{} spike(s):", report.spikes.len())?;
        for spike in &report.spikes {
            writeln!(
                out,
                " - +{} mg/dL from {} -> {} ({} to {}, {} min)",
                spike.delta,
                spike.glucose_start,
                spike.glucose_peak,
                spike.start_time,
                spike.end_time,
                spike.duration_minutes
            )?;
        }
    }
    if report.lows.is_empty() {
        writeln!(out, "No lows detected.")?;
    } else {
        writeln!(out, "{} low(s):", report.lows.len())?;
        for low in &report.lows {
            writeln!(out, " - {}: {} mg/dL", low.time, low.glucose)?;
        }
    }
    writeln!(out)?;

    // Macros
    writeln!(out, "MACRO PLAN")?;
    writeln!(out, "----------")?;
    writeln!(out, "Calories: {} kcal", report.macros.calories)?;
    writeln!(out, "Protein:  {} g", report.macros.protein_g)?;
    writeln!(out, "Carbs:    {} g", report.macros.carbs_g)?;
    writeln!(out, "Fat:      {} g", report.macros.fat_g)?;
    writeln!(out)?;

    writeln!(out, "GUIDANCE")?;
    writeln!(out, "--------")?;
    writeln!(out, "{}", report.guidance.headline)?;
    writeln!(out, "{}", report.guidance.advice)?;
    writeln!(out)?;

    writeln!(out, "EXPLANATION")?;
    writeln!(out, "-----------")?;
    writeln!(out, "{}", report.recommendation)?;

    if !report.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "WARNINGS")?;
        writeln!(out, "--------")?;
        for warning in &report.warnings {
            writeln!(out, "! {}", warning)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisRequest, GlucoseAnalyzer};
    use crate::import::parse_inline_readings;
    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    fn reference_report() -> AnalysisReport {
        let readings = parse_inline_readings(
            "06:00,90 07:00,100 08:00,112 09:00,145 10:00,138 11:00,65 12:00,101 13:00,150",
        )
        .unwrap();
        GlucoseAnalyzer::default()
            .analyze(&AnalysisRequest::new(readings, dec!(75), "maintain"))
            .unwrap()
    }

    #[test]
    fn test_render_report() {
        let text = render_report(&reference_report());

        assert!(text.contains("Time in Range: 62.5%"));
        assert!(text.contains("Readings: 8 total, 1 below, 5 within, 2 above"));
        assert!(text.contains(" - +33 mg/dL from 112 -> 145 (08:00 to 09:00, 60 min)"));
        assert!(text.contains(" - 11:00: 65 mg/dL"));
        assert!(text.contains("Calories: 2250 kcal"));
        assert!(text.contains("Time in range: 62.5%. Low glucose events detected."));
        assert!(!text.contains("WARNINGS"));
    }

    #[test]
    fn test_export_to_file() {
        let temp_file = NamedTempFile::new().unwrap();
        export_report(&reference_report(), temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.starts_with("Generated: "));
        assert!(content.contains("MACRO PLAN"));
    }
}
