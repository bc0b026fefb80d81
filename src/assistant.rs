//! Canned answers to questions about an analysis report
//!
//! The question is matched by keyword, checked in a fixed order, so
//! "spike" wins over "low" when a question mentions both. Matching is a
//! case-insensitive substring test.

use crate::analysis::AnalysisReport;

/// What a question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Spike,
    Low,
    Macros,
    Recommendation,
    Unknown,
}

impl Topic {
    const KEYWORDS: [(&'static str, Topic); 4] = [
        ("spike", Topic::Spike),
        ("low", Topic::Low),
        ("macro", Topic::Macros),
        ("recommendation", Topic::Recommendation),
    ];

    pub fn classify(question: &str) -> Self {
        let question = question.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| question.contains(keyword))
            .map(|(_, topic)| *topic)
            .unwrap_or(Topic::Unknown)
    }
}

/// Answer a question from the report alone
pub fn respond(report: &AnalysisReport, question: &str) -> String {
    match Topic::classify(question) {
        Topic::Spike => match report.spikes.last() {
            Some(spike) => format!(
                "You had a glucose spike from {} to {} with a +{} mg/dL increase. \
                 Likely due to high-GI carbs or low fiber.",
                spike.start_time, spike.end_time, spike.delta
            ),
            None => "No spikes were recorded today. Your post-meal control looks solid.".to_string(),
        },
        Topic::Low => match report.lows.last() {
            Some(low) => format!(
                "You experienced a glucose low at {} with a reading of {} mg/dL. \
                 Consider a protein+fat snack in the late morning.",
                low.time, low.glucose
            ),
            None => "No low glucose events today. Great stability.".to_string(),
        },
        Topic::Macros => format!(
            "Today's macros are: Protein {}g, Carbs {}g, Fat {}g.",
            report.macros.protein_g, report.macros.carbs_g, report.macros.fat_g
        ),
        Topic::Recommendation => report.recommendation.clone(),
        Topic::Unknown => {
            "I can answer questions about spikes, lows, macros or the recommendation.".to_string()
        }
    }
}
