use crate::clock::parse_clock_time;
use crate::error::{FormatError, ImportExportError, Result};
use crate::models::Reading;

/// Parse whitespace-separated `HH:MM,glucose` tokens
///
/// `"08:00,95 09:00,142"` yields two readings. Empty input yields none.
pub fn parse_inline_readings(text: &str) -> Result<Vec<Reading>> {
    text.split_whitespace().map(parse_token).collect()
}

fn parse_token(token: &str) -> Result<Reading> {
    let (time, glucose) = token.split_once(',').ok_or_else(|| ImportExportError::ParseError {
        format: "inline".to_string(),
        reason: format!("expected HH:MM,glucose but got {:?}", token),
    })?;

    let time = parse_clock_time(time.trim())?;
    let glucose = glucose
        .trim()
        .parse::<i32>()
        .map_err(|_| FormatError::MalformedGlucose {
            input: glucose.to_string(),
        })?;

    Ok(Reading::new(time, glucose))
}
