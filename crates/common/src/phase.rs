//! Phase interpretation
//!
//! Maps raw backend phase/progress payloads to normalized progress tuples,
//! isolating protocol-specific phase names from the rest of the system.

use crate::types::{InstallPhase, JobReport, ProgressUpdate};

/// Normalize a raw report's phase, percent, and message.
///
/// Pure: unknown phase strings map to the generic installing phase,
/// missing progress defaults to 0, and out-of-range percentages clamp
/// to 0..=100.
pub fn interpret(report: &JobReport) -> ProgressUpdate {
    let phase = match report.phase.as_deref() {
        Some("pull") => InstallPhase::Pull,
        Some("copy") => InstallPhase::Copy,
        Some("fix") => InstallPhase::Fix,
        _ => InstallPhase::Generic,
    };

    let percent = report.progress.unwrap_or(0).clamp(0, 100) as u8;

    let message = report
        .message
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    ProgressUpdate {
        phase,
        percent,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn report(phase: Option<&str>, progress: Option<i64>, message: Option<&str>) -> JobReport {
        JobReport {
            status: "running".to_string(),
            phase: phase.map(str::to_string),
            progress,
            message: message.map(str::to_string),
            ..Default::default()
        }
    }

    #[test_case(Some("pull"), InstallPhase::Pull; "pull phase")]
    #[test_case(Some("copy"), InstallPhase::Copy; "copy phase")]
    #[test_case(Some("fix"), InstallPhase::Fix; "fix phase")]
    #[test_case(Some("reticulating"), InstallPhase::Generic; "unknown phase")]
    #[test_case(Some(""), InstallPhase::Generic; "empty phase")]
    #[test_case(None, InstallPhase::Generic; "missing phase")]
    fn test_phase_mapping(raw: Option<&str>, expected: InstallPhase) {
        assert_eq!(interpret(&report(raw, Some(10), None)).phase, expected);
    }

    #[test_case(Some(40), 40; "in range")]
    #[test_case(Some(0), 0; "zero")]
    #[test_case(Some(100), 100; "full")]
    #[test_case(Some(250), 100; "clamped high")]
    #[test_case(Some(-5), 0; "clamped negative")]
    #[test_case(None, 0; "missing defaults to zero")]
    fn test_percent_normalization(raw: Option<i64>, expected: u8) {
        assert_eq!(interpret(&report(Some("pull"), raw, None)).percent, expected);
    }

    #[test]
    fn test_message_trimmed_and_defaulted() {
        assert_eq!(
            interpret(&report(None, None, Some("  copying  "))).message,
            "copying"
        );
        assert_eq!(interpret(&report(None, None, None)).message, "");
    }

    #[test]
    fn test_empty_report_is_harmless() {
        let update = interpret(&JobReport::default());
        assert_eq!(update.phase, InstallPhase::Generic);
        assert_eq!(update.percent, 0);
        assert!(update.message.is_empty());
    }
}
