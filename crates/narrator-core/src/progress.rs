//! Reading-position display derived from playback state.

use crate::playback::PlaybackStatus;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ProgressReport {
    /// 1-based; 0 when the document has no sentences.
    pub sentence_number: usize,
    pub total_sentences: usize,
    pub position_label: String,
    pub status_label: String,
    pub remaining_secs: u64,
    pub remaining_label: String,
    pub percent_complete: f64,
}

impl ProgressReport {
    pub fn percent_rounded(&self) -> u32 {
        self.percent_complete.round() as u32
    }
}

pub fn progress_report(
    current_index: usize,
    total: usize,
    status: PlaybackStatus,
    secs_per_sentence: f32,
) -> ProgressReport {
    let sentence_number = if total == 0 { 0 } else { current_index + 1 };
    let remaining_sentences = total.saturating_sub(current_index);
    let remaining_secs = (remaining_sentences as f64 * secs_per_sentence.max(0.0) as f64).round() as u64;
    ProgressReport {
        sentence_number,
        total_sentences: total,
        position_label: format!("Sentence {sentence_number} of {total}"),
        status_label: status.to_string(),
        remaining_secs,
        remaining_label: format_remaining(remaining_secs),
        percent_complete: percent_complete(current_index, total),
    }
}

/// `(index + 1) / total` as a percentage, capped at 100.
pub fn percent_complete(current_index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((current_index + 1) as f64 / total as f64 * 100.0).min(100.0)
}

pub fn format_remaining(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    if minutes > 0 {
        format!("{minutes}m {seconds}s remaining")
    } else {
        format!("{seconds}s remaining")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_position_and_estimate() {
        let report = progress_report(4, 40, PlaybackStatus::Reading, 4.0);
        assert_eq!(report.position_label, "Sentence 5 of 40");
        assert_eq!(report.status_label, "Reading");
        assert_eq!(report.remaining_secs, 144);
        assert_eq!(report.remaining_label, "2m 24s remaining");
        assert_eq!(report.percent_rounded(), 13);
    }

    #[test]
    fn short_estimates_omit_minutes() {
        assert_eq!(format_remaining(36), "36s remaining");
        assert_eq!(format_remaining(60), "1m 0s remaining");
    }

    #[test]
    fn empty_document_reports_zero() {
        let report = progress_report(0, 0, PlaybackStatus::Stopped, 4.0);
        assert_eq!(report.position_label, "Sentence 0 of 0");
        assert_eq!(report.remaining_secs, 0);
        assert!(report.percent_complete.abs() < f64::EPSILON);
    }
}
