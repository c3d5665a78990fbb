use crate::session::ReadingMode;
use crate::time_series::WpmPoint;
use crate::util::{mean, std_dev};
use chrono::{DateTime, Local};
use itertools::Itertools;
use std::collections::HashMap;

/// A completed (or abandoned) session joined with its optional
/// comprehension score, as served by the history database
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub mode: ReadingMode,
    pub ended_at: Option<DateTime<Local>>,
    pub duration_ms: i64,
    pub words_read: u64,
    pub computed_wpm: u32,
    pub score_percent: Option<u32>,
}

/// Derived cross-session aggregate; recomputable at any time from the
/// session records, never a source of truth itself
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub total_sessions: u64,
    pub total_time_ms: i64,
    pub total_words_read: u64,
    pub average_wpm_by_mode: HashMap<ReadingMode, u32>,
    pub average_score_percent: u32,
    pub wpm_spread: f64,
}

/// Reduce a collection of session records into summary statistics.
///
/// Pure over its input: callers apply any time-range or mode filter before
/// calling. Records without `ended_at` contribute nothing. `total_sessions`
/// counts every ended record even when its `duration_ms` is invalid; the
/// measured totals only include records with `duration_ms > 0`.
pub fn aggregate(records: &[SessionRecord]) -> AnalyticsSummary {
    let ended: Vec<&SessionRecord> = records.iter().filter(|r| r.ended_at.is_some()).collect();
    let measured: Vec<&SessionRecord> = ended
        .iter()
        .copied()
        .filter(|r| r.duration_ms > 0)
        .collect();

    let average_wpm_by_mode: HashMap<ReadingMode, u32> = measured
        .iter()
        .map(|r| (r.mode, r.computed_wpm as f64))
        .into_group_map()
        .into_iter()
        .filter_map(|(mode, wpms)| mean(&wpms).map(|avg| (mode, avg.round() as u32)))
        .collect();

    let scores: Vec<f64> = ended
        .iter()
        .filter_map(|r| r.score_percent)
        .map(f64::from)
        .collect();

    let wpms: Vec<f64> = measured.iter().map(|r| r.computed_wpm as f64).collect();

    AnalyticsSummary {
        total_sessions: ended.len() as u64,
        total_time_ms: measured.iter().map(|r| r.duration_ms).sum(),
        total_words_read: measured.iter().map(|r| r.words_read).sum(),
        average_wpm_by_mode,
        average_score_percent: mean(&scores).map_or(0, |avg| avg.round() as u32),
        wpm_spread: std_dev(&wpms).unwrap_or(0.0),
    }
}

/// WPM per measured session in record order, for the analytics chart
pub fn wpm_series(records: &[SessionRecord]) -> Vec<WpmPoint> {
    records
        .iter()
        .filter(|r| r.ended_at.is_some() && r.duration_ms > 0)
        .enumerate()
        .map(|(i, r)| WpmPoint::new((i + 1) as f64, r.computed_wpm as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn record(
        id: i64,
        mode: ReadingMode,
        ended: bool,
        duration_ms: i64,
        words_read: u64,
        computed_wpm: u32,
        score_percent: Option<u32>,
    ) -> SessionRecord {
        SessionRecord {
            id,
            mode,
            ended_at: ended.then(Local::now),
            duration_ms,
            words_read,
            computed_wpm,
            score_percent,
        }
    }

    #[test]
    fn aggregates_the_reference_example() {
        let records = vec![
            record(1, ReadingMode::Word, true, 60_000, 300, 300, Some(85)),
            record(2, ReadingMode::Word, true, 60_000, 400, 400, Some(90)),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.total_time_ms, 120_000);
        assert_eq!(summary.total_words_read, 700);
        assert_eq!(summary.average_wpm_by_mode[&ReadingMode::Word], 350);
        // round(87.5) == 88
        assert_eq!(summary.average_score_percent, 88);
    }

    #[test]
    fn unended_sessions_contribute_nothing() {
        let records = vec![
            record(1, ReadingMode::Word, false, 60_000, 300, 300, Some(85)),
            record(2, ReadingMode::Chunk, true, 30_000, 200, 400, None),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary.total_sessions, 1);
        assert_eq!(summary.total_time_ms, 30_000);
        assert_eq!(summary.total_words_read, 200);
        assert!(!summary.average_wpm_by_mode.contains_key(&ReadingMode::Word));
        assert_eq!(summary.average_score_percent, 0);
    }

    #[test]
    fn ended_but_unmeasured_sessions_only_bump_the_count() {
        // ended with a zero duration: in total_sessions, out of everything else
        let records = vec![
            record(1, ReadingMode::Word, true, 0, 0, 0, None),
            record(2, ReadingMode::Word, true, 60_000, 250, 250, None),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.total_time_ms, 60_000);
        assert_eq!(summary.total_words_read, 250);
        assert_eq!(summary.average_wpm_by_mode[&ReadingMode::Word], 250);
    }

    #[test]
    fn per_mode_averages_are_independent() {
        let records = vec![
            record(1, ReadingMode::Word, true, 60_000, 300, 300, None),
            record(2, ReadingMode::Chunk, true, 60_000, 500, 500, None),
            record(3, ReadingMode::Chunk, true, 60_000, 600, 601, None),
            record(4, ReadingMode::Paragraph, true, 60_000, 200, 200, None),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary.average_wpm_by_mode[&ReadingMode::Word], 300);
        // round(550.5) == 551
        assert_eq!(summary.average_wpm_by_mode[&ReadingMode::Chunk], 551);
        assert_eq!(summary.average_wpm_by_mode[&ReadingMode::Paragraph], 200);
    }

    #[test]
    fn empty_input_gives_zeroed_summary() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.total_time_ms, 0);
        assert_eq!(summary.total_words_read, 0);
        assert!(summary.average_wpm_by_mode.is_empty());
        assert_eq!(summary.average_score_percent, 0);
        assert_eq!(summary.wpm_spread, 0.0);
    }

    #[test]
    fn wpm_series_skips_unmeasured_sessions() {
        let records = vec![
            record(1, ReadingMode::Word, true, 60_000, 300, 300, None),
            record(2, ReadingMode::Word, false, 0, 0, 0, None),
            record(3, ReadingMode::Word, true, 60_000, 400, 400, None),
        ];
        let series = wpm_series(&records);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], WpmPoint::new(1.0, 300.0));
        assert_eq!(series[1], WpmPoint::new(2.0, 400.0));
    }

    #[test]
    fn wpm_spread_over_measured_sessions() {
        let records = vec![
            record(1, ReadingMode::Word, true, 60_000, 300, 300, None),
            record(2, ReadingMode::Word, true, 60_000, 400, 400, None),
        ];
        let summary = aggregate(&records);
        assert!((summary.wpm_spread - 50.0).abs() < 1e-10);
    }
}
