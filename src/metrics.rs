/// Hard cap on a computed WPM value; anything above is truncated, not rejected
pub const WPM_HARD_CAP: u32 = 3000;

/// Plausibility ceiling used by validation, lower than the hard cap: a
/// session can compute to 2500 WPM (capped at 3000) and still fail the
/// validation check here.
pub const WPM_PLAUSIBLE_MAX: u32 = 2000;

/// Convert words read over an elapsed duration into words per minute.
///
/// Non-positive durations yield 0. The result is rounded, then clamped to
/// `[0, WPM_HARD_CAP]` to absorb pathological inputs such as a near-zero
/// duration paired with a large word count.
pub fn compute_wpm(words_read: u64, duration_ms: i64) -> u32 {
    if duration_ms <= 0 {
        return 0;
    }
    let wpm = (words_read as f64 / duration_ms as f64 * 60_000.0).round() as u64;
    wpm.min(WPM_HARD_CAP as u64) as u32
}

/// Outcome of validating completion metrics: a flag plus every failed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl MetricsValidation {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Pure validation of a session's completion metrics.
///
/// Checks: positive duration, words read within the text's word count, and
/// the computed WPM under the plausibility ceiling.
pub fn validate_session_metrics(
    words_read: u64,
    duration_ms: i64,
    total_words: u64,
) -> MetricsValidation {
    let mut errors = Vec::new();

    if duration_ms <= 0 {
        errors.push(format!("duration_ms must be positive, got {duration_ms}"));
    }
    if words_read > total_words {
        errors.push(format!(
            "words_read ({words_read}) exceeds total words in text ({total_words})"
        ));
    }
    let wpm = compute_wpm(words_read, duration_ms);
    if wpm > WPM_PLAUSIBLE_MAX {
        errors.push(format!(
            "computed WPM ({wpm}) exceeds plausible maximum ({WPM_PLAUSIBLE_MAX})"
        ));
    }

    MetricsValidation::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative_durations_give_zero() {
        assert_eq!(compute_wpm(100, 0), 0);
        assert_eq!(compute_wpm(100, -5), 0);
        assert_eq!(compute_wpm(0, 0), 0);
    }

    #[test]
    fn known_rates() {
        assert_eq!(compute_wpm(100, 60_000), 100);
        assert_eq!(compute_wpm(50, 30_000), 100);
        assert_eq!(compute_wpm(12, 3_000), 240);
    }

    #[test]
    fn rounding_is_to_nearest() {
        // 301 words in 60.2s = 299.97... -> 300
        assert_eq!(compute_wpm(301, 60_200), 300);
        // 1 word in 350ms = 171.43 -> 171
        assert_eq!(compute_wpm(1, 350), 171);
    }

    #[test]
    fn hard_cap_applies() {
        assert_eq!(compute_wpm(10_000, 1_000), 3000);
        assert_eq!(compute_wpm(u64::MAX / 2, 1), WPM_HARD_CAP);
    }

    #[test]
    fn valid_metrics_pass() {
        let v = validate_session_metrics(300, 60_000, 300);
        assert!(v.valid);
        assert!(v.errors.is_empty());
    }

    #[test]
    fn non_positive_duration_fails() {
        let v = validate_session_metrics(10, 0, 100);
        assert!(!v.valid);
        assert!(v.errors.iter().any(|e| e.contains("duration_ms")));
    }

    #[test]
    fn words_read_over_total_fails() {
        let v = validate_session_metrics(500, 60_000, 300);
        assert!(!v.valid);
        assert!(v.errors.iter().any(|e| e.contains("exceeds total words")));
    }

    #[test]
    fn implausible_wpm_fails_even_under_hard_cap() {
        // 2500 WPM: below the 3000 cap, above the 2000 plausibility ceiling
        let v = validate_session_metrics(2500, 60_000, 5000);
        assert!(!v.valid);
        assert!(v.errors.iter().any(|e| e.contains("plausible maximum")));
    }

    #[test]
    fn multiple_failures_are_all_reported() {
        let v = validate_session_metrics(500, -1, 300);
        assert!(!v.valid);
        assert_eq!(v.errors.len(), 2);
    }
}
