use crate::time_series::WpmPoint;

/// Compute X (session ordinal) and Y (WPM) bounds for the analytics chart
pub fn compute_chart_params(series: &[WpmPoint]) -> (f64, f64) {
    let mut highest_wpm = 0.0;
    for p in series {
        if p.wpm > highest_wpm {
            highest_wpm = p.wpm;
        }
    }

    let mut last_session = series.last().map_or(1.0, |p| p.session);
    if last_session < 1.0 {
        last_session = 1.0;
    }

    (last_session, highest_wpm.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

/// Human-friendly duration for the results and analytics screens
pub fn format_duration_ms(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    if mins > 0 {
        format!("{mins}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}
