/// One point of the WPM-over-sessions chart: x is the 1-based session
/// ordinal, y the session's computed WPM
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmPoint {
    pub session: f64,
    pub wpm: f64,
}

impl WpmPoint {
    pub fn new(session: f64, wpm: f64) -> Self {
        Self { session, wpm }
    }
}

impl From<(f64, f64)> for WpmPoint {
    fn from(v: (f64, f64)) -> Self {
        WpmPoint {
            session: v.0,
            wpm: v.1,
        }
    }
}

impl From<WpmPoint> for (f64, f64) {
    fn from(p: WpmPoint) -> Self {
        (p.session, p.wpm)
    }
}
