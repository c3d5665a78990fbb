use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, SystemTime};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the reading loop
#[derive(Clone, Debug)]
pub enum ReaderEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if one arrives before the timeout, Err(Timeout) otherwise.
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<ReaderEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(ReaderEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(ReaderEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Upper bound on how long the loop sleeps between wakeups
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-backed event source for unit tests
pub struct TestEventSource {
    rx: Receiver<ReaderEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<ReaderEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Drives the application one event or tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the tick interval and returns the next event, or Tick
    /// on timeout
    pub fn step(&self) -> ReaderEvent {
        self.step_until(None)
    }

    /// Like `step`, but wakes no later than `deadline`. The pacing driver's
    /// next advance can fall well inside (paragraph mode) or well before
    /// (fast word mode) a fixed tick, so the loop sleeps only until
    /// whichever comes first.
    pub fn step_until(&self, deadline: Option<SystemTime>) -> ReaderEvent {
        let mut timeout = self.ticker.interval();
        if let Some(due) = deadline {
            let until_due = due
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO);
            timeout = timeout.min(until_due);
        }
        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                ReaderEvent::Tick
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(1)));

        match runner.step() {
            ReaderEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(ReaderEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(10)));

        match runner.step() {
            ReaderEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn step_until_wakes_for_an_imminent_deadline() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        // ticker alone would sleep for a minute
        let runner = Runner::new(es, FixedTicker::new(Duration::from_secs(60)));

        let soon = SystemTime::now() + Duration::from_millis(5);
        let started = std::time::Instant::now();
        match runner.step_until(Some(soon)) {
            ReaderEvent::Tick => {}
            _ => panic!("expected Tick at the deadline"),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn step_until_treats_past_deadlines_as_immediate() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let runner = Runner::new(es, FixedTicker::new(Duration::from_secs(60)));

        let past = SystemTime::now() - Duration::from_secs(5);
        match runner.step_until(Some(past)) {
            ReaderEvent::Tick => {}
            _ => panic!("expected immediate Tick"),
        }
    }
}
