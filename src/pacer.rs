use crate::error::{Error, Result};
use crate::session::{ReadingMode, SessionConfig, CHUNK_SIZE_MAX, CHUNK_SIZE_MIN, PACE_WPM_MAX, PACE_WPM_MIN};
use std::time::{Duration, SystemTime};

/// One displayable step of the text: a word, a chunk of words, or a paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub text: String,
    pub word_count: usize,
}

/// Split text on whitespace, dropping empty tokens
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Split text on blank-line boundaries, dropping empty paragraphs
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

fn chunk_units(words: &[String], chunk_size: usize) -> Vec<Unit> {
    words
        .chunks(chunk_size.max(1))
        .map(|group| Unit {
            text: group.join(" "),
            word_count: group.len(),
        })
        .collect()
}

fn build_units(text: &str, mode: ReadingMode, chunk_size: usize) -> (Vec<String>, Vec<Unit>) {
    let words = split_words(text);
    let units = match mode {
        ReadingMode::Word => words
            .iter()
            .map(|w| Unit {
                text: w.clone(),
                word_count: 1,
            })
            .collect(),
        ReadingMode::Chunk => chunk_units(&words, chunk_size),
        ReadingMode::Paragraph => split_paragraphs(text)
            .into_iter()
            .map(|p| {
                let word_count = p.split_whitespace().count();
                Unit {
                    text: p,
                    word_count,
                }
            })
            .collect(),
    };
    (words, units)
}

/// Time-driven cursor over a tokenized text.
///
/// The driver owns no clock: callers pass `SystemTime` into every
/// time-sensitive method, the binary's event loop feeds it real time and
/// tests feed it fabricated instants. The single rate law for all modes is
/// `interval = 60000ms * unit_size / pace_wpm`, where `unit_size` is 1 in
/// word mode, the configured chunk size in chunk mode, and the current
/// paragraph's own word count in paragraph mode.
///
/// Pausing clears the pending deadline outright, so a tick that was already
/// "due" can never advance a paused driver; resuming schedules the next
/// advance relative to the resume instant.
#[derive(Debug)]
pub struct Pacer {
    mode: ReadingMode,
    pace_wpm: u32,
    chunk_size: usize,
    words: Vec<String>,
    units: Vec<Unit>,
    index: usize,
    total_words: usize,
    words_read: usize,
    paused: bool,
    finished: bool,
    next_advance_at: Option<SystemTime>,
}

impl Pacer {
    pub fn new(text: &str, config: &SessionConfig) -> Self {
        let chunk_size = config.chunk_size.unwrap_or(1);
        let (words, units) = build_units(text, config.mode, chunk_size);
        let total_words = words.len();
        let finished = units.is_empty();
        Self {
            mode: config.mode,
            pace_wpm: config.pace_wpm,
            chunk_size,
            words,
            units,
            index: 0,
            total_words,
            words_read: 0,
            paused: false,
            finished,
            next_advance_at: None,
        }
    }

    pub fn mode(&self) -> ReadingMode {
        self.mode
    }

    pub fn pace_wpm(&self) -> u32 {
        self.pace_wpm
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    /// Cumulative words consumed, capped at the text's word count
    pub fn words_read(&self) -> usize {
        self.words_read
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_unit(&self) -> Option<&Unit> {
        self.units.get(self.index)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Fraction of the text consumed, 1.0 once finished
    pub fn progress(&self) -> f64 {
        if self.total_words == 0 {
            return 1.0;
        }
        self.words_read as f64 / self.total_words as f64
    }

    /// Display interval allotted to the unit at `idx` under the rate law
    fn interval_at(&self, idx: usize) -> Duration {
        let unit_size = match self.mode {
            ReadingMode::Word => 1,
            ReadingMode::Chunk => self.chunk_size,
            ReadingMode::Paragraph => self.units.get(idx).map_or(1, |u| u.word_count.max(1)),
        };
        Duration::from_millis(60_000 * unit_size as u64 / self.pace_wpm as u64)
    }

    /// Interval allotted to the currently displayed unit
    pub fn interval(&self) -> Duration {
        self.interval_at(self.index)
    }

    /// Time of the next scheduled advance, if the driver is running
    pub fn next_deadline(&self) -> Option<SystemTime> {
        self.next_advance_at
    }

    fn cumulative_words(&self) -> usize {
        if self.units.is_empty() {
            return 0;
        }
        let through_current: usize = self.units[..=self.index]
            .iter()
            .map(|u| u.word_count)
            .sum();
        through_current.min(self.total_words)
    }

    fn finish(&mut self) {
        self.finished = true;
        self.next_advance_at = None;
        self.words_read = self.cumulative_words();
    }

    /// Begin pacing: the first unit is on display from `now` and the first
    /// advance is due one interval later. No-op on an empty text.
    pub fn start(&mut self, now: SystemTime) {
        if self.finished || self.next_advance_at.is_some() {
            return;
        }
        self.words_read = self.cumulative_words();
        self.next_advance_at = Some(now + self.interval());
    }

    /// Advance past every deadline that has elapsed by `now`.
    /// Returns true if the cursor moved or the driver finished.
    pub fn poll(&mut self, now: SystemTime) -> bool {
        if self.paused || self.finished {
            return false;
        }
        let mut changed = false;
        while let Some(due) = self.next_advance_at {
            if now < due {
                break;
            }
            if self.index + 1 < self.units.len() {
                self.index += 1;
                self.words_read = self.cumulative_words();
                // schedule relative to the deadline, not `now`, so the
                // cadence holds exactly under a coarse tick
                self.next_advance_at = Some(due + self.interval_at(self.index));
            } else {
                self.finish();
            }
            changed = true;
        }
        changed
    }

    /// Halt the schedule, keeping the cursor where it is. Clears the pending
    /// deadline so a stale tick cannot fire mid-pause.
    pub fn pause(&mut self) {
        if self.finished {
            return;
        }
        self.paused = true;
        self.next_advance_at = None;
    }

    /// Resume pacing with the next deadline recomputed from `now`
    pub fn resume(&mut self, now: SystemTime) {
        if self.finished || !self.paused {
            return;
        }
        self.paused = false;
        self.next_advance_at = Some(now + self.interval());
    }

    fn reschedule(&mut self, now: SystemTime) {
        if self.next_advance_at.is_some() {
            self.next_advance_at = Some(now + self.interval());
        }
    }

    /// Manually step forward one unit, recomputing words-read immediately
    pub fn seek_next(&mut self, now: SystemTime) -> bool {
        if self.finished || self.index + 1 >= self.units.len() {
            return false;
        }
        self.index += 1;
        self.words_read = self.cumulative_words();
        self.reschedule(now);
        true
    }

    /// Manually step back one unit, recomputing words-read immediately
    pub fn seek_previous(&mut self, now: SystemTime) -> bool {
        if self.finished || self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.words_read = self.cumulative_words();
        self.reschedule(now);
        true
    }

    /// Jump to the final unit and finish the reading
    pub fn skip_to_end(&mut self) {
        if self.finished {
            return;
        }
        if !self.units.is_empty() {
            self.index = self.units.len() - 1;
        }
        self.finish();
    }

    /// Change the chunk size mid-session, reprojecting the current word
    /// position onto the new chunk boundaries. The cursor lands on the chunk
    /// containing the first word of the old current chunk, so no word is
    /// skipped or counted twice.
    pub fn set_chunk_size(&mut self, new_size: usize, now: SystemTime) -> Result<()> {
        if self.mode != ReadingMode::Chunk {
            return Err(Error::validation(format!(
                "chunk size does not apply to {} mode",
                self.mode
            )));
        }
        if !(CHUNK_SIZE_MIN..=CHUNK_SIZE_MAX).contains(&new_size) {
            return Err(Error::validation(format!(
                "chunk_size must be within [{CHUNK_SIZE_MIN}, {CHUNK_SIZE_MAX}], got {new_size}"
            )));
        }
        if self.finished {
            return Ok(());
        }
        let words_before: usize = self.units[..self.index].iter().map(|u| u.word_count).sum();
        self.units = chunk_units(&self.words, new_size);
        self.chunk_size = new_size;
        self.index = if self.units.is_empty() {
            0
        } else {
            (words_before / new_size).min(self.units.len() - 1)
        };
        self.words_read = self.cumulative_words();
        self.reschedule(now);
        Ok(())
    }

    /// Nudge the pace, clamped to the configured WPM range, and reschedule
    pub fn adjust_pace(&mut self, delta: i32, now: SystemTime) {
        let adjusted = (self.pace_wpm as i64 + delta as i64)
            .clamp(PACE_WPM_MIN as i64, PACE_WPM_MAX as i64);
        self.pace_wpm = adjusted as u32;
        if !self.paused && !self.finished {
            self.reschedule(now);
        }
    }
}
