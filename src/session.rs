use crate::error::{Error, Result};
use crate::metrics::{compute_wpm, validate_session_metrics};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const PACE_WPM_MIN: u32 = 100;
pub const PACE_WPM_MAX: u32 = 1200;
pub const CHUNK_SIZE_MIN: usize = 2;
pub const CHUNK_SIZE_MAX: usize = 8;

/// Display mode driving tokenization and pacing
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReadingMode {
    /// one word at a time
    Word,
    /// fixed-size groups of words
    Chunk,
    /// whole paragraphs, highlighted in sequence
    Paragraph,
}

impl FromStr for ReadingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "word" => Ok(ReadingMode::Word),
            "chunk" => Ok(ReadingMode::Chunk),
            "paragraph" => Ok(ReadingMode::Paragraph),
            other => Err(Error::validation(format!("unknown reading mode: {other}"))),
        }
    }
}

/// Validated parameters for a reading session.
/// Invariant: `chunk_size` is present iff `mode == Chunk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: ReadingMode,
    pub pace_wpm: u32,
    pub chunk_size: Option<usize>,
}

impl SessionConfig {
    pub fn new(mode: ReadingMode, pace_wpm: u32, chunk_size: Option<usize>) -> Result<Self> {
        let config = Self {
            mode,
            pace_wpm,
            chunk_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(PACE_WPM_MIN..=PACE_WPM_MAX).contains(&self.pace_wpm) {
            return Err(Error::validation(format!(
                "pace_wpm must be within [{PACE_WPM_MIN}, {PACE_WPM_MAX}], got {}",
                self.pace_wpm
            )));
        }
        match (self.mode, self.chunk_size) {
            (ReadingMode::Chunk, None) => {
                Err(Error::validation("chunk mode requires a chunk_size"))
            }
            (ReadingMode::Chunk, Some(size))
                if !(CHUNK_SIZE_MIN..=CHUNK_SIZE_MAX).contains(&size) =>
            {
                Err(Error::validation(format!(
                    "chunk_size must be within [{CHUNK_SIZE_MIN}, {CHUNK_SIZE_MAX}], got {size}"
                )))
            }
            (ReadingMode::Chunk, Some(_)) => Ok(()),
            (_, Some(_)) => Err(Error::validation(format!(
                "chunk_size only applies to chunk mode, not {}",
                self.mode
            ))),
            (_, None) => Ok(()),
        }
    }
}

/// A single reading session, from start through one-shot completion.
///
/// Created with zero metrics and `ended_at == None`; `complete` runs exactly
/// once and freezes the record. A second completion attempt is a conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSession {
    pub id: Option<i64>,
    pub mode: ReadingMode,
    pub pace_wpm: u32,
    pub chunk_size: Option<usize>,
    pub passage_title: String,
    pub total_words: u64,
    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,
    pub duration_ms: i64,
    pub words_read: u64,
    pub computed_wpm: u32,
}

impl ReadingSession {
    pub fn start(
        config: SessionConfig,
        passage_title: impl Into<String>,
        total_words: u64,
        started_at: DateTime<Local>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id: None,
            mode: config.mode,
            pace_wpm: config.pace_wpm,
            chunk_size: config.chunk_size,
            passage_title: passage_title.into(),
            total_words,
            started_at,
            ended_at: None,
            duration_ms: 0,
            words_read: 0,
            computed_wpm: 0,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Record the final metrics and seal the session. Returns the computed WPM.
    pub fn complete(
        &mut self,
        ended_at: DateTime<Local>,
        duration_ms: i64,
        words_read: u64,
    ) -> Result<u32> {
        if self.is_completed() {
            return Err(Error::conflict("session is already completed"));
        }
        let validation = validate_session_metrics(words_read, duration_ms, self.total_words);
        if !validation.valid {
            return Err(Error::validation(validation.errors.join("; ")));
        }
        self.ended_at = Some(ended_at);
        self.duration_ms = duration_ms;
        self.words_read = words_read;
        self.computed_wpm = compute_wpm(words_read, duration_ms);
        Ok(self.computed_wpm)
    }
}
