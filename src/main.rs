pub mod analytics;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pacer;
pub mod passage;
pub mod quiz;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod time_series;
pub mod ui;
pub mod util;

use crate::{
    analytics::{aggregate, wpm_series, AnalyticsSummary},
    config::{Config, ConfigStore, FileConfigStore},
    pacer::Pacer,
    passage::Passage,
    quiz::{
        calculate_score, validate_questions, ClozeQuestionSource, ComprehensionResult, Question,
        QuestionSource,
    },
    runtime::{CrosstermEventSource, FixedTicker, ReaderEvent, Runner},
    session::{ReadingMode, ReadingSession, SessionConfig},
    stats::HistoryDb,
    time_series::WpmPoint,
};
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, SystemTime},
};

const TICK_RATE_MS: u64 = 100;
const DEFAULT_PASSAGE: &str = "tides";
const PACE_STEP: i32 = 10;

/// terminal speed-reading trainer with paced display and reading analytics
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal speed-reading trainer: read embedded passages, files, or generated text word-by-word, chunk-by-chunk, or paragraph-by-paragraph at a target pace, answer comprehension questions, and track words-per-minute across sessions."
)]
pub struct Cli {
    /// reading mode
    #[clap(short, long, value_enum)]
    mode: Option<ReadingMode>,

    /// target pace in words per minute (100-1200)
    #[clap(short = 'w', long)]
    wpm: Option<u32>,

    /// words per chunk in chunk mode (2-8)
    #[clap(short, long)]
    chunk_size: Option<usize>,

    /// embedded passage to read (see --list-passages)
    #[clap(short, long)]
    passage: Option<String>,

    /// read text from a file
    #[clap(short, long)]
    file: Option<PathBuf>,

    /// read text supplied inline
    #[clap(short, long)]
    text: Option<String>,

    /// generate this many practice sentences instead of a passage
    #[clap(short = 's', long)]
    sentences: Option<usize>,

    /// number of comprehension questions after reading
    #[clap(short = 'q', long)]
    questions: Option<usize>,

    /// skip the comprehension quiz
    #[clap(long)]
    no_quiz: bool,

    /// list embedded passages and exit
    #[clap(long)]
    list_passages: bool,

    /// export session history as CSV to PATH and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Reading,
    Quiz,
    Results,
    Analytics,
}

#[derive(Debug)]
pub struct App {
    pub config: SessionConfig,
    pub passage: Passage,
    pub pacer: Pacer,
    pub session: ReadingSession,
    pub db: Option<HistoryDb>,
    pub state: AppState,
    pub quiz_size: usize,
    pub questions: Vec<Question>,
    pub answers: Vec<usize>,
    pub selected_option: usize,
    pub result: Option<ComprehensionResult>,
    pub record_error: Option<String>,
    pub summary: Option<AnalyticsSummary>,
    pub wpm_series: Vec<WpmPoint>,
}

impl App {
    pub fn new(
        config: SessionConfig,
        passage: Passage,
        quiz_size: usize,
        db: Option<HistoryDb>,
    ) -> crate::error::Result<Self> {
        let mut session = ReadingSession::start(
            config,
            passage.title.clone(),
            passage.word_count as u64,
            Local::now(),
        )?;
        if let Some(db) = &db {
            session.id = Some(db.insert_session(&session)?);
        }
        let mut pacer = Pacer::new(&passage.text, &config);
        pacer.start(SystemTime::now());
        Ok(Self {
            config,
            passage,
            pacer,
            session,
            db,
            state: AppState::Reading,
            quiz_size,
            questions: Vec::new(),
            answers: Vec::new(),
            selected_option: 0,
            result: None,
            record_error: None,
            summary: None,
            wpm_series: Vec::new(),
        })
    }

    /// Begin a fresh session over the same passage
    pub fn reset(&mut self) -> crate::error::Result<()> {
        let mut session = ReadingSession::start(
            self.config,
            self.passage.title.clone(),
            self.passage.word_count as u64,
            Local::now(),
        )?;
        if let Some(db) = &self.db {
            session.id = Some(db.insert_session(&session)?);
        }
        self.session = session;
        self.pacer = Pacer::new(&self.passage.text, &self.config);
        self.pacer.start(SystemTime::now());
        self.state = AppState::Reading;
        self.questions.clear();
        self.answers.clear();
        self.selected_option = 0;
        self.result = None;
        self.record_error = None;
        Ok(())
    }

    pub fn on_tick(&mut self, now: SystemTime) {
        if self.state != AppState::Reading {
            return;
        }
        self.pacer.poll(now);
        if self.pacer.is_finished() {
            self.finish_reading();
        }
    }

    fn finish_reading(&mut self) {
        if self.session.is_completed() {
            return;
        }
        let ended_at = Local::now();
        let duration_ms = (ended_at - self.session.started_at).num_milliseconds();
        let words_read = self.pacer.words_read() as u64;
        match self.session.complete(ended_at, duration_ms, words_read) {
            Ok(_) => {
                if let Some(db) = &self.db {
                    if let Err(err) = db.finish_session(&self.session) {
                        self.record_error = Some(err.to_string());
                    }
                }
            }
            Err(err) => {
                self.record_error = Some(err.to_string());
            }
        }

        if self.quiz_size > 0 {
            self.prepare_quiz();
        }
        self.state = if self.questions.is_empty() {
            AppState::Results
        } else {
            AppState::Quiz
        };
    }

    fn prepare_quiz(&mut self) {
        // a passage too thin for a quiz downgrades to plain results
        let raw = match ClozeQuestionSource.generate(&self.passage.text, self.quiz_size) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        if let Ok(questions) = validate_questions(raw, self.quiz_size) {
            self.questions = questions;
        }
    }

    fn answer_current(&mut self) {
        if self.answers.len() >= self.questions.len() {
            return;
        }
        self.answers.push(self.selected_option);
        self.selected_option = 0;
        if self.answers.len() < self.questions.len() {
            return;
        }
        match calculate_score(&self.answers, &self.questions) {
            Ok(score) => match (&self.db, self.session.id) {
                (Some(db), Some(id)) => match db.record_result(id, &self.answers, score) {
                    Ok(result) => self.result = Some(result),
                    Err(err) => self.record_error = Some(err.to_string()),
                },
                _ => {
                    self.result = Some(ComprehensionResult {
                        session_id: self.session.id.unwrap_or_default(),
                        answers: self.answers.clone(),
                        score_percent: score,
                    });
                }
            },
            Err(err) => self.record_error = Some(err.to_string()),
        }
        self.state = AppState::Results;
    }

    fn open_analytics(&mut self) {
        if let Some(db) = &self.db {
            if let Ok(records) = db.session_records() {
                self.summary = Some(aggregate(&records));
                self.wpm_series = wpm_series(&records);
            }
        }
        self.state = AppState::Analytics;
    }
}

fn resolve_passage(cli: &Cli) -> crate::error::Result<Passage> {
    if let Some(text) = &cli.text {
        Ok(passage::from_text(text))
    } else if let Some(path) = &cli.file {
        passage::load_file(path)
    } else if let Some(count) = cli.sentences {
        Ok(passage::generate_sentences(count))
    } else if let Some(title) = &cli.passage {
        passage::load_builtin(title)
    } else {
        passage::load_builtin(DEFAULT_PASSAGE)
    }
}

fn merge_preferences(cli: &Cli, store: &FileConfigStore) -> Config {
    let mut prefs = store.load();
    if let Some(mode) = cli.mode {
        prefs.mode = mode;
    }
    if let Some(wpm) = cli.wpm {
        prefs.pace_wpm = wpm;
    }
    if let Some(chunk) = cli.chunk_size {
        prefs.chunk_size = chunk;
    }
    if let Some(count) = cli.questions {
        prefs.quiz_questions = count;
    }
    let _ = store.save(&prefs);
    prefs
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_passages {
        for title in passage::builtin_titles() {
            println!("{title}");
        }
        return Ok(());
    }

    if let Some(path) = &cli.export {
        let db = HistoryDb::new()?;
        let file = std::fs::File::create(path)?;
        db.export_csv(file)?;
        println!("history exported to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let prefs = merge_preferences(&cli, &store);

    let chunk_size = (prefs.mode == ReadingMode::Chunk).then_some(prefs.chunk_size);
    let config = match SessionConfig::new(prefs.mode, prefs.pace_wpm, chunk_size) {
        Ok(config) => config,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err.to_string()).exit();
        }
    };

    let passage = match resolve_passage(&cli) {
        Ok(passage) => passage,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err.to_string()).exit();
        }
    };

    let quiz_size = if cli.no_quiz { 0 } else { prefs.quiz_questions };
    let db = HistoryDb::new().ok();
    let mut app = App::new(config, passage, quiz_size, db)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[derive(Debug)]
enum ExitType {
    Restart,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        let mut exit_type = ExitType::Quit;
        terminal.draw(|f| ui(app, f))?;

        loop {
            // wake exactly at the next pacing deadline while reading
            let deadline = if app.state == AppState::Reading {
                app.pacer.next_deadline()
            } else {
                None
            };

            match runner.step_until(deadline) {
                ReaderEvent::Tick => {
                    app.on_tick(SystemTime::now());
                }
                ReaderEvent::Resize => {}
                ReaderEvent::Key(key) => {
                    let now = SystemTime::now();
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        break;
                    }
                    match app.state {
                        AppState::Reading => match key.code {
                            KeyCode::Esc | KeyCode::Char('q') => break,
                            KeyCode::Char(' ') => {
                                if app.pacer.is_paused() {
                                    app.pacer.resume(now);
                                } else {
                                    app.pacer.pause();
                                }
                            }
                            KeyCode::Left => {
                                app.pacer.seek_previous(now);
                            }
                            KeyCode::Right => {
                                app.pacer.seek_next(now);
                            }
                            KeyCode::Char('e') => {
                                app.pacer.skip_to_end();
                                app.finish_reading();
                            }
                            KeyCode::Up => app.pacer.adjust_pace(PACE_STEP, now),
                            KeyCode::Down => app.pacer.adjust_pace(-PACE_STEP, now),
                            KeyCode::Char(c) if c.is_ascii_digit() => {
                                // chunk resize; rejected sizes and modes are ignored
                                let _ = app
                                    .pacer
                                    .set_chunk_size(c as usize - '0' as usize, now);
                            }
                            _ => {}
                        },
                        AppState::Quiz => match key.code {
                            KeyCode::Esc => {
                                app.state = AppState::Results;
                            }
                            KeyCode::Up => {
                                app.selected_option = app.selected_option.saturating_sub(1);
                            }
                            KeyCode::Down => {
                                let max = quiz::OPTION_COUNT - 1;
                                app.selected_option = (app.selected_option + 1).min(max);
                            }
                            KeyCode::Enter => app.answer_current(),
                            _ => {}
                        },
                        AppState::Results => match key.code {
                            KeyCode::Esc | KeyCode::Char('q') => break,
                            KeyCode::Char('r') => {
                                exit_type = ExitType::Restart;
                                break;
                            }
                            KeyCode::Char('a') => app.open_analytics(),
                            _ => {}
                        },
                        AppState::Analytics => match key.code {
                            KeyCode::Esc | KeyCode::Char('q') => break,
                            KeyCode::Char('b') | KeyCode::Backspace => {
                                app.state = AppState::Results;
                            }
                            KeyCode::Char('r') => {
                                exit_type = ExitType::Restart;
                                break;
                            }
                            _ => {}
                        },
                    }
                }
            }
            terminal.draw(|f| ui(app, f))?;
        }

        match exit_type {
            ExitType::Restart => {
                app.reset()?;
            }
            ExitType::Quit => break,
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
