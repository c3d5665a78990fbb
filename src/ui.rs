pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::session::ReadingMode;
use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn highlight() -> Style {
    bold().fg(Color::Yellow)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Reading => render_reading(self, area, buf),
            AppState::Quiz => render_quiz(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            AppState::Analytics => render_analytics(self, area, buf),
        }
    }
}

fn status_line(app: &App) -> Line<'static> {
    let pacer = &app.pacer;
    let position = format!(
        "{}/{}",
        (pacer.index() + 1).min(pacer.unit_count()),
        pacer.unit_count()
    );
    let mut spans = vec![
        Span::styled(format!("{} ", app.session.mode), dim()),
        Span::styled(position, dim()),
        Span::styled(format!(" · {} wpm", pacer.pace_wpm()), dim()),
        Span::styled(
            format!(" · {} of {} words", pacer.words_read(), pacer.total_words()),
            dim(),
        ),
        Span::styled(
            format!(" · {:.0}%", pacer.progress() * 100.0),
            dim(),
        ),
    ];
    if pacer.is_paused() {
        spans.push(Span::styled(" · PAUSED", highlight()));
    }
    Line::from(spans)
}

fn render_reading(app: &App, area: Rect, buf: &mut Buffer) {
    match app.session.mode {
        ReadingMode::Word | ReadingMode::Chunk => render_flash_unit(app, area, buf),
        ReadingMode::Paragraph => render_paragraphs(app, area, buf),
    }
}

/// Word and chunk mode: the current unit alone, centered like a flashcard
fn render_flash_unit(app: &App, area: Rect, buf: &mut Buffer) {
    let unit_text = app
        .pacer
        .current_unit()
        .map(|u| u.text.clone())
        .unwrap_or_default();

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let occupied_lines =
        ((unit_text.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);

    let top = (area.height.saturating_sub(occupied_lines + 2)) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(top),
                Constraint::Length(occupied_lines),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(Span::styled(unit_text, bold()))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);

    Paragraph::new(status_line(app))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

/// Paragraph mode: the full text with the current paragraph highlighted
fn render_paragraphs(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)].as_ref())
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    let mut current_starts_at = 0usize;
    for (i, unit) in app.pacer.units().iter().enumerate() {
        if i == app.pacer.index() {
            current_starts_at = lines.len();
        }
        let style = if i == app.pacer.index() {
            highlight()
        } else {
            dim()
        };
        for text_line in unit.text.lines() {
            lines.push(Line::from(Span::styled(text_line.to_string(), style)));
        }
        lines.push(Line::default());
    }

    // keep the highlighted paragraph in the upper third of the viewport
    let scroll = current_starts_at.saturating_sub(chunks[0].height as usize / 3) as u16;

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .scroll((scroll, 0))
        .render(chunks[0], buf);

    Paragraph::new(status_line(app))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
}

fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let answered = app.answers.len();
    let Some(question) = app.questions.get(answered) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(question.options.len() as u16),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(Span::styled(
        format!("question {} of {}", question.index, app.questions.len()),
        dim(),
    ))
    .render(chunks[0], buf);

    Paragraph::new(Span::styled(question.prompt.clone(), bold()))
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let options: Vec<Line> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            if i == app.selected_option {
                Line::from(Span::styled(format!("> {option}"), highlight()))
            } else {
                Line::from(Span::styled(format!("  {option}"), Style::default()))
            }
        })
        .collect();
    Paragraph::new(options).render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "up/down select · enter answer · esc skip quiz",
        dim(),
    ))
    .render(chunks[5], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} — {}", session.passage_title, session.mode),
            bold(),
        )),
        Line::default(),
        Line::from(Span::raw(format!("{} wpm", session.computed_wpm))),
        Line::from(Span::raw(format!(
            "{} of {} words in {}",
            session.words_read,
            session.total_words,
            charting::format_duration_ms(session.duration_ms),
        ))),
    ];
    if let Some(result) = &app.result {
        lines.push(Line::from(Span::raw(format!(
            "comprehension {}%",
            result.score_percent
        ))));
    }
    if let Some(err) = &app.record_error {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("not recorded: {err}"),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(r)estart (a)nalytics (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    )));

    centered_block(area, lines.len() as u16, |rect| {
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(rect, buf);
    });
}

fn render_analytics(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(7),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let series: Vec<(f64, f64)> = app.wpm_series.iter().map(|p| (*p).into()).collect();
    if series.len() >= 2 {
        let (x_max, y_max) = charting::compute_chart_params(&app.wpm_series);
        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&series)];
        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("session")
                    .style(dim())
                    .bounds([1.0, x_max])
                    .labels(vec!["1".to_string(), charting::format_label(x_max)]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .style(dim())
                    .bounds([0.0, y_max])
                    .labels(vec!["0".to_string(), charting::format_label(y_max)]),
            )
            .render(chunks[0], buf);
    } else {
        Paragraph::new(Span::styled(
            "complete a few more sessions to see the wpm chart",
            dim(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);
    }

    let mut lines = Vec::new();
    if let Some(summary) = &app.summary {
        lines.push(Line::from(Span::styled(
            format!(
                "{} sessions · {} words · {}",
                summary.total_sessions,
                summary.total_words_read,
                charting::format_duration_ms(summary.total_time_ms),
            ),
            bold(),
        )));
        let mut modes: Vec<_> = summary.average_wpm_by_mode.iter().collect();
        modes.sort_by_key(|(mode, _)| mode.to_string());
        for (mode, avg) in modes {
            lines.push(Line::from(Span::raw(format!("{mode}: {avg} wpm average"))));
        }
        lines.push(Line::from(Span::raw(format!(
            "comprehension {}% average · wpm spread {:.1}",
            summary.average_score_percent, summary.wpm_spread,
        ))));
    } else {
        lines.push(Line::from(Span::styled("no history recorded yet", dim())));
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(b)ack (r)estart (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}

fn centered_block(area: Rect, content_height: u16, render: impl FnOnce(Rect)) {
    let top = area.height.saturating_sub(content_height) / 2;
    let rect = Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height: content_height.min(area.height),
    };
    render(rect);
}
