pub mod sections;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::app::{App, Focus};
use crate::client::StudyFetcher;
use crate::session::Phase;
use crate::storage::KeyValueStore;
use crate::study::{Mode, StudyData};
use sections::{history_line, math_lines, quiz_lines, summary_lines, tip_lines, Palette};

const HORIZONTAL_MARGIN: u16 = 2;
const KEY_HINTS: &str =
    "Enter submit · Tab focus · ^T math · ^D dark mode · ^L clear history · ^R reset · Esc quit";

impl<F: StudyFetcher, S: KeyValueStore> Widget for &App<F, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = Palette::new(self.prefs.dark_mode());
        buf.set_style(area, p.base());

        let history_height = if self.history().is_empty() { 0 } else { 3 };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1),              // title
                Constraint::Length(4),              // form
                Constraint::Length(history_height), // recent topics
                Constraint::Min(0),                 // body
                Constraint::Length(1),              // hints / notice
            ])
            .split(area);

        render_title(self, &p, chunks[0], buf);
        render_form(self, &p, chunks[1], buf);
        if history_height > 0 {
            let block = focus_block("Recent Topics", self.focus == Focus::History, &p);
            let cursor = (self.focus == Focus::History).then_some(self.history_cursor);
            Paragraph::new(history_line(self.history().entries(), cursor, &p))
                .block(block)
                .render(chunks[2], buf);
        }
        render_body(self, &p, chunks[3], buf);

        let footer = match &self.notice {
            Some(n) => Span::styled(n.text.clone(), Style::default().fg(p.accent)),
            None => Span::styled(KEY_HINTS, Style::default().fg(p.dim)),
        };
        Paragraph::new(Line::from(footer))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

fn focus_block(title: &str, focused: bool, p: &Palette) -> Block<'static> {
    let border = if focused {
        Style::default().fg(p.accent)
    } else {
        Style::default().fg(p.dim)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title.to_string())
}

fn render_title<F: StudyFetcher, S: KeyValueStore>(
    app: &App<F, S>,
    p: &Palette,
    area: Rect,
    buf: &mut Buffer,
) {
    let theme = if app.prefs.dark_mode() { "☀" } else { "☾" };
    Paragraph::new(Line::from(vec![
        Span::styled(
            "AI Study Assistant",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(theme, Style::default().fg(p.dim)),
    ]))
    .render(area, buf);
}

fn render_form<F: StudyFetcher, S: KeyValueStore>(
    app: &App<F, S>,
    p: &Palette,
    area: Rect,
    buf: &mut Buffer,
) {
    let loading = app.state().is_loading();
    let topic = if app.input.is_empty() {
        Span::styled(
            "Enter a topic (e.g., Quantum Physics, Algebra, History)",
            Style::default().fg(p.dim).add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::raw(app.input.clone())
    };
    let cursor = if app.focus == Focus::Topic && !loading { "▏" } else { "" };

    let mode = match app.mode {
        Mode::Math => Span::styled("[x] Math Mode", Style::default().fg(p.accent)),
        Mode::Default => Span::styled("[ ] Math Mode", Style::default().fg(p.dim)),
    };
    let button = if loading {
        Span::styled("Generating...", Style::default().fg(p.dim))
    } else if app.can_submit() {
        Span::styled(
            "[ Generate Study Guide ]",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("[ Generate Study Guide ]", Style::default().fg(p.dim))
    };

    Paragraph::new(vec![
        Line::from(vec![topic, Span::raw(cursor)]),
        Line::from(vec![mode, Span::raw("   "), button]),
    ])
    .block(focus_block("Study Topic", app.focus == Focus::Topic, p))
    .render(area, buf);
}

fn render_body<F: StudyFetcher, S: KeyValueStore>(
    app: &App<F, S>,
    p: &Palette,
    area: Rect,
    buf: &mut Buffer,
) {
    let state = app.state();
    let lines: Vec<Line> = match &state.phase {
        Phase::Idle => vec![Line::from(Span::styled(
            "Type a topic and press Enter to get a summary, a quiz and a study tip.",
            Style::default().fg(p.dim),
        ))],
        Phase::Loading => vec![Line::from(Span::styled(
            format!("⏳ Generating study guide for \"{}\"...", state.topic),
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ))],
        Phase::Error(e) => vec![
            Line::from(Span::styled(
                "Error",
                Style::default().fg(p.bad).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(e.user_message(), Style::default().fg(p.bad))),
        ],
        Phase::Success(data) => result_lines(app, data, p),
    };

    Paragraph::new(lines)
        .block(focus_block("Study Guide", app.focus == Focus::Quiz, p))
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

fn result_lines<F: StudyFetcher, S: KeyValueStore>(
    app: &App<F, S>,
    data: &StudyData,
    p: &Palette,
) -> Vec<Line<'static>> {
    let focused = app.focus == Focus::Quiz;
    let mut lines = Vec::new();
    match data {
        StudyData::Default { summary, quiz, .. } => {
            lines.extend(summary_lines(summary, p));
            lines.push(Line::default());
            lines.extend(quiz_lines(quiz, &app.quiz, focused, p));
            let (correct, answered) = app.quiz.score(data);
            if answered > 0 {
                lines.push(Line::from(Span::styled(
                    format!("Score: {correct}/{answered}"),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
        }
        StudyData::Math { math_question, .. } => {
            lines.extend(math_lines(math_question, &app.quiz, p));
        }
    }
    lines.push(Line::default());
    lines.extend(tip_lines(data.study_tip(), p));
    lines
}
