use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::history::HistoryEntry;
use crate::quiz::QuizProgress;
use crate::study::{MathQuestion, Mode, QuizQuestion};

/// Light or dark color set
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub accent: Color,
    pub dim: Color,
    pub good: Color,
    pub bad: Color,
    pub selected: Color,
}

impl Palette {
    pub fn new(dark: bool) -> Self {
        if dark {
            Self {
                fg: Color::Gray,
                bg: Color::Black,
                accent: Color::LightMagenta,
                dim: Color::DarkGray,
                good: Color::LightGreen,
                bad: Color::LightRed,
                selected: Color::LightBlue,
            }
        } else {
            Self {
                fg: Color::Black,
                bg: Color::White,
                accent: Color::Blue,
                dim: Color::Gray,
                good: Color::Green,
                bad: Color::Red,
                selected: Color::Blue,
            }
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }
}

/// Cut `s` to at most `max` display columns, marking the cut with an ellipsis
pub fn truncate_to_width(s: &str, max: usize) -> String {
    let mut out = String::new();
    let mut width = 0;
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return s.to_string();
    }
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}

pub fn history_line(
    entries: &[HistoryEntry],
    cursor: Option<usize>,
    p: &Palette,
) -> Line<'static> {
    let mut spans = Vec::with_capacity(entries.len() * 2);
    for (i, entry) in entries.iter().enumerate() {
        let mut label = truncate_to_width(&entry.topic, 24);
        if entry.mode == Mode::Math {
            label.push_str(" ∑");
        }
        let style = if cursor == Some(i) {
            Style::default()
                .fg(p.bg)
                .bg(p.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(p.fg).add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!("({label})"), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

pub fn summary_lines(summary: &[String], p: &Palette) -> Vec<Line<'static>> {
    let mut lines = vec![heading("Summary", p)];
    lines.extend(summary.iter().map(|s| {
        Line::from(vec![
            Span::styled(" • ", Style::default().fg(p.accent)),
            Span::raw(s.clone()),
        ])
    }));
    lines
}

pub fn quiz_lines(
    quiz: &[QuizQuestion],
    progress: &QuizProgress,
    focused: bool,
    p: &Palette,
) -> Vec<Line<'static>> {
    let mut lines = vec![heading("Quiz", p)];
    for (qi, q) in quiz.iter().enumerate() {
        let marker = if focused && progress.focus == qi { "▶ " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(p.accent)),
            Span::styled(
                format!("{}. {}", qi + 1, q.question),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));

        let revealed = progress.is_revealed(qi);
        for (oi, option) in q.options.iter().enumerate() {
            let is_selected = progress.selected(qi) == Some(oi);
            let is_correct = q.is_correct(oi);
            let style = match (revealed, is_correct, is_selected) {
                (true, true, _) => Style::default().fg(p.good).add_modifier(Modifier::BOLD),
                (true, false, true) => Style::default()
                    .fg(p.bad)
                    .add_modifier(Modifier::CROSSED_OUT),
                (true, false, false) => Style::default().fg(p.dim),
                (false, _, true) => Style::default()
                    .fg(p.selected)
                    .add_modifier(Modifier::BOLD),
                (false, _, false) => Style::default(),
            };
            let mut text = format!("{}. {}", QuizQuestion::option_label(oi), option);
            if revealed && is_correct {
                text.push_str(" ✓");
            }
            lines.push(Line::from(vec![Span::raw("     "), Span::styled(text, style)]));
        }
        let hint = if revealed { "Hide Answer" } else { "Check Answer" };
        lines.push(Line::from(Span::styled(
            format!("     [{hint}]"),
            Style::default().fg(p.dim),
        )));
    }
    lines
}

pub fn math_lines(
    q: &MathQuestion,
    progress: &QuizProgress,
    p: &Palette,
) -> Vec<Line<'static>> {
    let mut lines = vec![
        heading("Math Problem", p),
        Line::from(Span::styled(
            q.question.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    if progress.is_revealed(0) {
        lines.push(Line::from(vec![
            Span::styled("Answer: ", Style::default().fg(p.good).add_modifier(Modifier::BOLD)),
            Span::raw(q.answer.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Explanation: ", Style::default().fg(p.accent)),
            Span::raw(q.explanation.clone()),
        ]));
        lines.push(Line::from(Span::styled("[Hide Answer]", Style::default().fg(p.dim))));
    } else {
        lines.push(Line::from(Span::styled("[Show Answer]", Style::default().fg(p.dim))));
    }
    lines
}

pub fn tip_lines(tip: &str, p: &Palette) -> Vec<Line<'static>> {
    vec![
        heading("Study Tip", p),
        Line::from(Span::styled(
            format!("💡 {tip}"),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ]
}

fn heading(text: &str, p: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(p.accent)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}
