use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::session::CharState;

pub fn char_style(state: CharState) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match state {
        CharState::Correct => bold.fg(Color::Green),
        CharState::Incorrect => bold.fg(Color::Red).bg(Color::Rgb(80, 20, 20)),
        CharState::Pending => bold.fg(Color::DarkGray),
    }
}

/// Spaced-out word with per-character coloring
pub fn word_line(states: &[(char, CharState)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(states.len() * 2);
    for (idx, (c, state)) in states.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(c.to_string(), char_style(*state)));
    }
    Line::from(spans)
}
