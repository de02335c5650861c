use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{app::App, session::Phase, ui::prompt::word_line};

/// A UI Screen boundary: renders the body for one session phase
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Before the first round, or before the word list arrives
pub struct IdleScreen;

impl Screen for IdleScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let message = if app.session.can_start() {
            Span::styled(
                "press enter to start",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else if app.words_loading() {
            Span::styled("loading words...", Style::default().add_modifier(Modifier::DIM))
        } else {
            Span::styled("no words loaded", Style::default().fg(Color::Red))
        };

        Paragraph::new(vec![Line::from(message), Line::from(""), legend("(esc)ape")])
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// Round in progress: the word, its translation and the miss flash
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let session = &app.session;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // word box
                Constraint::Length(1), // translation
                Constraint::Length(1), // padding
                Constraint::Min(0),    // legend
            ])
            .split(area);

        let border = if session.error_flag() {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mut block = Block::default().borders(Borders::ALL).border_style(border);
        if session.error_flag() {
            block = block.title("miss");
        }

        Paragraph::new(word_line(&session.char_states()))
            .block(block)
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        if app.show_translation {
            Paragraph::new(Span::styled(
                session.current_word().japanese.clone(),
                Style::default().fg(Color::Gray),
            ))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
        }

        Paragraph::new(legend("(esc)ape"))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }
}

/// Round over: final score, name form, replay
pub struct ResultScreen;

impl Screen for ResultScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let session = &app.session;
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::from(Span::styled("time's up", bold)),
            Line::from(Span::styled(
                format!("final score {}", session.score()),
                bold.fg(Color::Green),
            )),
            Line::from(""),
        ];

        if session.score_submitted() {
            lines.push(Line::from(Span::styled(
                "score submitted",
                Style::default().fg(Color::Green),
            )));
        } else if session.submit_pending() {
            lines.push(Line::from(Span::styled(
                "submitting...",
                Style::default().add_modifier(Modifier::DIM),
            )));
        } else {
            lines.push(Line::from(vec![
                Span::raw("name: "),
                Span::styled(session.player_name().to_string(), bold),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]));
        }

        if let Some(status) = &app.status {
            lines.push(Line::from(Span::styled(
                status.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        lines.push(Line::from(""));
        lines.push(legend(if session.score_submitted() {
            "(enter) play again / (esc)ape"
        } else {
            "(enter) submit / (→) play again / (esc)ape"
        }));

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

fn legend(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen(phase: Phase) -> Box<dyn Screen> {
    match phase {
        Phase::Idle => Box::new(IdleScreen),
        Phase::Active => Box::new(PlayScreen),
        Phase::Finished => Box::new(ResultScreen),
    }
}
