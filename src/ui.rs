pub mod leaderboard;
pub mod prompt;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{app::App, ui::screen::current_screen};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const LEADERBOARD_WIDTH: u16 = 34;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Min(20), Constraint::Length(LEADERBOARD_WIDTH)])
            .split(area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(1), // padding
                Constraint::Length(1), // time / score / combo
                Constraint::Length(1), // padding
                Constraint::Min(1),    // phase body
            ])
            .split(columns[0]);

        Paragraph::new(Span::styled(
            "tango word typing",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(rows[0], buf);

        header(self).render(rows[2], buf);

        current_screen(self.session.phase()).render(self, rows[4], buf);

        leaderboard::render_leaderboard(self.session.leaderboard(), columns[1], buf);
    }
}

fn header(app: &App) -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let session = &app.session;

    Paragraph::new(Line::from(vec![
        Span::raw("time "),
        Span::styled(
            format!("{}s", session.time_remaining()),
            bold.fg(Color::Yellow),
        ),
        Span::raw("   score "),
        Span::styled(session.score().to_string(), bold.fg(Color::Green)),
        Span::raw("   combo "),
        Span::styled(format!("{}x", session.combo()), bold.fg(Color::LightRed)),
    ]))
    .alignment(Alignment::Center)
}
