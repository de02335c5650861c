use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::leaderboard::LeaderboardEntry;

const NAME_COLUMNS: usize = 16;

/// Cuts `name` down to `columns` display cells, marking the cut with an ellipsis.
pub fn fit_name(name: &str, columns: usize) -> String {
    if name.width() <= columns {
        return name.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in name.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > columns {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Pure presenter for a single leaderboard row
pub fn present_row(rank: usize, entry: &LeaderboardEntry) -> Row<'static> {
    let style = if rank == 1 {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(format!("{rank}.")),
        Cell::from(fit_name(&entry.name, NAME_COLUMNS)),
        Cell::from(entry.score.to_string()),
    ])
    .style(style)
}

pub fn render_leaderboard(entries: &[LeaderboardEntry], area: Rect, buf: &mut Buffer) {
    let rows: Vec<Row> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| present_row(idx + 1, entry))
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(NAME_COLUMNS as u16),
            Constraint::Min(5),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title("ranking"))
    .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn entry(name: &str, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            id: "1".into(),
            name: name.into(),
            score,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn short_names_are_untouched() {
        assert_eq!(fit_name("Alice", 16), "Alice");
    }

    #[test]
    fn long_names_are_cut_by_display_width() {
        assert_eq!(fit_name("abcdefghij", 6), "abcde…");
        // wide characters take two cells each
        assert_eq!(fit_name("たなかたろう", 6), "たな…");
    }

    #[test]
    fn leader_is_highlighted() {
        let first = present_row(1, &entry("a", 10));
        let second = present_row(2, &entry("b", 5));

        assert_eq!(
            first,
            Row::new(vec![Cell::from("1."), Cell::from("a"), Cell::from("10")]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            )
        );
        assert_eq!(
            second,
            Row::new(vec![Cell::from("2."), Cell::from("b"), Cell::from("5")])
        );
    }

    #[test]
    fn renders_ranks_in_order() {
        let area = Rect::new(0, 0, 34, 6);
        let mut buf = Buffer::empty(area);
        render_leaderboard(&[entry("Alice", 90), entry("Bob", 40)], area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        let alice = text.find("Alice").unwrap();
        let bob = text.find("Bob").unwrap();
        assert!(alice < bob);
        assert!(text.contains("ranking"));
    }
}
