use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{app::App, runtime::Clock, store::ScoreEntry};

/// Pure presenter for a single leaderboard row; `rank` is 1-based
pub fn present_row(rank: usize, entry: &ScoreEntry) -> Row<'static> {
    let style = match rank {
        1 => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        2 | 3 => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    };

    Row::new(vec![
        Cell::from(format!("#{rank}")).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(entry.player.clone()),
        Cell::from(entry.score.to_string()),
        Cell::from(entry.display_date()),
    ])
    .style(style)
}

/// Render the leaderboard screen
pub fn render_leaderboard<C: Clock>(app: &mut App<C>, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let title = Paragraph::new("Top scores")
        .block(Block::default().borders(Borders::ALL).title("Leaderboard"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let lb = &mut app.leaderboard;
    if let Some(err) = &lb.error {
        let msg = Paragraph::new(format!("Could not load scores: {err}"))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Red));
        f.render_widget(msg, chunks[1]);
    } else if lb.entries.is_empty() {
        let msg = Paragraph::new("No scores yet. Play a round to get on the board.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(msg, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = lb.entries.len().saturating_sub(table_height);
        if lb.scroll_offset > max_scroll {
            lb.scroll_offset = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("Rank"),
            Cell::from("Player"),
            Cell::from("Score"),
            Cell::from("Date"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows = lb
            .entries
            .iter()
            .enumerate()
            .skip(lb.scroll_offset)
            .take(table_height)
            .map(|(i, e)| present_row(i + 1, e))
            .collect_vec();

        let widths = [
            Constraint::Length(6),
            Constraint::Min(12),
            Constraint::Length(8),
            Constraint::Length(12),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Scores"))
            .column_spacing(2);
        f.render_widget(table, chunks[1]);
    }

    let instructions =
        Paragraph::new("(↑/↓) scroll  (PgUp/PgDn) page  (Home) top  (r) reload  (b/esc/tab) back")
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[2]);
}
