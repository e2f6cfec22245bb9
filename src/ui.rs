pub mod leaderboard;
pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    app::App,
    backend::Submission,
    board::{key_for_slot, Position},
    runtime::Clock,
    session::Status,
};

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 1;
/// Seconds left at which the timer turns red
const LOW_TIME_SECS: u32 = 10;
/// Cells taken by one target: bug glyph (2 wide) plus its key label
pub const TARGET_WIDTH: u16 = 3;

fn split(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

fn board_block() -> Block<'static> {
    Block::default().borders(Borders::ALL).title(" bughunt ")
}

/// Inner area of the board for a frame of size `area`
pub fn board_area(area: Rect) -> Rect {
    let (_, board, _) = split(area);
    board_block().inner(board)
}

/// Cells occupied by a target at `pos` inside `board`
pub fn target_rect(board: Rect, pos: Position) -> Rect {
    let max_x = board.width.saturating_sub(TARGET_WIDTH) as u32;
    let max_y = board.height.saturating_sub(1) as u32;
    let x = board.x + (max_x * pos.x_pct as u32 / 100) as u16;
    let y = board.y + (max_y * pos.y_pct as u32 / 100) as u16;
    Rect::new(x, y, TARGET_WIDTH.min(board.width), 1.min(board.height))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

/// Draw the current screen and remember the frame size for mouse hit-testing
pub fn draw<C: Clock>(app: &mut App<C>, f: &mut Frame) {
    app.last_area = f.area();
    let screen = screen::current_screen::<C>(&app.state);
    screen.render(app, f);
}

pub fn render_game<C: Clock>(app: &mut App<C>, f: &mut Frame) {
    let (header, board, footer) = split(f.area());
    let session = &app.session;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(header);

    let timer_style = if session.seconds_remaining() <= LOW_TIME_SECS {
        bold.fg(Color::Red)
    } else {
        bold.fg(Color::Green)
    };
    let cells = [
        ("PLAYER", session.player_name().to_string(), bold.fg(Color::Cyan)),
        ("SCORE", session.score().to_string(), bold.fg(Color::Yellow)),
        ("TIME", format!("{}s", session.seconds_remaining()), timer_style),
    ];
    for ((label, value, style), area) in cells.into_iter().zip(columns.iter()) {
        let text = vec![
            Line::from(Span::styled(label, Style::default().add_modifier(Modifier::DIM))),
            Line::from(Span::styled(value, style)),
        ];
        f.render_widget(Paragraph::new(text).alignment(Alignment::Center), *area);
    }

    let block = board_block();
    let inner = block.inner(board);
    f.render_widget(block, board);

    let target_style = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
    for t in session.targets() {
        let label = key_for_slot(t.slot).unwrap_or('?');
        f.render_widget(
            Paragraph::new(Span::styled(format!("🐞{label}"), target_style)),
            target_rect(inner, t.position),
        );
    }

    if let Some(lines) = overlay_lines(app) {
        let area = centered_rect(44, lines.len() as u16 + 2, inner);
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            area,
        );
    }

    let help = match app.session.status() {
        Status::Idle => "(enter) start  (tab) leaderboard  (esc) quit",
        Status::Running => "(a-o) or click to swat  (space) pause  (tab) leaderboard  (esc) quit",
        Status::Paused => "(space) resume  (tab) leaderboard  (esc) quit",
        Status::Ended => "(enter) play again  (tab) leaderboard  (esc) quit",
    };
    f.render_widget(
        Paragraph::new(help)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM)),
        footer,
    );
}

fn overlay_lines<C: Clock>(app: &App<C>) -> Option<Vec<Line<'static>>> {
    let session = &app.session;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match session.status() {
        Status::Running => None,
        Status::Idle => Some(vec![
            Line::from(Span::styled("BUG HUNT", bold.fg(Color::Yellow))),
            Line::from(format!(
                "Swat bugs for {} points each",
                session.config().points_per_target
            )),
            Line::from(format!(
                "You have {} seconds",
                session.config().duration_secs
            )),
            Line::from("Press Enter to start"),
        ]),
        Status::Paused => Some(vec![
            Line::from(Span::styled("PAUSED", bold.fg(Color::Yellow))),
            Line::from("Press Space to resume"),
        ]),
        Status::Ended => {
            let saved = match session.submission_state() {
                Submission::Saved => Span::styled("Score saved", Style::default().fg(Color::Green)),
                Submission::Failed => {
                    Span::styled("Error saving score", Style::default().fg(Color::Red))
                }
                Submission::Pending | Submission::NotSubmitted => {
                    Span::styled("Saving score...", Style::default().add_modifier(Modifier::DIM))
                }
            };
            let mut lines = vec![
                Line::from(Span::styled("GAME OVER", bold.fg(Color::Yellow))),
                Line::from(format!("Score: {} points", session.score())),
                Line::from(format!("Player: {}", session.player_name())),
                Line::from(saved),
            ];
            if let Some(best) = app.personal_best {
                lines.push(Line::from(format!("Personal best: {best}")));
            }
            Some(lines)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::backend::StaticName;
    use crate::board::SLOTS;
    use crate::runtime::ManualClock;
    use crate::session::{Session, SessionConfig};
    use crate::store::ScoreDb;
    use chrono::Local;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use std::time::Duration;

    fn app(scores: Arc<ScoreDb>) -> App<ManualClock> {
        let config = SessionConfig {
            spawn_probability: 0.0,
            ..SessionConfig::default()
        };
        let session = Session::new(
            config,
            StdRng::seed_from_u64(5),
            Box::new(StaticName(Some("ana".into()))),
            scores.clone(),
        );
        App::new(session, scores, ManualClock::new())
    }

    fn render(app: &mut App<ManualClock>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn target_rect_stays_inside_board() {
        let board = Rect::new(1, 4, 78, 18);
        for pos in SLOTS {
            let r = target_rect(board, pos);
            assert!(r.x >= board.x && r.right() <= board.right());
            assert!(r.y >= board.y && r.bottom() <= board.bottom());
        }
    }

    #[test]
    fn target_rect_on_tiny_board_does_not_overflow() {
        let board = Rect::new(0, 0, 2, 1);
        let r = target_rect(board, Position::new(80, 65));
        assert_eq!(r, Rect::new(0, 0, 2, 1));
    }

    #[test]
    fn idle_screen_prompts_to_start() {
        let mut app = app(Arc::new(ScoreDb::open_in_memory().unwrap()));
        let content = render(&mut app);

        assert!(content.contains("Press Enter to start"));
        assert!(content.contains("ana"));
        assert!(content.contains("30s"));
        assert_eq!(app.last_area, Rect::new(0, 0, 80, 24));
    }

    #[test]
    fn running_screen_draws_targets_with_labels() {
        let mut app = app(Arc::new(ScoreDb::open_in_memory().unwrap()));
        app.session.start();
        app.clock().advance(Duration::from_millis(1000));
        app.on_tick();

        let content = render(&mut app);
        assert!(content.contains("29s"));
        for t in app.session.targets() {
            assert!(content.contains(key_for_slot(t.slot).unwrap()));
        }
        assert!(!content.contains("Press Enter"));
    }

    #[test]
    fn paused_and_ended_overlays() {
        let mut app = app(Arc::new(ScoreDb::open_in_memory().unwrap()));
        app.session.start();
        app.session.toggle_pause();
        assert!(render(&mut app).contains("PAUSED"));

        app.session.toggle_pause();
        for _ in 0..40 {
            app.clock().advance(Duration::from_secs(1));
            app.on_tick();
        }
        app.session.wait_for_submission(Duration::from_secs(5));
        app.on_tick();
        let content = render(&mut app);
        assert!(content.contains("GAME OVER"));
        assert!(content.contains("Score saved"));
        assert!(content.contains("Personal best: 0"));
    }

    #[test]
    fn leaderboard_lists_entries_and_clamps_scroll() {
        let scores = Arc::new(ScoreDb::open_in_memory().unwrap());
        scores.record("bo", 120, Local::now()).unwrap();
        scores.record("cy", 40, Local::now()).unwrap();
        let mut app = app(scores);
        app.open_leaderboard();
        app.leaderboard.scroll_offset = 99;

        let content = render(&mut app);
        assert_eq!(app.state, AppState::Leaderboard);
        assert!(content.contains("Leaderboard"));
        assert!(content.contains("bo"));
        assert!(content.contains("120"));
        assert_eq!(app.leaderboard.scroll_offset, 0);
    }

    #[test]
    fn empty_leaderboard_message() {
        let mut app = app(Arc::new(ScoreDb::open_in_memory().unwrap()));
        app.open_leaderboard();
        assert!(render(&mut app).contains("No scores yet"));
    }
}
