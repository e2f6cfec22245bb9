use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position as CellPos, Rect};

use crate::backend::Submission;
use crate::board::slot_for_key;
use crate::runtime::{Clock, GameEvent, MonotonicClock};
use crate::session::{Session, Status};
use crate::store::{ScoreDb, ScoreEntry, LEADERBOARD_LIMIT};
use crate::ui;

/// How long quitting waits for an in-flight score submission
const SUBMIT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Leaderboard,
}

#[derive(Debug, Default)]
pub struct LeaderboardState {
    pub entries: Vec<ScoreEntry>,
    pub error: Option<String>,
    pub scroll_offset: usize,
}

/// Screen-level state wrapped around one session engine
pub struct App<C: Clock = MonotonicClock> {
    pub session: Session,
    pub state: AppState,
    pub leaderboard: LeaderboardState,
    pub should_quit: bool,
    /// Best saved score of the current player, looked up once a round is saved
    pub personal_best: Option<u32>,
    /// Area of the last rendered frame, used to hit-test mouse clicks
    pub last_area: Rect,
    scores: Arc<ScoreDb>,
    clock: C,
}

impl<C: Clock> App<C> {
    pub fn new(session: Session, scores: Arc<ScoreDb>, clock: C) -> Self {
        Self {
            session,
            state: AppState::Playing,
            leaderboard: LeaderboardState::default(),
            should_quit: false,
            personal_best: None,
            last_area: Rect::default(),
            scores,
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Dispatch one runtime event; returns true when the screen should be redrawn
    pub fn handle(&mut self, event: GameEvent) -> bool {
        match event {
            GameEvent::Tick => self.on_tick(),
            GameEvent::Resize => true,
            GameEvent::Key(key) => self.on_key(key),
            GameEvent::Mouse(m) => self.on_mouse(m),
        }
    }

    pub fn on_tick(&mut self) -> bool {
        let before = self.session.snapshot();
        let submission = self.session.submission_state();
        self.session.advance(self.clock.now());
        self.session.poll_submission();
        let best = self.personal_best;
        self.refresh_personal_best();
        before != self.session.snapshot()
            || submission != self.session.submission_state()
            || best != self.personal_best
    }

    fn refresh_personal_best(&mut self) {
        if self.session.status() != Status::Ended
            || self.session.submission_state() != Submission::Saved
            || self.personal_best.is_some()
        {
            return;
        }
        match self.scores.best_score(self.session.player_name()) {
            Ok(best) => self.personal_best = best,
            Err(e) => log::warn!("could not look up personal best: {e}"),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return true;
        }

        match self.state {
            AppState::Playing => self.on_playing_key(key),
            AppState::Leaderboard => self.on_leaderboard_key(key),
        }
        true
    }

    fn on_playing_key(&mut self, key: KeyEvent) {
        // keep the session clock current before the input is applied
        self.session.advance(self.clock.now());
        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Char(' ') => {
                self.session.toggle_pause();
            }
            KeyCode::Enter => match self.session.status() {
                Status::Idle => {
                    self.session.start();
                }
                Status::Ended => {
                    self.personal_best = None;
                    self.session.restart();
                }
                Status::Running | Status::Paused => {}
            },
            KeyCode::Tab => self.open_leaderboard(),
            KeyCode::Char(c) => {
                if let Some(slot) = slot_for_key(c) {
                    self.session.tap_slot(slot);
                }
            }
            _ => {}
        }
    }

    fn on_leaderboard_key(&mut self, key: KeyEvent) {
        let offset = self.leaderboard.scroll_offset;
        match key.code {
            KeyCode::Esc | KeyCode::Tab | KeyCode::Backspace | KeyCode::Char('b') => {
                self.state = AppState::Playing;
            }
            KeyCode::Char('r') => self.reload_leaderboard(),
            KeyCode::Up => self.leaderboard.scroll_offset = offset.saturating_sub(1),
            KeyCode::Down => self.leaderboard.scroll_offset = offset + 1,
            KeyCode::PageUp => self.leaderboard.scroll_offset = offset.saturating_sub(10),
            KeyCode::PageDown => self.leaderboard.scroll_offset = offset + 10,
            KeyCode::Home => self.leaderboard.scroll_offset = 0,
            _ => {}
        }
    }

    pub fn on_mouse(&mut self, m: MouseEvent) -> bool {
        if self.state != AppState::Playing || m.kind != MouseEventKind::Down(MouseButton::Left) {
            return false;
        }
        self.session.advance(self.clock.now());

        let board = ui::board_area(self.last_area);
        let hit = self
            .session
            .targets()
            .iter()
            .find(|t| ui::target_rect(board, t.position).contains(CellPos::new(m.column, m.row)))
            .map(|t| t.id);
        match hit {
            Some(id) => self.session.tap_target(id),
            None => false,
        }
    }

    /// Leaving the game screen abandons the current play-through
    pub fn open_leaderboard(&mut self) {
        self.leave_session();
        self.state = AppState::Leaderboard;
        self.reload_leaderboard();
    }

    pub fn reload_leaderboard(&mut self) {
        self.leaderboard.scroll_offset = 0;
        match self.scores.top_scores(LEADERBOARD_LIMIT) {
            Ok(entries) => {
                self.leaderboard.entries = entries;
                self.leaderboard.error = None;
            }
            Err(e) => {
                log::warn!("could not load leaderboard: {e}");
                self.leaderboard.entries.clear();
                self.leaderboard.error = Some(e.to_string());
            }
        }
    }

    pub fn quit(&mut self) {
        self.leave_session();
        self.should_quit = true;
    }

    fn leave_session(&mut self) {
        if self.session.submission_state() == Submission::Pending {
            self.session.wait_for_submission(SUBMIT_GRACE);
        }
        self.session.reset();
        self.personal_best = None;
    }
}
