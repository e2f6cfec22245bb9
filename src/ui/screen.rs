use ratatui::Frame;

use crate::{
    app::{App, AppState},
    runtime::Clock,
    ui::{leaderboard::render_leaderboard, render_game},
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen<C: Clock> {
    fn render(&self, app: &mut App<C>, f: &mut Frame);
}

/// Game screen - header, board with targets and status overlay
pub struct GameScreen;

impl<C: Clock> Screen<C> for GameScreen {
    fn render(&self, app: &mut App<C>, f: &mut Frame) {
        render_game(app, f);
    }
}

/// Leaderboard screen - uses dedicated renderer
pub struct LeaderboardScreen;

impl<C: Clock> Screen<C> for LeaderboardScreen {
    fn render(&self, app: &mut App<C>, f: &mut Frame) {
        render_leaderboard(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<C: Clock>(state: &AppState) -> Box<dyn Screen<C>> {
    match state {
        AppState::Playing => Box::new(GameScreen),
        AppState::Leaderboard => Box::new(LeaderboardScreen),
    }
}
