use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A point on the board expressed as percentages of its width and height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x_pct: u8,
    pub y_pct: u8,
}

impl Position {
    pub const fn new(x_pct: u8, y_pct: u8) -> Self {
        Self { x_pct, y_pct }
    }
}

/// Predefined spawn positions, kept away from the board edges
pub const SLOTS: [Position; 15] = [
    Position::new(25, 30),
    Position::new(50, 25),
    Position::new(75, 30),
    Position::new(20, 50),
    Position::new(45, 45),
    Position::new(70, 50),
    Position::new(35, 65),
    Position::new(60, 70),
    Position::new(80, 65),
    Position::new(30, 40),
    Position::new(55, 35),
    Position::new(65, 40),
    Position::new(40, 55),
    Position::new(25, 60),
    Position::new(70, 60),
];

/// Keyboard label for each slot, index-aligned with `SLOTS`
pub const SLOT_KEYS: [char; 15] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
];

pub fn slot_for_key(c: char) -> Option<usize> {
    SLOT_KEYS
        .iter()
        .position(|&k| k == c.to_ascii_lowercase())
}

pub fn key_for_slot(slot: usize) -> Option<char> {
    SLOT_KEYS.get(slot).copied()
}

/// A tappable bug on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: u64,
    pub slot: usize,
    pub position: Position,
}

/// Pick a slot index in `0..pool_len`, avoiding the ones in `used` when possible.
///
/// When every slot has been used the set is cleared and a new cycle begins.
/// A used slot is redrawn at most `max_attempts - 1` times; the last draw is
/// accepted even if it repeats. The chosen slot is marked used.
pub fn select_slot<R: Rng + ?Sized>(
    used: &mut HashSet<usize>,
    pool_len: usize,
    max_attempts: u32,
    rng: &mut R,
) -> usize {
    debug_assert!(pool_len > 0);
    if used.len() >= pool_len {
        used.clear();
    }

    let mut index = rng.gen_range(0..pool_len);
    let mut attempts = 1;
    while used.contains(&index) && attempts < max_attempts {
        index = rng.gen_range(0..pool_len);
        attempts += 1;
    }

    used.insert(index);
    index
}

/// Bernoulli trial deciding whether a periodic spawn attempt produces a target
pub fn spawn_roll<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> bool {
    rng.gen_bool(probability.clamp(0.0, 1.0))
}
