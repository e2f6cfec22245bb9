use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::backend::{
    DisplayNameProvider, PendingSubmission, ResultSink, Submission, DEFAULT_PLAYER_NAME,
};
use crate::board::{select_slot, spawn_roll, Target, SLOTS};
use crate::scheduler::{Scheduler, Task};

pub const SESSION_DURATION: u32 = 30;
pub const MAX_TARGETS: usize = 10;
pub const POINTS_PER_TARGET: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Status {
    Idle,
    Running,
    Paused,
    Ended,
}

/// Tuned constants of a play-through
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub duration_secs: u32,
    pub max_targets: usize,
    pub points_per_target: u32,
    pub tick_interval: Duration,
    pub spawn_interval: Duration,
    pub spawn_probability: f64,
    pub replacement_delay: Duration,
    pub initial_spawn_delays: Vec<Duration>,
    pub slot_retry_limit: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: SESSION_DURATION,
            max_targets: MAX_TARGETS,
            points_per_target: POINTS_PER_TARGET,
            tick_interval: Duration::from_secs(1),
            spawn_interval: Duration::from_millis(2000),
            spawn_probability: 0.4,
            replacement_delay: Duration::from_millis(300),
            initial_spawn_delays: vec![
                Duration::from_millis(300),
                Duration::from_millis(600),
                Duration::from_millis(900),
            ],
            slot_retry_limit: 20,
        }
    }
}

/// What the presentation layer needs to draw a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: Status,
    pub seconds_remaining: u32,
    pub score: u32,
    pub targets: Vec<Target>,
}

/// One timed play-through of the minigame.
///
/// All mutation happens through `&mut self` on the caller's thread. Time only
/// moves when the owner calls [`Session::advance`], which runs due tasks in
/// order; the score submission is the only work handed to another thread.
pub struct Session<R: Rng = StdRng> {
    config: SessionConfig,
    status: Status,
    seconds_remaining: u32,
    score: u32,
    targets: Vec<Target>,
    used_slots: HashSet<usize>,
    spawn_counter: u64,
    scheduler: Scheduler,
    /// One-shot spawns held back while paused, with the delay they had left
    suspended: Vec<(Task, Duration)>,
    clock: Duration,
    rng: R,
    names: Box<dyn DisplayNameProvider>,
    sink: Arc<dyn ResultSink>,
    player_name: Option<String>,
    submission: Submission,
    pending: Option<PendingSubmission>,
    subscribers: Vec<Sender<SessionSnapshot>>,
    last_emitted: Option<SessionSnapshot>,
}

impl Session<StdRng> {
    /// Session with an entropy-seeded random source, or a fixed one when `seed` is given
    pub fn with_seed(
        config: SessionConfig,
        seed: Option<u64>,
        names: Box<dyn DisplayNameProvider>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self::new(config, rng, names, sink)
    }
}

impl<R: Rng> Session<R> {
    pub fn new(
        config: SessionConfig,
        rng: R,
        names: Box<dyn DisplayNameProvider>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let seconds_remaining = config.duration_secs;
        Self {
            config,
            status: Status::Idle,
            seconds_remaining,
            score: 0,
            targets: Vec::new(),
            used_slots: HashSet::new(),
            spawn_counter: 0,
            scheduler: Scheduler::new(),
            suspended: Vec::new(),
            clock: Duration::ZERO,
            rng,
            names,
            sink,
            player_name: None,
            submission: Submission::NotSubmitted,
            pending: None,
            subscribers: Vec::new(),
            last_emitted: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn spawn_counter(&self) -> u64 {
        self.spawn_counter
    }

    pub fn used_slots(&self) -> &HashSet<usize> {
        &self.used_slots
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn pending_tasks(&self) -> Vec<(Task, Duration)> {
        self.scheduler.pending()
    }

    pub fn submission_state(&self) -> Submission {
        self.submission
    }

    /// Name used for the header and the stored score
    pub fn player_name(&self) -> &str {
        self.player_name.as_deref().unwrap_or(DEFAULT_PLAYER_NAME)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            seconds_remaining: self.seconds_remaining,
            score: self.score,
            targets: self.targets.clone(),
        }
    }

    /// Receive a snapshot after every observable state change
    pub fn subscribe(&mut self) -> Receiver<SessionSnapshot> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn start(&mut self) -> bool {
        if self.status != Status::Idle {
            log::debug!("ignoring start() while {}", self.status);
            return false;
        }

        self.player_name = self.names.display_name();
        self.status = Status::Running;
        self.seconds_remaining = self.config.duration_secs;
        self.score = 0;
        self.targets.clear();
        self.used_slots.clear();
        self.spawn_counter = 0;
        self.submission = Submission::NotSubmitted;
        self.pending = None;

        let now = self.clock;
        for (i, delay) in self.config.initial_spawn_delays.iter().enumerate() {
            self.scheduler
                .schedule(Task::InitialSpawn(i as u8), now + *delay);
        }
        self.schedule_periodic();

        log::info!(
            "session started for {} ({}s)",
            self.player_name(),
            self.config.duration_secs
        );
        self.emit();
        true
    }

    /// `reset()` followed by `start()`
    pub fn restart(&mut self) -> bool {
        self.reset();
        self.start()
    }

    /// Move logical time forward to `now`, running every task that falls due.
    /// Calls with a time earlier than the current clock are ignored.
    pub fn advance(&mut self, now: Duration) {
        if now < self.clock {
            return;
        }
        if self.scheduler.is_empty() {
            self.clock = now;
            return;
        }
        while let Some((task, due)) = self.scheduler.pop_due(now) {
            self.clock = self.clock.max(due);
            self.run_task(task, due, now);
        }
        self.clock = now;
    }

    pub fn advance_by(&mut self, dt: Duration) {
        self.advance(self.clock + dt);
    }

    fn run_task(&mut self, task: Task, due: Duration, now: Duration) {
        match task {
            Task::Tick => {
                self.tick();
                if self.status == Status::Running {
                    let next = Self::next_occurrence(due, now, self.config.tick_interval);
                    self.scheduler.schedule(Task::Tick, next);
                }
            }
            Task::SpawnLoop => {
                self.attempt_spawn();
                if self.status == Status::Running {
                    let next = Self::next_occurrence(due, now, self.config.spawn_interval);
                    self.scheduler.schedule(Task::SpawnLoop, next);
                }
            }
            Task::InitialSpawn(_) | Task::ReplacementSpawn => {
                self.spawn_target();
            }
        }
    }

    // Periodic tasks that fell behind by a whole interval skip the missed firings.
    fn next_occurrence(due: Duration, now: Duration, interval: Duration) -> Duration {
        let next = due + interval;
        if next <= now {
            now + interval
        } else {
            next
        }
    }

    fn schedule_periodic(&mut self) {
        let now = self.clock;
        self.scheduler
            .schedule(Task::Tick, now + self.config.tick_interval);
        self.scheduler
            .schedule(Task::SpawnLoop, now + self.config.spawn_interval);
    }

    /// One countdown step; ends the session when the timer reaches zero
    pub fn tick(&mut self) {
        if self.status != Status::Running {
            return;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.end();
        } else {
            self.emit();
        }
    }

    /// Periodic Bernoulli trial for a new target
    pub fn attempt_spawn(&mut self) -> bool {
        if self.status != Status::Running || self.targets.len() >= self.config.max_targets {
            return false;
        }
        if spawn_roll(self.config.spawn_probability, &mut self.rng) {
            self.spawn_target()
        } else {
            false
        }
    }

    pub fn spawn_target(&mut self) -> bool {
        if self.status != Status::Running || self.targets.len() >= self.config.max_targets {
            return false;
        }

        let slot = select_slot(
            &mut self.used_slots,
            SLOTS.len(),
            self.config.slot_retry_limit,
            &mut self.rng,
        );
        self.spawn_counter += 1;
        self.targets.push(Target {
            id: self.spawn_counter,
            slot,
            position: SLOTS[slot],
        });
        log::debug!("spawned target {} at slot {}", self.spawn_counter, slot);
        self.emit();
        true
    }

    pub fn tap_target(&mut self, id: u64) -> bool {
        if self.status != Status::Running {
            return false;
        }
        let Some(idx) = self.targets.iter().position(|t| t.id == id) else {
            return false;
        };

        self.targets.remove(idx);
        self.score = self.score.saturating_add(self.config.points_per_target);
        self.scheduler.schedule(
            Task::ReplacementSpawn,
            self.clock + self.config.replacement_delay,
        );
        self.emit();
        true
    }

    /// Tap the oldest target sitting in `slot`
    pub fn tap_slot(&mut self, slot: usize) -> bool {
        let id = self
            .targets
            .iter()
            .filter(|t| t.slot == slot)
            .map(|t| t.id)
            .min();
        match id {
            Some(id) => self.tap_target(id),
            None => false,
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.status {
            Status::Running => {
                self.status = Status::Paused;
                self.scheduler.cancel(Task::Tick);
                self.scheduler.cancel(Task::SpawnLoop);
                let now = self.clock;
                self.suspended = [Task::InitialSpawn(0), Task::ReplacementSpawn]
                    .into_iter()
                    .flat_map(|kind| self.scheduler.take(kind))
                    .map(|(task, due)| (task, due.saturating_sub(now)))
                    .collect();
                log::debug!(
                    "paused with {}s left, {} spawns held",
                    self.seconds_remaining,
                    self.suspended.len()
                );
            }
            Status::Paused => {
                self.status = Status::Running;
                self.schedule_periodic();
                let now = self.clock;
                for (task, remaining) in std::mem::take(&mut self.suspended) {
                    self.scheduler.schedule(task, now + remaining);
                }
                log::debug!("resumed with {}s left", self.seconds_remaining);
            }
            Status::Idle | Status::Ended => return false,
        }
        self.emit();
        true
    }

    fn end(&mut self) {
        if self.status != Status::Running {
            return;
        }
        self.status = Status::Ended;
        self.scheduler.cancel_all();
        self.suspended.clear();
        self.targets.clear();

        let player = self.player_name().to_string();
        log::info!("session ended: {} scored {}", player, self.score);
        self.pending = Some(PendingSubmission::spawn(
            Arc::clone(&self.sink),
            self.score,
            player,
        ));
        self.submission = Submission::Pending;
        self.emit();
    }

    /// Return to a fresh `Idle` session from any state. Safe to call repeatedly.
    pub fn reset(&mut self) {
        let cancelled = self.scheduler.cancel_all() + self.suspended.len();
        self.suspended.clear();
        if cancelled > 0 {
            log::debug!("reset cancelled {cancelled} scheduled tasks");
        }
        self.status = Status::Idle;
        self.seconds_remaining = self.config.duration_secs;
        self.score = 0;
        self.targets.clear();
        self.used_slots.clear();
        self.spawn_counter = 0;
        self.submission = Submission::NotSubmitted;
        self.pending = None;
        self.emit();
    }

    /// Outcome of the score submission, picking up a finished worker if any
    pub fn poll_submission(&mut self) -> Submission {
        if let Some(outcome) = self.pending.as_ref().and_then(|p| p.poll()) {
            self.submission = outcome;
            self.pending = None;
        }
        self.submission
    }

    /// Block for up to `timeout` waiting on an in-flight submission
    pub fn wait_for_submission(&mut self, timeout: Duration) -> Submission {
        if let Some(outcome) = self.pending.as_ref().and_then(|p| p.wait(timeout)) {
            self.submission = outcome;
            self.pending = None;
        }
        self.submission
    }

    fn emit(&mut self) {
        let snap = self.snapshot();
        if self.last_emitted.as_ref() == Some(&snap) {
            return;
        }
        self.subscribers.retain(|tx| tx.send(snap.clone()).is_ok());
        self.last_emitted = Some(snap);
    }
}
