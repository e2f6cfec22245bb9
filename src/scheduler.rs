use std::time::Duration;

/// Named activities a session can have pending at any moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// One-second countdown step
    Tick,
    /// Periodic spawn attempt
    SpawnLoop,
    /// Staggered spawn issued by `start()`, indexed from zero
    InitialSpawn(u8),
    /// One-shot spawn issued after a successful tap
    ReplacementSpawn,
}

impl Task {
    fn same_kind(&self, other: &Task) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Lower runs first among tasks due at the same instant; the countdown
    /// goes before any spawn so the final tick ends the session first.
    fn rank(&self) -> u8 {
        match self {
            Task::Tick => 0,
            Task::SpawnLoop | Task::InitialSpawn(_) | Task::ReplacementSpawn => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    task: Task,
    due: Duration,
    seq: u64,
}

impl Scheduled {
    fn order(&self) -> (Duration, u8, u64) {
        (self.due, self.task.rank(), self.seq)
    }
}

/// Logical-time task queue owned by a single session.
///
/// Nothing here reads a wall clock: the owner passes the current logical time
/// to `pop_due` and decides what running a task means. Every pending task can
/// be enumerated and cancelled, so a suspended or finished session can always
/// be brought to a state where nothing else will fire.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: Vec<Scheduled>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: Task, due: Duration) {
        self.queue.push(Scheduled {
            task,
            due,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Cancel every pending task of the same kind as `task`.
    /// `InitialSpawn(_)` cancels all staggered spawns regardless of index.
    pub fn cancel(&mut self, task: Task) -> usize {
        let before = self.queue.len();
        self.queue.retain(|s| !s.task.same_kind(&task));
        before - self.queue.len()
    }

    /// Remove every pending task of the same kind as `task` and return them
    /// ordered by due time.
    pub fn take(&mut self, task: Task) -> Vec<(Task, Duration)> {
        let (mut taken, kept): (Vec<Scheduled>, Vec<Scheduled>) = self
            .queue
            .drain(..)
            .partition(|s| s.task.same_kind(&task));
        self.queue = kept;
        taken.sort_by_key(Scheduled::order);
        taken.into_iter().map(|s| (s.task, s.due)).collect()
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.queue.len();
        self.queue.clear();
        cancelled
    }

    /// Remove and return the earliest task due at or before `now`.
    /// Ties resolve countdown first, then in scheduling order.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Task, Duration)> {
        let (idx, _) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= now)
            .min_by_key(|(_, s)| s.order())?;
        let s = self.queue.swap_remove(idx);
        Some((s.task, s.due))
    }

    /// Pending tasks ordered by due time
    pub fn pending(&self) -> Vec<(Task, Duration)> {
        let mut items = self.queue.clone();
        items.sort_by_key(Scheduled::order);
        items.into_iter().map(|s| (s.task, s.due)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
