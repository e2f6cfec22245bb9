use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::store::StoreError;

/// Name shown in the header and stored with the score when nothing else is known
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Looks up the current player's display name
pub trait DisplayNameProvider {
    fn display_name(&self) -> Option<String>;
}

/// Persists the final score of a finished session
pub trait ResultSink: Send + Sync + 'static {
    fn submit_result(&self, score: u32, player: &str) -> Result<(), StoreError>;
}

/// Display name fixed at construction (from config or the command line)
#[derive(Debug, Clone, Default)]
pub struct StaticName(pub Option<String>);

impl DisplayNameProvider for StaticName {
    fn display_name(&self) -> Option<String> {
        self.0
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
    }
}

/// Outcome of the one-time score submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    NotSubmitted,
    Pending,
    Saved,
    Failed,
}

/// Runs a submission on a worker thread and reports back over a channel
#[derive(Debug)]
pub struct PendingSubmission {
    rx: Receiver<bool>,
}

impl PendingSubmission {
    pub fn spawn(sink: Arc<dyn ResultSink>, score: u32, player: String) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let ok = match sink.submit_result(score, &player) {
                Ok(()) => {
                    log::info!("saved score {score} for {player}");
                    true
                }
                Err(e) => {
                    log::warn!("failed to save score {score} for {player}: {e}");
                    false
                }
            };
            let _ = tx.send(ok);
        });
        Self { rx }
    }

    /// Non-blocking check; `None` while the worker is still running
    pub fn poll(&self) -> Option<Submission> {
        match self.rx.try_recv() {
            Ok(ok) => Some(Self::outcome(ok)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Submission::Failed),
        }
    }

    pub fn wait(&self, timeout: Duration) -> Option<Submission> {
        match self.rx.recv_timeout(timeout) {
            Ok(ok) => Some(Self::outcome(ok)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Submission::Failed),
        }
    }

    fn outcome(ok: bool) -> Submission {
        if ok {
            Submission::Saved
        } else {
            Submission::Failed
        }
    }
}

/// In-memory sink that records every submission; handy for headless runs and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    results: Mutex<Vec<(u32, String)>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every submission fails
    pub fn failing() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn results(&self) -> Vec<(u32, String)> {
        self.results
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for MemorySink {
    fn submit_result(&self, score: u32, player: &str) -> Result<(), StoreError> {
        if let Ok(mut results) = self.results.lock() {
            results.push((score, player.to_string()));
        }
        if self.fail {
            return Err(StoreError::Unavailable("memory sink set to fail".into()));
        }
        Ok(())
    }
}
