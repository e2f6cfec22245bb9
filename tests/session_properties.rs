use std::sync::Arc;
use std::time::Duration;

use bughunt::backend::{MemorySink, StaticName, Submission};
use bughunt::session::{
    Session, SessionConfig, SessionSnapshot, Status, MAX_TARGETS, POINTS_PER_TARGET,
    SESSION_DURATION,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const STEP: Duration = Duration::from_millis(50);

fn session(seed: u64, spawn_probability: f64, sink: Arc<MemorySink>) -> Session {
    let config = SessionConfig {
        spawn_probability,
        ..SessionConfig::default()
    };
    Session::new(
        config,
        StdRng::seed_from_u64(seed),
        Box::new(StaticName(Some("prop".into()))),
        sink,
    )
}

fn run_for(s: &mut Session, total: Duration) {
    let end = s.clock() + total;
    while s.clock() < end {
        s.advance_by(STEP);
    }
}

#[derive(Debug, Clone)]
enum Action {
    Wait(u64),
    TapOldest,
    TapMissing(u64),
    TogglePause,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (1u64..3000).prop_map(Action::Wait),
        Just(Action::TapOldest),
        (1000u64..2000).prop_map(Action::TapMissing),
        Just(Action::TogglePause),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn score_tracks_successful_taps_and_cap_holds(
        seed in any::<u64>(),
        actions in proptest::collection::vec(action(), 1..80),
    ) {
        let sink = Arc::new(MemorySink::new());
        let mut s = session(seed, 0.4, sink);
        let rx = s.subscribe();
        s.start();

        let mut hits = 0u32;
        for a in actions {
            match a {
                Action::Wait(ms) => s.advance_by(Duration::from_millis(ms)),
                Action::TapOldest => {
                    if let Some(t) = s.targets().first().copied() {
                        if s.tap_target(t.id) {
                            hits += 1;
                        }
                    }
                }
                Action::TapMissing(id) => {
                    let before = s.score();
                    prop_assert!(!s.tap_target(id));
                    prop_assert_eq!(s.score(), before);
                }
                Action::TogglePause => {
                    s.toggle_pause();
                }
            }
            prop_assert_eq!(s.score(), POINTS_PER_TARGET * hits);
        }

        let snaps: Vec<SessionSnapshot> = rx.try_iter().collect();
        prop_assert!(snaps.iter().all(|snap| snap.targets.len() <= MAX_TARGETS));
        prop_assert!(snaps.iter().filter(|snap| snap.status == Status::Ended).count() <= 1);
        prop_assert!(snaps
            .windows(2)
            .all(|w| w[1].score >= w[0].score || w[1].status == Status::Idle));
    }

    #[test]
    fn reset_twice_always_lands_in_idle(seed in any::<u64>(), wait_ms in 0u64..40_000, pause in any::<bool>()) {
        let mut s = session(seed, 0.4, Arc::new(MemorySink::new()));
        s.start();
        s.advance_by(Duration::from_millis(wait_ms / 2));
        if pause {
            s.toggle_pause();
        }
        s.advance_by(Duration::from_millis(wait_ms / 2));

        s.reset();
        s.reset();

        prop_assert_eq!(s.status(), Status::Idle);
        prop_assert_eq!(s.score(), 0);
        prop_assert_eq!(s.seconds_remaining(), SESSION_DURATION);
        prop_assert!(s.targets().is_empty());
        prop_assert!(s.pending_tasks().is_empty());
    }
}

#[test]
fn untouched_round_ends_once_with_zero() {
    let sink = Arc::new(MemorySink::new());
    let mut s = session(1, 0.4, sink.clone());
    let rx = s.subscribe();

    s.start();
    run_for(&mut s, Duration::from_secs(SESSION_DURATION as u64 + 5));

    assert_eq!(s.status(), Status::Ended);
    assert_eq!(
        s.wait_for_submission(Duration::from_secs(5)),
        Submission::Saved
    );
    assert_eq!(sink.results(), vec![(0, "prop".to_string())]);
    let ended = rx
        .try_iter()
        .filter(|snap| snap.status == Status::Ended)
        .count();
    assert_eq!(ended, 1);
}

#[test]
fn staggered_spawns_then_three_taps_then_timeout() {
    let sink = Arc::new(MemorySink::new());
    let mut s = session(2, 0.0, sink.clone());
    let rx = s.subscribe();

    s.start();
    run_for(&mut s, Duration::from_millis(900));
    assert_eq!(s.targets().len(), 3);

    for t in s.targets().to_vec() {
        assert!(s.tap_target(t.id));
    }
    assert_eq!(s.score(), 30);

    run_for(&mut s, Duration::from_secs(SESSION_DURATION as u64));

    assert_eq!(s.status(), Status::Ended);
    assert_eq!(
        s.wait_for_submission(Duration::from_secs(5)),
        Submission::Saved
    );
    assert_eq!(sink.results(), vec![(30, "prop".to_string())]);
    let ended = rx
        .try_iter()
        .filter(|snap| snap.status == Status::Ended)
        .count();
    assert_eq!(ended, 1);

    // nothing left to fire: more time changes nothing
    run_for(&mut s, Duration::from_secs(5));
    assert_eq!(sink.results().len(), 1);
    assert_eq!(s.score(), 30);
}

#[test]
fn pause_resume_keeps_targets_and_time() {
    let mut s = session(3, 0.4, Arc::new(MemorySink::new()));
    s.start();
    run_for(&mut s, Duration::from_millis(7_300));
    let before = s.snapshot();

    s.toggle_pause();
    run_for(&mut s, Duration::from_secs(45));
    s.toggle_pause();

    let after = s.snapshot();
    assert_eq!(after.seconds_remaining, before.seconds_remaining);
    assert_eq!(after.targets, before.targets);
    assert_eq!(after.score, before.score);
}
