use std::sync::{mpsc, Arc};
use std::time::Duration;

use bughunt::app::App;
use bughunt::backend::{StaticName, Submission};
use bughunt::board::key_for_slot;
use bughunt::runtime::{FixedTicker, GameEvent, ManualClock, Runner, TestEventSource};
use bughunt::session::{Session, SessionConfig, Status};
use bughunt::store::ScoreDb;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn key(code: KeyCode) -> GameEvent {
    GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn app(scores: Arc<ScoreDb>, secs: u32) -> App<ManualClock> {
    let config = SessionConfig {
        duration_secs: secs,
        spawn_probability: 0.0,
        ..SessionConfig::default()
    };
    let session = Session::new(
        config,
        StdRng::seed_from_u64(21),
        Box::new(StaticName(Some("headless".into()))),
        scores.clone(),
    );
    App::new(session, scores, ManualClock::new())
}

// Headless integration using the runtime + App without a TTY.
// Ticks from the runner move a manual clock by 100ms each.
#[test]
fn headless_round_completes_and_saves_score() {
    let dir = tempfile::tempdir().unwrap();
    let scores = Arc::new(ScoreDb::open(dir.path().join("scores.db")).unwrap());
    let mut app = app(scores.clone(), 3);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();

    let mut swatted = false;
    for _ in 0..200u32 {
        let event = runner.step();
        if let GameEvent::Tick = event {
            app.clock().advance(Duration::from_millis(100));
        }
        app.handle(event);

        if !swatted && app.session.targets().len() == 3 {
            for t in app.session.targets().to_vec() {
                tx.send(key(KeyCode::Char(key_for_slot(t.slot).unwrap())))
                    .unwrap();
            }
            swatted = true;
        }
        if app.session.status() == Status::Ended {
            break;
        }
    }

    assert!(swatted, "initial bugs should have appeared");
    assert_eq!(app.session.status(), Status::Ended);
    assert_eq!(app.session.score(), 30);
    assert_eq!(
        app.session.wait_for_submission(Duration::from_secs(5)),
        Submission::Saved
    );

    let top = scores.top_scores(10).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].score, 30);
    assert_eq!(top[0].player, "headless");
}

#[test]
fn headless_pause_freezes_timer() {
    let scores = Arc::new(ScoreDb::open_in_memory().unwrap());
    let mut app = app(scores, 30);

    app.handle(key(KeyCode::Enter));
    for _ in 0..15 {
        app.clock().advance(Duration::from_millis(100));
        app.handle(GameEvent::Tick);
    }
    assert_eq!(app.session.seconds_remaining(), 29);

    app.handle(key(KeyCode::Char(' ')));
    for _ in 0..100 {
        app.clock().advance(Duration::from_millis(100));
        app.handle(GameEvent::Tick);
    }
    assert_eq!(app.session.status(), Status::Paused);
    assert_eq!(app.session.seconds_remaining(), 29);

    app.handle(key(KeyCode::Char(' ')));
    for _ in 0..10 {
        app.clock().advance(Duration::from_millis(100));
        app.handle(GameEvent::Tick);
    }
    assert_eq!(app.session.seconds_remaining(), 28);
}
