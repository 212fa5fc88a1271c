use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::tempdir;

use deer_timer::clock::ManualClock;
use deer_timer::draft::{FieldUpdate, SessionDraft};
use deer_timer::runtime::FixedTicker;
use deer_timer::service::TimerService;
use deer_timer::session::Catalog;
use deer_timer::stats::{self, Period};
use deer_timer::store::{JsonSessionStore, SessionLog};
use deer_timer::timer::RunState;

fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

// Headless run of the whole path: timer service -> draft -> log -> disk -> stats
#[test]
fn timed_sessions_flow_into_statistics() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let catalog = Catalog::default();
    let clock = ManualClock::new();
    let timer = TimerService::spawn(clock.clone(), FixedTicker::new(Duration::from_secs(3600)));
    let mut log = SessionLog::open(JsonSessionStore::with_path(&path), &catalog);
    assert!(log.is_empty());

    // Monday: 10 minutes with a pause in the middle
    timer.start().unwrap();
    clock.advance(Duration::from_secs(240));
    timer.pause().unwrap();
    clock.advance(Duration::from_secs(900));
    timer.start().unwrap();
    clock.advance(Duration::from_secs(360));
    let draft = SessionDraft::default()
        .with(FieldUpdate::Remark("first".into()))
        .with(FieldUpdate::Mood("Happy".into()))
        .with(FieldUpdate::Rating(4.0));
    let elapsed = timer.stop().unwrap().unwrap();
    assert_eq!(elapsed, 600);
    log.append(draft.materialize(&catalog, at(12, 21), elapsed)).unwrap();

    // Wednesday: 20 minutes straight
    assert_eq!(timer.start().unwrap().elapsed_secs, 0);
    clock.advance(Duration::from_secs(1200));
    let elapsed = timer.stop().unwrap().unwrap();
    log.append(SessionDraft::default().materialize(&catalog, at(14, 7), elapsed))
        .unwrap();

    assert_eq!(timer.snapshot().unwrap().state, RunState::Idle);

    // a fresh process sees exactly what was written
    let reloaded = SessionLog::open(JsonSessionStore::with_path(&path), &catalog);
    assert!(reloaded.load_error().is_none());
    assert_eq!(reloaded.sessions(), log.sessions());

    let sessions = reloaded.snapshot();
    let now = at(15, 12);
    let week_start = Period::Week.start(now).date();
    let week: Vec<f64> = stats::group_by_day(&sessions, week_start, week_start + chrono::Duration::days(6))
        .iter()
        .map(|b| b.minutes)
        .collect();
    assert_eq!(week, vec![10.0, 0.0, 20.0, 0.0, 0.0, 0.0, 0.0]);

    let agg = stats::period_aggregate(&sessions, Period::Week, now);
    assert_eq!(agg.total_seconds, 1800);
    assert_eq!(agg.average_minutes, 15.0);
    assert_eq!(stats::most_recent(&sessions).unwrap().timestamp, at(14, 7));
    assert_eq!(sessions[0].mood, "Happy");
    assert_eq!(sessions[1].mood, "Calm");
}

#[test]
fn observer_reattaching_mid_run_sees_the_same_timer() {
    let clock = ManualClock::new();
    let timer = TimerService::spawn(clock.clone(), FixedTicker::new(Duration::from_secs(3600)));
    let screen = timer.subscribe().unwrap();
    timer.start().unwrap();
    clock.advance(Duration::from_secs(30));
    drop(screen);

    // another front end picks the run up later
    let other = timer.clone();
    clock.advance(Duration::from_secs(30));
    let screen = other.subscribe().unwrap();
    let snap = screen.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(snap.state, RunState::Running);
    assert_eq!(snap.elapsed_secs, 60);

    assert_eq!(other.stop().unwrap(), Some(60));
}
