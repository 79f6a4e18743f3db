//! The periodic decision tick: heartbeat, time snapshot, scheduled
//! watering and the safety ceiling.

use chrono::Duration;

use crate::mock_hw::{MockBoard, SETTLE_MS, Sim, boot_wall_time};

use plantwater::app::commands::{AppCommand, Dose};
use plantwater::app::events::AppEvent;
use plantwater::app::lights::Animation;
use plantwater::app::ports::{Channel, ClockPort, StorageError};
use plantwater::app::timekeeper::CurrentTimeRecord;

const FIRST_TICK_MS: u64 = SETTLE_MS + 30_000;

fn long_ago() -> &'static str {
    "2024-05-01T05:00:00Z"
}

fn is_watering_started(e: &AppEvent) -> bool {
    matches!(e, AppEvent::WateringStarted { .. })
}

#[test]
fn idle_tick_blinks_one_pseudo_random_channel() {
    let mut board = MockBoard::new();
    board.random = 4;
    let mut sim = Sim::armed(board);

    sim.advance_to(FIRST_TICK_MS);
    assert!(sim.board.saw(&AppEvent::Heartbeat(Channel::Two)));

    sim.advance_to(FIRST_TICK_MS + 500);
    assert!(sim.board.light_level(Channel::Two) > 0.0);
    assert_eq!(sim.board.light_level(Channel::One), 0.0);
    assert_eq!(sim.board.light_level(Channel::Three), 0.0);

    sim.advance_to(FIRST_TICK_MS + 1_500);
    assert!(!sim.app.is_animating());
}

#[test]
fn heartbeat_never_interrupts_an_active_animation() {
    let mut sim = Sim::armed(MockBoard::new());
    let now = sim.now();
    let runner = Animation::Runner { unit_ms: 100 };
    assert!(sim.app.handle_command(AppCommand::RunAnimation(runner), now, &mut sim.board));

    sim.advance_to(FIRST_TICK_MS + 30_000);
    assert_eq!(sim.board.count(|e| matches!(e, AppEvent::Heartbeat(_))), 0);
    assert!(sim.app.is_animating());
    assert_eq!(sim.app.lights().owned_timers().len(), 3);
}

#[test]
fn every_tick_persists_the_wall_clock() {
    let mut sim = Sim::armed(MockBoard::new());
    sim.advance_to(FIRST_TICK_MS + 60_000 + 7);

    let doc = sim.board.docs["currentTime"].clone();
    let record: CurrentTimeRecord = serde_json::from_value(doc).unwrap();
    // Stamped at the tick's deadline, not at the late poll.
    assert_eq!(
        record.timestamp,
        boot_wall_time() + Duration::milliseconds((FIRST_TICK_MS + 60_000) as i64)
    );
}

#[test]
fn due_tick_waters_long_and_records() {
    let mut board = MockBoard::new();
    board.seed_watering(long_ago(), 3);
    let mut sim = Sim::armed(board);

    sim.advance_to(FIRST_TICK_MS);
    let at = boot_wall_time() + Duration::milliseconds(FIRST_TICK_MS as i64);
    assert!(sim.board.saw(&AppEvent::WateringStarted {
        dose: Dose::Long,
        duration_ms: 25_000,
    }));
    assert!(sim.board.saw(&AppEvent::WateringRecorded { counter: 4, at }));
    assert_eq!(sim.board.stored_counter(), Some(4));
    assert!(sim.board.pump_on());

    sim.advance_to(FIRST_TICK_MS + 25_000);
    assert!(!sim.board.pump_on());

    // Not due again until a full period after the last watering.
    sim.advance_to(FIRST_TICK_MS + 3_600_000 - 30_000);
    assert_eq!(sim.board.count(is_watering_started), 1);

    sim.advance_to(FIRST_TICK_MS + 3_600_000);
    assert_eq!(sim.board.count(is_watering_started), 2);
    assert_eq!(sim.board.stored_counter(), Some(5));
}

#[test]
fn tick_skips_watering_while_pump_runs() {
    let mut board = MockBoard::new();
    board.seed_watering(long_ago(), 0);
    let mut sim = Sim::armed(board);

    // A manual long dose straddling the first tick.
    sim.advance_to(FIRST_TICK_MS - 1_000);
    let now = sim.now();
    assert!(sim.app.handle_command(AppCommand::StartWatering(Dose::Long), now, &mut sim.board));

    sim.advance_to(FIRST_TICK_MS);
    assert_eq!(sim.board.count(is_watering_started), 1);
    assert_eq!(sim.board.stored_counter(), Some(0));

    // Pump idle again at the next tick: the overdue watering happens.
    sim.advance_to(FIRST_TICK_MS + 30_000);
    assert_eq!(sim.board.count(is_watering_started), 2);
    assert_eq!(sim.board.stored_counter(), Some(1));
}

#[test]
fn counter_at_ceiling_still_waters_once_more() {
    let mut board = MockBoard::new();
    board.seed_watering(long_ago(), 20);
    let mut sim = Sim::armed(board);

    sim.advance_to(FIRST_TICK_MS);
    assert_eq!(sim.board.stored_counter(), Some(21));
    assert!(sim.app.safety_alarm());
}

#[test]
fn ceiling_refuses_until_reset_and_reports_once() {
    let mut board = MockBoard::new();
    board.seed_watering(long_ago(), 21);
    let mut sim = Sim::armed(board);

    sim.advance_to(FIRST_TICK_MS + 5 * 30_000);
    assert_eq!(sim.board.count(is_watering_started), 0);
    assert!(!sim.board.pump_on());
    assert_eq!(
        sim.board.count(|e| matches!(e, AppEvent::SafetyCeilingReached { counter: 21 })),
        1
    );

    sim.press(3_200);
    let reset_at = sim.board.now();
    assert_eq!(sim.board.stored_counter(), Some(-1));
    assert_eq!(sim.board.stored_last_watered(), Some(reset_at));
    assert!(!sim.app.safety_alarm());

    // The reset restarts the period: nothing for the next hour.
    sim.advance_by(30_000);
    assert_eq!(sim.board.count(is_watering_started), 0);
    sim.advance_by(3_560_000);
    assert_eq!(sim.board.count(is_watering_started), 0);
    assert!(!sim.board.pump_on());

    // First tick a full period after the reset waters and counts from 0.
    sim.advance_by(40_000);
    assert_eq!(sim.board.count(is_watering_started), 1);
    assert_eq!(sim.board.stored_counter(), Some(0));
}

#[test]
fn persistence_failures_are_reported_and_absorbed() {
    let mut board = MockBoard::new();
    board.seed_watering(long_ago(), 3);
    board.fail_writes = true;
    let mut sim = Sim::armed(board);

    sim.advance_to(FIRST_TICK_MS);
    assert!(sim.board.saw(&AppEvent::PersistFailed {
        key: "currentTime",
        error: StorageError::IoError,
    }));
    assert!(sim.board.saw(&AppEvent::PersistFailed {
        key: "wateringData",
        error: StorageError::IoError,
    }));
    assert!(sim.board.pump_on());
    assert_eq!(sim.app.schedule().counter(), 4);
    assert_eq!(sim.board.stored_counter(), Some(3));
}
