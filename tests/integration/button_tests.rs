//! Button gestures against the full coordinator: short press waters or
//! aborts, long press resets the schedule.

use crate::mock_hw::{MockBoard, SETTLE_MS, Sim};

use plantwater::app::commands::{AppCommand, Dose};
use plantwater::app::events::{AppEvent, StopReason};
use plantwater::app::lights::Animation;
use plantwater::app::ports::Channel;

/// The idle slow blink (5 × 40 frames × 50 ms) is over by then.
const IDLE_OVER_MS: u64 = SETTLE_MS + 10_000;

#[test]
fn presses_during_settle_are_ignored() {
    let mut sim = Sim::boot(MockBoard::new());
    sim.advance_to(1_000);
    sim.press(200);
    sim.press(3_500);
    assert!(!sim.app.is_pump_running());
    assert!(!sim.board.pump_on());
    assert!(!sim.board.saw(&AppEvent::ScheduleReset));
    // Boot pulse is still showing.
    assert!((sim.board.light_level(Channel::One) - 0.1).abs() < 1e-6);
}

#[test]
fn short_press_runs_short_dose_then_auto_stops() {
    let mut sim = Sim::armed(MockBoard::new());
    sim.advance_to(IDLE_OVER_MS);
    sim.press(500);

    assert!(sim.app.is_pump_running());
    assert!(sim.board.pump_on());
    assert!(sim.board.saw(&AppEvent::WateringStarted {
        dose: Dose::Short,
        duration_ms: 5_000,
    }));
    assert!(sim.board.saw(&AppEvent::AnimationStarted(Animation::RunProgressBar {
        duration_ms: 5_000
    })));

    let started = sim.now();
    sim.advance_to(started + 4_999);
    assert!(sim.board.pump_on());

    sim.advance_to(started + 5_000);
    assert!(!sim.app.is_pump_running());
    assert!(!sim.board.pump_on());
    assert_eq!(
        sim.board.count(|e| *e == AppEvent::PumpStopped(StopReason::Completed)),
        1
    );
    // Progress bar chained into the completion blink.
    assert!(sim.app.is_animating());
    assert!(sim.board.saw(&AppEvent::AnimationStarted(Animation::blink(3))));

    // A manual dose is never counted.
    assert_eq!(sim.board.stored_counter(), None);
}

#[test]
fn short_press_while_running_aborts_everything() {
    let mut sim = Sim::armed(MockBoard::new());
    sim.advance_to(IDLE_OVER_MS);
    sim.press(200);
    assert!(sim.app.completion_blink_pending());

    sim.advance_by(1_000);
    sim.press(300);

    assert!(!sim.app.is_pump_running());
    assert!(!sim.board.pump_on());
    assert!(!sim.app.is_animating());
    assert!(!sim.app.completion_blink_pending());
    assert!(sim.board.all_lights_off());
    assert!(sim.board.saw(&AppEvent::PumpStopped(StopReason::Aborted)));
    assert_eq!(sim.board.stored_counter(), None);

    // Nothing left over fires before the next tick.
    let events_before = sim.board.events.len();
    sim.advance_to(SETTLE_MS + 29_999);
    assert!(sim.board.all_lights_off());
    assert_eq!(sim.board.events.len(), events_before);
}

#[test]
fn press_just_under_threshold_is_short() {
    let mut sim = Sim::armed(MockBoard::new());
    sim.advance_to(IDLE_OVER_MS);
    sim.press(2_999);
    assert!(sim.app.is_pump_running());
    assert!(!sim.board.saw(&AppEvent::ScheduleReset));
}

#[test]
fn long_press_resets_counter_and_acknowledges() {
    let mut board = MockBoard::new();
    board.seed_watering("2024-05-01T07:30:00Z", 12);
    let mut sim = Sim::armed(board);
    assert_eq!(sim.app.schedule().counter(), 12);

    sim.advance_to(IDLE_OVER_MS);
    sim.press(3_000);

    assert_eq!(sim.app.schedule().counter(), -1);
    assert_eq!(sim.board.stored_counter(), Some(-1));
    assert!(sim.board.saw(&AppEvent::ScheduleReset));
    assert!(sim.board.saw(&AppEvent::AnimationStarted(Animation::blink(5))));
    assert!(!sim.app.is_pump_running());

    // Acknowledge blink: 5 cycles of 1 s, then dark.
    let released = sim.now();
    sim.advance_to(released + 500);
    assert!(sim.board.light_level(Channel::Two) > 0.0);
    sim.advance_to(released + 5_500);
    assert!(!sim.app.is_animating());
    assert!(sim.board.all_lights_off());
}

#[test]
fn long_press_while_pumping_resets_without_stopping_pump() {
    let mut sim = Sim::armed(MockBoard::new());
    sim.advance_to(IDLE_OVER_MS);
    let now = sim.now();
    assert!(sim.app.handle_command(AppCommand::StartWatering(Dose::Long), now, &mut sim.board));

    sim.advance_by(1_000);
    sim.press(4_000);

    assert_eq!(sim.app.schedule().counter(), -1);
    assert!(sim.app.is_pump_running());
    assert!(sim.board.pump_on());

    // The pump still stops on its own schedule.
    sim.advance_to(IDLE_OVER_MS + 25_000);
    assert!(!sim.board.pump_on());
}

#[test]
fn superseded_progress_bar_still_gets_one_completion_blink() {
    let mut sim = Sim::armed(MockBoard::new());
    sim.advance_to(IDLE_OVER_MS);
    sim.press(200);
    let started = sim.now();
    let is_completion_blink = |e: &AppEvent| *e == AppEvent::AnimationStarted(Animation::blink(3));

    // A long press mid-dose replaces the progress bar with the acknowledge blink.
    sim.advance_by(1_000);
    sim.press(3_500);
    assert!(sim.board.saw(&AppEvent::AnimationStarted(Animation::blink(5))));
    assert!(sim.app.is_pump_running());
    assert!(sim.app.completion_blink_pending());

    sim.advance_to(started + 4_999);
    assert_eq!(sim.board.count(is_completion_blink), 0);

    sim.advance_to(started + 5_000);
    assert!(!sim.board.pump_on());
    let stopped = sim
        .board
        .events
        .iter()
        .position(|e| *e == AppEvent::PumpStopped(StopReason::Completed))
        .expect("pump stopped");
    let blinked = sim.board.events.iter().position(is_completion_blink).expect("completion blink");
    assert!(stopped < blinked);
    assert!(sim.app.is_animating());
    assert!(!sim.app.completion_blink_pending());

    // Three 1 s cycles, then nothing more.
    sim.advance_to(started + 10_000);
    assert_eq!(sim.board.count(is_completion_blink), 1);
    assert!(!sim.app.is_animating());
    assert!(sim.board.all_lights_off());
}

#[test]
fn animation_command_mid_dose_leaves_the_backstop_armed() {
    let mut sim = Sim::armed(MockBoard::new());
    sim.advance_to(IDLE_OVER_MS);
    let now = sim.now();
    assert!(sim.app.handle_command(AppCommand::StartWatering(Dose::Short), now, &mut sim.board));
    assert!(sim.app.handle_command(
        AppCommand::RunAnimation(Animation::Runner { unit_ms: 0 }),
        now + 100,
        &mut sim.board
    ));

    sim.advance_to(now + 5_000);
    assert!(!sim.app.is_pump_running());
    assert_eq!(
        sim.board.count(|e| *e == AppEvent::AnimationStarted(Animation::blink(3))),
        1
    );
}

#[test]
fn start_watering_refused_while_running() {
    let mut sim = Sim::armed(MockBoard::new());
    let now = sim.now();
    assert!(sim.app.handle_command(AppCommand::StartWatering(Dose::Short), now, &mut sim.board));
    let pump_writes = sim.board.pump_writes();
    assert!(!sim.app.handle_command(AppCommand::StartWatering(Dose::Long), now, &mut sim.board));
    assert_eq!(sim.board.pump_writes(), pump_writes);
}

#[test]
fn abort_command_when_idle_is_a_no_op() {
    let mut sim = Sim::armed(MockBoard::new());
    let now = sim.now();
    assert!(sim.app.handle_command(AppCommand::Abort, now, &mut sim.board));
    assert!(!sim.board.saw(&AppEvent::PumpStopped(StopReason::Aborted)));
    assert!(!sim.board.pump_on());
}
